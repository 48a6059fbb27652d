//! Outbound SMS notification.

pub mod gateway;
pub mod message;
pub mod provider;
pub mod twilio;

pub use gateway::{DeliveryDetail, DispatchResult, NotificationGateway, Recipient, SendFailure};
pub use provider::{ProviderError, ProviderReceipt, SmsProvider};
