use salvo::async_trait;
use thiserror::Error;

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReceipt {
    pub sid: String,
    pub status: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider rejected message (code {code:?}): {message}")]
    Rejected { code: Option<u32>, message: String },

    #[error("Provider request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// A single-attempt SMS sender.
#[async_trait]
pub trait SmsProvider: std::fmt::Debug + Send + Sync {
    /// ## Errors
    /// Returns a `ProviderError` describing why the message was not accepted.
    async fn send(&self, to: &str, body: &str) -> Result<ProviderReceipt, ProviderError>;
}
