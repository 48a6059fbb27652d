//! Twilio Programmable Messaging over its REST API.

use std::time::Duration;

use salvo::async_trait;
use serde::Deserialize;

use acompaniar_core::config::SmsCredentials;

use super::provider::{ProviderError, ProviderReceipt, SmsProvider};
use crate::error::{ServiceError, ServiceResult};

pub struct TwilioProvider {
    client: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
    code: Option<u32>,
    message: Option<String>,
}

impl TwilioProvider {
    /// ## Summary
    /// Builds a provider that posts to `{api_base}/2010-04-01/Accounts/{sid}/Messages.json`.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the HTTP client cannot be built.
    pub fn new(
        credentials: SmsCredentials<'_>,
        api_base: &str,
        timeout: Duration,
    ) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InvalidConfiguration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            messages_url: format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                api_base.trim_end_matches('/'),
                credentials.account_sid
            ),
            account_sid: credentials.account_sid.to_string(),
            auth_token: credentials.auth_token.to_string(),
            from_number: credentials.from_number.to_string(),
        })
    }
}

impl std::fmt::Debug for TwilioProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioProvider")
            .field("messages_url", &self.messages_url)
            .field("from_number", &self.from_number)
            .finish_non_exhaustive()
    }
}

fn transport_error(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(err.to_string())
    }
}

#[async_trait]
impl SmsProvider for TwilioProvider {
    #[tracing::instrument(skip(self, body), fields(body_len = body.chars().count()))]
    async fn send(&self, to: &str, body: &str) -> Result<ProviderReceipt, ProviderError> {
        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if status.is_success() {
            let message: MessageResource = response.json().await.map_err(|e| transport_error(&e))?;
            return Ok(ProviderReceipt {
                sid: message.sid,
                status: message.status,
            });
        }

        let error = response
            .json::<ErrorResource>()
            .await
            .unwrap_or(ErrorResource {
                code: None,
                message: None,
            });

        Err(ProviderError::Rejected {
            code: error.code,
            message: error
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        })
    }
}
