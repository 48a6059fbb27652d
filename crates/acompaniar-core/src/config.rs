use std::fmt;

use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub phone: PhoneConfig,
    #[serde(default)]
    pub emergency: EmergencyConfig,
    #[serde(default = "WindowConfig::test_sms_default")]
    pub test_sms: WindowConfig,
    #[serde(default = "WindowConfig::login_default")]
    pub login: WindowConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_token_ttl")]
    pub token_ttl_minutes: i64,
}

impl AuthConfig {
    const fn default_token_ttl() -> i64 {
        60 * 24 * 7
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// SMS provider settings. Sending is disabled unless the account SID,
/// auth token and sender number are all present.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub api_base: String,
    pub timeout_seconds: u64,
    pub timezone: String,
    pub signature: String,
}

/// Borrowed view of complete provider credentials.
#[derive(Debug, Clone, Copy)]
pub struct SmsCredentials<'a> {
    pub account_sid: &'a str,
    pub auth_token: &'a str,
    pub from_number: &'a str,
}

impl SmsConfig {
    /// ## Summary
    /// Returns the provider credentials if every part is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<SmsCredentials<'_>> {
        Some(SmsCredentials {
            account_sid: self.account_sid.as_deref().filter(|s| !s.is_empty())?,
            auth_token: self.auth_token.as_deref().filter(|s| !s.is_empty())?,
            from_number: self.from_number.as_deref().filter(|s| !s.is_empty())?,
        })
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            api_base: "https://api.twilio.com".to_string(),
            timeout_seconds: 10,
            timezone: "America/Argentina/Tucuman".to_string(),
            signature: "App Acompañar - Tucumán".to_string(),
        }
    }
}

impl fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

/// Phone number normalization rules.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhoneConfig {
    /// Country calling code, with or without a leading `+`.
    pub default_country_code: String,
    /// Area code treated as domestic when dialing without a country code.
    pub local_area_code: Option<String>,
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            default_country_code: "54".to_string(),
            local_area_code: Some("381".to_string()),
            min_length: 6,
            max_length: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    pub rate_limit_seconds: u64,
    pub max_alerts_per_window: u32,
    pub max_contacts: usize,
    pub history_limit: i64,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            rate_limit_seconds: 60,
            max_alerts_per_window: 1,
            max_contacts: 3,
            history_limit: 10,
        }
    }
}

/// Budget for an in-memory sliding window.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub max_requests: usize,
    pub window_seconds: u64,
}

impl WindowConfig {
    #[must_use]
    pub const fn test_sms_default() -> Self {
        Self {
            max_requests: 3,
            window_seconds: 300,
        }
    }

    #[must_use]
    pub const fn login_default() -> Self {
        Self {
            max_requests: 5,
            window_seconds: 60,
        }
    }
}

const fn default_true() -> bool {
    true
}

impl Settings {
    /// ## Summary
    /// Loads configuration from defaults, an optional `config.toml` and
    /// `ACOMPANIAR__SECTION__KEY` environment variables. Environment variables
    /// take precedence over the file.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.max_connections", 4)?
            .set_default("database.run_migrations", true)?
            .set_default("logging.level", "info")?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env
            .add_source(
                config::Environment::with_prefix("ACOMPANIAR")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
