//! Phone number normalization.
//!
//! ## Summary
//! Two views of the same number are produced: a compact digits-only form that
//! is stored with a contact, and an E.164-like `+<country><number>` form that
//! is handed to the SMS provider.

use crate::config::PhoneConfig;
use crate::error::{CoreError, CoreResult};

/// Normalization rules derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneRules {
    country_code: String,
    local_area_code: Option<String>,
    min_length: usize,
    max_length: usize,
}

impl PhoneRules {
    #[must_use]
    pub fn new(
        country_code: &str,
        local_area_code: Option<&str>,
        min_length: usize,
        max_length: usize,
    ) -> Self {
        Self {
            country_code: digits_only(country_code),
            local_area_code: local_area_code
                .map(digits_only)
                .filter(|code| !code.is_empty()),
            min_length,
            max_length,
        }
    }

    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// ## Summary
    /// Normalizes user input into the stored contact form.
    ///
    /// Characters other than digits and `+` are removed. Numbers already in
    /// international form or starting with the country code are kept; any other
    /// number loses its leading zeros and gains the country code. The result is
    /// truncated to the maximum length.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the cleaned number is outside the allowed
    /// length range or has a `+` anywhere but the first position.
    pub fn normalize_for_storage(&self, raw: &str) -> CoreResult<String> {
        let cleaned = clean(raw);
        let length = cleaned.chars().count();

        if length < self.min_length || length > self.max_length {
            return Err(CoreError::ValidationError(format!(
                "El teléfono debe tener entre {} y {} dígitos",
                self.min_length, self.max_length
            )));
        }
        if cleaned.rfind('+').is_some_and(|idx| idx > 0) {
            return Err(CoreError::ValidationError(
                "Formato de teléfono inválido".to_string(),
            ));
        }

        let mut normalized =
            if cleaned.starts_with('+') || cleaned.starts_with(self.country_code.as_str()) {
                cleaned
            } else {
                format!("{}{}", self.country_code, cleaned.trim_start_matches('0'))
            };
        normalized.truncate(self.max_length);

        tracing::trace!(raw, normalized = %normalized, "Normalized phone for storage");

        Ok(normalized)
    }

    /// ## Summary
    /// Produces the `+<country><number>` form used when dispatching an SMS.
    ///
    /// A number already starting with `+` is kept. A number starting with the
    /// country code or the local area code is considered domestic. Otherwise a
    /// single leading trunk `0` is dropped before the country code is added.
    #[must_use]
    pub fn normalize_for_dispatch(&self, raw: &str) -> String {
        let cleaned = clean(raw);

        if cleaned.starts_with('+') {
            return cleaned;
        }
        if cleaned.starts_with(self.country_code.as_str()) {
            return format!("+{cleaned}");
        }
        if let Some(local) = &self.local_area_code
            && cleaned.starts_with(local.as_str())
        {
            return format!("+{}{cleaned}", self.country_code);
        }

        let national = cleaned.strip_prefix('0').unwrap_or(&cleaned);
        format!("+{}{national}", self.country_code)
    }
}

impl From<&PhoneConfig> for PhoneRules {
    fn from(config: &PhoneConfig) -> Self {
        Self::new(
            &config.default_country_code,
            config.local_area_code.as_deref(),
            config.min_length,
            config.max_length,
        )
    }
}

impl Default for PhoneRules {
    fn default() -> Self {
        Self::from(&PhoneConfig::default())
    }
}

/// Keeps only digits and `+`.
#[must_use]
pub fn clean(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect()
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
