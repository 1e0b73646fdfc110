//! Payment configuration

use serde::Deserialize;

use crate::domain::billing::Currency;

use super::error::ValidationError;

/// Payment configuration (PayPal)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// PayPal REST client id
    pub paypal_client_id: String,

    /// PayPal REST client secret
    pub paypal_client_secret: String,

    /// PayPal API base URL. The sandbox host in development, the live host
    /// in production.
    #[serde(default = "default_paypal_base_url")]
    pub paypal_base_url: String,

    /// ISO-4217 code applied when a checkout request names no currency
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Days of access granted per purchase. Absent means access never
    /// expires by time.
    pub access_ttl_days: Option<u32>,

    /// Per-request timeout for provider calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    /// Check if pointed at the PayPal sandbox
    pub fn is_sandbox(&self) -> bool {
        self.paypal_base_url.contains("sandbox")
    }

    /// The parsed default currency.
    pub fn parsed_default_currency(&self) -> Result<Currency, ValidationError> {
        Currency::parse(&self.default_currency)
            .map_err(|_| ValidationError::UnsupportedDefaultCurrency)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.paypal_client_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_ID"));
        }
        if self.paypal_client_secret.is_empty() {
            return Err(ValidationError::MissingRequired("PAYPAL_CLIENT_SECRET"));
        }
        if !self.paypal_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidProviderUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        self.parsed_default_currency()?;
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            paypal_client_id: String::new(),
            paypal_client_secret: String::new(),
            paypal_base_url: default_paypal_base_url(),
            default_currency: default_currency(),
            access_ttl_days: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_paypal_base_url() -> String {
    "https://api-m.paypal.com".to_string()
}

fn default_currency() -> String {
    "RUB".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PaymentConfig {
        PaymentConfig {
            paypal_client_id: "client-id".to_string(),
            paypal_client_secret: "client-secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.parsed_default_currency().unwrap(), Currency::Rub);
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(PaymentConfig::default().validate().is_err());

        let config = PaymentConfig {
            paypal_client_secret: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn plain_http_base_url_is_rejected() {
        let config = PaymentConfig {
            paypal_base_url: "http://api-m.paypal.com".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidProviderUrl)
        ));
    }

    #[test]
    fn unsupported_default_currency_is_rejected() {
        let config = PaymentConfig {
            default_currency: "GBP".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::UnsupportedDefaultCurrency)
        ));
    }

    #[test]
    fn sandbox_detection() {
        let config = PaymentConfig {
            paypal_base_url: "https://api-m.sandbox.paypal.com".to_string(),
            ..valid_config()
        };
        assert!(config.is_sandbox());
        assert!(!valid_config().is_sandbox());
    }
}
