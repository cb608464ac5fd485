//! Stripe charges API client.
//!
//! Posts form-encoded charges to `{api_base}/v1/charges` and maps Stripe's
//! error envelope onto [`GatewayError`].

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{instrument, warn};

use super::gateway::{ChargeId, ChargeRequest, Decline, GatewayError, PaymentGateway};
use crate::config::PaymentsConfig;

/// Stripe API client for card charges.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    charges_url: String,
    secret_key: SecretString,
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("charges_url", &self.charges_url)
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl StripeGateway {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            charges_url: format!("{}/v1/charges", config.api_base.trim_end_matches('/')),
            secret_key: config.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeId, GatewayError> {
        let amount = request.amount.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("source", request.source.as_str()),
        ];

        let response = self
            .client
            .post(&self.charges_url)
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
            let error = classify(status, envelope.map(|e| e.error));
            warn!(status = status.as_u16(), error = %error, "Stripe charge failed");
            return Err(error);
        }

        let charge: ChargeResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Api {
                status: status.as_u16(),
                message: format!("unreadable charge response: {e}"),
            })?;

        Ok(ChargeId::new(charge.id))
    }
}

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: StripeError,
}

/// Stripe's `error` object.
#[derive(Debug, Default, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
    param: Option<String>,
}

fn transport_error(error: reqwest::Error) -> GatewayError {
    if error.is_connect() || error.is_timeout() {
        GatewayError::Network(error.to_string())
    } else {
        GatewayError::Api {
            status: error.status().map_or(0, |s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

/// Map a non-success response onto a failure category.
///
/// Stripe's `error.type` wins over the status code where both are present.
fn classify(status: StatusCode, error: Option<StripeError>) -> GatewayError {
    let error = error.unwrap_or_default();
    let message = error
        .message
        .clone()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());

    match (error.kind.as_deref(), status.as_u16()) {
        (Some("card_error"), _) | (_, 402) => GatewayError::CardDeclined(Decline {
            message,
            code: error.code,
            decline_code: error.decline_code,
            param: error.param,
        }),
        (_, 429) => GatewayError::RateLimited,
        (_, 401 | 403) => GatewayError::Authentication,
        (Some("invalid_request_error"), _) | (_, 400 | 404) => {
            GatewayError::InvalidRequest(message)
        }
        (_, status) => GatewayError::Api { status, message },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stripe_error(kind: &str, message: &str) -> Option<StripeError> {
        Some(StripeError {
            kind: Some(kind.to_owned()),
            message: Some(message.to_owned()),
            ..StripeError::default()
        })
    }

    #[test]
    fn test_card_error_keeps_stripe_message() {
        let body = r#"{"error":{"type":"card_error","message":"Your card was declined.","code":"card_declined","decline_code":"generic_decline"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();

        match classify(StatusCode::PAYMENT_REQUIRED, Some(envelope.error)) {
            GatewayError::CardDeclined(decline) => {
                assert_eq!(decline.message, "Your card was declined.");
                assert_eq!(decline.code.as_deref(), Some("card_declined"));
                assert_eq!(decline.decline_code.as_deref(), Some("generic_decline"));
            }
            other => panic!("expected decline, got {other:?}"),
        }
    }

    #[test]
    fn test_402_without_body_is_decline() {
        assert!(matches!(
            classify(StatusCode::PAYMENT_REQUIRED, None),
            GatewayError::CardDeclined(_)
        ));
    }

    #[test]
    fn test_status_categories() {
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, None),
            GatewayError::RateLimited
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, None),
            GatewayError::Authentication
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, None),
            GatewayError::Authentication
        );
        assert!(matches!(
            classify(StatusCode::NOT_FOUND, None),
            GatewayError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_invalid_request_type() {
        assert_eq!(
            classify(
                StatusCode::BAD_REQUEST,
                stripe_error("invalid_request_error", "No such token")
            ),
            GatewayError::InvalidRequest("No such token".to_owned())
        );
    }

    #[test]
    fn test_server_error_is_generic() {
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, stripe_error("api_error", "upstream")),
            GatewayError::Api {
                status: 502,
                message: "upstream".to_owned()
            }
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = PaymentsConfig {
            secret_key: SecretString::from("sk_test_abcdefghijklmnop"),
            api_base: "https://api.stripe.com/".to_owned(),
            currency: corner_shop_core::CurrencyCode::USD,
            timeout: std::time::Duration::from_secs(5),
        };
        let gateway = StripeGateway::new(&config).unwrap();
        let debug = format!("{gateway:?}");
        assert!(debug.contains("https://api.stripe.com/v1/charges"));
        assert!(!debug.contains("sk_test"));
    }
}
