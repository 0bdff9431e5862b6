//! Webhook signature verification.
//!
//! Each platform may sign its deliveries with an HMAC-SHA256 hex digest over
//! the exact raw body, carried in an `X-<Platform>-Signature` header and
//! compared in constant time. Verification is optional per platform: when no
//! secret is configured the check is skipped entirely. Cakto additionally
//! supports a shared-secret field inside the JSON body as an alternative
//! factor when the header is absent.

use axum::http::{HeaderMap, StatusCode};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use tracing::debug;

use crate::config::AppConfig;
use crate::extractors::Platform;

type HmacSha256 = Hmac<Sha256>;

/// Errors that can occur during webhook signature verification
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("missing required signature header: {header}")]
    MissingSignature { header: String },

    #[error("invalid signature format: {header}")]
    InvalidSignatureFormat { header: String },

    #[error("signature verification failed")]
    VerificationFailed,
}

impl VerificationError {
    /// Signature problems reject the delivery before persistence.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

/// Result type for webhook verification
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Verifies an HMAC-SHA256 hex signature over the raw request body.
pub fn verify_hmac_signature(
    body: &[u8],
    signature_header: &str,
    secret: &str,
) -> VerificationResult<()> {
    if signature_header.is_empty() {
        return Err(VerificationError::MissingSignature {
            header: "signature".to_string(),
        });
    }

    // Platforms send a bare hex digest; tolerate a "sha256=" prefix
    let provided_hex = signature_header
        .strip_prefix("sha256=")
        .unwrap_or(signature_header);

    let provided_bytes =
        hex::decode(provided_hex).map_err(|_| VerificationError::InvalidSignatureFormat {
            header: "signature contains invalid hex".to_string(),
        })?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::VerificationFailed)?;
    mac.update(body);
    let expected_bytes = mac.finalize().into_bytes();

    // Constant-time comparison to prevent timing attacks
    let expected: &[u8] = expected_bytes.as_ref();
    if subtle::ConstantTimeEq::ct_eq(expected, &provided_bytes[..]).into() {
        Ok(())
    } else {
        Err(VerificationError::VerificationFailed)
    }
}

/// Look up the configured secret for a platform, if any.
pub fn platform_secret(platform: Platform, config: &AppConfig) -> Option<&str> {
    match platform {
        Platform::Kirvano => config.webhook_kirvano_secret.as_deref(),
        Platform::Hubla => config.webhook_hubla_secret.as_deref(),
        Platform::Braip => config.webhook_braip_secret.as_deref(),
        Platform::Cakto => config.webhook_cakto_secret.as_deref(),
    }
}

/// Verify a webhook delivery for the given platform.
///
/// No configured secret means the check is skipped. With a secret configured,
/// the signature header must validate; for Cakto, a matching `secret` field
/// inside the JSON body is accepted when the header is absent.
pub fn verify_webhook(
    platform: Platform,
    body: &[u8],
    headers: &HeaderMap,
    config: &AppConfig,
) -> VerificationResult<()> {
    let Some(secret) = platform_secret(platform, config) else {
        debug!(platform = %platform, "no webhook secret configured, skipping verification");
        return Ok(());
    };

    let signature_header = headers
        .get(platform.signature_header())
        .and_then(|h| h.to_str().ok());

    match signature_header {
        Some(signature) => verify_hmac_signature(body, signature, secret),
        None if platform == Platform::Cakto => verify_body_secret(body, secret),
        None => Err(VerificationError::MissingSignature {
            header: platform.signature_header().to_string(),
        }),
    }
}

/// Cakto's alternative factor: a shared-secret field inside the body.
fn verify_body_secret(body: &[u8], secret: &str) -> VerificationResult<()> {
    let payload: Value = serde_json::from_slice(body).map_err(|_| {
        VerificationError::MissingSignature {
            header: "secret (body field)".to_string(),
        }
    })?;

    let provided = payload
        .get("secret")
        .and_then(Value::as_str)
        .ok_or_else(|| VerificationError::MissingSignature {
            header: "secret (body field)".to_string(),
        })?;

    if subtle::ConstantTimeEq::ct_eq(provided.as_bytes(), secret.as_bytes()).into() {
        Ok(())
    } else {
        Err(VerificationError::VerificationFailed)
    }
}

/// Compute the hex HMAC-SHA256 digest a sender would attach to `body`.
/// Shared with the test suites.
pub fn sign_body(body: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_secret(platform: Platform, secret: &str) -> AppConfig {
        let mut config = AppConfig::default();
        match platform {
            Platform::Kirvano => config.webhook_kirvano_secret = Some(secret.to_string()),
            Platform::Hubla => config.webhook_hubla_secret = Some(secret.to_string()),
            Platform::Braip => config.webhook_braip_secret = Some(secret.to_string()),
            Platform::Cakto => config.webhook_cakto_secret = Some(secret.to_string()),
        }
        config
    }

    #[test]
    fn valid_signature_over_exact_body_is_accepted() {
        let secret = "test_secret";
        let body = br#"{"event":"SALE_APPROVED"}"#;
        let signature = sign_body(body, secret);
        assert!(verify_hmac_signature(body, &signature, secret).is_ok());
    }

    #[test]
    fn altered_body_with_original_signature_is_rejected() {
        let secret = "test_secret";
        let signature = sign_body(br#"{"event":"SALE_APPROVED"}"#, secret);
        let altered = br#"{"event":"SALE_REFUNDED"}"#;
        assert!(matches!(
            verify_hmac_signature(altered, &signature, secret),
            Err(VerificationError::VerificationFailed)
        ));
    }

    #[test]
    fn sha256_prefix_is_tolerated() {
        let secret = "test_secret";
        let body = b"payload";
        let signature = format!("sha256={}", sign_body(body, secret));
        assert!(verify_hmac_signature(body, &signature, secret).is_ok());
    }

    #[test]
    fn invalid_hex_is_a_format_error() {
        assert!(matches!(
            verify_hmac_signature(b"payload", "not-hex!", "s"),
            Err(VerificationError::InvalidSignatureFormat { .. })
        ));
    }

    #[test]
    fn missing_signature_with_secret_configured_is_rejected() {
        let config = config_with_secret(Platform::Kirvano, "s3cr3t");
        let headers = HeaderMap::new();
        let result = verify_webhook(Platform::Kirvano, b"{}", &headers, &config);
        assert!(matches!(result, Err(VerificationError::MissingSignature { .. })));
        assert_eq!(result.unwrap_err().status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_signature_without_secret_is_accepted() {
        let config = AppConfig::default();
        let headers = HeaderMap::new();
        assert!(verify_webhook(Platform::Hubla, b"{}", &headers, &config).is_ok());
    }

    #[test]
    fn header_signature_verified_per_platform() {
        let secret = "hubla_secret";
        let config = config_with_secret(Platform::Hubla, secret);
        let body = br#"{"event":"NewSale"}"#;

        let mut headers = HeaderMap::new();
        headers.insert("x-hubla-signature", sign_body(body, secret).parse().unwrap());
        assert!(verify_webhook(Platform::Hubla, body, &headers, &config).is_ok());

        // same digest under the wrong platform header is a missing signature
        let config = config_with_secret(Platform::Braip, secret);
        assert!(verify_webhook(Platform::Braip, body, &headers, &config).is_err());
    }

    #[test]
    fn cakto_body_secret_accepted_when_header_absent() {
        let config = config_with_secret(Platform::Cakto, "shared-secret");
        let body = br#"{"event":"purchase_approved","secret":"shared-secret"}"#;
        let headers = HeaderMap::new();
        assert!(verify_webhook(Platform::Cakto, body, &headers, &config).is_ok());
    }

    #[test]
    fn cakto_wrong_body_secret_rejected() {
        let config = config_with_secret(Platform::Cakto, "shared-secret");
        let body = br#"{"event":"purchase_approved","secret":"wrong"}"#;
        let headers = HeaderMap::new();
        assert!(matches!(
            verify_webhook(Platform::Cakto, body, &headers, &config),
            Err(VerificationError::VerificationFailed)
        ));
    }

    #[test]
    fn cakto_header_still_takes_precedence() {
        let secret = "shared-secret";
        let config = config_with_secret(Platform::Cakto, secret);
        let body = br#"{"event":"purchase_approved"}"#;
        let mut headers = HeaderMap::new();
        headers.insert("x-cakto-signature", sign_body(body, secret).parse().unwrap());
        assert!(verify_webhook(Platform::Cakto, body, &headers, &config).is_ok());
    }
}
