// src/services/token.rs

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{common::error::AppError, models::auth::Claims};

/// Signing material and lifetime for issued tokens. Built once at startup.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }
}

// Never print the key.
impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Issues and checks HS256 JWTs whose subject is the user's email.
///
/// Tokens are honoured until they expire; there is no revocation list.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: config.ttl,
        }
    }

    /// Configured lifetime for tokens issued at login/registration.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: &str, now: DateTime<Utc>, ttl: Duration) -> Result<String, AppError> {
        let claims = Claims {
            sub: subject.to_owned(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("failed to sign token: {e}")))
    }

    /// Returns the subject of a well-signed token that has not expired at `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = self.decode_claims(token)?;
        if claims.exp <= now.timestamp() {
            return Err(AppError::TokenExpired);
        }
        Ok(claims.sub)
    }

    /// Signature-checked parse that does not look at the expiry.
    pub fn extract_subject(&self, token: &str) -> Result<String, AppError> {
        Ok(self.decode_claims(token)?.sub)
    }

    // Expiry is checked against the caller's clock, not the library's.
    fn decode_claims(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["sub".to_string(), "exp".to_string()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::TokenMalformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&TokenConfig::new(secret, Duration::hours(24)))
    }

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn issued_token_verifies_to_subject() {
        let tokens = service("test-secret");
        let token = tokens.issue("a@x.com", issued_at(), Duration::hours(1)).unwrap();
        let subject = tokens.verify(&token, issued_at() + Duration::minutes(59)).unwrap();
        assert_eq!(subject, "a@x.com");
    }

    #[test]
    fn zero_ttl_is_expired_one_second_later() {
        let tokens = service("test-secret");
        let token = tokens.issue("a@x.com", issued_at(), Duration::zero()).unwrap();
        let err = tokens.verify(&token, issued_at() + Duration::seconds(1)).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn expiry_instant_itself_is_expired() {
        let tokens = service("test-secret");
        let token = tokens.issue("a@x.com", issued_at(), Duration::hours(1)).unwrap();
        let err = tokens.verify(&token, issued_at() + Duration::hours(1)).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service("test-secret");
        for token in ["", "not-a-jwt", "a.b.c"] {
            let err = tokens.verify(token, issued_at()).unwrap_err();
            assert!(matches!(err, AppError::TokenMalformed), "{token:?}");
        }
    }

    #[test]
    fn foreign_signature_is_malformed() {
        let token = service("other-secret")
            .issue("a@x.com", issued_at(), Duration::hours(1))
            .unwrap();
        let err = service("test-secret").verify(&token, issued_at()).unwrap_err();
        assert!(matches!(err, AppError::TokenMalformed));
    }

    #[test]
    fn tampered_payload_is_malformed() {
        let tokens = service("test-secret");
        let token = tokens.issue("a@x.com", issued_at(), Duration::hours(1)).unwrap();
        let other = tokens.issue("b@x.com", issued_at(), Duration::hours(1)).unwrap();

        // Header and signature from one token, claims from the other.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        let err = tokens.verify(&forged, issued_at()).unwrap_err();
        assert!(matches!(err, AppError::TokenMalformed));
    }

    #[test]
    fn extract_subject_ignores_expiry() {
        let tokens = service("test-secret");
        let token = tokens.issue("a@x.com", issued_at(), Duration::zero()).unwrap();
        assert_eq!(tokens.extract_subject(&token).unwrap(), "a@x.com");
        assert!(matches!(
            tokens.extract_subject("nope"),
            Err(AppError::TokenMalformed)
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = TokenConfig::new("super-secret-key", Duration::hours(1));
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret-key"));
        assert!(printed.contains("<redacted>"));
    }
}
