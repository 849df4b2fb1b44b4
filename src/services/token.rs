//! Bearer-token verification against the external identity provider.
//!
//! The verifier is built once at startup from [`IdentityConfig`] and handed
//! to request handlers through shared state; there is no lazy init path.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

use crate::config::IdentityConfig;

/// Claims asserted by the provider about the authenticated person.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityClaims {
    /// Stable subject id. Becomes the local user id on first contact.
    pub sub: String,

    pub email: Option<String>,

    #[serde(default)]
    pub email_verified: bool,

    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Authentication token has expired")]
    Expired,

    #[error("Invalid authentication token")]
    Invalid(String),
}

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);

        Self {
            decoding_key: DecodingKey::from_secret(config.hs256_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        match decode::<IdentityClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => match err.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid(err.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        email: Option<&'a str>,
        email_verified: bool,
        name: Option<&'a str>,
        iss: &'a str,
        aud: &'a str,
        exp: i64,
    }

    fn test_config() -> IdentityConfig {
        IdentityConfig {
            issuer: "https://id.test".to_string(),
            audience: "snapnest-test".to_string(),
            hs256_secret: "unit-test-secret".to_string(),
            admin_emails: vec![],
        }
    }

    fn sign(claims: &TestClaims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_well_formed_token() {
        let config = test_config();
        let verifier = TokenVerifier::new(&config);

        let token = sign(
            &TestClaims {
                sub: "sub-1",
                email: Some("host@example.com"),
                email_verified: true,
                name: Some("Host"),
                iss: "https://id.test",
                aud: "snapnest-test",
                exp: chrono::Utc::now().timestamp() + 3600,
            },
            "unit-test-secret",
        );

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.sub, "sub-1");
        assert_eq!(claims.email.as_deref(), Some("host@example.com"));
        assert!(claims.email_verified);
    }

    #[test]
    fn rejects_expired_token() {
        let config = test_config();
        let verifier = TokenVerifier::new(&config);

        let token = sign(
            &TestClaims {
                sub: "sub-1",
                email: None,
                email_verified: false,
                name: None,
                iss: "https://id.test",
                aud: "snapnest-test",
                exp: chrono::Utc::now().timestamp() - 600,
            },
            "unit-test-secret",
        );

        assert!(matches!(verifier.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn rejects_wrong_secret_and_audience() {
        let config = test_config();
        let verifier = TokenVerifier::new(&config);

        let forged = sign(
            &TestClaims {
                sub: "sub-1",
                email: None,
                email_verified: false,
                name: None,
                iss: "https://id.test",
                aud: "snapnest-test",
                exp: chrono::Utc::now().timestamp() + 3600,
            },
            "some-other-secret",
        );
        assert!(matches!(
            verifier.verify(&forged),
            Err(TokenError::Invalid(_))
        ));

        let wrong_audience = sign(
            &TestClaims {
                sub: "sub-1",
                email: None,
                email_verified: false,
                name: None,
                iss: "https://id.test",
                aud: "someone-else",
                exp: chrono::Utc::now().timestamp() + 3600,
            },
            "unit-test-secret",
        );
        assert!(matches!(
            verifier.verify(&wrong_audience),
            Err(TokenError::Invalid(_))
        ));
    }
}
