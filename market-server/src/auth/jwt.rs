//! Identity tokens
//!
//! HS256 JWTs carrying the caller's role and scoped id. Resolving a token is
//! pure: signature, expiry, issuer and audience are checked, nothing is
//! looked up.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Identity, Role};
use thiserror::Error;

/// Minimum accepted secret length
pub const MIN_SECRET_LEN: usize = 32;

/// Default token lifetime: 7 days
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Read `JWT_*` variables.
    ///
    /// Without `JWT_SECRET` a random secret is generated, but only when
    /// `allow_generated_secret` is set (development).
    pub fn from_env(allow_generated_secret: bool) -> Result<Self, JwtError> {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(JwtError::Config(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
                )));
            }
            Ok(secret) => secret,
            Err(_) if allow_generated_secret => {
                tracing::warn!("JWT_SECRET not set, generating a temporary development secret");
                generate_printable_secret()?
            }
            Err(_) => {
                return Err(JwtError::Config(
                    "JWT_SECRET environment variable must be set".to_string(),
                ));
            }
        };

        Ok(Self {
            secret,
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_EXPIRATION_MINUTES),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "market-server".to_string()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "market-clients".to_string()),
        })
    }

    /// Fixed configuration for tests and tools
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            issuer: "market-server".to_string(),
            audience: "market-clients".to_string(),
        }
    }
}

/// Claims stored in the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

impl TryFrom<Claims> for Identity {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims.sub;
        match (claims.role, claims.buyer_id, claims.seller_id) {
            (Role::Buyer, Some(buyer_id), None) => Ok(Identity::Buyer { user_id, buyer_id }),
            (Role::Seller, None, Some(seller_id)) => Ok(Identity::Seller { user_id, seller_id }),
            (Role::Admin, None, None) => Ok(Identity::Admin { user_id }),
            (role, _, _) => Err(JwtError::InvalidToken(format!(
                "role {role} does not match the scoped ids"
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    Generation(String),

    #[error("JWT configuration error: {0}")]
    Config(String),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AppError::token_expired(),
            JwtError::InvalidToken(_) | JwtError::InvalidSignature => {
                AppError::invalid_token("Invalid token")
            }
            JwtError::Generation(msg) | JwtError::Config(msg) => AppError::internal(msg),
        }
    }
}

/// Random 64-character printable secret
pub fn generate_printable_secret() -> Result<String, JwtError> {
    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

    let mut bytes = [0u8; 64];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| JwtError::Config("failed to generate a random secret".to_string()))?;

    Ok(bytes
        .iter()
        .map(|b| CHARSET[usize::from(*b) % CHARSET.len()] as char)
        .collect())
}

/// Issued token and its expiry (unix millis)
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("expiration_minutes", &self.config.expiration_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    /// Sign a token for `identity`
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: identity.user_id().to_string(),
            role: identity.role(),
            buyer_id: identity.buyer_id().map(str::to_string),
            seller_id: identity.seller_id().map(str::to_string),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Generation(e.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_at: expiration.timestamp_millis(),
        })
    }

    /// Validate and decode a token
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// Token to identity. The only way an [`Identity`] enters a request.
    pub fn resolve(&self, token: &str) -> Result<Identity, JwtError> {
        self.validate(token)?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn service() -> JwtService {
        JwtService::new(JwtConfig::with_secret(SECRET))
    }

    fn seller() -> Identity {
        Identity::Seller {
            user_id: "u1".into(),
            seller_id: "s1".into(),
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp_offset_secs: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: "u1".into(),
            role: Role::Buyer,
            buyer_id: Some("b1".into()),
            seller_id: None,
            exp: now + exp_offset_secs,
            iat: now - 10,
            iss: "market-server".into(),
            aud: "market-clients".into(),
        }
    }

    #[test]
    fn test_issue_then_resolve() {
        let service = service();
        let issued = service.issue(&seller()).unwrap();
        assert!(issued.expires_at > Utc::now().timestamp_millis());
        assert_eq!(service.resolve(&issued.token).unwrap(), seller());

        let admin = Identity::Admin { user_id: "a".into() };
        let issued = service.issue(&admin).unwrap();
        assert_eq!(service.resolve(&issued.token).unwrap(), admin);
    }

    #[test]
    fn test_expired_token() {
        let token = sign(&claims(-60), SECRET);
        assert!(matches!(service().resolve(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = sign(&claims(3600), "another-secret-another-secret-xx");
        assert!(matches!(
            service().resolve(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(3600)).unwrap());
        let token = format!("{header}.{payload}.");
        assert!(service().resolve(&token).is_err());
    }

    #[test]
    fn test_garbage_and_wrong_audience() {
        assert!(matches!(
            service().resolve("not-a-token"),
            Err(JwtError::InvalidToken(_))
        ));

        let mut c = claims(3600);
        c.aud = "someone-else".into();
        assert!(service().resolve(&sign(&c, SECRET)).is_err());
    }

    #[test]
    fn test_role_and_ids_must_agree() {
        let mut c = claims(3600);
        c.role = Role::Seller;
        let err = service().resolve(&sign(&c, SECRET)).unwrap_err();
        assert!(matches!(err, JwtError::InvalidToken(_)));

        let mut c = claims(3600);
        c.seller_id = Some("s1".into());
        assert!(service().resolve(&sign(&c, SECRET)).is_err());
    }

    #[test]
    fn test_error_mapping() {
        let err: AppError = JwtError::Expired.into();
        assert_eq!(err.code, shared::error::ErrorCode::TokenExpired);
        let err: AppError = JwtError::InvalidSignature.into();
        assert_eq!(err.code, shared::error::ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_generated_secret_is_long_enough() {
        let secret = generate_printable_secret().unwrap();
        assert_eq!(secret.len(), 64);
        assert!(secret.len() >= MIN_SECRET_LEN);
    }
}
