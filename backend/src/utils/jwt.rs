use admission_shared::{UserRole, JWT_ACCESS_TOKEN_EXPIRY_SECS, JWT_MIN_SECRET_LENGTH};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;


const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // user id
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Authentication("Invalid subject in token".to_string()))
    }
}

/// HS256 bearer token issuing and validation.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.len() < JWT_MIN_SECRET_LENGTH {
            return Err(AppError::Internal(format!(
                "JWT secret must be at least {} characters long",
                JWT_MIN_SECRET_LENGTH
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub", "iat", "jti"]);
        validation.leeway = 30;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn generate_access_token(&self, user_id: Uuid, role: UserRole) -> Result<String, AppError> {
        self.generate_token(user_id, role, Duration::seconds(JWT_ACCESS_TOKEN_EXPIRY_SECS))
    }

    fn generate_token(&self, user_id: Uuid, role: UserRole, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Decodes an access token, rejecting expired, tampered or non-access tokens.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Authentication("Token has expired".to_string()),
                ErrorKind::InvalidSignature => {
                    AppError::Authentication("Invalid token signature".to_string())
                }
                _ => AppError::Authentication("Invalid token".to_string()),
            })?;

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::Authentication("Invalid token type".to_string()));
        }

        Ok(token_data.claims)
    }

    /// Strips the `Bearer ` scheme from an Authorization header value.
    pub fn extract_bearer(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}
