//! Bearer token handling. Tokens are minted by the identity provider in
//! front of this service; issuance here exists for seeding and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::user::User;

/// JWT claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issue an access token for `user`.
pub fn issue_access_token(user: &User, jwt_secret: &str, expiry_secs: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let encoding_key = EncodingKey::from_secret(jwt_secret.as_bytes());

    let claims = Claims {
        sub: user.id.to_string(),
        name: user.name.clone(),
        role: serde_json::to_string(&user.role)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string(),
        token_type: "access".to_string(),
        exp: (now + Duration::seconds(expiry_secs)).timestamp(),
        iat: now.timestamp(),
    };

    jsonwebtoken::encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))
}

/// Validate a JWT and return the claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(jwt_secret.as_bytes());
    let validation = Validation::default();

    jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}
