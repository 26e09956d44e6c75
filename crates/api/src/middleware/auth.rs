//! Bearer-token authentication: signer, verifier, and role extractors.
//!
//! Every protected handler takes one of [`CustomerAuth`], [`SellerAuth`], or
//! [`AdminAuth`] as an argument. The extractor verifies the `Authorization:
//! Bearer` token, checks the role claim, and hands the handler the branded
//! actor id. Handlers never see the raw token.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn list_my_carts(
//!     State(state): State<AppState>,
//!     CustomerAuth(customer_id): CustomerAuth,
//! ) -> Result<Json<Page<CartDto>>> { ... }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use dragonfruit_core::{AdminId, CustomerId, Role, SellerId};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Errors from token issuance or verification.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The signing secret is unusable.
    #[error("empty token secret")]
    EmptySecret,
    /// No `Authorization: Bearer` header on the request.
    #[error("missing bearer token")]
    MissingToken,
    /// The token is expired.
    #[error("token expired")]
    Expired,
    /// The token failed verification.
    #[error("invalid token")]
    Invalid,
    /// Token encoding failed.
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// The decoded token payload handed to handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Actor identifier.
    pub sub: Uuid,
    /// Actor role.
    pub role: Role,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
}

/// HS256 token signer and verifier.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    /// Derive signing keys from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmptySecret`] if the secret is empty.
    pub fn new(secret: &str, ttl_hours: i64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            ttl: Duration::hours(ttl_hours),
        })
    }

    /// Issue a token for an actor.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Encoding`] if serialization fails.
    pub fn issue(&self, sub: Uuid, role: Role, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = AuthClaims {
            sub,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Expired`] or [`AuthError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        jsonwebtoken::decode::<AuthClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            })
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => Self::Unauthorized("missing bearer token".to_owned()),
            AuthError::Expired => Self::Unauthorized("token expired".to_owned()),
            AuthError::Invalid => Self::Unauthorized("invalid token".to_owned()),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Pull verified claims out of the request headers.
fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<AuthClaims, AuthError> {
    let token = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    state.tokens().verify(token)
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr, $id:ty) => {
        $(#[$meta])*
        pub struct $name(pub $id);

        impl FromRequestParts<AppState> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let claims = claims_from_parts(parts, state)?;
                if claims.role != $role {
                    return Err(ApiError::Forbidden(format!(
                        "{} token required",
                        $role.as_str()
                    )));
                }
                Ok(Self(<$id>::new(claims.sub)))
            }
        }
    };
}

role_extractor!(
    /// Extractor requiring a customer token.
    CustomerAuth,
    Role::Customer,
    CustomerId
);
role_extractor!(
    /// Extractor requiring a seller token.
    SellerAuth,
    Role::Seller,
    SellerId
);
role_extractor!(
    /// Extractor requiring an admin token.
    AdminAuth,
    Role::Admin,
    AdminId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("kfjghd87g3kjhfv8d7fgkjh3g487fgkjhdfg", 24).unwrap()
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(TokenSigner::new("", 24), Err(AuthError::EmptySecret)));
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let signer = signer();
        let sub = Uuid::from_u128(7);
        let token = signer.issue(sub, Role::Seller, Utc::now()).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.role, Role::Seller);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let signer = signer();
        let two_days_ago = Utc::now() - Duration::hours(48);
        let token = signer
            .issue(Uuid::from_u128(7), Role::Customer, two_days_ago)
            .unwrap();

        assert!(matches!(signer.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert!(matches!(
            signer().verify("not.a.token"),
            Err(AuthError::Invalid)
        ));
    }
}
