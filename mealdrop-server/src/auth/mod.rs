//! Bearer-token authentication
//!
//! Token issuance lives with the external identity provider; this
//! module only resolves a presented token to a [`Principal`].
//! `resolve_token` is a pure function of (token, secret, now) so the
//! expiry check is deterministic under test.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::state::AppState;

/// Actor role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Restaurant,
    Driver,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User account id
    pub sub: i64,
    pub role: Role,
    /// Expiration (Unix timestamp seconds)
    pub exp: i64,
    /// Issued at (Unix timestamp seconds)
    pub iat: i64,
}

/// Authenticated identity extracted from a bearer token
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    /// Reject principals of the wrong role before touching any data
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "endpoint requires {role:?} role"
            )))
        }
    }
}

const TOKEN_EXPIRY_HOURS: i64 = 24;

/// Create a signed token (dev tooling and tests; production tokens
/// come from the identity provider sharing the same secret)
pub fn create_token(
    user_id: i64,
    role: Role,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (now + chrono::Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp(),
        iat: now.timestamp(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Resolve a bearer token to a principal, or fail with 401.
///
/// Expiry is checked against the supplied `now` rather than the
/// process clock.
pub fn resolve_token(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Principal, AppError> {
    let mut validation = Validation::default();
    // Expiry is checked below against the caller's clock
    validation.validate_exp = false;

    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("token validation failed: {e}");
        AppError::invalid_token("Invalid token")
    })?;

    if data.claims.exp <= now.timestamp() {
        return Err(AppError::token_expired());
    }

    Ok(Principal {
        user_id: data.claims.sub,
        role: data.claims.role,
    })
}

/// Middleware that extracts and verifies the bearer token from the
/// Authorization header and inserts a [`Principal`] extension
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::not_authenticated().into_response())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format").into_response())?;

    let principal = resolve_token(token, &state.jwt_secret, Utc::now())
        .map_err(|e| e.into_response())?;

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
