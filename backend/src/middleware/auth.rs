//! Authentication middleware
//!
//! Validates the bearer JWT and scopes the request to the tenant it names.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, ErrorDetail, ErrorResponse};

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    /// Tenant every ledger operation is scoped to
    pub business_id: Uuid,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub business_id: String,
    pub exp: i64,
}

/// Authentication middleware that validates JWT tokens against `secret`
pub async fn auth_middleware(
    State(secret): State<Arc<str>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response();
        }
    };

    match authenticate(token, &secret) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Decode the token and resolve the user it belongs to
pub fn authenticate(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;
    let business_id = Uuid::parse_str(&claims.business_id)
        .map_err(|_| AppError::Unauthorized("Invalid business ID in token".to_string()))?;

    Ok(AuthUser {
        user_id,
        business_id,
    })
}

/// Extractor for authenticated user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(sub: &str, business_id: &str, exp: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            business_id: business_id.to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    fn future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let business_id = Uuid::new_v4();
        let token = token(&user_id.to_string(), &business_id.to_string(), future());

        let user = authenticate(&token, "test-secret").unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.business_id, business_id);
    }

    #[test]
    fn test_wrong_secret() {
        let token = token(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), future());
        assert!(matches!(
            authenticate(&token, "other-secret"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let expired = chrono::Utc::now().timestamp() - 3600;
        let token = token(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), expired);
        assert!(matches!(
            authenticate(&token, "test-secret"),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_bad_business_id() {
        let token = token(&Uuid::new_v4().to_string(), "not-a-uuid", future());
        assert!(matches!(
            authenticate(&token, "test-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
