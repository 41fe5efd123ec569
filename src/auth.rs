use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::Role, token::TokenState};

/// Principal
///
/// The resolved identity of an authenticated request. The authentication gate
/// attaches it to the request extensions; handlers receive it as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    /// Handler-level role check, repeated inside admin handlers as a second line
    /// behind the path policy.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Principal Extractor Implementation
///
/// Reads the principal placed by `authentication_gate`. Rejects with 401 when the
/// request is unauthenticated, which is how public-path handlers such as
/// `/api/auth/me` still demand a login.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(value: &str) -> Option<&str> {
    value.strip_prefix("Bearer ").filter(|token| !token.is_empty())
}

/// authentication_gate
///
/// Runs once per request before authorization:
/// 1. No bearer credential: pass through unauthenticated.
/// 2. Otherwise validate the token with the token service.
/// 3. On valid claims, attach a `Principal` unless one is already attached.
/// 4. On an invalid token, log and pass through unauthenticated; the policy
///    layer decides whether that becomes a 401.
///
/// Pure computation: no I/O, never blocks.
pub async fn authentication_gate(
    State(tokens): State<TokenState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    if let Some(token) = token {
        match tokens.validate(&token) {
            Ok(claims) => {
                if request.extensions().get::<Principal>().is_none() {
                    request.extensions_mut().insert(Principal {
                        username: claims.sub,
                        role: claims.role,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(uri = %request.uri(), error = %e, "bearer token rejected");
            }
        }
    }

    next.run(request).await
}
