use super::jwt::{self, AuthInfo};
use crate::server::controller::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode};
use thiserror::Error;
use tracing::warn;

/// challenge sent back with every 401, regardless of why the token
/// was rejected
pub const BEARER_CHALLENGE: &str = "Bearer, charset=\"UTF-8\"";

#[derive(Debug, Error)]
enum AuthError {
    #[error("missing required Authorization header")]
    MissingHeader,

    #[error("unsupported or malformed Authorization header (only Bearer scheme is supported)")]
    MalformedHeader,

    #[error("invalid auth token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

fn parse_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::MalformedHeader)?;

    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}

/// the uniform 401 sent for every authentication failure, the cause is only
/// logged so callers cannot probe why a token was refused
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static(BEARER_CHALLENGE),
        )],
    )
        .into_response()
}

/// middleware for routes that require an authenticated provider, verifies
/// the bearer token and adds the `AuthInfo` extension on success
pub async fn require_provider(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let verified = parse_bearer_token(req.headers())
        .and_then(|token| jwt::verify(token, &state.jwt_public_key).map_err(AuthError::from));

    match verified {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(err) => {
            warn!("rejected request: {err}");
            unauthorized_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthInfo
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthInfo>()
            .copied()
            .ok_or_else(unauthorized_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_rejected() {
        let err = parse_bearer_token(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingHeader));
    }

    #[test]
    fn non_bearer_schemes_are_rejected() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "token abc"] {
            let headers = headers_with_authorization(value);
            assert!(
                matches!(parse_bearer_token(&headers), Err(AuthError::MalformedHeader)),
                "value: {value}"
            );
        }
    }

    #[test]
    fn bearer_tokens_are_extracted() {
        let headers = headers_with_authorization("Bearer some.jwt.token");
        assert_eq!(parse_bearer_token(&headers).unwrap(), "some.jwt.token");
    }
}
