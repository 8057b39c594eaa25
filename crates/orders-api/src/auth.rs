//! # Bearer Token Gate
//!
//! Requires `Authorization: Bearer <token>` on API routes when enabled.
//! Only the header's shape is checked; token verification is out of scope
//! for this service. Health probes, metrics and the OpenAPI document are
//! never gated.

use axum::extract::Request;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// The token from a well-formed `Bearer` authorization header.
///
/// The header value must be exactly two space-separated parts, the first
/// being `Bearer`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

/// Rejects requests without a well-formed bearer header with `401`.
pub async fn bearer_middleware(request: Request, next: Next) -> Response {
    if !request.headers().contains_key(header::AUTHORIZATION) {
        tracing::warn!("authentication failed: missing authorization header");
        return AppError::Unauthorized("token required".into()).into_response();
    }
    if bearer_token(request.headers()).is_none() {
        tracing::warn!("authentication failed: malformed authorization header");
        return AppError::Unauthorized("invalid authorization format".into()).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn accepts_well_formed_bearer() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
    }

    #[test]
    fn rejects_other_shapes() {
        for value in ["", "Bearer", "Bearer ", "bearer abc", "Basic abc", "Bearer a b"] {
            assert_eq!(bearer_token(&headers(value)), None, "{value:?}");
        }
    }

    #[test]
    fn missing_header_has_no_token() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
