//! Request extractors

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::NomadError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken from the `X-User-Id` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = NomadError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| UserId(value.to_string()))
            .ok_or_else(|| NomadError::unauthorized(format!("Missing {USER_ID_HEADER} header")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<UserId, NomadError> {
        let (mut parts, _) = request.into_parts();
        UserId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_is_required_and_trimmed() {
        let ok = Request::builder()
            .header("X-User-Id", " traveller@example.com ")
            .body(())
            .unwrap();
        assert_eq!(extract(ok).await.unwrap(), UserId("traveller@example.com".into()));

        let missing = Request::builder().body(()).unwrap();
        assert!(matches!(extract(missing).await, Err(NomadError::Unauthorized { .. })));

        let blank = Request::builder().header("X-User-Id", "  ").body(()).unwrap();
        assert!(extract(blank).await.is_err());
    }
}
