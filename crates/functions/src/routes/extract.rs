//! Request extractors that reject with `AppError` so malformed input gets the
//! same `{ "error": ... }` body as every other failure.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Form body extractor.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct ApiForm<T>(pub T);

/// Extractor for scheduled jobs: requires `Authorization: Bearer <cron secret>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn nightly(_: CronAuth, State(state): State<AppState>) -> Result<Json<...>> {
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let authorized =
            bearer_token(&parts.headers).is_some_and(|token| state.cron_secret_matches(token));
        if authorized {
            Ok(Self)
        } else {
            tracing::warn!(path = %parts.uri.path(), "Rejected scheduled job call");
            Err(AppError::Unauthorized)
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cr3t"));
        assert_eq!(bearer_token(&headers), Some("s3cr3t"));
    }
}
