use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request, Uri, header::COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::{error::AppError, routes::extract::wants_json, state::SharedState};

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "bingo_session";
/// Header alternative to the session cookie.
pub const SESSION_HEADER: &str = "x-session-token";

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// `Set-Cookie` value storing `token`.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value expiring the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Find a session token in the cookie, the `x-session-token` header or the `token` query parameter.
pub fn session_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_owned());

    from_cookie
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        })
        .or_else(|| {
            Query::<TokenQuery>::try_from_uri(uri)
                .ok()
                .and_then(|Query(query)| query.token)
        })
        .filter(|token| !token.is_empty())
}

/// Resolve the caller's session into the request extensions, or turn them away:
/// browsers are sent back to `/`, JSON clients get a 401.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let session = session_token(req.headers(), req.uri())
        .and_then(|token| state.sessions().resolve(&token));

    match session {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => {
            debug!(path = %req.uri().path(), "request without a valid session");
            if wants_json(req.headers()) {
                AppError::Unauthorized("login required".into()).into_response()
            } else {
                Redirect::to("/").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn token_is_read_from_cookie_first() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; bingo_session=abc123"),
        );
        headers.insert(SESSION_HEADER, HeaderValue::from_static("other"));
        let uri: Uri = "/ws?token=query".parse().unwrap();
        assert_eq!(session_token(&headers, &uri).as_deref(), Some("abc123"));
    }

    #[test]
    fn header_and_query_are_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("from-header"));
        let uri: Uri = "/ws".parse().unwrap();
        assert_eq!(session_token(&headers, &uri).as_deref(), Some("from-header"));

        let uri: Uri = "/ws?token=from-query".parse().unwrap();
        assert_eq!(
            session_token(&HeaderMap::new(), &uri).as_deref(),
            Some("from-query")
        );
        assert!(session_token(&HeaderMap::new(), &"/ws".parse().unwrap()).is_none());
    }
}
