use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::{
        HeaderMap,
        header::{ACCEPT, CONTENT_TYPE},
    },
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Body extractor accepting either `application/json` or a urlencoded form.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json_content(req.headers()) {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
            Ok(Self(value))
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: axum::http::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn is_json_content(headers: &HeaderMap) -> bool {
    header_str(headers, CONTENT_TYPE).is_some_and(|value| value.starts_with("application/json"))
}

/// True for programmatic clients: JSON bodies or an `Accept` asking for JSON.
///
/// Everyone else is treated as a browser form and gets redirects.
pub fn wants_json(headers: &HeaderMap) -> bool {
    is_json_content(headers)
        || header_str(headers, ACCEPT).is_some_and(|value| value.contains("application/json"))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn browsers_do_not_want_json() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,*/*;q=0.8"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        assert!(!wants_json(&headers));
    }

    #[test]
    fn json_body_or_accept_header_wants_json() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        assert!(wants_json(&headers));

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        assert!(wants_json(&headers));
    }
}
