use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
    routing::post,
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::auth::{AuthRequest, AuthResponse},
    error::AppError,
    routes::{
        extract::{JsonOrForm, wants_json},
        session::{expired_session_cookie, session_cookie},
    },
    services::auth_service,
    state::{SharedState, session::Session},
};

/// Public signup/login route.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/auth", post(authenticate))
}

/// Routes that need an existing session.
pub fn session_router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/logout", post(logout))
}

#[utoipa::path(
    post,
    path = "/auth",
    tag = "auth",
    request_body(content = AuthRequest, description = "JSON or urlencoded form credentials"),
    responses(
        (status = 200, description = "Logged in or signed up", body = AuthResponse),
        (status = 303, description = "Form clients are redirected to /bingo, or to /?error=<code> on failure"),
        (status = 400, description = "Invalid username or password format"),
        (status = 401, description = "Wrong password or username already taken"),
        (status = 503, description = "Storage unavailable or phrase pool too small")
    )
)]
/// Sign up or log in, provisioning a board for new users.
pub async fn authenticate(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<JsonOrForm<AuthRequest>, AppError>,
) -> Response {
    let json = wants_json(&headers);

    let result = async {
        let JsonOrForm(request) = payload?;
        request.validate()?;
        let username = request.username.clone();
        auth_service::authenticate(&state, request)
            .await
            .map_err(|err| {
                err.log_failure("auth", &username);
                AppError::from(err)
            })
    }
    .await;

    match result {
        Ok(outcome) => {
            let cookie = [(SET_COOKIE, session_cookie(&outcome.session.token))];
            if json {
                let body = AuthResponse {
                    username: outcome.session.username,
                    token: outcome.session.token,
                    created: outcome.created,
                };
                (cookie, Json(body)).into_response()
            } else {
                (cookie, Redirect::to("/bingo")).into_response()
            }
        }
        Err(err) if json => err.into_response(),
        Err(err) => Redirect::to(&format!("/?error={}", err.code())).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses((status = 303, description = "Session revoked, redirected to /"))
)]
/// Revoke the caller's session and clear the cookie.
pub async fn logout(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Response {
    state.sessions().revoke(&session.token);
    info!(username = %session.username, "logged out");
    ([(SET_COOKIE, expired_session_cookie())], Redirect::to("/")).into_response()
}
