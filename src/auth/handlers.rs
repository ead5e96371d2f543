use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoggedIn, LoginRequest, NewPasswordRequest, Registered, RegisterRequest,
            RotatedSession, SessionRequest,
        },
        extractors::Fields,
    },
    error::allow_only,
    response::{self, ApiResult},
    state::AppState,
    users::repo_types::User,
};

/// Auth endpoints under both naming schemes (`/auth/newPassword` and
/// `/auth/password`, `/auth/getBySession` and `/auth/session`).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", allow_only(post(register)))
        .route("/auth/login", allow_only(post(login)))
        .route("/auth/logout", allow_only(post(logout).delete(logout)))
        .route("/auth/refresh", allow_only(post(refresh).put(refresh)))
        .route(
            "/auth/newPassword",
            allow_only(post(new_password).put(new_password)),
        )
        .route(
            "/auth/password",
            allow_only(post(new_password).put(new_password)),
        )
        .route(
            "/auth/getBySession",
            allow_only(get(get_by_session).post(get_by_session)),
        )
        .route(
            "/auth/session",
            allow_only(get(get_by_session).post(get_by_session)),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Fields(payload): Fields<RegisterRequest>,
) -> ApiResult<Registered> {
    let out = state.accounts.register(payload).await?;
    response::created("User registered", out)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Fields(payload): Fields<LoginRequest>,
) -> ApiResult<LoggedIn> {
    let out = state
        .accounts
        .login(&payload.phone_number, &payload.password)
        .await?;
    response::ok("Logged in", out)
}

#[instrument(skip(state, payload))]
pub async fn logout(
    State(state): State<AppState>,
    Fields(payload): Fields<SessionRequest>,
) -> ApiResult<()> {
    state.accounts.logout(&payload.session).await?;
    response::done("Logged out")
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Fields(payload): Fields<SessionRequest>,
) -> ApiResult<RotatedSession> {
    let session = state.accounts.refresh_session(&payload.session).await?;
    response::ok("Session refreshed", RotatedSession { session })
}

#[instrument(skip(state, payload))]
pub async fn new_password(
    State(state): State<AppState>,
    Fields(payload): Fields<NewPasswordRequest>,
) -> ApiResult<()> {
    state.accounts.refresh_password(payload).await?;
    response::done("Password changed")
}

#[instrument(skip(state, payload))]
pub async fn get_by_session(
    State(state): State<AppState>,
    Fields(payload): Fields<SessionRequest>,
) -> ApiResult<User> {
    let user = state.accounts.get_by_session(&payload.session).await?;
    response::ok("User found by session", user)
}
