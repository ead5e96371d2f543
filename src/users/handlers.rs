use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::Fields,
    error::allow_only,
    response::{self, ApiResult},
    state::AppState,
    users::{
        dto::{Deleted, IdQuery, UpdateUserRequest},
        repo_types::UserProfile,
    },
};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/users", allow_only(get(list_users)))
        .route("/users/getAll", allow_only(get(list_users)))
        .route("/users/getById", allow_only(get(get_user_by_query)))
        .route(
            "/users/:id",
            allow_only(
                get(get_user)
                    .put(update_user)
                    .patch(update_user)
                    .delete(delete_user),
            ),
        )
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    let users = state.directory.list_all().await?;
    let message = if users.is_empty() {
        "No users in database".to_string()
    } else {
        format!("Found {} users", users.len())
    };
    response::ok(message, users)
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<UserProfile> {
    let user = state.directory.get_by_id(&id).await?;
    response::ok("User found", user)
}

#[instrument(skip(state, query))]
pub async fn get_user_by_query(
    State(state): State<AppState>,
    Fields(query): Fields<IdQuery>,
) -> ApiResult<UserProfile> {
    let user = state.directory.get_by_id(&query.id).await?;
    response::ok("User found", user)
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Fields(body): Fields<UpdateUserRequest>,
) -> ApiResult<UserProfile> {
    let user = state
        .directory
        .update_profile(&id, body.name, body.surname, body.phone_number)
        .await?;
    response::ok("User updated", user)
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let deleted_id = state.directory.delete(&id).await?;
    response::ok("User deleted", Deleted { deleted_id })
}
