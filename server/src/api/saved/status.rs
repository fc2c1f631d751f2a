use super::{bookmark_error_response, SavedStatusResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::services::bookmarks;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/saved",
    tag = "saved",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Whether the caller saved the recipe", body = SavedStatusResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn saved_status(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match bookmarks::is_saved(pool.as_ref(), user.id, recipe_id) {
        Ok(saved) => (StatusCode::OK, Json(SavedStatusResponse { saved })).into_response(),
        Err(e) => bookmark_error_response(e),
    }
}
