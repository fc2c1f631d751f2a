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
    put,
    path = "/api/recipes/{id}/saved",
    tag = "saved",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Recipe saved", body = SavedStatusResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 409, description = "Already saved", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_recipe(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match bookmarks::save(pool.as_ref(), user.id, recipe_id) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(SavedStatusResponse { saved: true }),
        )
            .into_response(),
        Err(e) => bookmark_error_response(e),
    }
}
