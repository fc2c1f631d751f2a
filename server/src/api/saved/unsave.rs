use super::bookmark_error_response;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::services::bookmarks;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/saved",
    tag = "saved",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Bookmark removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Not saved", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unsave_recipe(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match bookmarks::unsave(pool.as_ref(), user.id, recipe_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => bookmark_error_response(e),
    }
}
