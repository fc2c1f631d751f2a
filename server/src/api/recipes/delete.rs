use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::services::recipes::{self, RecipeError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

/// Delete a recipe together with its ingredients, comments, ratings and
/// every user's bookmark of it.
#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's owner", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match recipes::delete_recipe(pool.as_ref(), user.id, id) {
        Ok(purge) => {
            tracing::info!(recipe_id = %id, user_id = %user.id, ?purge, "recipe deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(RecipeError::NotFound) => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(RecipeError::Forbidden) => error_response(
            StatusCode::FORBIDDEN,
            "You can only delete your own recipes",
        ),
        Err(RecipeError::Store(e)) => internal_error("Failed to delete recipe", e),
    }
}
