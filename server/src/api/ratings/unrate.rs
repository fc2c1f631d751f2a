use super::{rating_error_response, RatingStatsResponse};
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::services::ratings;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/rating",
    tag = "ratings",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Rating removed, remaining aggregate", body = RatingStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe or rating not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unrate_recipe(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match ratings::unrate(pool.as_ref(), user.id, recipe_id) {
        Ok(summary) => (
            StatusCode::OK,
            Json(RatingStatsResponse::from_summary(&summary)),
        )
            .into_response(),
        Err(e) => rating_error_response(e),
    }
}
