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
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RateRequest {
    /// 1 to 5
    pub rating: i32,
}

/// Create or replace the caller's rating.
#[utoipa::path(
    post,
    path = "/api/recipes/{id}/rating",
    tag = "ratings",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RateRequest,
    responses(
        (status = 200, description = "Rating saved", body = RatingStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Own recipe", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 422, description = "Rating out of range", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn rate_recipe(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
    Json(req): Json<RateRequest>,
) -> impl IntoResponse {
    match ratings::rate(pool.as_ref(), user.id, recipe_id, req.rating) {
        Ok(outcome) => {
            let mut body = RatingStatsResponse::from_summary(&outcome.summary);
            body.user_rating = Some(outcome.rating.rating);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => rating_error_response(e),
    }
}
