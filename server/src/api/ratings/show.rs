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
    get,
    path = "/api/recipes/{id}/rating",
    tag = "ratings",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Caller's rating and the recipe aggregate", body = RatingStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn show_rating(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match ratings::show(pool.as_ref(), user.id, recipe_id) {
        Ok(view) => {
            let mut body = RatingStatsResponse::from_summary(&view.summary);
            body.user_rating = view.user_rating;
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => rating_error_response(e),
    }
}
