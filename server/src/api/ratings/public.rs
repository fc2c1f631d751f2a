use super::{rating_error_response, RatingStatsResponse};
use crate::api::ErrorResponse;
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
    path = "/api/recipes/{id}/rating/public",
    tag = "ratings",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe aggregate and owner", body = RatingStatsResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn public_rating(
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    match ratings::public_summary(pool.as_ref(), recipe_id) {
        Ok(public) => {
            let mut body = RatingStatsResponse::from_summary(&public.summary);
            body.recipe_owner_id = public.recipe_owner_id;
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => rating_error_response(e),
    }
}
