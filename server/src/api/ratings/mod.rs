pub mod public;
pub mod rate;
pub mod show;
pub mod unrate;

use crate::api::{error_response, internal_error};
use crate::services::ratings::RatingError;
use crate::store::RatingSummary;
use crate::AppState;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipes/{id}/rating",
            get(show::show_rating)
                .post(rate::rate_recipe)
                .delete(unrate::unrate_recipe),
        )
        .route("/api/recipes/{id}/rating/public", get(public::public_rating))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatingStatsResponse {
    /// Mean of all ratings, one decimal, 0 when unrated
    pub average_rating: f64,
    pub ratings_count: i64,
    /// The caller's own rating, when there is a caller and they rated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<i32>,
    /// Present on the public endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_owner_id: Option<Uuid>,
}

impl RatingStatsResponse {
    fn from_summary(summary: &RatingSummary) -> Self {
        Self {
            average_rating: summary.average(),
            ratings_count: summary.count,
            user_rating: None,
            recipe_owner_id: None,
        }
    }
}

fn rating_error_response(err: RatingError) -> Response {
    match err {
        RatingError::RecipeNotFound => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        RatingError::OwnRecipe => {
            error_response(StatusCode::FORBIDDEN, "You cannot rate your own recipe.")
        }
        RatingError::OutOfRange => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The rating must be between 1 and 5.",
        ),
        RatingError::NotFound => {
            error_response(StatusCode::NOT_FOUND, "You have not rated this recipe.")
        }
        RatingError::Store(e) => internal_error("Rating operation failed", e),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        show::show_rating,
        public::public_rating,
        rate::rate_recipe,
        unrate::unrate_recipe,
    ),
    components(schemas(RatingStatsResponse, rate::RateRequest))
)]
pub struct ApiDoc;
