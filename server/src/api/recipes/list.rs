use super::{load_responses, RecipeResponse};
use crate::api::{internal_error, ErrorResponse};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{recipes, users};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Number of recipes to return (default: 20, max: 100)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Newest recipes first. Public.
#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Recipes, newest first", body = ListRecipesResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let rows: Vec<(Recipe, Option<String>)> = match recipes::table
        .left_join(users::table)
        .order(recipes::created_at.desc())
        .limit(clamp_limit(params.limit))
        .select((Recipe::as_select(), users::name.nullable()))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => return internal_error("Failed to list recipes", e),
    };

    match load_responses(&mut conn, rows) {
        Ok(recipes) => (StatusCode::OK, Json(ListRecipesResponse { recipes })).into_response(),
        Err(e) => internal_error("Failed to load recipe details", e),
    }
}
