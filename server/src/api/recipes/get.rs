use super::{load_responses, RecipeResponse};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{recipes, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let row: (Recipe, Option<String>) = match recipes::table
        .left_join(users::table)
        .filter(recipes::id.eq(id))
        .select((Recipe::as_select(), users::name.nullable()))
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(diesel::NotFound) => {
            return error_response(StatusCode::NOT_FOUND, "Recipe not found")
        }
        Err(e) => return internal_error("Failed to fetch recipe", e),
    };

    match load_responses(&mut conn, vec![row]) {
        Ok(mut loaded) => match loaded.pop() {
            Some(recipe) => (StatusCode::OK, Json(recipe)).into_response(),
            None => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        },
        Err(e) => internal_error("Failed to load recipe details", e),
    }
}
