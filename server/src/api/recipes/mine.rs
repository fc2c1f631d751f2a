use super::list::ListRecipesResponse;
use super::load_responses;
use crate::api::{internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{recipes, users};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/my-recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "The caller's recipes, newest first", body = ListRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_recipes(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let rows: Vec<(Recipe, Option<String>)> = match recipes::table
        .left_join(users::table)
        .filter(recipes::user_id.eq(user.id))
        .order(recipes::created_at.desc())
        .select((Recipe::as_select(), users::name.nullable()))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => return internal_error("Failed to list user recipes", e),
    };

    match load_responses(&mut conn, rows) {
        Ok(recipes) => (StatusCode::OK, Json(ListRecipesResponse { recipes })).into_response(),
        Err(e) => internal_error("Failed to load recipe details", e),
    }
}
