use crate::api::recipes::list::ListRecipesResponse;
use crate::api::recipes::load_responses;
use crate::api::{internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{recipes, saved_recipes, users};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Recipes the caller bookmarked, most recently saved first.
#[utoipa::path(
    get,
    path = "/api/saved-recipes",
    tag = "saved",
    responses(
        (status = 200, description = "Saved recipes", body = ListRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_saved(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let ids: Vec<Uuid> = match saved_recipes::table
        .filter(saved_recipes::user_id.eq(user.id))
        .order(saved_recipes::created_at.desc())
        .select(saved_recipes::recipe_id)
        .load(&mut conn)
    {
        Ok(ids) => ids,
        Err(e) => return internal_error("Failed to list saved recipes", e),
    };

    let rows: Vec<(Recipe, Option<String>)> = match recipes::table
        .left_join(users::table)
        .filter(recipes::id.eq_any(&ids))
        .select((Recipe::as_select(), users::name.nullable()))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => return internal_error("Failed to load saved recipes", e),
    };

    // Back into bookmark order
    let rank: HashMap<Uuid, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut rows = rows;
    rows.sort_by_key(|(recipe, _)| rank.get(&recipe.id).copied().unwrap_or(usize::MAX));

    match load_responses(&mut conn, rows) {
        Ok(recipes) => (StatusCode::OK, Json(ListRecipesResponse { recipes })).into_response(),
        Err(e) => internal_error("Failed to load recipe details", e),
    }
}
