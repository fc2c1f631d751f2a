use super::validate::{validate_recipe, RecipeRequest};
use super::{insert_ingredients, load_responses, RecipeResponse};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{ingredients, recipes, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

/// Replace a recipe's fields and its whole ingredient list.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the recipe's owner", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 422, description = "Invalid recipe", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecipeRequest>,
) -> impl IntoResponse {
    let recipe = match validate_recipe(&request) {
        Ok(r) => r,
        Err(message) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let mut conn = get_conn!(pool);

    let owner: Option<Uuid> = match recipes::table
        .find(id)
        .select(recipes::user_id)
        .first(&mut conn)
    {
        Ok(owner) => owner,
        Err(diesel::NotFound) => {
            return error_response(StatusCode::NOT_FOUND, "Recipe not found")
        }
        Err(e) => return internal_error("Failed to fetch recipe", e),
    };
    if owner != Some(user.id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only edit your own recipes",
        );
    }

    let result: QueryResult<(Recipe, Option<String>)> = conn.transaction(|conn| {
        // The owner filter guards against a concurrent disown
        let updated = diesel::update(
            recipes::table
                .filter(recipes::id.eq(id))
                .filter(recipes::user_id.eq(user.id)),
        )
        .set((
            &recipe.fields,
            recipes::preparation_notes.eq(recipe.preparation_notes),
            recipes::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;
        if updated == 0 {
            return Err(diesel::NotFound);
        }

        diesel::delete(ingredients::table.filter(ingredients::recipe_id.eq(id))).execute(conn)?;
        insert_ingredients(conn, id, &recipe.ingredients)?;

        recipes::table
            .left_join(users::table)
            .filter(recipes::id.eq(id))
            .select((Recipe::as_select(), users::name.nullable()))
            .first(conn)
    });

    let row = match result {
        Ok(row) => row,
        Err(diesel::NotFound) => {
            return error_response(StatusCode::NOT_FOUND, "Recipe not found")
        }
        Err(e) => return internal_error("Failed to update recipe", e),
    };

    match load_responses(&mut conn, vec![row]) {
        Ok(mut loaded) => match loaded.pop() {
            Some(recipe) => (StatusCode::OK, Json(recipe)).into_response(),
            None => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        },
        Err(e) => internal_error("Failed to load recipe details", e),
    }
}
