use super::insert_ingredients;
use super::validate::{validate_recipe, RecipeRequest};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::NewRecipe;
use crate::schema::recipes;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateRecipeResponse {
    pub id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = CreateRecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Invalid recipe", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(request): Json<RecipeRequest>,
) -> impl IntoResponse {
    let recipe = match validate_recipe(&request) {
        Ok(r) => r,
        Err(message) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let mut conn = get_conn!(pool);

    // Recipe and ingredients land together or not at all
    let result: QueryResult<Uuid> = conn.transaction(|conn| {
        let recipe_id: Uuid = diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                user_id: user.id,
                fields: recipe.fields.clone(),
                preparation_notes: recipe.preparation_notes,
            })
            .returning(recipes::id)
            .get_result(conn)?;

        insert_ingredients(conn, recipe_id, &recipe.ingredients)?;
        Ok(recipe_id)
    });

    match result {
        Ok(recipe_id) => {
            tracing::info!(%recipe_id, user_id = %user.id, "recipe created");
            (
                StatusCode::CREATED,
                Json(CreateRecipeResponse { id: recipe_id }),
            )
                .into_response()
        }
        Err(e) => internal_error("Failed to create recipe", e),
    }
}
