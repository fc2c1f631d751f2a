pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod mine;
pub mod update;
pub mod validate;

use crate::models::{Ingredient, NewIngredient, Recipe};
use crate::schema::{ingredients, ratings};
use crate::store::RatingSummary;
use crate::AppState;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipes",
            get(list::list_recipes).post(create::create_recipe),
        )
        .route(
            "/api/recipes/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route("/api/my-recipes", get(mine::my_recipes))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub measurement: String,
    pub substitution_option: Option<String>,
    pub allergen_info: Option<String>,
}

impl From<Ingredient> for IngredientResponse {
    fn from(i: Ingredient) -> Self {
        Self {
            id: i.id,
            name: i.name,
            measurement: i.measurement,
            substitution_option: i.substitution_option,
            allergen_info: i.allergen_info,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    /// None once the author deleted their account but kept their content
    pub user_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub title: String,
    pub short_description: String,
    pub cuisine_type: String,
    pub category: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub total_time: i32,
    pub serving_size: i32,
    pub preparation_notes: Option<String>,
    pub ingredients: Vec<IngredientResponse>,
    pub average_rating: f64,
    pub ratings_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attach ingredients (in display order) and rating aggregates to recipe
/// rows, keeping the row order. Rows come from
/// `recipes.left_join(users).select((Recipe::as_select(), users::name.nullable()))`.
pub(crate) fn load_responses(
    conn: &mut PgConnection,
    rows: Vec<(Recipe, Option<String>)>,
) -> QueryResult<Vec<RecipeResponse>> {
    let (recipe_rows, authors): (Vec<Recipe>, Vec<Option<String>>) = rows.into_iter().unzip();
    let ids: Vec<Uuid> = recipe_rows.iter().map(|r| r.id).collect();

    let ingredients: Vec<Ingredient> = ingredients::table
        .filter(ingredients::recipe_id.eq_any(&ids))
        .select(Ingredient::as_select())
        .order(ingredients::position.asc())
        .load(conn)?;

    let summaries: HashMap<Uuid, RatingSummary> = ratings::table
        .filter(ratings::recipe_id.eq_any(&ids))
        .group_by(ratings::recipe_id)
        .select((ratings::recipe_id, sum(ratings::rating), count_star()))
        .load::<(Uuid, Option<i64>, i64)>(conn)?
        .into_iter()
        .map(|(id, total, count)| {
            (
                id,
                RatingSummary {
                    total: total.unwrap_or(0),
                    count,
                },
            )
        })
        .collect();

    Ok(assemble(recipe_rows, authors, ingredients, &summaries))
}

/// Pair each recipe with its author, its own ingredients and its rating
/// aggregate. Ingredients may arrive in any recipe order.
fn assemble(
    recipe_rows: Vec<Recipe>,
    authors: Vec<Option<String>>,
    ingredients: Vec<Ingredient>,
    summaries: &HashMap<Uuid, RatingSummary>,
) -> Vec<RecipeResponse> {
    let grouped = ingredients.grouped_by(&recipe_rows);
    recipe_rows
        .into_iter()
        .zip(authors)
        .zip(grouped)
        .map(|((recipe, author_name), ingredients)| {
            let summary = summaries.get(&recipe.id).copied().unwrap_or_default();
            RecipeResponse {
                id: recipe.id,
                user_id: recipe.user_id,
                author_name,
                title: recipe.title,
                short_description: recipe.short_description,
                cuisine_type: recipe.cuisine_type,
                category: recipe.category,
                prep_time: recipe.prep_time,
                cook_time: recipe.cook_time,
                total_time: recipe.total_time,
                serving_size: recipe.serving_size,
                preparation_notes: recipe.preparation_notes,
                ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
                average_rating: summary.average(),
                ratings_count: summary.count,
                created_at: recipe.created_at,
                updated_at: recipe.updated_at,
            }
        })
        .collect()
}

/// Insert ingredients for a recipe, numbering them in request order.
pub(crate) fn insert_ingredients(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    items: &[validate::ValidIngredient<'_>],
) -> QueryResult<usize> {
    let rows: Vec<NewIngredient> = items
        .iter()
        .enumerate()
        .map(|(position, i)| NewIngredient {
            recipe_id,
            name: i.name,
            measurement: i.measurement,
            substitution_option: i.substitution_option,
            allergen_info: i.allergen_info,
            position: position as i32,
        })
        .collect();
    diesel::insert_into(ingredients::table)
        .values(&rows)
        .execute(conn)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        get::get_recipe,
        create::create_recipe,
        update::update_recipe,
        delete::delete_recipe,
        mine::my_recipes,
    ),
    components(schemas(
        RecipeResponse,
        IngredientResponse,
        validate::RecipeRequest,
        validate::IngredientRequest,
        list::ListRecipesResponse,
        create::CreateRecipeResponse,
    ))
)]
pub struct ApiDoc;
