use crate::store::{Store, StoreError, Tx};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("recipe not found")]
    NotFound,

    #[error("recipe belongs to another user")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rows removed along with one recipe.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RecipePurge {
    pub comments: usize,
    pub ratings: usize,
    pub ingredients: usize,
    pub saves: usize,
}

/// Remove a recipe and every row that references it. Children go first so the
/// recipe row is never deleted while something still points at it.
pub fn purge_recipe(tx: &mut dyn Tx, recipe_id: Uuid) -> Result<RecipePurge, StoreError> {
    let purge = RecipePurge {
        comments: tx.delete_recipe_comments(recipe_id)?,
        ratings: tx.delete_recipe_ratings(recipe_id)?,
        ingredients: tx.delete_recipe_ingredients(recipe_id)?,
        saves: tx.delete_recipe_saves(recipe_id)?,
    };
    tx.delete_recipe(recipe_id)?;
    Ok(purge)
}

/// Owner-initiated recipe deletion.
pub fn delete_recipe<S: Store>(
    store: &S,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<RecipePurge, RecipeError> {
    store.transaction(|tx| {
        let recipe = tx.find_recipe(recipe_id)?.ok_or(RecipeError::NotFound)?;
        if recipe.user_id != Some(user_id) {
            return Err(RecipeError::Forbidden);
        }
        Ok(purge_recipe(tx, recipe_id)?)
    })
}
