//! Saved-recipe (bookmark) state changes.
//!
//! The `(user_id, recipe_id)` primary key is the final arbiter of whether a
//! bookmark exists. Every write locks the user row first, so toggles, saves
//! and unsaves from the same account run one after the other and a toggle
//! never meets another request's half-finished insert.

use crate::store::{Store, StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("recipe not found")]
    RecipeNotFound,

    #[error("recipe is already saved")]
    AlreadySaved,

    #[error("recipe is not saved")]
    NotSaved,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Flip the saved state. Returns the new state: `true` when now saved.
pub fn toggle<S: Store>(store: &S, user_id: Uuid, recipe_id: Uuid) -> Result<bool, BookmarkError> {
    store.transaction(|tx| {
        // Serializes concurrent toggles by the same user
        tx.lock_user(user_id)?;
        tx.find_recipe(recipe_id)?
            .ok_or(BookmarkError::RecipeNotFound)?;

        if tx.delete_saved(user_id, recipe_id)? > 0 {
            return Ok(false);
        }
        tx.insert_saved(user_id, recipe_id)?;
        Ok(true)
    })
}

/// Save a recipe. A concurrent save that commits first wins and this call
/// reports [`BookmarkError::AlreadySaved`].
pub fn save<S: Store>(store: &S, user_id: Uuid, recipe_id: Uuid) -> Result<(), BookmarkError> {
    store.transaction(|tx| {
        tx.lock_user(user_id)?;
        tx.find_recipe(recipe_id)?
            .ok_or(BookmarkError::RecipeNotFound)?;
        tx.insert_saved(user_id, recipe_id).map_err(|e| match e {
            StoreError::UniqueViolation => BookmarkError::AlreadySaved,
            other => BookmarkError::Store(other),
        })
    })
}

pub fn unsave<S: Store>(store: &S, user_id: Uuid, recipe_id: Uuid) -> Result<(), BookmarkError> {
    store.transaction(|tx| {
        tx.lock_user(user_id)?;
        tx.find_recipe(recipe_id)?
            .ok_or(BookmarkError::RecipeNotFound)?;
        match tx.delete_saved(user_id, recipe_id)? {
            0 => Err(BookmarkError::NotSaved),
            _ => Ok(()),
        }
    })
}

pub fn is_saved<S: Store>(store: &S, user_id: Uuid, recipe_id: Uuid) -> Result<bool, BookmarkError> {
    store.transaction(|tx| {
        tx.find_recipe(recipe_id)?
            .ok_or(BookmarkError::RecipeNotFound)?;
        Ok(tx.is_saved(user_id, recipe_id)?)
    })
}
