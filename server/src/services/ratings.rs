use crate::models::Rating;
use crate::store::{RatingSummary, Store, StoreError};
use thiserror::Error;
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("recipe not found")]
    RecipeNotFound,

    #[error("you cannot rate your own recipe")]
    OwnRecipe,

    #[error("rating must be between 1 and 5")]
    OutOfRange,

    #[error("rating not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingOutcome {
    pub rating: Rating,
    pub summary: RatingSummary,
}

/// The caller's own rating next to the recipe aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingView {
    pub user_rating: Option<i32>,
    pub summary: RatingSummary,
}

/// Public aggregate, with the owner so clients can hide the rating widget.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicRating {
    pub recipe_owner_id: Option<Uuid>,
    pub summary: RatingSummary,
}

/// Create or replace the caller's rating in one upsert.
pub fn rate<S: Store>(
    store: &S,
    user_id: Uuid,
    recipe_id: Uuid,
    value: i32,
) -> Result<RatingOutcome, RatingError> {
    store.transaction(|tx| {
        let recipe = tx
            .find_recipe(recipe_id)?
            .ok_or(RatingError::RecipeNotFound)?;
        if recipe.user_id == Some(user_id) {
            return Err(RatingError::OwnRecipe);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(RatingError::OutOfRange);
        }

        let rating = tx.upsert_rating(recipe_id, user_id, value)?;
        let summary = tx.rating_summary(recipe_id)?;
        Ok(RatingOutcome { rating, summary })
    })
}

pub fn unrate<S: Store>(
    store: &S,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<RatingSummary, RatingError> {
    store.transaction(|tx| {
        tx.find_recipe(recipe_id)?
            .ok_or(RatingError::RecipeNotFound)?;
        if tx.delete_rating(recipe_id, user_id)? == 0 {
            return Err(RatingError::NotFound);
        }
        Ok(tx.rating_summary(recipe_id)?)
    })
}

pub fn show<S: Store>(store: &S, user_id: Uuid, recipe_id: Uuid) -> Result<RatingView, RatingError> {
    store.transaction(|tx| {
        tx.find_recipe(recipe_id)?
            .ok_or(RatingError::RecipeNotFound)?;
        Ok(RatingView {
            user_rating: tx.user_rating(recipe_id, user_id)?,
            summary: tx.rating_summary(recipe_id)?,
        })
    })
}

pub fn public_summary<S: Store>(store: &S, recipe_id: Uuid) -> Result<PublicRating, RatingError> {
    store.transaction(|tx| {
        let recipe = tx
            .find_recipe(recipe_id)?
            .ok_or(RatingError::RecipeNotFound)?;
        Ok(PublicRating {
            recipe_owner_id: recipe.user_id,
            summary: tx.rating_summary(recipe_id)?,
        })
    })
}
