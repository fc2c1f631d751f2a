//! Transactional datastore seam for the operations whose invariants matter:
//! account deletion, bookmarking and rating.
//!
//! The production backend is the diesel connection pool (`pg`). Tests run the
//! same services against `memory::MemoryStore`, which enforces the foreign-key
//! and uniqueness constraints of the migrations and can fail on demand.

#[cfg(test)]
pub mod memory;
mod pg;

use crate::models::{Rating, User};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("connection pool error: {0}")]
    Pool(String),
}

/// Owner reference of a recipe, as needed for authorization checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecipeRef {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
}

/// Aggregate of all ratings on one recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingSummary {
    pub total: i64,
    pub count: i64,
}

impl RatingSummary {
    /// Mean rating rounded to one decimal, 0.0 when unrated.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let mean = self.total as f64 / self.count as f64;
        (mean * 10.0).round() / 10.0
    }
}

/// A datastore that runs a unit of work atomically.
///
/// `f` sees a [`Tx`] whose writes are committed only when it returns `Ok`.
/// Any `Err`, whether produced by `f` or by the datastore, rolls everything back.
pub trait Store {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T, E>,
        E: From<StoreError>;
}

/// Row-level operations available inside a transaction.
///
/// Counts returned by deletes and updates are affected row counts.
pub trait Tx {
    /// Load a user and hold a row lock on it until the transaction ends.
    fn lock_user(&mut self, user_id: Uuid) -> Result<Option<User>, StoreError>;
    fn delete_user(&mut self, user_id: Uuid) -> Result<usize, StoreError>;
    fn revoke_sessions(&mut self, user_id: Uuid) -> Result<usize, StoreError>;

    fn find_recipe(&mut self, recipe_id: Uuid) -> Result<Option<RecipeRef>, StoreError>;
    fn recipe_ids_owned_by(&mut self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    fn delete_recipe(&mut self, recipe_id: Uuid) -> Result<usize, StoreError>;
    fn delete_recipe_comments(&mut self, recipe_id: Uuid) -> Result<usize, StoreError>;
    fn delete_recipe_ratings(&mut self, recipe_id: Uuid) -> Result<usize, StoreError>;
    fn delete_recipe_ingredients(&mut self, recipe_id: Uuid) -> Result<usize, StoreError>;
    fn delete_recipe_saves(&mut self, recipe_id: Uuid) -> Result<usize, StoreError>;

    fn delete_user_comments(&mut self, user_id: Uuid) -> Result<usize, StoreError>;
    fn delete_user_ratings(&mut self, user_id: Uuid) -> Result<usize, StoreError>;
    fn delete_user_saves(&mut self, user_id: Uuid) -> Result<usize, StoreError>;

    fn disown_recipes(&mut self, user_id: Uuid) -> Result<usize, StoreError>;
    fn disown_comments(&mut self, user_id: Uuid) -> Result<usize, StoreError>;
    fn disown_ratings(&mut self, user_id: Uuid) -> Result<usize, StoreError>;

    fn is_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, StoreError>;
    /// Fails with [`StoreError::UniqueViolation`] when the pair already exists.
    fn insert_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<(), StoreError>;
    fn delete_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<usize, StoreError>;

    /// Insert or overwrite the (recipe, user) rating in one statement.
    fn upsert_rating(
        &mut self,
        recipe_id: Uuid,
        user_id: Uuid,
        value: i32,
    ) -> Result<Rating, StoreError>;
    fn delete_rating(&mut self, recipe_id: Uuid, user_id: Uuid) -> Result<usize, StoreError>;
    fn user_rating(&mut self, recipe_id: Uuid, user_id: Uuid) -> Result<Option<i32>, StoreError>;
    fn rating_summary(&mut self, recipe_id: Uuid) -> Result<RatingSummary, StoreError>;
}
