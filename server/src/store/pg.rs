use super::{RatingSummary, RecipeRef, Store, StoreError, Tx};
use crate::db::DbPool;
use crate::models::{NewRating, NewSavedRecipe, Rating, User};
use crate::schema::{comments, ingredients, ratings, recipes, saved_recipes, sessions, users};
use chrono::Utc;
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

impl From<DieselError> for StoreError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                StoreError::UniqueViolation
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::ForeignKeyViolation(info.message().to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Error carried out of `PgConnection::transaction`: either the caller's own
/// error or one raised by diesel while beginning/committing.
enum Abort<E> {
    Caller(E),
    Database(DieselError),
}

impl<E> From<DieselError> for Abort<E> {
    fn from(e: DieselError) -> Self {
        Abort::Database(e)
    }
}

impl Store for DbPool {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut pooled = self
            .get()
            .map_err(|e| E::from(StoreError::Pool(e.to_string())))?;
        let conn: &mut PgConnection = &mut pooled;

        conn.transaction::<T, Abort<E>, _>(|conn| f(conn).map_err(Abort::Caller))
            .map_err(|abort| match abort {
                Abort::Caller(e) => e,
                Abort::Database(e) => E::from(StoreError::from(e)),
            })
    }
}

impl Tx for PgConnection {
    fn lock_user(&mut self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(users::table
            .find(user_id)
            .select(User::as_select())
            .for_update()
            .first(self)
            .optional()?)
    }

    fn delete_user(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::delete(users::table.find(user_id)).execute(self)?)
    }

    fn revoke_sessions(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id))).execute(self)?)
    }

    fn find_recipe(&mut self, recipe_id: Uuid) -> Result<Option<RecipeRef>, StoreError> {
        let row: Option<(Uuid, Option<Uuid>)> = recipes::table
            .find(recipe_id)
            .select((recipes::id, recipes::user_id))
            .first(self)
            .optional()?;
        Ok(row.map(|(id, user_id)| RecipeRef { id, user_id }))
    }

    fn recipe_ids_owned_by(&mut self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(recipes::table
            .filter(recipes::user_id.eq(user_id))
            .select(recipes::id)
            .load(self)?)
    }

    fn delete_recipe(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::delete(recipes::table.find(recipe_id)).execute(self)?)
    }

    fn delete_recipe_comments(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        Ok(
            diesel::delete(comments::table.filter(comments::recipe_id.eq(recipe_id)))
                .execute(self)?,
        )
    }

    fn delete_recipe_ratings(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::delete(ratings::table.filter(ratings::recipe_id.eq(recipe_id))).execute(self)?)
    }

    fn delete_recipe_ingredients(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        Ok(
            diesel::delete(ingredients::table.filter(ingredients::recipe_id.eq(recipe_id)))
                .execute(self)?,
        )
    }

    fn delete_recipe_saves(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        Ok(
            diesel::delete(saved_recipes::table.filter(saved_recipes::recipe_id.eq(recipe_id)))
                .execute(self)?,
        )
    }

    fn delete_user_comments(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        // Replies to these comments go with them (ON DELETE CASCADE on parent_id)
        Ok(diesel::delete(comments::table.filter(comments::user_id.eq(user_id))).execute(self)?)
    }

    fn delete_user_ratings(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::delete(ratings::table.filter(ratings::user_id.eq(user_id))).execute(self)?)
    }

    fn delete_user_saves(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(
            diesel::delete(saved_recipes::table.filter(saved_recipes::user_id.eq(user_id)))
                .execute(self)?,
        )
    }

    fn disown_recipes(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::update(recipes::table.filter(recipes::user_id.eq(user_id)))
            .set(recipes::user_id.eq(None::<Uuid>))
            .execute(self)?)
    }

    fn disown_comments(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::update(comments::table.filter(comments::user_id.eq(user_id)))
            .set(comments::user_id.eq(None::<Uuid>))
            .execute(self)?)
    }

    fn disown_ratings(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::update(ratings::table.filter(ratings::user_id.eq(user_id)))
            .set(ratings::user_id.eq(None::<Uuid>))
            .execute(self)?)
    }

    fn is_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, StoreError> {
        Ok(diesel::select(diesel::dsl::exists(
            saved_recipes::table
                .filter(saved_recipes::user_id.eq(user_id))
                .filter(saved_recipes::recipe_id.eq(recipe_id)),
        ))
        .get_result(self)?)
    }

    fn insert_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<(), StoreError> {
        diesel::insert_into(saved_recipes::table)
            .values(&NewSavedRecipe { user_id, recipe_id })
            .execute(self)?;
        Ok(())
    }

    fn delete_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::delete(
            saved_recipes::table
                .filter(saved_recipes::user_id.eq(user_id))
                .filter(saved_recipes::recipe_id.eq(recipe_id)),
        )
        .execute(self)?)
    }

    fn upsert_rating(
        &mut self,
        recipe_id: Uuid,
        user_id: Uuid,
        value: i32,
    ) -> Result<Rating, StoreError> {
        Ok(diesel::insert_into(ratings::table)
            .values(&NewRating {
                recipe_id,
                user_id,
                rating: value,
            })
            .on_conflict((ratings::recipe_id, ratings::user_id))
            .do_update()
            .set((
                ratings::rating.eq(value),
                ratings::updated_at.eq(Utc::now()),
            ))
            .returning(Rating::as_returning())
            .get_result(self)?)
    }

    fn delete_rating(&mut self, recipe_id: Uuid, user_id: Uuid) -> Result<usize, StoreError> {
        Ok(diesel::delete(
            ratings::table
                .filter(ratings::recipe_id.eq(recipe_id))
                .filter(ratings::user_id.eq(user_id)),
        )
        .execute(self)?)
    }

    fn user_rating(&mut self, recipe_id: Uuid, user_id: Uuid) -> Result<Option<i32>, StoreError> {
        Ok(ratings::table
            .filter(ratings::recipe_id.eq(recipe_id))
            .filter(ratings::user_id.eq(user_id))
            .select(ratings::rating)
            .first(self)
            .optional()?)
    }

    fn rating_summary(&mut self, recipe_id: Uuid) -> Result<RatingSummary, StoreError> {
        let (total, count): (Option<i64>, i64) = ratings::table
            .filter(ratings::recipe_id.eq(recipe_id))
            .select((sum(ratings::rating), count_star()))
            .first(self)?;
        Ok(RatingSummary {
            total: total.unwrap_or(0),
            count,
        })
    }
}
