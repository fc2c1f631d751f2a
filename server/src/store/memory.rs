//! In-memory store for tests.
//!
//! Transactions run concurrently. Each one works on its own copy of the
//! tables and records its writes, which are replayed onto the latest
//! committed state at commit. Row locks behave like PostgreSQL's: `lock_user`
//! blocks while another transaction holds the same user, and inserting a
//! bookmark or rating waits for any other transaction writing the same key,
//! then sees its committed result. Reads after a lock see the latest commits,
//! as under READ COMMITTED.
//!
//! The referential and uniqueness rules of the migrations are checked on every
//! write and again at commit, so a service that deletes in the wrong order or
//! races on a unique key fails here as it would against the database.

use super::{RatingSummary, RecipeRef, Store, StoreError, Tx};
use crate::models::{Comment, Ingredient, Rating, Recipe, SavedRecipe, Session, User};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub users: Vec<User>,
    pub sessions: Vec<Session>,
    pub recipes: Vec<Recipe>,
    pub ingredients: Vec<Ingredient>,
    pub comments: Vec<Comment>,
    pub ratings: Vec<Rating>,
    pub saved: Vec<SavedRecipe>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Committed state.
    tables: Mutex<Tables>,
    locks: RowLocks,
    next_tx: AtomicU64,
    /// Fail the N-th write (0-based) of every following transaction.
    fail_at_write: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }

    pub fn fail_at_write(&self, n: Option<usize>) {
        *self.fail_at_write.lock().unwrap() = n;
    }

    pub fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut self.tables.lock().unwrap())
    }

    pub fn add_user(&self, name: &str, password_hash: &str) -> Uuid {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = user.id;
        self.with_tables(|t| {
            t.sessions.push(Session {
                id: Uuid::new_v4(),
                user_id: id,
                token_hash: format!("session-of-{}", id),
                expires_at: now + Duration::days(30),
                created_at: now,
            });
            t.users.push(user);
        });
        id
    }

    pub fn add_recipe(&self, owner: Uuid, title: &str, ingredient_count: usize) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.with_tables(|t| {
            t.recipes.push(Recipe {
                id,
                user_id: Some(owner),
                title: title.to_string(),
                short_description: format!("{} described at length", title),
                cuisine_type: "Italian".to_string(),
                category: "Dinner".to_string(),
                prep_time: 10,
                cook_time: 20,
                total_time: 30,
                serving_size: 4,
                preparation_notes: Some("Mix everything, then bake it well.".to_string()),
                created_at: now,
                updated_at: now,
            });
            for position in 0..ingredient_count {
                t.ingredients.push(Ingredient {
                    id: Uuid::new_v4(),
                    recipe_id: id,
                    name: format!("ingredient {}", position),
                    measurement: "1 cup".to_string(),
                    substitution_option: None,
                    allergen_info: None,
                    position: position as i32,
                });
            }
        });
        id
    }

    pub fn add_comment(&self, recipe_id: Uuid, author: Uuid, parent_id: Option<Uuid>) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.with_tables(|t| {
            t.comments.push(Comment {
                id,
                recipe_id,
                user_id: Some(author),
                parent_id,
                body: "Lovely!".to_string(),
                created_at: now,
                updated_at: now,
            })
        });
        id
    }

    pub fn add_rating(&self, recipe_id: Uuid, author: Uuid, value: i32) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.with_tables(|t| {
            t.ratings.push(Rating {
                id,
                recipe_id,
                user_id: Some(author),
                rating: value,
                created_at: now,
                updated_at: now,
            })
        });
        id
    }

    pub fn add_saved(&self, user_id: Uuid, recipe_id: Uuid) {
        self.with_tables(|t| {
            t.saved.push(SavedRecipe {
                user_id,
                recipe_id,
                created_at: Utc::now(),
            })
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    User(Uuid),
    Saved(Uuid, Uuid),
    Rating(Uuid, Uuid),
}

/// Row locks held until the owning transaction ends.
#[derive(Debug, Default)]
struct RowLocks {
    held: Mutex<HashMap<RowKey, u64>>,
    released: Condvar,
}

impl RowLocks {
    fn acquire(&self, key: RowKey, owner: u64) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.get(&key).is_some_and(|holder| *holder != owner) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key, owner);
    }

    fn release_all(&self, owner: u64) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, holder| *holder != owner);
        self.released.notify_all();
    }
}

impl Store for MemoryStore {
    fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn Tx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut tx = MemoryTx::begin(self);
        let out = f(&mut tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// A recorded write, replayable onto newer committed state.
#[derive(Debug, Clone)]
enum Op {
    DeleteUser(Uuid),
    RevokeSessions(Uuid),
    DeleteRecipe(Uuid),
    DeleteRecipeComments(Uuid),
    DeleteRecipeRatings(Uuid),
    DeleteRecipeIngredients(Uuid),
    DeleteRecipeSaves(Uuid),
    DeleteUserComments(Uuid),
    DeleteUserRatings(Uuid),
    DeleteUserSaves(Uuid),
    DisownRecipes(Uuid),
    DisownComments(Uuid),
    DisownRatings(Uuid),
    InsertSaved {
        user_id: Uuid,
        recipe_id: Uuid,
        at: DateTime<Utc>,
    },
    DeleteSaved {
        user_id: Uuid,
        recipe_id: Uuid,
    },
    UpsertRating {
        id: Uuid,
        recipe_id: Uuid,
        user_id: Uuid,
        value: i32,
        at: DateTime<Utc>,
    },
    DeleteRating {
        recipe_id: Uuid,
        user_id: Uuid,
    },
}

impl Op {
    /// Apply to `t` under the constraints of the migrations. Returns the
    /// affected row count.
    fn apply(&self, t: &mut Tables) -> Result<usize, StoreError> {
        match *self {
            Op::DeleteUser(user_id) => {
                let referenced = t.sessions.iter().any(|s| s.user_id == user_id)
                    || t.saved.iter().any(|s| s.user_id == user_id);
                if referenced {
                    return Err(StoreError::ForeignKeyViolation(
                        "users still referenced by sessions or saved_recipes".to_string(),
                    ));
                }
                // recipes/comments/ratings use ON DELETE SET NULL
                disown(t.recipes.iter_mut().map(|r| &mut r.user_id), user_id);
                disown(t.comments.iter_mut().map(|c| &mut c.user_id), user_id);
                disown(t.ratings.iter_mut().map(|r| &mut r.user_id), user_id);
                Ok(retain_count(&mut t.users, |u| u.id != user_id))
            }
            Op::RevokeSessions(user_id) => {
                Ok(retain_count(&mut t.sessions, |s| s.user_id != user_id))
            }
            Op::DeleteRecipe(recipe_id) => {
                let referenced = t.ingredients.iter().any(|i| i.recipe_id == recipe_id)
                    || t.comments.iter().any(|c| c.recipe_id == recipe_id)
                    || t.ratings.iter().any(|r| r.recipe_id == recipe_id)
                    || t.saved.iter().any(|s| s.recipe_id == recipe_id);
                if referenced {
                    return Err(StoreError::ForeignKeyViolation(
                        "recipes still referenced by child rows".to_string(),
                    ));
                }
                Ok(retain_count(&mut t.recipes, |r| r.id != recipe_id))
            }
            Op::DeleteRecipeComments(recipe_id) => {
                Ok(delete_comments_where(t, |c| c.recipe_id == recipe_id))
            }
            Op::DeleteRecipeRatings(recipe_id) => {
                Ok(retain_count(&mut t.ratings, |r| r.recipe_id != recipe_id))
            }
            Op::DeleteRecipeIngredients(recipe_id) => {
                Ok(retain_count(&mut t.ingredients, |i| i.recipe_id != recipe_id))
            }
            Op::DeleteRecipeSaves(recipe_id) => {
                Ok(retain_count(&mut t.saved, |s| s.recipe_id != recipe_id))
            }
            Op::DeleteUserComments(user_id) => {
                Ok(delete_comments_where(t, |c| c.user_id == Some(user_id)))
            }
            Op::DeleteUserRatings(user_id) => {
                Ok(retain_count(&mut t.ratings, |r| r.user_id != Some(user_id)))
            }
            Op::DeleteUserSaves(user_id) => {
                Ok(retain_count(&mut t.saved, |s| s.user_id != user_id))
            }
            Op::DisownRecipes(user_id) => {
                Ok(disown(t.recipes.iter_mut().map(|r| &mut r.user_id), user_id))
            }
            Op::DisownComments(user_id) => {
                Ok(disown(t.comments.iter_mut().map(|c| &mut c.user_id), user_id))
            }
            Op::DisownRatings(user_id) => {
                Ok(disown(t.ratings.iter_mut().map(|r| &mut r.user_id), user_id))
            }
            Op::InsertSaved {
                user_id,
                recipe_id,
                at,
            } => {
                if has_saved(t, user_id, recipe_id) {
                    return Err(StoreError::UniqueViolation);
                }
                if !t.users.iter().any(|u| u.id == user_id)
                    || !t.recipes.iter().any(|r| r.id == recipe_id)
                {
                    return Err(StoreError::ForeignKeyViolation(
                        "saved_recipes references a missing row".to_string(),
                    ));
                }
                t.saved.push(SavedRecipe {
                    user_id,
                    recipe_id,
                    created_at: at,
                });
                Ok(1)
            }
            Op::DeleteSaved { user_id, recipe_id } => Ok(retain_count(&mut t.saved, |s| {
                !(s.user_id == user_id && s.recipe_id == recipe_id)
            })),
            Op::UpsertRating {
                id,
                recipe_id,
                user_id,
                value,
                at,
            } => {
                if !t.recipes.iter().any(|r| r.id == recipe_id) {
                    return Err(StoreError::ForeignKeyViolation(
                        "ratings references a missing recipe".to_string(),
                    ));
                }
                if let Some(existing) = t
                    .ratings
                    .iter_mut()
                    .find(|r| r.recipe_id == recipe_id && r.user_id == Some(user_id))
                {
                    existing.rating = value;
                    existing.updated_at = at;
                    return Ok(1);
                }
                t.ratings.push(Rating {
                    id,
                    recipe_id,
                    user_id: Some(user_id),
                    rating: value,
                    created_at: at,
                    updated_at: at,
                });
                Ok(1)
            }
            Op::DeleteRating { recipe_id, user_id } => Ok(retain_count(&mut t.ratings, |r| {
                !(r.recipe_id == recipe_id && r.user_id == Some(user_id))
            })),
        }
    }
}

fn retain_count<T>(rows: &mut Vec<T>, keep: impl Fn(&T) -> bool) -> usize {
    let before = rows.len();
    rows.retain(|r| keep(r));
    before - rows.len()
}

fn disown<'a>(owners: impl Iterator<Item = &'a mut Option<Uuid>>, user_id: Uuid) -> usize {
    let mut n = 0;
    for owner in owners {
        if *owner == Some(user_id) {
            *owner = None;
            n += 1;
        }
    }
    n
}

fn has_saved(t: &Tables, user_id: Uuid, recipe_id: Uuid) -> bool {
    t.saved
        .iter()
        .any(|s| s.user_id == user_id && s.recipe_id == recipe_id)
}

/// Drop comments matching `pred` together with their replies.
fn delete_comments_where(t: &mut Tables, pred: impl Fn(&Comment) -> bool) -> usize {
    let doomed: Vec<Uuid> = t.comments.iter().filter(|c| pred(c)).map(|c| c.id).collect();
    retain_count(&mut t.comments, |c| {
        !doomed.contains(&c.id) && !c.parent_id.is_some_and(|p| doomed.contains(&p))
    })
}

struct MemoryTx<'s> {
    store: &'s MemoryStore,
    id: u64,
    /// Committed state as of the last refresh, with `ops` applied on top.
    view: Tables,
    ops: Vec<Op>,
    writes: usize,
    fail_at_write: Option<usize>,
}

impl<'s> MemoryTx<'s> {
    fn begin(store: &'s MemoryStore) -> Self {
        Self {
            store,
            id: store.next_tx.fetch_add(1, Ordering::Relaxed),
            view: store.snapshot(),
            ops: Vec::new(),
            writes: 0,
            fail_at_write: *store.fail_at_write.lock().unwrap(),
        }
    }

    /// Re-read committed state and replay this transaction's writes on it.
    fn refresh(&mut self) -> Result<(), StoreError> {
        let mut view = self.store.snapshot();
        for op in &self.ops {
            op.apply(&mut view)?;
        }
        self.view = view;
        Ok(())
    }

    /// Wait for `key`, hold it until the transaction ends, then refresh.
    fn lock(&mut self, key: RowKey) -> Result<(), StoreError> {
        self.store.locks.acquire(key, self.id);
        self.refresh()
    }

    fn exec(&mut self, op: Op) -> Result<usize, StoreError> {
        let n = self.writes;
        self.writes += 1;
        if self.fail_at_write == Some(n) {
            return Err(StoreError::Database(format!("injected failure at write {}", n)));
        }
        let count = op.apply(&mut self.view)?;
        self.ops.push(op);
        Ok(count)
    }

    fn commit(&self) -> Result<(), StoreError> {
        let mut committed = self.store.tables.lock().unwrap();
        let mut next = committed.clone();
        for op in &self.ops {
            op.apply(&mut next)?;
        }
        *committed = next;
        Ok(())
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        self.store.locks.release_all(self.id);
    }
}

impl Tx for MemoryTx<'_> {
    fn lock_user(&mut self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        self.lock(RowKey::User(user_id))?;
        Ok(self.view.users.iter().find(|u| u.id == user_id).cloned())
    }

    fn delete_user(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteUser(user_id))
    }

    fn revoke_sessions(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::RevokeSessions(user_id))
    }

    fn find_recipe(&mut self, recipe_id: Uuid) -> Result<Option<RecipeRef>, StoreError> {
        Ok(self
            .view
            .recipes
            .iter()
            .find(|r| r.id == recipe_id)
            .map(|r| RecipeRef {
                id: r.id,
                user_id: r.user_id,
            }))
    }

    fn recipe_ids_owned_by(&mut self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .view
            .recipes
            .iter()
            .filter(|r| r.user_id == Some(user_id))
            .map(|r| r.id)
            .collect())
    }

    fn delete_recipe(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteRecipe(recipe_id))
    }

    fn delete_recipe_comments(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteRecipeComments(recipe_id))
    }

    fn delete_recipe_ratings(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteRecipeRatings(recipe_id))
    }

    fn delete_recipe_ingredients(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteRecipeIngredients(recipe_id))
    }

    fn delete_recipe_saves(&mut self, recipe_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteRecipeSaves(recipe_id))
    }

    fn delete_user_comments(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteUserComments(user_id))
    }

    fn delete_user_ratings(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteUserRatings(user_id))
    }

    fn delete_user_saves(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DeleteUserSaves(user_id))
    }

    fn disown_recipes(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DisownRecipes(user_id))
    }

    fn disown_comments(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DisownComments(user_id))
    }

    fn disown_ratings(&mut self, user_id: Uuid) -> Result<usize, StoreError> {
        self.exec(Op::DisownRatings(user_id))
    }

    fn is_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<bool, StoreError> {
        Ok(has_saved(&self.view, user_id, recipe_id))
    }

    fn insert_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<(), StoreError> {
        self.lock(RowKey::Saved(user_id, recipe_id))?;
        self.exec(Op::InsertSaved {
            user_id,
            recipe_id,
            at: Utc::now(),
        })?;
        Ok(())
    }

    fn delete_saved(&mut self, user_id: Uuid, recipe_id: Uuid) -> Result<usize, StoreError> {
        // A DELETE only waits on rows it can see
        self.refresh()?;
        if has_saved(&self.view, user_id, recipe_id) {
            self.lock(RowKey::Saved(user_id, recipe_id))?;
        }
        self.exec(Op::DeleteSaved { user_id, recipe_id })
    }

    fn upsert_rating(
        &mut self,
        recipe_id: Uuid,
        user_id: Uuid,
        value: i32,
    ) -> Result<Rating, StoreError> {
        self.lock(RowKey::Rating(recipe_id, user_id))?;
        self.exec(Op::UpsertRating {
            id: Uuid::new_v4(),
            recipe_id,
            user_id,
            value,
            at: Utc::now(),
        })?;
        self.view
            .ratings
            .iter()
            .find(|r| r.recipe_id == recipe_id && r.user_id == Some(user_id))
            .cloned()
            .ok_or_else(|| StoreError::Database("upserted rating not found".to_string()))
    }

    fn delete_rating(&mut self, recipe_id: Uuid, user_id: Uuid) -> Result<usize, StoreError> {
        self.lock(RowKey::Rating(recipe_id, user_id))?;
        self.exec(Op::DeleteRating { recipe_id, user_id })
    }

    fn user_rating(&mut self, recipe_id: Uuid, user_id: Uuid) -> Result<Option<i32>, StoreError> {
        Ok(self
            .view
            .ratings
            .iter()
            .find(|r| r.recipe_id == recipe_id && r.user_id == Some(user_id))
            .map(|r| r.rating))
    }

    fn rating_summary(&mut self, recipe_id: Uuid) -> Result<RatingSummary, StoreError> {
        let rows = self.view.ratings.iter().filter(|r| r.recipe_id == recipe_id);
        let (total, count) = rows.fold((0i64, 0i64), |(t, c), r| (t + r.rating as i64, c + 1));
        Ok(RatingSummary { total, count })
    }
}
