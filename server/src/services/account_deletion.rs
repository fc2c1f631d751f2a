//! Account deletion with a data-retention choice.
//!
//! A user closes their account in one of two modes:
//!
//! - [`DeletionMode::DeleteAll`] removes every recipe they own (with its
//!   ingredients, comments, ratings and other users' bookmarks of it), plus
//!   every comment and rating they wrote elsewhere.
//! - [`DeletionMode::KeepData`] leaves their recipes, comments and ratings in
//!   place and clears the owner reference, so the content stays visible but
//!   is no longer attributed to anyone.
//!
//! In both modes the user's own bookmarks are removed, all sessions are
//! revoked and the user row is deleted. All of it happens in one transaction:
//! a failure at any step leaves the datastore exactly as it was.

use super::recipes::purge_recipe;
use crate::auth::verify_password;
use crate::models::User;
use crate::store::{Store, StoreError, Tx};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// What happens to the content of a deleted account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeletionMode {
    /// Delete the account and everything it authored
    DeleteAll,
    /// Delete the account, keep its content without an owner
    KeepData,
}

impl DeletionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionMode::DeleteAll => "delete_all",
            DeletionMode::KeepData => "keep_data",
        }
    }
}

impl fmt::Display for DeletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletionMode {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete_all" => Ok(DeletionMode::DeleteAll),
            "keep_data" => Ok(DeletionMode::KeepData),
            _ => Err(AccountError::InvalidInput(
                "The selected mode is invalid. Use delete_all or keep_data.".to_string(),
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    InvalidInput(String),

    /// Wrong password, or the account no longer exists.
    #[error("password is incorrect")]
    Unauthorized,

    #[error("account deletion failed: {0}")]
    TransactionFailed(#[from] StoreError),
}

/// Row counts touched by a successful deletion.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DeletionSummary {
    /// Recipes deleted (`DeleteAll`) or disowned (`KeepData`).
    pub recipes: usize,
    pub comments: usize,
    pub ratings: usize,
    pub ingredients: usize,
    /// Bookmark rows removed: the user's own plus, for `DeleteAll`, other
    /// users' bookmarks of the deleted recipes.
    pub saved: usize,
    pub sessions: usize,
}

/// Delete `user`'s account after re-checking their password.
///
/// `user` is the authenticated caller as loaded for this request. The
/// password is verified against it before any connection is taken. Inside
/// the transaction the user row is locked, so a second concurrent deletion of
/// the same account waits and then finds nothing to delete, which it reports
/// as [`AccountError::Unauthorized`].
pub fn delete_account<S: Store>(
    store: &S,
    user: &User,
    password: &str,
    mode: DeletionMode,
) -> Result<DeletionSummary, AccountError> {
    let user_id = user.id;
    if password.is_empty() {
        return Err(AccountError::InvalidInput(
            "The password field is required.".to_string(),
        ));
    }
    if !verify_password(password, &user.password_hash) {
        tracing::debug!(%user_id, mode = %mode, "account deletion refused: wrong password");
        return Err(AccountError::Unauthorized);
    }

    let result = store.transaction(|tx| {
        tx.lock_user(user_id)?.ok_or(AccountError::Unauthorized)?;

        let mut summary = match mode {
            DeletionMode::DeleteAll => delete_content(tx, user_id)?,
            DeletionMode::KeepData => disown_content(tx, user_id)?,
        };

        summary.sessions = tx.revoke_sessions(user_id)?;
        tx.delete_user(user_id)?;
        Ok(summary)
    });

    match &result {
        Ok(summary) => tracing::info!(
            %user_id,
            mode = %mode,
            recipes = summary.recipes,
            comments = summary.comments,
            ratings = summary.ratings,
            sessions = summary.sessions,
            "account deleted"
        ),
        Err(AccountError::TransactionFailed(e)) => tracing::error!(
            %user_id,
            mode = %mode,
            error = %e,
            "account deletion rolled back"
        ),
        Err(e) => tracing::debug!(%user_id, mode = %mode, error = %e, "account deletion refused"),
    }

    result
}

fn delete_content(tx: &mut dyn Tx, user_id: Uuid) -> Result<DeletionSummary, StoreError> {
    let mut summary = DeletionSummary::default();

    for recipe_id in tx.recipe_ids_owned_by(user_id)? {
        let purge = purge_recipe(tx, recipe_id)?;
        summary.recipes += 1;
        summary.comments += purge.comments;
        summary.ratings += purge.ratings;
        summary.ingredients += purge.ingredients;
        summary.saved += purge.saves;
    }

    summary.comments += tx.delete_user_comments(user_id)?;
    summary.ratings += tx.delete_user_ratings(user_id)?;
    summary.saved += tx.delete_user_saves(user_id)?;
    Ok(summary)
}

fn disown_content(tx: &mut dyn Tx, user_id: Uuid) -> Result<DeletionSummary, StoreError> {
    Ok(DeletionSummary {
        recipes: tx.disown_recipes(user_id)?,
        comments: tx.disown_comments(user_id)?,
        ratings: tx.disown_ratings(user_id)?,
        ingredients: 0,
        // Bookmarks are private to the account and go in both modes
        saved: tx.delete_user_saves(user_id)?,
        sessions: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::models::Recipe;
    use crate::store::memory::{MemoryStore, Tables};
    use chrono::{DateTime, Utc};
    use std::sync::{mpsc, Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    const PASSWORD: &str = "correct horse battery";

    /// U owns R1 (3 ingredients, 2 comments and 1 rating from V) and has
    /// saved R2, which V owns.
    struct Fixture {
        store: MemoryStore,
        u: Uuid,
        v: Uuid,
        r1: Uuid,
        r2: Uuid,
    }

    impl Fixture {
        /// U as the request extractor would have loaded it.
        fn user_u(&self) -> User {
            self.store
                .snapshot()
                .users
                .into_iter()
                .find(|user| user.id == self.u)
                .unwrap()
        }
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let hash = hash_password(PASSWORD).unwrap();
        let u = store.add_user("U", &hash);
        let v = store.add_user("V", &hash);
        let r1 = store.add_recipe(u, "Lasagne", 3);
        let r2 = store.add_recipe(v, "Risotto", 2);
        store.add_comment(r1, v, None);
        store.add_comment(r1, v, None);
        store.add_rating(r1, v, 5);
        store.add_saved(u, r2);
        Fixture { store, u, v, r1, r2 }
    }

    /// Adds content authored by U on V's recipe, plus V's bookmark of R1.
    fn with_cross_activity(f: &Fixture) {
        let parent = f.store.add_comment(f.r2, f.u, None);
        f.store.add_comment(f.r2, f.v, Some(parent));
        f.store.add_rating(f.r2, f.u, 3);
        f.store.add_saved(f.v, f.r1);
    }

    fn references_user(store: &MemoryStore, user_id: Uuid) -> bool {
        let t = store.snapshot();
        let owner = Some(user_id);
        t.users.iter().any(|u| u.id == user_id)
            || t.sessions.iter().any(|s| s.user_id == user_id)
            || t.recipes.iter().any(|r| r.user_id == owner)
            || t.comments.iter().any(|c| c.user_id == owner)
            || t.ratings.iter().any(|r| r.user_id == owner)
            || t.saved.iter().any(|s| s.user_id == user_id)
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("delete_all".parse::<DeletionMode>().unwrap(), DeletionMode::DeleteAll);
        assert_eq!("keep_data".parse::<DeletionMode>().unwrap(), DeletionMode::KeepData);
        for bad in ["", "DELETE_ALL", "keep", "delete_all "] {
            assert!(matches!(
                bad.parse::<DeletionMode>(),
                Err(AccountError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: DeletionMode = serde_json::from_str("\"keep_data\"").unwrap();
        assert_eq!(mode, DeletionMode::KeepData);
        assert_eq!(
            serde_json::to_string(&DeletionMode::DeleteAll).unwrap(),
            "\"delete_all\""
        );
    }

    #[test]
    fn test_delete_all_scenario() {
        let f = fixture();

        let summary =
            delete_account(&f.store, &f.user_u(), PASSWORD, DeletionMode::DeleteAll).unwrap();
        assert_eq!(summary.recipes, 1);
        assert_eq!(summary.ingredients, 3);
        assert_eq!(summary.comments, 2);
        assert_eq!(summary.ratings, 1);
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.sessions, 1);

        let t = f.store.snapshot();
        assert!(t.recipes.iter().all(|r| r.id != f.r1));
        assert!(t.ingredients.iter().all(|i| i.recipe_id != f.r1));
        assert!(t.comments.iter().all(|c| c.recipe_id != f.r1));
        assert!(t.ratings.iter().all(|r| r.recipe_id != f.r1));
        assert!(t.saved.is_empty());

        // R2 untouched
        let r2 = t.recipes.iter().find(|r| r.id == f.r2).unwrap();
        assert_eq!(r2.user_id, Some(f.v));
        assert_eq!(t.ingredients.iter().filter(|i| i.recipe_id == f.r2).count(), 2);

        assert!(!references_user(&f.store, f.u));
        assert!(t.users.iter().any(|u| u.id == f.v));
    }

    #[test]
    fn test_delete_all_removes_activity_on_other_recipes() {
        let f = fixture();
        with_cross_activity(&f);

        delete_account(&f.store, &f.user_u(), PASSWORD, DeletionMode::DeleteAll).unwrap();

        let t = f.store.snapshot();
        assert!(!references_user(&f.store, f.u));
        // U's comment on R2 is gone, and V's reply to it with it
        assert!(t.comments.iter().all(|c| c.recipe_id != f.r2));
        assert!(t.ratings.iter().all(|r| r.recipe_id != f.r2));
        // V's bookmark of the deleted R1 must not dangle
        assert!(t.saved.iter().all(|s| s.recipe_id != f.r1));
        // Nothing left pointing at a recipe U owned
        assert!(t.ingredients.iter().all(|i| i.recipe_id != f.r1));
        assert!(t.recipes.iter().any(|r| r.id == f.r2));
    }

    #[test]
    fn test_keep_data_scenario() {
        let f = fixture();
        let before = f.store.snapshot();

        let summary =
            delete_account(&f.store, &f.user_u(), PASSWORD, DeletionMode::KeepData).unwrap();
        assert_eq!(summary.recipes, 1);
        assert_eq!(summary.saved, 1);
        assert_eq!(summary.sessions, 1);

        let t = f.store.snapshot();
        let r1_before = before.recipes.iter().find(|r| r.id == f.r1).unwrap();
        let r1_after = t.recipes.iter().find(|r| r.id == f.r1).unwrap();
        assert_eq!(r1_after.user_id, None);
        assert_eq!(content_of(r1_after), content_of(r1_before));

        // Ingredients, and V's comments and rating on R1, are untouched
        assert_eq!(t.ingredients, before.ingredients);
        let v_comments = |tables: &Tables| {
            tables
                .comments
                .iter()
                .filter(|c| c.recipe_id == f.r1)
                .cloned()
                .collect::<Vec<_>>()
        };
        assert_eq!(v_comments(&t), v_comments(&before));
        assert!(v_comments(&t).iter().all(|c| c.user_id == Some(f.v)));
        assert_eq!(t.ratings, before.ratings);

        assert!(t.saved.is_empty());
        assert!(t.recipes.iter().any(|r| r.id == f.r2));
        assert!(!references_user(&f.store, f.u));
    }

    /// A recipe with the owner and timestamps blanked out.
    fn content_of(r: &Recipe) -> Recipe {
        Recipe {
            user_id: None,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            ..r.clone()
        }
    }

    #[test]
    fn test_keep_data_disowns_activity_on_other_recipes() {
        let f = fixture();
        with_cross_activity(&f);
        let before = f.store.snapshot();

        delete_account(&f.store, &f.user_u(), PASSWORD, DeletionMode::KeepData).unwrap();

        let t = f.store.snapshot();
        assert_eq!(t.comments.len(), before.comments.len());
        assert_eq!(t.ratings.len(), before.ratings.len());
        for (after, prior) in t.comments.iter().zip(before.comments.iter()) {
            assert_eq!(after.body, prior.body);
            assert_eq!(after.parent_id, prior.parent_id);
            if prior.user_id == Some(f.u) {
                assert_eq!(after.user_id, None);
            } else {
                assert_eq!(after.user_id, prior.user_id);
            }
        }
        // V's bookmark of R1 survives: R1 still exists
        assert!(t.saved.iter().any(|s| s.user_id == f.v && s.recipe_id == f.r1));
        assert!(!references_user(&f.store, f.u));
    }

    #[test]
    fn test_wrong_password_changes_nothing() {
        let f = fixture();
        let before = f.store.snapshot();

        for mode in [DeletionMode::DeleteAll, DeletionMode::KeepData] {
            let err =
                delete_account(&f.store, &f.user_u(), "not my password", mode).unwrap_err();
            assert!(matches!(err, AccountError::Unauthorized));
        }
        assert_eq!(f.store.snapshot(), before);
    }

    #[test]
    fn test_empty_password_is_invalid_input() {
        let f = fixture();
        let before = f.store.snapshot();

        let err = delete_account(&f.store, &f.user_u(), "", DeletionMode::DeleteAll).unwrap_err();
        assert!(matches!(err, AccountError::InvalidInput(_)));
        assert_eq!(f.store.snapshot(), before);
    }

    #[test]
    fn test_second_deletion_is_unauthorized() {
        let f = fixture();
        // The record a second, already-authenticated request would hold
        let user = f.user_u();

        delete_account(&f.store, &user, PASSWORD, DeletionMode::KeepData).unwrap();
        let after_first = f.store.snapshot();

        let err = delete_account(&f.store, &user, PASSWORD, DeletionMode::DeleteAll).unwrap_err();
        assert!(matches!(err, AccountError::Unauthorized));
        assert_eq!(f.store.snapshot(), after_first);
    }

    #[test]
    fn test_injected_failure_at_every_write_rolls_back() {
        for mode in [DeletionMode::DeleteAll, DeletionMode::KeepData] {
            let mut n = 0;
            loop {
                let f = fixture();
                with_cross_activity(&f);
                let before = f.store.snapshot();

                f.store.fail_at_write(Some(n));
                match delete_account(&f.store, &f.user_u(), PASSWORD, mode) {
                    Err(AccountError::TransactionFailed(_)) => {
                        assert_eq!(f.store.snapshot(), before, "{} failing at write {}", mode, n);
                    }
                    Ok(_) => {
                        // n is past the last write: every step has been covered
                        assert!(n > 0);
                        break;
                    }
                    Err(other) => panic!("unexpected error {:?}", other),
                }
                n += 1;
            }
        }
    }

    #[test]
    fn test_concurrent_deletions_only_one_succeeds() {
        for _ in 0..10 {
            let f = fixture();
            let user = f.user_u();
            let u = f.u;
            let store = Arc::new(f.store);
            let barrier = Arc::new(Barrier::new(2));

            let handles: Vec<_> = [DeletionMode::DeleteAll, DeletionMode::KeepData]
                .into_iter()
                .map(|mode| {
                    let store = Arc::clone(&store);
                    let barrier = Arc::clone(&barrier);
                    let user = user.clone();
                    thread::spawn(move || {
                        barrier.wait();
                        delete_account(store.as_ref(), &user, PASSWORD, mode)
                    })
                })
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(AccountError::Unauthorized))));
            assert!(!references_user(&store, u));
        }
    }

    #[test]
    fn test_wrong_password_does_not_wait_for_row_lock() {
        let f = fixture();
        let user = f.user_u();
        let u = f.u;
        let store = Arc::new(f.store);

        // Another transaction holds U's row until told to finish
        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let holder = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store.transaction(|tx| {
                    tx.lock_user(u)?;
                    locked_tx.send(()).unwrap();
                    release_rx.recv().ok();
                    Ok::<_, StoreError>(())
                })
            })
        };
        locked_rx.recv().unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let result = delete_account(
                    store.as_ref(),
                    &user,
                    "not my password",
                    DeletionMode::DeleteAll,
                );
                done_tx.send(result).ok();
            });
        }
        let result = done_rx.recv_timeout(Duration::from_secs(5));

        release_tx.send(()).unwrap();
        holder.join().unwrap().unwrap();
        assert!(matches!(result, Ok(Err(AccountError::Unauthorized))));
        assert!(store.snapshot().users.iter().any(|user| user.id == u));
    }
}
