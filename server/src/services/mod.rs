//! Operations that must hold their invariants under a single transaction.
//! HTTP handlers call into these; everything here is written against the
//! [`Store`](crate::store::Store) seam.

pub mod account_deletion;
pub mod bookmarks;
pub mod ratings;
pub mod recipes;
