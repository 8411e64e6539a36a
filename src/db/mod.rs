//! Persistence layer: the board store abstraction and its SQLite backing.
//!
//! This module is split into two parts:
//! - the `BoardStore` trait and `StoreError`, which is all the
//!   reconciliation engine knows about storage (so tests can substitute an
//!   in-memory fake);
//! - `repo`: SQL-only functions and the SQLite-backed store.
//!
//! External modules should import from `dipwatch::db` — the repository API
//! is re-exported here.

pub mod repo;

pub use repo::{init_pool, load_credentials, run_migrations, save_credentials, Pool, SqliteBoards};

use crate::model::BoardRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("board {0} is already stored")]
    DuplicateKey(i64),
    #[error("board {0} is not stored")]
    NotFound(i64),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Keyed access to the last-known record per board.
///
/// `update` overwrites only the mutable fields (`date`, `phase`,
/// `order_status`, `has_mail`); `name` and `my_country` keep whatever was
/// stored when the board was first seen. Every successful call is durably
/// committed before it returns, so a run that dies mid-batch leaves all
/// earlier boards persisted.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<BoardRecord>, StoreError>;
    async fn insert(&self, record: &BoardRecord) -> Result<(), StoreError>;
    async fn update(&self, record: &BoardRecord) -> Result<(), StoreError>;
}
