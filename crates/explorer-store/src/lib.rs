//! # explorer-store
//!
//! Local persistence for per-user favorites, backed by SQLite.
//!
//! Each signed-in user owns one document: a `users` row plus the set of
//! favorite country codes in `favorites`.  The crate exposes a synchronous
//! `Database` handle that wraps a `rusqlite::Connection` and provides typed
//! helpers for that document.

pub mod database;
pub mod favorites;
pub mod migrations;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
