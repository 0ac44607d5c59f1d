//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite. It follows the
//! Repository pattern: each table has a repository in [`handlers`] that wraps a connection or
//! transaction and returns the records defined in [`models`].
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   SQLite    │
//! └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use selcon::db::handlers::{Repository, Users};
//!
//! let mut tx = pool.begin().await?;
//! let mut users = Users::new(&mut tx);
//! if let Some(user) = users.get_user_by_username("alice").await? {
//!     println!("Found user: {}", user.email);
//! }
//! tx.commit().await?;
//! ```
//!
//! # Transactions
//!
//! SQLite allows one writer at a time. Handlers that write open a transaction with
//! `pool.begin()` and build repositories from it. Handlers that only read may use
//! `pool.acquire()` directly.
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are embedded with [`crate::migrator`]:
//!
//! ```ignore
//! selcon::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
