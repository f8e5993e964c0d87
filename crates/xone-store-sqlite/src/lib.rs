//! SQLite backend for the xone member registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteStore`] owns the connection,
//! applies the embedded migrations on open and hands out per-call
//! transactions; [`PersonStore`], [`MembershipStore`] and [`UserStore`] are
//! thin facades over it.

mod encode;
mod membership;
mod person;
mod store;
mod user;

pub mod error;
pub mod migrate;

pub use error::{Error, Result};
pub use membership::MembershipStore;
pub use person::PersonStore;
pub use store::{SqliteStore, Tx};
pub use user::UserStore;
