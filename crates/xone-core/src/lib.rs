//! Core types and trait definitions for the xone member registry.
//!
//! This crate is deliberately free of database and file-format dependencies.
//! Storage backends (`xone-store-sqlite`, `xone-csv`) implement the
//! repository traits declared here.

// Native `async fn` in traits; the futures are declared `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod context;
pub mod date;
pub mod error;
pub mod membership;
pub mod person;
pub mod store;
pub mod user;

pub use context::Context;
pub use date::DATE_FORMAT;
pub use error::{Error, Result};
