//! Core types and trait definitions for the Rankwatch rank tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends, search providers, the batch checker and the API layer
//! all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod history;
pub mod rank;
pub mod search;
pub mod site;
pub mod store;

pub use error::{Error, Result};
