//! Web-search provider clients for Rankwatch.
//!
//! Currently a single backend: the Brave Web Search API.

mod brave;

pub mod error;

pub use brave::{BRAVE_API_URL, BraveClient, BraveConfig};
pub use error::{Error, Result};
