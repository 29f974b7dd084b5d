//! Error type for `rankwatch-search`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The provider answered with a non-success HTTP status.
  #[error("search provider returned {status}: {message}")]
  Status { status: u16, message: String },

  /// Connection, TLS or timeout failure before a response was read.
  #[error("search request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("invalid search response: {0}")]
  Decode(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
