//! Error types for `rankwatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("domain must not be empty")]
  EmptyDomain,

  #[error("keyword must not be empty")]
  EmptyKeyword,

  /// A stored or supplied rank that is not a positive integer.
  #[error("invalid rank position: {0}")]
  InvalidRank(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
