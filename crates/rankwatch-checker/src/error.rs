//! Error types for `rankwatch-checker`.

use thiserror::Error;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that abort a whole batch before or while listing keywords.
#[derive(Debug, Error)]
pub enum CheckError {
  #[error("invalid input: {0}")]
  Validation(String),

  /// The site has no keywords, or does not exist; the two are not
  /// distinguished.
  #[error("no keywords found for site {0}")]
  NoKeywords(Uuid),

  #[error("failed to load keywords: {0}")]
  Store(#[source] BoxError),
}

/// Why a single keyword produced no report entry.
#[derive(Debug, Error)]
pub enum KeywordFailure {
  #[error("search failed: {0}")]
  Provider(#[source] BoxError),

  /// A panic raised while the keyword was being processed.
  #[error("unexpected failure: {0}")]
  Unexpected(String),
}
