//! Error type for `rankwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] rankwatch_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to add a keyword to a site that does not exist.
  #[error("site not found: {0}")]
  SiteNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
