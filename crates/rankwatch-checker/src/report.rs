//! The aggregate result of one batch.

use rankwatch_core::rank::Rank;
use serde::Serialize;
use uuid::Uuid;

/// One keyword's outcome within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordRank {
  pub keyword_id: Uuid,
  pub keyword:    String,
  pub rank:       Rank,
  /// `false` if the observation could not be saved; the rank is still
  /// reported.
  pub persisted:  bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
  pub site_id:       Uuid,
  /// Maximum number of results examined per keyword.
  pub result_window: usize,
  pub results:       Vec<KeywordRank>,
  /// Number of entries in `results`.
  pub checked_count: usize,
  /// Keywords attempted but dropped because of a failure.
  pub skipped_count: usize,
  /// The batch stopped early because its deadline passed.
  pub truncated:     bool,
}

impl BatchReport {
  pub(crate) fn new(site_id: Uuid, result_window: usize) -> Self {
    Self {
      site_id,
      result_window,
      results: Vec::new(),
      checked_count: 0,
      skipped_count: 0,
      truncated: false,
    }
  }
}
