//! Rank positions, rank observations, and rank extraction.
//!
//! A rank is the 1-based position of the first search result whose URL
//! mentions the tracked domain. "Absent" means the domain did not appear in
//! the examined window; it is never a stand-in for an error or for zero.

use std::{fmt, num::NonZeroU32};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, search::SearchHit};

/// Number of results requested and examined per keyword.
pub const DEFAULT_RESULT_WINDOW: usize = 50;

// ─── Rank ────────────────────────────────────────────────────────────────────

/// Position of a domain within a bounded result window.
///
/// Serialises as a bare number, or `null` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rank {
  Found(NonZeroU32),
  Absent,
}

impl Rank {
  /// The 1-based position, if the domain was found.
  pub fn position(self) -> Option<u32> {
    match self {
      Self::Found(p) => Some(p.get()),
      Self::Absent => None,
    }
  }

  pub fn is_absent(self) -> bool { matches!(self, Self::Absent) }

  /// Build a rank from a nullable stored position.
  ///
  /// `None` is absent; zero and negative positions are rejected.
  pub fn from_stored(position: Option<i64>) -> Result<Self> {
    match position {
      None => Ok(Self::Absent),
      Some(p) => u32::try_from(p)
        .ok()
        .and_then(NonZeroU32::new)
        .map(Self::Found)
        .ok_or(Error::InvalidRank(p)),
    }
  }

  /// Convert from a 0-based result index.
  fn from_index(index: usize) -> Self {
    index
      .checked_add(1)
      .and_then(|p| u32::try_from(p).ok())
      .and_then(NonZeroU32::new)
      .map_or(Self::Absent, Self::Found)
  }
}

impl fmt::Display for Rank {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Found(p) => write!(f, "#{p}"),
      Self::Absent => f.write_str("not found"),
    }
  }
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// One persisted rank measurement. Observations are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankObservation {
  pub observation_id: Uuid,
  pub keyword_id:     Uuid,
  pub rank:           Rank,
  pub observed_at:    DateTime<Utc>,
}

// ─── Extraction ──────────────────────────────────────────────────────────────

/// Find the 1-based position of the first result whose URL contains `domain`.
///
/// The comparison is a case-insensitive substring match, not host equality:
/// `example.com` also matches `https://example.com.mirror.tld/`. An empty
/// domain matches nothing.
pub fn extract_rank(results: &[SearchHit], domain: &str) -> Rank {
  let needle = domain.trim().to_lowercase();
  if needle.is_empty() {
    return Rank::Absent;
  }

  results
    .iter()
    .position(|hit| hit.url.to_lowercase().contains(&needle))
    .map_or(Rank::Absent, Rank::from_index)
}

/// Like [`extract_rank`], but examines at most `window` results so the
/// returned position never exceeds the window.
pub fn extract_rank_within(
  results: &[SearchHit],
  domain: &str,
  window: usize,
) -> Rank {
  let examined = &results[..results.len().min(window)];
  extract_rank(examined, domain)
}
