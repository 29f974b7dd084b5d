//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so lexical order matches chronological order.
//! UUIDs are stored as hyphenated lowercase strings. Ranks are nullable
//! integers.

use chrono::{DateTime, SecondsFormat, Utc};
use rankwatch_core::{
  rank::{Rank, RankObservation},
  site::{Keyword, Site},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Rank ─────────────────────────────────────────────────────────────────────

pub fn encode_rank(rank: Rank) -> Option<i64> {
  rank.position().map(i64::from)
}

pub fn decode_rank(position: Option<i64>) -> Result<Rank> {
  Ok(Rank::from_stored(position)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `sites` row.
pub struct RawSite {
  pub site_id:    String,
  pub user_id:    String,
  pub domain:     String,
  pub name:       Option<String>,
  pub created_at: String,
}

impl RawSite {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      site_id:    row.get(0)?,
      user_id:    row.get(1)?,
      domain:     row.get(2)?,
      name:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_site(self) -> Result<Site> {
    Ok(Site {
      site_id:    decode_uuid(&self.site_id)?,
      user_id:    self.user_id,
      domain:     self.domain,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `keywords` row.
pub struct RawKeyword {
  pub keyword_id: String,
  pub site_id:    String,
  pub keyword:    String,
  pub created_at: String,
}

impl RawKeyword {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      keyword_id: row.get(0)?,
      site_id:    row.get(1)?,
      keyword:    row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_keyword(self) -> Result<Keyword> {
    Ok(Keyword {
      keyword_id: decode_uuid(&self.keyword_id)?,
      site_id:    decode_uuid(&self.site_id)?,
      text:       self.keyword,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `rank_observations` row.
pub struct RawObservation {
  pub observation_id: String,
  pub keyword_id:     String,
  pub rank:           Option<i64>,
  pub observed_at:    String,
}

impl RawObservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      observation_id: row.get(0)?,
      keyword_id:     row.get(1)?,
      rank:           row.get(2)?,
      observed_at:    row.get(3)?,
    })
  }

  pub fn into_observation(self) -> Result<RankObservation> {
    Ok(RankObservation {
      observation_id: decode_uuid(&self.observation_id)?,
      keyword_id:     decode_uuid(&self.keyword_id)?,
      rank:           decode_rank(self.rank)?,
      observed_at:    decode_dt(&self.observed_at)?,
    })
  }
}
