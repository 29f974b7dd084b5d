//! [`SqliteStore`]: the SQLite implementation of [`RankStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rankwatch_core::{
  rank::{Rank, RankObservation},
  site::{Keyword, NewSite, Site},
  store::RankStore,
};

use crate::{
  Error, Result,
  encode::{RawKeyword, RawObservation, RawSite, encode_dt, encode_rank, encode_uuid},
  schema::SCHEMA,
};

const SITE_COLUMNS: &str = "site_id, user_id, domain, name, created_at";
const KEYWORD_COLUMNS: &str = "keyword_id, site_id, keyword, created_at";
const OBSERVATION_COLUMNS: &str = "observation_id, keyword_id, rank, observed_at";

/// Sub-second digits kept by [`encode_dt`]; returned records are truncated to
/// match what a later read yields.
const STORED_PRECISION: u16 = 6;

fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(STORED_PRECISION) }

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rankwatch store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RankStore impl ──────────────────────────────────────────────────────────

impl RankStore for SqliteStore {
  type Error = Error;

  // ── Sites ─────────────────────────────────────────────────────────────────

  async fn add_site(&self, input: NewSite) -> Result<Site> {
    let site = Site {
      site_id:    Uuid::new_v4(),
      user_id:    input.user_id,
      domain:     input.domain,
      name:       input.name,
      created_at: now(),
    };

    let id_str  = encode_uuid(site.site_id);
    let user_id = site.user_id.clone();
    let domain  = site.domain.clone();
    let name    = site.name.clone();
    let at_str  = encode_dt(site.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sites (site_id, user_id, domain, name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, user_id, domain, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(site)
  }

  async fn get_site(&self, site_id: Uuid) -> Result<Option<Site>> {
    let id_str = encode_uuid(site_id);

    let raw: Option<RawSite> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SITE_COLUMNS} FROM sites WHERE site_id = ?1"),
            rusqlite::params![id_str],
            RawSite::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSite::into_site).transpose()
  }

  async fn list_sites(&self, user_id: &str) -> Result<Vec<Site>> {
    let user_id = user_id.to_owned();

    let raws: Vec<RawSite> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SITE_COLUMNS} FROM sites
           WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawSite::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSite::into_site).collect()
  }

  // ── Keywords ──────────────────────────────────────────────────────────────

  async fn add_keyword(&self, site_id: Uuid, text: String) -> Result<Keyword> {
    let keyword = Keyword {
      keyword_id: Uuid::new_v4(),
      site_id,
      text,
      created_at: now(),
    };

    let id_str      = encode_uuid(keyword.keyword_id);
    let site_id_str = encode_uuid(site_id);
    let text        = keyword.text.clone();
    let at_str      = encode_dt(keyword.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let site_exists = conn
          .query_row(
            "SELECT 1 FROM sites WHERE site_id = ?1",
            rusqlite::params![site_id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();

        if !site_exists {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO keywords (keyword_id, site_id, keyword, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, site_id_str, text, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::SiteNotFound(site_id));
    }
    Ok(keyword)
  }

  async fn get_keyword(&self, keyword_id: Uuid) -> Result<Option<Keyword>> {
    let id_str = encode_uuid(keyword_id);

    let raw: Option<RawKeyword> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {KEYWORD_COLUMNS} FROM keywords WHERE keyword_id = ?1"),
            rusqlite::params![id_str],
            RawKeyword::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawKeyword::into_keyword).transpose()
  }

  async fn list_keywords(&self, site_id: Uuid) -> Result<Vec<Keyword>> {
    let site_id_str = encode_uuid(site_id);

    let raws: Vec<RawKeyword> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {KEYWORD_COLUMNS} FROM keywords
           WHERE site_id = ?1
           ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![site_id_str], RawKeyword::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawKeyword::into_keyword).collect()
  }

  async fn delete_keyword(&self, keyword_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(keyword_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM keywords WHERE keyword_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  // ── Observations ──────────────────────────────────────────────────────────

  async fn record_observation(
    &self,
    keyword_id:  Uuid,
    rank:        Rank,
    observed_at: DateTime<Utc>,
  ) -> Result<RankObservation> {
    let observation = RankObservation {
      observation_id: Uuid::new_v4(),
      keyword_id,
      rank,
      observed_at: observed_at.trunc_subsecs(STORED_PRECISION),
    };

    let id_str         = encode_uuid(observation.observation_id);
    let keyword_id_str = encode_uuid(keyword_id);
    let rank_val       = encode_rank(rank);
    let at_str         = encode_dt(observation.observed_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rank_observations (observation_id, keyword_id, rank, observed_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, keyword_id_str, rank_val, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(observation)
  }

  async fn list_observations(
    &self,
    keyword_id: Uuid,
    limit:      usize,
  ) -> Result<Vec<RankObservation>> {
    let keyword_id_str = encode_uuid(keyword_id);
    let limit_val      = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawObservation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {OBSERVATION_COLUMNS} FROM rank_observations
           WHERE keyword_id = ?1
           ORDER BY observed_at DESC, rowid DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![keyword_id_str, limit_val],
            RawObservation::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawObservation::into_observation)
      .collect()
  }
}
