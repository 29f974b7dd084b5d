//! The `RankStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `rankwatch-store-sqlite`). The batch checker and the HTTP layer depend on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  rank::{Rank, RankObservation},
  site::{Keyword, NewSite, Site},
};

/// Abstraction over a Rankwatch persistence backend.
///
/// Rank observations are append-only: they are never updated, and deleting a
/// keyword leaves its observations in place.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RankStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sites ─────────────────────────────────────────────────────────────

  /// Persist a new site. The id and creation time are assigned by the store.
  fn add_site(
    &self,
    input: NewSite,
  ) -> impl Future<Output = Result<Site, Self::Error>> + Send + '_;

  /// Retrieve a site by UUID. Returns `None` if not found.
  fn get_site(
    &self,
    site_id: Uuid,
  ) -> impl Future<Output = Result<Option<Site>, Self::Error>> + Send + '_;

  /// List the sites owned by `user_id`, newest first.
  fn list_sites<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Site>, Self::Error>> + Send + 'a;

  // ── Keywords ──────────────────────────────────────────────────────────

  /// Add a keyword to an existing site.
  ///
  /// Returns an error if the site does not exist. `text` is stored as given;
  /// callers normalise it with [`normalize_keyword`](crate::site::normalize_keyword).
  fn add_keyword(
    &self,
    site_id: Uuid,
    text: String,
  ) -> impl Future<Output = Result<Keyword, Self::Error>> + Send + '_;

  /// Retrieve a keyword by UUID. Returns `None` if not found.
  fn get_keyword(
    &self,
    keyword_id: Uuid,
  ) -> impl Future<Output = Result<Option<Keyword>, Self::Error>> + Send + '_;

  /// List a site's keywords in creation order. An unknown site yields an
  /// empty list rather than an error.
  fn list_keywords(
    &self,
    site_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Keyword>, Self::Error>> + Send + '_;

  /// Delete a keyword. Returns `false` if it did not exist.
  ///
  /// Historical observations for the keyword are retained.
  fn delete_keyword(
    &self,
    keyword_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Observations ──────────────────────────────────────────────────────

  /// Append one rank observation. Never reads or updates existing records.
  fn record_observation(
    &self,
    keyword_id: Uuid,
    rank: Rank,
    observed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<RankObservation, Self::Error>> + Send + '_;

  /// The most recent observations for a keyword, newest first.
  fn list_observations(
    &self,
    keyword_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RankObservation>, Self::Error>> + Send + '_;
}
