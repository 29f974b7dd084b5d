//! Sites and the keywords tracked for them.
//!
//! A site belongs to exactly one user and is only ever created by an explicit
//! user action. Its domain is a bare hostname-like string used for substring
//! matching against result URLs; it is not parsed as a URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Site ────────────────────────────────────────────────────────────────────

/// A website registered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
  pub site_id:    Uuid,
  /// Identity of the owning user (the authenticated username).
  pub user_id:    String,
  pub domain:     String,
  /// Optional human-friendly label shown instead of the domain.
  pub name:       Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input for [`RankStore::add_site`](crate::store::RankStore::add_site).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSite {
  pub user_id: String,
  pub domain:  String,
  pub name:    Option<String>,
}

impl NewSite {
  /// Build a validated site input.
  ///
  /// The domain is trimmed and must be non-empty. A blank display name is
  /// treated as no name at all.
  pub fn new(
    user_id: impl Into<String>,
    domain: &str,
    name: Option<&str>,
  ) -> Result<Self> {
    let domain = domain.trim();
    if domain.is_empty() {
      return Err(Error::EmptyDomain);
    }
    let name = name
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .map(str::to_owned);

    Ok(Self { user_id: user_id.into(), domain: domain.to_owned(), name })
  }
}

// ─── Keyword ─────────────────────────────────────────────────────────────────

/// A search phrase whose rank is tracked for a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
  pub keyword_id: Uuid,
  pub site_id:    Uuid,
  #[serde(rename = "keyword")]
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

/// Trim keyword text, rejecting phrases that are empty afterwards.
pub fn normalize_keyword(text: &str) -> Result<String> {
  let text = text.trim();
  if text.is_empty() {
    return Err(Error::EmptyKeyword);
  }
  Ok(text.to_owned())
}
