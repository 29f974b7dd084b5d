//! Handler for `POST /check-rankings`.
//!
//! | Outcome | Status | Body |
//! |---------|--------|------|
//! | batch ran | 200 | `{"success":true,"results":[...],"message":"Checked N keywords"}` |
//! | `siteId`/`domain` missing | 400 | `{"success":false,"error":"Missing siteId or domain"}` |
//! | no keywords | 404 | `{"success":false,"error":"No keywords found for this site"}` |
//! | anything else | 500 | `{"success":false,"error":"..."}` |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use rankwatch_checker::{BatchReport, CheckError, Pacer};
use rankwatch_core::{rank::Rank, search::SearchProvider, store::RankStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, ApiState};

pub const MISSING_INPUT: &str = "Missing siteId or domain";
pub const NO_KEYWORDS: &str = "No keywords found for this site";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBody {
  pub site_id: Option<String>,
  pub domain:  Option<String>,
}

/// A rank as shown to clients: the position, or a "not found" sentence that
/// names the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RankLabel {
  Position(u32),
  NotFound(String),
}

impl RankLabel {
  pub fn new(rank: Rank, result_window: usize) -> Self {
    match rank.position() {
      Some(p) => Self::Position(p),
      None => Self::NotFound(format!("Not found in top {result_window}")),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedKeyword {
  pub keyword_id: Uuid,
  pub keyword:    String,
  pub rank:       RankLabel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
  pub success:   bool,
  pub results:   Vec<CheckedKeyword>,
  pub message:   String,
  pub skipped:   usize,
  pub truncated: bool,
}

impl From<BatchReport> for CheckResponse {
  fn from(report: BatchReport) -> Self {
    let window = report.result_window;
    let results = report
      .results
      .into_iter()
      .map(|r| CheckedKeyword {
        keyword_id: r.keyword_id,
        keyword:    r.keyword,
        rank:       RankLabel::new(r.rank, window),
      })
      .collect();

    Self {
      success: true,
      results,
      message: format!("Checked {} keywords", report.checked_count),
      skipped: report.skipped_count,
      truncated: report.truncated,
    }
  }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

/// `POST /check-rankings`, body: `{"siteId":"<uuid>","domain":"example.com"}`
///
/// Runs the whole batch before responding.
pub async fn check_rankings<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  body: Result<Json<CheckBody>, JsonRejection>,
) -> Result<Json<CheckResponse>, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let Json(body) = body?;

  let (Some(site_id), Some(domain)) = (
    non_blank(body.site_id.as_deref()),
    non_blank(body.domain.as_deref()),
  ) else {
    return Err(ApiError::BadRequest(MISSING_INPUT.into()));
  };

  // An id that cannot name a site has no keywords either.
  let Ok(site_id) = Uuid::parse_str(site_id) else {
    return Err(ApiError::NotFound(NO_KEYWORDS.into()));
  };

  match state.checker.check_all(site_id, domain).await {
    Ok(report) => Ok(Json(report.into())),
    Err(CheckError::NoKeywords(_)) => Err(ApiError::NotFound(NO_KEYWORDS.into())),
    Err(CheckError::Validation(msg)) => Err(ApiError::BadRequest(msg)),
    Err(CheckError::Store(e)) => Err(ApiError::Store(e)),
  }
}
