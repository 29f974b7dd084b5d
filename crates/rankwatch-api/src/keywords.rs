//! Handlers for keyword endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sites/:id/keywords` | Newest first |
//! | `POST`   | `/sites/:id/keywords` | Body: `{"keyword":"rank tracker"}` |
//! | `DELETE` | `/keywords/:id` | Rank history is kept |
//! | `GET`    | `/keywords/:id/history` | Optional `?limit=` (default 30) |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use rankwatch_checker::Pacer;
use rankwatch_core::{
  history::{DEFAULT_HISTORY_LIMIT, Trend, rank_trend},
  rank::{Rank, RankObservation},
  search::SearchProvider,
  site::{Keyword, Site, normalize_keyword},
  store::RankStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, ApiState, Identity, owned_site};

/// Load a keyword whose parent site is owned by `identity`.
async fn owned_keyword<S: RankStore>(
  store: &S,
  keyword_id: Uuid,
  identity: &Identity,
) -> Result<(Keyword, Site), ApiError> {
  let not_found = || ApiError::NotFound(format!("keyword {keyword_id} not found"));

  let keyword = store
    .get_keyword(keyword_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;

  let site = owned_site(store, keyword.site_id, identity)
    .await
    .map_err(|e| match e {
      ApiError::NotFound(_) => not_found(),
      other => other,
    })?;

  Ok((keyword, site))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sites/:id/keywords`
pub async fn list<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  identity: Identity,
  site_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Keyword>>, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let Path(site_id) = site_id?;
  owned_site(state.store.as_ref(), site_id, &identity).await?;

  let mut keywords = state
    .store
    .list_keywords(site_id)
    .await
    .map_err(ApiError::store)?;
  keywords.reverse();
  Ok(Json(keywords))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub keyword: String,
}

/// `POST /sites/:id/keywords`, body: `{"keyword":"rank tracker"}`
pub async fn create<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  identity: Identity,
  site_id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let Path(site_id) = site_id?;
  let Json(body) = body?;
  let text = normalize_keyword(&body.keyword)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  owned_site(state.store.as_ref(), site_id, &identity).await?;

  let keyword = state
    .store
    .add_keyword(site_id, text)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(keyword)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /keywords/:id`
pub async fn delete_one<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  identity: Identity,
  keyword_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let Path(keyword_id) = keyword_id?;
  owned_keyword(state.store.as_ref(), keyword_id, &identity).await?;

  let removed = state
    .store
    .delete_keyword(keyword_id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("keyword {keyword_id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct KeywordHistory {
  pub keyword: Keyword,
  pub site:    Site,
  /// Newest first.
  pub checks:  Vec<RankObservation>,
  /// Rank of the newest check; `null` when never checked or absent.
  pub latest:  Option<Rank>,
  pub trend:   Trend,
}

/// `GET /keywords/:id/history[?limit=<n>]`
pub async fn history<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  identity: Identity,
  keyword_id: Result<Path<Uuid>, PathRejection>,
  params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<KeywordHistory>, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let Path(keyword_id) = keyword_id?;
  let Query(params) = params?;
  let (keyword, site) = owned_keyword(state.store.as_ref(), keyword_id, &identity).await?;

  let checks = state
    .store
    .list_observations(keyword_id, params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
    .await
    .map_err(ApiError::store)?;

  let latest = checks.first().map(|c| c.rank);
  let trend = rank_trend(&checks);

  Ok(Json(KeywordHistory { keyword, site, checks, latest, trend }))
}
