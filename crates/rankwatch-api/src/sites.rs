//! Handlers for `/sites` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sites` | Caller's sites, newest first |
//! | `POST` | `/sites` | Body: `{"domain":"example.com","name":"Blog"}` |
//! | `GET`  | `/sites/:id` | 404 if missing or not owned by the caller |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use rankwatch_checker::Pacer;
use rankwatch_core::{
  search::SearchProvider,
  site::{NewSite, Site},
  store::RankStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, ApiState, Identity, owned_site};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sites`
pub async fn list<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  identity: Identity,
) -> Result<Json<Vec<Site>>, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let sites = state
    .store
    .list_sites(identity.as_str())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(sites))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub domain: String,
  #[serde(default)]
  pub name:   Option<String>,
}

/// `POST /sites`, body: `{"domain":"example.com"}`
pub async fn create<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  identity: Identity,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let Json(body) = body?;
  let input = NewSite::new(identity.0, &body.domain, body.name.as_deref())
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  let site = state.store.add_site(input).await.map_err(ApiError::store)?;
  tracing::info!(site_id = %site.site_id, domain = %site.domain, "site added");
  Ok((StatusCode::CREATED, Json(site)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /sites/:id`
pub async fn get_one<S, P, T>(
  State(state): State<ApiState<S, P, T>>,
  identity: Identity,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Site>, ApiError>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  let Path(id) = id?;
  let site = owned_site(state.store.as_ref(), id, &identity).await?;
  Ok(Json(site))
}
