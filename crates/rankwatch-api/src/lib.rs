//! JSON REST API for Rankwatch.
//!
//! Exposes an axum [`Router`] backed by any [`RankStore`] and
//! [`SearchProvider`]. Authentication, TLS, and transport concerns are the
//! caller's responsibility; user-scoped handlers read the caller's
//! [`Identity`] from the request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rankwatch_api::api_router(state))
//! ```

pub mod check;
pub mod error;
pub mod identity;
pub mod keywords;
pub mod sites;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use rankwatch_checker::{Pacer, RankChecker, TokioPacer};
use rankwatch_core::{search::SearchProvider, site::Site, store::RankStore};
use uuid::Uuid;

pub use error::ApiError;
pub use identity::Identity;

/// Shared state threaded through all handlers.
pub struct ApiState<S, P, T = TokioPacer> {
  pub store:   Arc<S>,
  pub checker: Arc<RankChecker<S, P, T>>,
}

impl<S, P, T> Clone for ApiState<S, P, T> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), checker: self.checker.clone() }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, P, T>(state: ApiState<S, P, T>) -> Router<()>
where
  S: RankStore + 'static,
  P: SearchProvider + 'static,
  T: Pacer + 'static,
{
  Router::new()
    // Batch trigger
    .route("/check-rankings", post(check::check_rankings::<S, P, T>))
    // Sites
    .route("/sites", get(sites::list::<S, P, T>).post(sites::create::<S, P, T>))
    .route("/sites/{id}", get(sites::get_one::<S, P, T>))
    .route(
      "/sites/{id}/keywords",
      get(keywords::list::<S, P, T>).post(keywords::create::<S, P, T>),
    )
    // Keywords
    .route("/keywords/{id}", delete(keywords::delete_one::<S, P, T>))
    .route("/keywords/{id}/history", get(keywords::history::<S, P, T>))
    .with_state(state)
}

/// Load a site and check that `identity` owns it.
///
/// A site owned by someone else is reported exactly like a missing one.
pub(crate) async fn owned_site<S: RankStore>(
  store: &S,
  site_id: Uuid,
  identity: &Identity,
) -> Result<Site, ApiError> {
  store
    .get_site(site_id)
    .await
    .map_err(ApiError::store)?
    .filter(|site| site.user_id == identity.as_str())
    .ok_or_else(|| ApiError::NotFound(format!("site {site_id} not found")))
}
