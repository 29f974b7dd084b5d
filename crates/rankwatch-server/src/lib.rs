//! Rankwatch server: configuration, authentication and HTTP wiring.
//!
//! The binary in `main.rs` loads a [`ServerConfig`], opens the store, builds
//! the search client and hands everything to [`router`].

pub mod auth;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use rankwatch_api::{ApiState, api_router};
use rankwatch_checker::{BatchOptions, Pacer};
use rankwatch_core::{rank::DEFAULT_RESULT_WINDOW, search::SearchProvider, store::RankStore};
use rankwatch_search::{BRAVE_API_URL, BraveConfig};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, UserCredential, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RANKWATCH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Brave subscription token.
  pub search_api_key:   String,
  #[serde(default = "default_search_base_url")]
  pub search_base_url:  String,
  #[serde(default = "default_result_window")]
  pub result_window:    usize,
  #[serde(default = "default_request_delay_ms")]
  pub request_delay_ms: u64,
  #[serde(default)]
  pub users:            Vec<UserCredential>,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("rankwatch.db") }
fn default_search_base_url() -> String { BRAVE_API_URL.into() }
fn default_result_window() -> usize { DEFAULT_RESULT_WINDOW }
fn default_request_delay_ms() -> u64 { 1000 }

impl ServerConfig {
  pub fn batch_options(&self) -> BatchOptions {
    BatchOptions {
      result_window: self.result_window,
      delay:         Duration::from_millis(self.request_delay_ms),
    }
  }

  pub fn brave_config(&self) -> BraveConfig {
    BraveConfig {
      base_url: self.search_base_url.clone(),
      ..BraveConfig::new(self.search_api_key.clone())
    }
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig { users: self.users.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: the authenticated API under `/api` and
/// an open `/health` check.
pub fn router<S, P, T>(state: ApiState<S, P, T>, auth: Arc<AuthConfig>) -> Router
where
  S: RankStore + 'static,
  P: SearchProvider + 'static,
  T: Pacer + 'static,
{
  let api = api_router(state).layer(middleware::from_fn_with_state(auth, require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
