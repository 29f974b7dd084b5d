//! Brave Web Search API client.

use std::time::Duration;

use rankwatch_core::search::{SearchHit, SearchProvider};
use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result};

/// Default base URL; the client appends `/search`.
pub const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web";

/// Connection settings for the Brave Search API.
#[derive(Debug, Clone)]
pub struct BraveConfig {
  pub base_url: String,
  /// Sent as the `X-Subscription-Token` header.
  pub api_key:  String,
  pub timeout:  Duration,
}

impl BraveConfig {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      base_url: BRAVE_API_URL.to_owned(),
      api_key:  api_key.into(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async client for the Brave Web Search API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct BraveClient {
  client: Client,
  config: BraveConfig,
}

impl BraveClient {
  pub fn new(config: BraveConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/search", self.config.base_url.trim_end_matches('/'))
  }

  /// `GET {base}/search?q=<query>&count=<window>`
  ///
  /// One request, no retry. The query string is URL-encoded by `reqwest`.
  pub async fn web_search(&self, query: &str, count: usize) -> Result<Vec<SearchHit>> {
    let count = count.to_string();
    let resp = self
      .client
      .get(self.url())
      .header("Accept", "application/json")
      .header("X-Subscription-Token", &self.config.api_key)
      .query(&[("q", query), ("count", count.as_str())])
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("unknown error").to_owned(),
        text => text.to_owned(),
      };
      return Err(Error::Status { status: status.as_u16(), message });
    }

    let body = resp.text().await?;
    let parsed: BraveResponse = serde_json::from_str(&body)?;
    let hits: Vec<SearchHit> = parsed
      .web
      .map(|web| web.results)
      .unwrap_or_default()
      .into_iter()
      .map(|r| SearchHit { url: r.url.unwrap_or_default(), title: r.title })
      .collect();

    tracing::debug!(query, results = hits.len(), "brave search complete");
    Ok(hits)
  }
}

impl SearchProvider for BraveClient {
  type Error = Error;

  fn name(&self) -> &'static str { "brave" }

  async fn search(&self, query: &str, result_window: usize) -> Result<Vec<SearchHit>> {
    self.web_search(query, result_window).await
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BraveResponse {
  #[serde(default)]
  web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
  #[serde(default)]
  results: Vec<BraveResult>,
}

/// A result without a URL (missing or `null`) keeps its slot in the ranking
/// but never matches.
#[derive(Debug, Deserialize)]
struct BraveResult {
  #[serde(default)]
  url:   Option<String>,
  #[serde(default)]
  title: Option<String>,
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
  };

  use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
  };
  use serde_json::{Value, json};
  use tokio::net::TcpListener;

  use super::*;

  #[derive(Clone, Default)]
  struct Seen {
    params: Arc<Mutex<Vec<HashMap<String, String>>>>,
    tokens: Arc<Mutex<Vec<String>>>,
  }

  /// Serve `reply` for every `/search` request on an ephemeral port and
  /// return the base URL plus a record of received requests.
  async fn fake_brave(reply: (StatusCode, Value)) -> (String, Seen) {
    let seen = Seen::default();

    async fn handler(
      State((seen, reply)): State<(Seen, (StatusCode, Value))>,
      headers: HeaderMap,
      Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
      seen.params.lock().unwrap().push(params);
      if let Some(token) = headers.get("x-subscription-token") {
        seen.tokens.lock().unwrap().push(token.to_str().unwrap().to_owned());
      }
      (reply.0, Json(reply.1))
    }

    let app = Router::new()
      .route("/search", get(handler))
      .with_state((seen.clone(), reply));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (format!("http://{addr}"), seen)
  }

  fn client(base_url: &str) -> BraveClient {
    BraveClient::new(BraveConfig {
      base_url: base_url.to_owned(),
      api_key:  "test-key".to_owned(),
      timeout:  Duration::from_secs(5),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn returns_urls_in_order() {
    let body = json!({
      "web": { "results": [
        { "title": "A", "url": "https://a.com/x" },
        { "title": "B", "url": "https://EXAMPLE.com/y" }
      ]}
    });
    let (base, _) = fake_brave((StatusCode::OK, body)).await;

    let hits = client(&base).search("rank tracker", 50).await.unwrap();
    let urls: Vec<_> = hits.iter().map(|h| h.url.as_str()).collect();
    assert_eq!(urls, ["https://a.com/x", "https://EXAMPLE.com/y"]);
    assert_eq!(hits[0].title.as_deref(), Some("A"));
  }

  #[tokio::test]
  async fn sends_query_window_and_token() {
    let (base, seen) = fake_brave((StatusCode::OK, json!({}))).await;

    client(&base).search("c++ & rust?", 50).await.unwrap();

    let params = seen.params.lock().unwrap();
    assert_eq!(params[0]["q"], "c++ & rust?");
    assert_eq!(params[0]["count"], "50");
    assert_eq!(seen.tokens.lock().unwrap()[0], "test-key");
  }

  #[tokio::test]
  async fn missing_web_section_is_empty() {
    let (base, _) = fake_brave((StatusCode::OK, json!({ "type": "search" }))).await;
    let hits = client(&base).search("anything", 50).await.unwrap();
    assert!(hits.is_empty());
  }

  #[tokio::test]
  async fn result_without_url_keeps_its_slot() {
    let body = json!({ "web": { "results": [ { "title": "no url" }, { "url": "https://b.com" } ] } });
    let (base, _) = fake_brave((StatusCode::OK, body)).await;
    let hits = client(&base).search("q", 50).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].url, "");
  }

  #[tokio::test]
  async fn null_url_keeps_its_slot() {
    let body = json!({ "web": { "results": [ { "url": null }, { "url": "https://example.com" } ] } });
    let (base, _) = fake_brave((StatusCode::OK, body)).await;
    let hits = client(&base).search("q", 50).await.unwrap();
    let urls: Vec<_> = hits.iter().map(|h| h.url.as_str()).collect();
    assert_eq!(urls, ["", "https://example.com"]);
  }

  #[tokio::test]
  async fn non_success_status_is_an_error() {
    let body = json!({ "error": "quota exceeded" });
    let (base, _) = fake_brave((StatusCode::TOO_MANY_REQUESTS, body)).await;

    let err = client(&base).search("q", 50).await.unwrap_err();
    match err {
      Error::Status { status, message } => {
        assert_eq!(status, 429);
        assert!(message.contains("quota exceeded"), "message: {message}");
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test]
  async fn unreachable_provider_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}")).search("q", 50).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
  }

  #[test]
  fn url_joins_base_without_double_slash() {
    let c = client("https://api.example.test/v1/");
    assert_eq!(c.url(), "https://api.example.test/v1/search");
  }
}
