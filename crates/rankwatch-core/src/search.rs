//! The [`SearchProvider`] trait and the result type it yields.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// One organic result returned by a web-search provider, in ranked order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
  pub url:   String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
}

impl SearchHit {
  pub fn new(url: impl Into<String>) -> Self {
    Self { url: url.into(), title: None }
  }
}

/// Abstraction over an external web-search API.
///
/// Implementations issue exactly one upstream request per call and never
/// retry; retry policy belongs to the caller. Any non-success response is
/// reported as `Self::Error`.
pub trait SearchProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Short provider name used in logs.
  fn name(&self) -> &'static str;

  /// Run `query` and return up to `result_window` results in ranked order.
  fn search<'a>(
    &'a self,
    query: &'a str,
    result_window: usize,
  ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send + 'a;
}
