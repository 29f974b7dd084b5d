//! [`RankChecker`]: sequential, rate-limited rank checks for one site.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use chrono::Utc;
use futures::FutureExt as _;
use rankwatch_core::{
  rank::{DEFAULT_RESULT_WINDOW, extract_rank_within},
  search::SearchProvider,
  site::Keyword,
  store::RankStore,
};
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
  BatchReport, CheckError, KeywordFailure, KeywordRank,
  pacer::{Pacer, TokioPacer},
};

/// Tunables for a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
  /// Results requested from the provider and examined per keyword.
  pub result_window: usize,
  /// Pause between consecutive keywords. Not applied after the last one.
  pub delay:         Duration,
}

impl Default for BatchOptions {
  fn default() -> Self {
    Self {
      result_window: DEFAULT_RESULT_WINDOW,
      delay:         Duration::from_millis(1000),
    }
  }
}

/// Checks every keyword of a site against a [`SearchProvider`] and appends
/// the results to a [`RankStore`].
///
/// Keywords are processed strictly one after another. Separate batches share
/// no mutable state and may run concurrently.
pub struct RankChecker<S, P, T = TokioPacer> {
  store:    Arc<S>,
  provider: Arc<P>,
  pacer:    T,
  options:  BatchOptions,
}

impl<S, P> RankChecker<S, P> {
  pub fn new(store: Arc<S>, provider: Arc<P>, options: BatchOptions) -> Self {
    Self { store, provider, pacer: TokioPacer, options }
  }
}

impl<S, P, T> RankChecker<S, P, T> {
  /// Replace the pacer used between keywords.
  pub fn with_pacer<U>(self, pacer: U) -> RankChecker<S, P, U> {
    RankChecker {
      store:    self.store,
      provider: self.provider,
      pacer,
      options:  self.options,
    }
  }

  pub fn options(&self) -> &BatchOptions { &self.options }
}

impl<S, P, T> RankChecker<S, P, T>
where
  S: RankStore,
  P: SearchProvider,
  T: Pacer,
{
  /// Run one full batch for `site_id`, matching results against `domain`.
  pub async fn check_all(
    &self,
    site_id: Uuid,
    domain: &str,
  ) -> Result<BatchReport, CheckError> {
    self.check_all_until(site_id, domain, None).await
  }

  /// Like [`check_all`](Self::check_all), but stops before starting a new
  /// keyword once `deadline` has passed. A keyword that has started is always
  /// finished. The report is marked `truncated` if anything was left over.
  pub async fn check_all_until(
    &self,
    site_id: Uuid,
    domain: &str,
    deadline: Option<Instant>,
  ) -> Result<BatchReport, CheckError> {
    let domain = domain.trim();
    if domain.is_empty() {
      return Err(CheckError::Validation("domain must not be empty".into()));
    }

    let keywords = self
      .store
      .list_keywords(site_id)
      .await
      .map_err(|e| CheckError::Store(Box::new(e)))?;

    if keywords.is_empty() {
      return Err(CheckError::NoKeywords(site_id));
    }

    tracing::info!(
      %site_id,
      domain,
      keywords = keywords.len(),
      provider = self.provider.name(),
      "starting rank check"
    );

    let mut report = BatchReport::new(site_id, self.options.result_window);

    for (index, keyword) in keywords.iter().enumerate() {
      if index > 0 {
        self.pacer.pause(self.options.delay).await;
      }

      // Checked after the pause so a deadline that expires while waiting
      // still stops the next request.
      if deadline.is_some_and(|d| Instant::now() >= d) {
        tracing::warn!(
          %site_id,
          remaining = keywords.len() - index,
          "deadline reached; stopping rank check"
        );
        report.truncated = true;
        break;
      }

      let outcome = AssertUnwindSafe(self.check_keyword(keyword, domain))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(KeywordFailure::Unexpected(panic_message(&*panic))));

      match outcome {
        Ok(entry) => report.results.push(entry),
        Err(failure) => {
          tracing::warn!(
            keyword = %keyword.text,
            keyword_id = %keyword.keyword_id,
            error = %failure,
            "skipping keyword"
          );
          report.skipped_count += 1;
        }
      }
    }

    report.checked_count = report.results.len();
    tracing::info!(
      %site_id,
      checked = report.checked_count,
      skipped = report.skipped_count,
      truncated = report.truncated,
      "rank check finished"
    );
    Ok(report)
  }

  /// Search, extract and persist a single keyword.
  ///
  /// A persistence failure is logged and reflected in
  /// [`KeywordRank::persisted`]; it does not drop the entry.
  async fn check_keyword(
    &self,
    keyword: &Keyword,
    domain: &str,
  ) -> Result<KeywordRank, KeywordFailure> {
    let window = self.options.result_window;

    let hits = self
      .provider
      .search(&keyword.text, window)
      .await
      .map_err(|e| KeywordFailure::Provider(Box::new(e)))?;

    let rank = extract_rank_within(&hits, domain, window);

    let persisted = match self
      .store
      .record_observation(keyword.keyword_id, rank, Utc::now())
      .await
    {
      Ok(_) => true,
      Err(e) => {
        tracing::warn!(
          keyword = %keyword.text,
          keyword_id = %keyword.keyword_id,
          error = %e,
          "failed to save rank observation"
        );
        false
      }
    };

    tracing::debug!(keyword = %keyword.text, %rank, "keyword checked");

    Ok(KeywordRank {
      keyword_id: keyword.keyword_id,
      keyword: keyword.text.clone(),
      rank,
      persisted,
    })
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_owned()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "panic with non-string payload".to_owned()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::{HashMap, HashSet},
    io,
    num::NonZeroU32,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use chrono::{DateTime, Utc};
  use rankwatch_core::{
    rank::{Rank, RankObservation},
    search::SearchHit,
    site::{NewSite, Site},
  };
  use rankwatch_store_sqlite::SqliteStore;

  use super::*;

  // ── Stubs ───────────────────────────────────────────────────────────────────

  /// In-memory store holding the keywords of a single site.
  #[derive(Default)]
  struct StubStore {
    keywords:     Vec<Keyword>,
    fail_listing: bool,
    /// Keyword texts whose observation cannot be saved.
    fail_saving:  HashSet<String>,
    recorded:     Mutex<Vec<(Uuid, Rank)>>,
  }

  impl StubStore {
    fn with_keywords(site_id: Uuid, texts: &[&str]) -> Self {
      let keywords = texts
        .iter()
        .map(|t| Keyword {
          keyword_id: Uuid::new_v4(),
          site_id,
          text:       (*t).to_owned(),
          created_at: Utc::now(),
        })
        .collect();
      Self { keywords, ..Default::default() }
    }

    fn recorded(&self) -> Vec<(Uuid, Rank)> { self.recorded.lock().unwrap().clone() }
  }

  impl RankStore for StubStore {
    type Error = io::Error;

    async fn add_site(&self, _input: NewSite) -> io::Result<Site> {
      Err(io::Error::other("unsupported"))
    }

    async fn get_site(&self, _site_id: Uuid) -> io::Result<Option<Site>> { Ok(None) }

    async fn list_sites(&self, _user_id: &str) -> io::Result<Vec<Site>> { Ok(vec![]) }

    async fn add_keyword(&self, _site_id: Uuid, _text: String) -> io::Result<Keyword> {
      Err(io::Error::other("unsupported"))
    }

    async fn get_keyword(&self, keyword_id: Uuid) -> io::Result<Option<Keyword>> {
      Ok(self.keywords.iter().find(|k| k.keyword_id == keyword_id).cloned())
    }

    async fn list_keywords(&self, site_id: Uuid) -> io::Result<Vec<Keyword>> {
      if self.fail_listing {
        return Err(io::Error::other("database is locked"));
      }
      Ok(self.keywords.iter().filter(|k| k.site_id == site_id).cloned().collect())
    }

    async fn delete_keyword(&self, _keyword_id: Uuid) -> io::Result<bool> { Ok(false) }

    async fn record_observation(
      &self,
      keyword_id: Uuid,
      rank: Rank,
      observed_at: DateTime<Utc>,
    ) -> io::Result<RankObservation> {
      let text = self
        .keywords
        .iter()
        .find(|k| k.keyword_id == keyword_id)
        .map(|k| k.text.as_str())
        .unwrap_or_default();
      if self.fail_saving.contains(text) {
        return Err(io::Error::other("disk full"));
      }
      self.recorded.lock().unwrap().push((keyword_id, rank));
      Ok(RankObservation { observation_id: Uuid::new_v4(), keyword_id, rank, observed_at })
    }

    async fn list_observations(
      &self,
      _keyword_id: Uuid,
      _limit: usize,
    ) -> io::Result<Vec<RankObservation>> {
      Ok(vec![])
    }
  }

  enum Reply {
    Urls(Vec<&'static str>),
    Fail,
    Panic,
  }

  /// Provider answering from a fixed table keyed by query text.
  struct StubProvider {
    replies: HashMap<&'static str, Reply>,
    calls:   Mutex<Vec<(String, usize)>>,
  }

  impl StubProvider {
    fn new(replies: impl IntoIterator<Item = (&'static str, Reply)>) -> Self {
      Self { replies: replies.into_iter().collect(), calls: Mutex::new(vec![]) }
    }

    fn call_count(&self) -> usize { self.calls.lock().unwrap().len() }
  }

  impl SearchProvider for StubProvider {
    type Error = io::Error;

    fn name(&self) -> &'static str { "stub" }

    async fn search(&self, query: &str, result_window: usize) -> io::Result<Vec<SearchHit>> {
      self.calls.lock().unwrap().push((query.to_owned(), result_window));
      match self.replies.get(query) {
        Some(Reply::Urls(urls)) => Ok(urls.iter().map(|u| SearchHit::new(*u)).collect()),
        Some(Reply::Fail) | None => Err(io::Error::other("503 Service Unavailable")),
        Some(Reply::Panic) => panic!("provider blew up on {query}"),
      }
    }
  }

  #[derive(Default)]
  struct CountingPacer(AtomicUsize);

  impl Pacer for CountingPacer {
    async fn pause(&self, _delay: Duration) { self.0.fetch_add(1, Ordering::SeqCst); }
  }

  fn checker(
    store: &Arc<StubStore>,
    provider: &Arc<StubProvider>,
  ) -> RankChecker<StubStore, StubProvider, CountingPacer> {
    RankChecker::new(store.clone(), provider.clone(), BatchOptions::default())
      .with_pacer(CountingPacer::default())
  }

  fn found(p: u32) -> Rank { Rank::Found(NonZeroU32::new(p).unwrap()) }

  // ── Tests ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn checks_every_keyword_and_records_ranks() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["seo", "rank tracker"]));
    let provider = Arc::new(StubProvider::new([
      ("seo", Reply::Urls(vec!["https://a.com/x", "https://EXAMPLE.com/y"])),
      ("rank tracker", Reply::Urls(vec!["https://example.com/"])),
    ]));
    let checker = checker(&store, &provider);

    let report = checker.check_all(site_id, "example.com").await.unwrap();

    assert_eq!(report.checked_count, 2);
    assert_eq!(report.skipped_count, 0);
    assert!(!report.truncated);
    assert_eq!(report.results[0].keyword, "seo");
    assert_eq!(report.results[0].rank, found(2));
    assert_eq!(report.results[1].rank, found(1));
    assert!(report.results.iter().all(|r| r.persisted));
    assert_eq!(store.recorded().len(), 2);
  }

  #[tokio::test]
  async fn no_keywords_is_not_found_and_persists_nothing() {
    let store = Arc::new(StubStore::default());
    let provider = Arc::new(StubProvider::new([]));
    let checker = checker(&store, &provider);

    let site_id = Uuid::new_v4();
    let err = checker.check_all(site_id, "example.com").await.unwrap_err();

    assert!(matches!(err, CheckError::NoKeywords(id) if id == site_id));
    assert!(store.recorded().is_empty());
    assert_eq!(provider.call_count(), 0);
  }

  #[tokio::test]
  async fn provider_failure_skips_only_that_keyword() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["one", "two", "three"]));
    let provider = Arc::new(StubProvider::new([
      ("one", Reply::Urls(vec!["https://example.com"])),
      ("two", Reply::Fail),
      ("three", Reply::Urls(vec!["https://b.com", "https://example.com"])),
    ]));
    let checker = checker(&store, &provider);

    let report = checker.check_all(site_id, "example.com").await.unwrap();

    let keywords: Vec<_> = report.results.iter().map(|r| r.keyword.as_str()).collect();
    assert_eq!(keywords, ["one", "three"]);
    assert_eq!(report.checked_count, 2);
    assert_eq!(report.skipped_count, 1);
    assert!(store.recorded().len() <= 2);
  }

  #[tokio::test]
  async fn n_keywords_make_n_calls_and_n_minus_one_pauses() {
    let site_id = Uuid::new_v4();
    let texts = ["a", "b", "c", "d"];
    let store = Arc::new(StubStore::with_keywords(site_id, &texts));
    let provider = Arc::new(StubProvider::new(
      texts.map(|t| (t, Reply::Urls(vec!["https://x.com"]))),
    ));
    let checker = checker(&store, &provider);

    checker.check_all(site_id, "example.com").await.unwrap();

    assert_eq!(provider.call_count(), 4);
    assert_eq!(checker.pacer.0.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn single_keyword_never_pauses() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["solo"]));
    let provider = Arc::new(StubProvider::new([("solo", Reply::Urls(vec![]))]));
    let checker = checker(&store, &provider);

    checker.check_all(site_id, "example.com").await.unwrap();

    assert_eq!(checker.pacer.0.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn requests_the_configured_window() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["q"]));
    let provider = Arc::new(StubProvider::new([("q", Reply::Urls(vec![]))]));
    let checker = checker(&store, &provider);

    checker.check_all(site_id, "example.com").await.unwrap();

    assert_eq!(provider.calls.lock().unwrap()[0], ("q".to_owned(), 50));
  }

  #[tokio::test]
  async fn persistence_failure_keeps_entry_and_continues() {
    let site_id = Uuid::new_v4();
    let mut stub = StubStore::with_keywords(site_id, &["lost", "kept"]);
    stub.fail_saving.insert("lost".into());
    let store = Arc::new(stub);
    let provider = Arc::new(StubProvider::new([
      ("lost", Reply::Urls(vec!["https://example.com"])),
      ("kept", Reply::Urls(vec!["https://example.com"])),
    ]));
    let checker = checker(&store, &provider);

    let report = checker.check_all(site_id, "example.com").await.unwrap();

    assert_eq!(report.checked_count, 2);
    assert!(!report.results[0].persisted);
    assert!(report.results[1].persisted);
    assert_eq!(store.recorded().len(), 1);
  }

  #[tokio::test]
  async fn panic_inside_keyword_is_contained() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["boom", "fine"]));
    let provider = Arc::new(StubProvider::new([
      ("boom", Reply::Panic),
      ("fine", Reply::Urls(vec!["https://example.com"])),
    ]));
    let checker = checker(&store, &provider);

    let report = checker.check_all(site_id, "example.com").await.unwrap();

    assert_eq!(report.checked_count, 1);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.results[0].keyword, "fine");
  }

  #[tokio::test]
  async fn blank_domain_is_rejected_before_listing() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["q"]));
    let provider = Arc::new(StubProvider::new([]));
    let checker = checker(&store, &provider);

    let err = checker.check_all(site_id, "   ").await.unwrap_err();
    assert!(matches!(err, CheckError::Validation(_)));
    assert_eq!(provider.call_count(), 0);
  }

  #[tokio::test]
  async fn listing_failure_aborts_batch() {
    let store = Arc::new(StubStore { fail_listing: true, ..Default::default() });
    let provider = Arc::new(StubProvider::new([]));
    let checker = checker(&store, &provider);

    let err = checker.check_all(Uuid::new_v4(), "example.com").await.unwrap_err();
    assert!(matches!(err, CheckError::Store(_)));
  }

  #[tokio::test]
  async fn passed_deadline_stops_before_next_keyword() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["a", "b"]));
    let provider = Arc::new(StubProvider::new([
      ("a", Reply::Urls(vec![])),
      ("b", Reply::Urls(vec![])),
    ]));
    let checker = checker(&store, &provider);

    let report = checker
      .check_all_until(site_id, "example.com", Some(Instant::now()))
      .await
      .unwrap();

    assert!(report.truncated);
    assert_eq!(report.checked_count, 0);
    assert_eq!(provider.call_count(), 0);
  }

  #[tokio::test]
  async fn deadline_passing_during_pause_stops_next_request() {
    let site_id = Uuid::new_v4();
    let store = Arc::new(StubStore::with_keywords(site_id, &["a", "b"]));
    let provider = Arc::new(StubProvider::new([
      ("a", Reply::Urls(vec![])),
      ("b", Reply::Urls(vec![])),
    ]));
    let options = BatchOptions { delay: Duration::from_millis(200), ..BatchOptions::default() };
    let checker = RankChecker::new(store.clone(), provider.clone(), options);

    let deadline = Instant::now() + Duration::from_millis(50);
    let report = checker
      .check_all_until(site_id, "example.com", Some(deadline))
      .await
      .unwrap();

    assert!(report.truncated);
    assert_eq!(report.checked_count, 1);
    assert_eq!(report.skipped_count, 0);
    assert_eq!(provider.call_count(), 1);
  }

  #[tokio::test]
  async fn absent_rank_is_persisted_as_absent() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let site = store
      .add_site(NewSite::new("alice", "nomatch.com", None).unwrap())
      .await
      .unwrap();
    let kw = store.add_keyword(site.site_id, "widgets".into()).await.unwrap();
    let provider = Arc::new(StubProvider::new([(
      "widgets",
      Reply::Urls(vec!["https://a.com", "https://b.com"]),
    )]));
    let checker = RankChecker::new(store.clone(), provider, BatchOptions::default())
      .with_pacer(CountingPacer::default());

    let report = checker.check_all(site.site_id, &site.domain).await.unwrap();
    assert_eq!(report.results[0].rank, Rank::Absent);

    let history = store.list_observations(kw.keyword_id, 30).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].rank, Rank::Absent);
  }
}
