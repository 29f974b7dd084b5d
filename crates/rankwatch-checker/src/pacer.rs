//! Pauses between consecutive provider requests.

use std::{future::Future, time::Duration};

/// Waits between keywords of a batch.
pub trait Pacer: Send + Sync {
  fn pause(&self, delay: Duration) -> impl Future<Output = ()> + Send + '_;
}

/// Suspends the current task with [`tokio::time::sleep`]; other tasks keep
/// running.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
  async fn pause(&self, delay: Duration) {
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
  }
}
