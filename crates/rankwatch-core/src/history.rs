//! Rank movement between the two most recent observations of a keyword.

use serde::{Deserialize, Serialize};

use crate::rank::RankObservation;

/// Number of observations shown in a keyword's history by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

/// Direction and size of the latest rank change.
///
/// A smaller position is better, so moving from #8 to #5 is `Up(3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "direction", content = "change", rename_all = "snake_case")]
pub enum Trend {
  Up(u32),
  Down(u32),
  Same,
  /// Fewer than two comparable observations.
  New,
}

/// Compute the trend from observations ordered newest first.
///
/// If either of the two latest observations is absent there is nothing to
/// compare and the keyword is reported as [`Trend::New`].
pub fn rank_trend(observations: &[RankObservation]) -> Trend {
  let [latest, previous, ..] = observations else {
    return Trend::New;
  };

  let (Some(latest), Some(previous)) =
    (latest.rank.position(), previous.rank.position())
  else {
    return Trend::New;
  };

  match previous.cmp(&latest) {
    std::cmp::Ordering::Greater => Trend::Up(previous - latest),
    std::cmp::Ordering::Less => Trend::Down(latest - previous),
    std::cmp::Ordering::Equal => Trend::Same,
  }
}
