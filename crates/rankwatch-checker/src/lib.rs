//! The batch rank checker.
//!
//! [`RankChecker::check_all`] walks every keyword of a site one at a time:
//! search, extract the rank, append an observation, pause, repeat. A failure
//! on one keyword is logged and skipped; only missing input, an empty keyword
//! list, or a failure to list keywords aborts the batch.

mod checker;
mod pacer;
mod report;

pub mod error;

pub use checker::{BatchOptions, RankChecker};
pub use error::{CheckError, KeywordFailure};
pub use pacer::{Pacer, TokioPacer};
pub use report::{BatchReport, KeywordRank};
