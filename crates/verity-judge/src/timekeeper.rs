//! Bucket alignment and submission windows.
//!
//! A bucket timestamp `ts` is valid iff `ts >= starting_epoch` and
//! `(ts - starting_epoch) % bucket_width == 0`. The bucket's window is
//! `[ts, ts + bucket_width)`; judging becomes possible at the window's end.

use serde::{Deserialize, Serialize};
use verity_types::BucketTs;

use crate::{JudgeConfig, JudgeError, Result};

/// Where a point in time falls relative to a bucket's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPosition {
    /// `now < ts`.
    TooEarly,
    /// `ts <= now < ts + bucket_width`.
    InWindow,
    /// `now >= ts + bucket_width`.
    Expired,
}

/// Pure bucket arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeKeeper {
    starting_epoch: BucketTs,
    bucket_width: u64,
}

impl TimeKeeper {
    /// Create a timekeeper.
    pub fn new(starting_epoch: BucketTs, bucket_width: u64) -> Self {
        Self {
            starting_epoch,
            bucket_width,
        }
    }

    /// Timekeeper for the constants in `config`.
    pub fn from_config(config: &JudgeConfig) -> Self {
        Self::new(config.starting_epoch, config.bucket_width)
    }

    /// Whether `ts` is a bucket boundary.
    pub fn is_bucket(&self, ts: BucketTs) -> bool {
        ts.checked_sub(self.starting_epoch)
            .and_then(|offset| offset.checked_rem(self.bucket_width))
            == Some(0)
    }

    /// Reject timestamps that are not bucket boundaries.
    ///
    /// # Errors
    ///
    /// - [`JudgeError::InvalidBucket`] if `ts` is before the epoch or misaligned
    pub fn validate_bucket(&self, ts: BucketTs) -> Result<()> {
        if self.is_bucket(ts) {
            Ok(())
        } else {
            Err(JudgeError::InvalidBucket { ts })
        }
    }

    /// Classify `now` against the window of bucket `ts`.
    pub fn classify(&self, ts: BucketTs, now: u64) -> WindowPosition {
        if now < ts {
            WindowPosition::TooEarly
        } else if now >= self.deadline(ts) {
            WindowPosition::Expired
        } else {
            WindowPosition::InWindow
        }
    }

    /// End of the window of bucket `ts`. Saturates at `u64::MAX`.
    pub fn deadline(&self, ts: BucketTs) -> u64 {
        ts.saturating_add(self.bucket_width)
    }

    /// Whether bucket `ts` may be judged at `now`.
    pub fn is_due(&self, ts: BucketTs, now: u64) -> bool {
        now >= self.deadline(ts)
    }

    /// The bucket immediately before `ts`, if it exists.
    pub fn previous_bucket(&self, ts: BucketTs) -> Option<BucketTs> {
        ts.checked_sub(self.bucket_width)
            .filter(|prev| self.is_bucket(*prev))
    }
}
