//! Judge constants.

use serde::{Deserialize, Serialize};
use verity_types::{
    AccountId, Amount, BucketTs, DEFAULT_BUCKET_WIDTH, DEFAULT_COLLATERAL_REQUIREMENT,
    DEFAULT_STARTING_EPOCH, DEFAULT_SYSTEM_ACCOUNT,
};

use crate::{JudgeError, Result};

/// Constants that shape every judge operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Collateral locked per registration; also the only accepted non-zero
    /// deposit attached to a submission.
    #[serde(default = "default_collateral_requirement")]
    pub collateral_requirement: Amount,
    /// Width of one submission window in seconds.
    #[serde(default = "default_bucket_width")]
    pub bucket_width: u64,
    /// Bucket alignment origin.
    #[serde(default = "default_starting_epoch")]
    pub starting_epoch: BucketTs,
    /// Account credited with rounding remainders.
    #[serde(default = "default_system_account")]
    pub system_account: AccountId,
    /// Reject submissions for game types that were never created.
    #[serde(default)]
    pub require_live_game_type: bool,
}

fn default_collateral_requirement() -> Amount {
    DEFAULT_COLLATERAL_REQUIREMENT
}

fn default_bucket_width() -> u64 {
    DEFAULT_BUCKET_WIDTH
}

fn default_starting_epoch() -> BucketTs {
    DEFAULT_STARTING_EPOCH
}

fn default_system_account() -> AccountId {
    DEFAULT_SYSTEM_ACCOUNT
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            collateral_requirement: default_collateral_requirement(),
            bucket_width: default_bucket_width(),
            starting_epoch: default_starting_epoch(),
            system_account: default_system_account(),
            require_live_game_type: false,
        }
    }
}

impl JudgeConfig {
    /// Reject configurations the judge cannot run with.
    ///
    /// # Errors
    ///
    /// - [`JudgeError::InvalidConfig`] if `bucket_width` or
    ///   `collateral_requirement` is zero
    pub fn validate(&self) -> Result<()> {
        if self.bucket_width == 0 {
            return Err(JudgeError::InvalidConfig(
                "bucket_width must be positive".to_string(),
            ));
        }
        if self.collateral_requirement == 0 {
            return Err(JudgeError::InvalidConfig(
                "collateral_requirement must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
