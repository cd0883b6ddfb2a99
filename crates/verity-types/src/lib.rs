//! # verity-types
//!
//! Shared domain types used across the Verity workspace: identities, game
//! type ids, the scalar aliases every crate agrees on, and the events the
//! judge emits.

pub mod events;
pub mod identity;

pub use identity::{AccountId, GameTypeId, ParseAccountIdError};

/// Start of a submission bucket, in Unix seconds.
pub type BucketTs = u64;

/// Collateral and balance amounts, in the smallest ledger unit.
pub type Amount = u64;

/// A reported value (e.g. a price quoted in integer minor units).
pub type PredictionValue = i64;

/// Length of an [`AccountId`] in bytes.
pub const ACCOUNT_ID_LEN: usize = 20;

/// Default collateral staked per registration.
pub const DEFAULT_COLLATERAL_REQUIREMENT: Amount = 5;

/// Default bucket width in seconds (8 minutes).
pub const DEFAULT_BUCKET_WIDTH: u64 = 480;

/// Default bucket alignment origin (2018-02-25 07:44:32 UTC).
pub const DEFAULT_STARTING_EPOCH: BucketTs = 1_519_544_672;

/// Default system account receiving rounding remainders.
pub const DEFAULT_SYSTEM_ACCOUNT: AccountId = AccountId([
    0x7a, 0x5d, 0x16, 0x10, 0xad, 0xce, 0xc3, 0x51, 0x1a, 0x26, 0x46, 0x76, 0xfa, 0x1a, 0x73,
    0xa4, 0x45, 0xa0, 0x33, 0xef,
]);
