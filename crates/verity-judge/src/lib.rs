//! # verity-judge
//!
//! Multi-oracle consensus judge.
//!
//! Oracles stake collateral and submit a value for a time-bucketed instance
//! of a game type. Each submission updates a running plurality leader, so
//! judging only has to split the registered oracles into those who agreed
//! with the leader and those who did not. Losers forfeit their whole balance;
//! winners get their collateral back plus an equal share of the forfeits, and
//! the integer-division remainder goes to the system account.
//!
//! ## Modules
//!
//! - [`config`] — judge constants
//! - [`timekeeper`] — bucket alignment and submission windows
//! - [`clock`] — current-time primitive
//! - [`ledger`] — available/locked balance accounting
//! - [`instance`] — per-instance registration, tally and leader
//! - [`registry`] — game type registration
//! - [`events`] — event sink seam
//! - [`engine`] — the operations

pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod instance;
pub mod ledger;
pub mod registry;
pub mod timekeeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::JudgeConfig;
pub use engine::{CallContext, Engine, Judgement, Settlement, Submission, SubmitReceipt};
pub use events::{EventSink, NullSink, RecordingSink};
pub use instance::InstanceHeader;
pub use registry::GameTypeRecord;
pub use timekeeper::{TimeKeeper, WindowPosition};

use verity_store::StoreError;
use verity_types::{AccountId, Amount, BucketTs, GameTypeId};

/// Coarse classification of a [`JudgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller may not act for the named account.
    Authorization,
    /// The request is malformed or mistimed.
    Validation,
    /// The request conflicts with existing state.
    StateConflict,
    /// A balance is too low.
    InsufficientResource,
    /// Storage, codec or arithmetic fault.
    Internal,
}

/// Error types for judge operations.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// The authenticated caller is not the account named in the request.
    #[error("caller {caller} may not act for {account}")]
    Unauthorized {
        /// Authenticated caller.
        caller: AccountId,
        /// Account named in the request.
        account: AccountId,
    },

    /// Timestamp is not aligned to a bucket boundary.
    #[error("timestamp {ts} is not a bucket boundary")]
    InvalidBucket {
        /// The rejected timestamp.
        ts: BucketTs,
    },

    /// Submission arrived before or after its bucket's window.
    #[error("bucket {ts} is not open at {now} ({position:?})")]
    OutOfWindow {
        /// The bucket submitted to.
        ts: BucketTs,
        /// Current time.
        now: u64,
        /// Where `now` falls relative to the window.
        position: WindowPosition,
    },

    /// Stake attached to a submission is neither zero nor the collateral.
    #[error("stake amount {amount} must be 0 or {required}")]
    InvalidStakeAmount {
        /// Attached amount.
        amount: Amount,
        /// Collateral requirement.
        required: Amount,
    },

    /// Instance cannot be judged before its window closes.
    #[error("bucket {ts} cannot be judged before {deadline} (now {now})")]
    NotYetDue {
        /// The bucket.
        ts: BucketTs,
        /// First time judging is allowed.
        deadline: u64,
        /// Current time.
        now: u64,
    },

    /// Instance is already judged.
    #[error("instance {game_type}@{ts} already judged")]
    AlreadyJudged {
        /// Game type.
        game_type: GameTypeId,
        /// Bucket.
        ts: BucketTs,
    },

    /// Oracle already registered for the instance.
    #[error("oracle {oracle} already registered for {game_type}@{ts}")]
    AlreadyRegistered {
        /// The oracle.
        oracle: AccountId,
        /// Game type.
        game_type: GameTypeId,
        /// Bucket.
        ts: BucketTs,
    },

    /// Game type was already created.
    #[error("game type {game_type} is already live")]
    AlreadyLive {
        /// Game type.
        game_type: GameTypeId,
    },

    /// Game type was never created.
    #[error("game type {game_type} is not live")]
    UnknownGameType {
        /// Game type.
        game_type: GameTypeId,
    },

    /// Available balance is below what the operation needs.
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance {
        /// Amount needed.
        required: Amount,
        /// Amount available.
        available: Amount,
    },

    /// Arithmetic overflow in a balance or counter.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl JudgeError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            JudgeError::Unauthorized { .. } => ErrorKind::Authorization,
            JudgeError::InvalidBucket { .. }
            | JudgeError::OutOfWindow { .. }
            | JudgeError::InvalidStakeAmount { .. }
            | JudgeError::NotYetDue { .. } => ErrorKind::Validation,
            JudgeError::AlreadyJudged { .. }
            | JudgeError::AlreadyRegistered { .. }
            | JudgeError::AlreadyLive { .. }
            | JudgeError::UnknownGameType { .. } => ErrorKind::StateConflict,
            JudgeError::InsufficientBalance { .. } => ErrorKind::InsufficientResource,
            JudgeError::Overflow(_) | JudgeError::InvalidConfig(_) | JudgeError::Store(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Stable upper-case name for the error, used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            JudgeError::Unauthorized { .. } => "UNAUTHORIZED",
            JudgeError::InvalidBucket { .. } => "INVALID_BUCKET",
            JudgeError::OutOfWindow { .. } => "OUT_OF_WINDOW",
            JudgeError::InvalidStakeAmount { .. } => "INVALID_STAKE_AMOUNT",
            JudgeError::NotYetDue { .. } => "NOT_YET_DUE",
            JudgeError::AlreadyJudged { .. } => "ALREADY_JUDGED",
            JudgeError::AlreadyRegistered { .. } => "ALREADY_REGISTERED",
            JudgeError::AlreadyLive { .. } => "ALREADY_LIVE",
            JudgeError::UnknownGameType { .. } => "UNKNOWN_GAME_TYPE",
            JudgeError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            JudgeError::Overflow(_) => "OVERFLOW",
            JudgeError::InvalidConfig(_) => "INVALID_CONFIG",
            JudgeError::Store(_) => "STORE_ERROR",
        }
    }
}

/// Convenience result type for judge operations.
pub type Result<T> = std::result::Result<T, JudgeError>;
