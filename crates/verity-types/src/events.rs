//! Notifications produced by the judge.
//!
//! Events are only emitted for operations that committed; a rejected
//! operation never produces one.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, BucketTs, GameTypeId, PredictionValue};

/// An event emitted after a committed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    /// A new game type went live.
    GameTypeCreated {
        game_type: GameTypeId,
        creator: AccountId,
        created_at: u64,
    },
    /// An oracle registered for an instance and its value was tallied.
    PredictionAccepted {
        game_type: GameTypeId,
        bucket_ts: BucketTs,
        oracle: AccountId,
        slot: u32,
        leader_value: PredictionValue,
        leader_count: u64,
    },
    /// An instance was judged and its bounty distributed.
    JudgingComplete {
        game_type: GameTypeId,
        bucket_ts: BucketTs,
        n_correct: u64,
        leader: PredictionValue,
        total_bounty: Amount,
    },
}

impl Event {
    /// Stable event name, matching the serialized `event_type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::GameTypeCreated { .. } => "game_type_created",
            Event::PredictionAccepted { .. } => "prediction_accepted",
            Event::JudgingComplete { .. } => "judging_complete",
        }
    }
}
