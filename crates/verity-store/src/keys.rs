//! Composite key encoding.
//!
//! Every key starts with a one-byte tag naming its shape. Integers are
//! fixed-width big-endian, identities are their fixed 20 bytes, and strings
//! carry a `u32` big-endian length prefix. Two keys therefore encode to the
//! same bytes only if they have the same shape and the same fields.
//!
//! ```text
//! game_type   : 0x01 | len | game
//! instance    : 0x02 | len | game | ts
//! slot        : 0x03 | len | game | ts | slot
//! member      : 0x04 | len | game | ts | oracle
//! prediction  : 0x05 | len | game | ts | oracle
//! vote_count  : 0x06 | len | game | ts | value
//! available   : 0x07 | oracle
//! locked      : 0x08 | oracle
//! ```

use verity_types::{AccountId, BucketTs, GameTypeId, PredictionValue};

/// A typed key into the judge's namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKey<'a> {
    /// Game type registration record.
    GameType(&'a GameTypeId),
    /// Instance header record.
    Instance(&'a GameTypeId, BucketTs),
    /// Oracle registered in the given slot of an instance.
    Slot(&'a GameTypeId, BucketTs, u32),
    /// Membership marker for an oracle in an instance.
    Member(&'a GameTypeId, BucketTs, &'a AccountId),
    /// Value submitted by an oracle for an instance.
    Prediction(&'a GameTypeId, BucketTs, &'a AccountId),
    /// Number of votes for a value in an instance.
    VoteCount(&'a GameTypeId, BucketTs, PredictionValue),
    /// Available balance of an account.
    Available(&'a AccountId),
    /// Locked balance of an account.
    Locked(&'a AccountId),
}

impl StoreKey<'_> {
    /// The shape tag written as the first key byte.
    pub fn tag(&self) -> u8 {
        match self {
            StoreKey::GameType(..) => 0x01,
            StoreKey::Instance(..) => 0x02,
            StoreKey::Slot(..) => 0x03,
            StoreKey::Member(..) => 0x04,
            StoreKey::Prediction(..) => 0x05,
            StoreKey::VoteCount(..) => 0x06,
            StoreKey::Available(..) => 0x07,
            StoreKey::Locked(..) => 0x08,
        }
    }

    /// Encode the key to its raw bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.push(self.tag());
        match *self {
            StoreKey::GameType(game) => {
                put_str(&mut out, game.as_str());
            }
            StoreKey::Instance(game, ts) => {
                put_str(&mut out, game.as_str());
                out.extend_from_slice(&ts.to_be_bytes());
            }
            StoreKey::Slot(game, ts, slot) => {
                put_str(&mut out, game.as_str());
                out.extend_from_slice(&ts.to_be_bytes());
                out.extend_from_slice(&slot.to_be_bytes());
            }
            StoreKey::Member(game, ts, oracle) | StoreKey::Prediction(game, ts, oracle) => {
                put_str(&mut out, game.as_str());
                out.extend_from_slice(&ts.to_be_bytes());
                out.extend_from_slice(oracle.as_bytes());
            }
            StoreKey::VoteCount(game, ts, value) => {
                put_str(&mut out, game.as_str());
                out.extend_from_slice(&ts.to_be_bytes());
                out.extend_from_slice(&value.to_be_bytes());
            }
            StoreKey::Available(account) | StoreKey::Locked(account) => {
                out.extend_from_slice(account.as_bytes());
            }
        }
        out
    }
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    // Game type ids are short; anything beyond u32::MAX bytes cannot be held
    // in memory as a key anyway.
    let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}
