//! Per-instance state: registrations, predictions, tally and leader.
//!
//! An instance is keyed by `(game_type, bucket_ts)`. Its header is one CBOR
//! record; the registration list, membership set, predictions and vote
//! counts each live under their own keys so a submission touches only what
//! it changes. A missing header reads as a fresh, empty instance.

use serde::{Deserialize, Serialize};
use verity_store::{codec, KvRead, Overlay, StoreKey};
use verity_types::{AccountId, BucketTs, GameTypeId, PredictionValue};

use crate::{JudgeError, Result};

/// Summary record of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceHeader {
    /// Set once by judging, never cleared.
    pub judged: bool,
    /// Number of registered oracles; also the next free slot.
    pub oracle_count: u32,
    /// Value with the highest vote count (first to reach it wins ties).
    pub leader_value: PredictionValue,
    /// Vote count of `leader_value`.
    pub leader_count: u64,
    /// Oracles that agreed with the leader. Meaningful only when judged.
    pub correct_count: u64,
}

/// Read the header, or a default one if the instance has never been touched.
pub fn header<R: KvRead + ?Sized>(
    store: &R,
    game: &GameTypeId,
    ts: BucketTs,
) -> Result<InstanceHeader> {
    match store.get(&StoreKey::Instance(game, ts).encode())? {
        Some(bytes) => Ok(codec::from_slice(&bytes)?),
        None => Ok(InstanceHeader::default()),
    }
}

/// Buffer a header write.
pub fn save_header(
    overlay: &mut Overlay<'_>,
    game: &GameTypeId,
    ts: BucketTs,
    header: &InstanceHeader,
) -> Result<()> {
    overlay.put(StoreKey::Instance(game, ts).encode(), codec::to_vec(header)?);
    Ok(())
}

/// Whether `oracle` is registered for the instance.
pub fn is_member<R: KvRead + ?Sized>(
    store: &R,
    game: &GameTypeId,
    ts: BucketTs,
    oracle: &AccountId,
) -> Result<bool> {
    Ok(store
        .get(&StoreKey::Member(game, ts, oracle).encode())?
        .is_some())
}

/// Append `oracle` to the registration list and membership set. Returns the
/// slot it was given. The caller checks membership first.
pub fn register(
    overlay: &mut Overlay<'_>,
    game: &GameTypeId,
    ts: BucketTs,
    oracle: &AccountId,
    header: &mut InstanceHeader,
) -> Result<u32> {
    let slot = header.oracle_count;
    header.oracle_count = slot
        .checked_add(1)
        .ok_or(JudgeError::Overflow("oracle count"))?;
    overlay.put(
        StoreKey::Slot(game, ts, slot).encode(),
        oracle.as_bytes().to_vec(),
    );
    overlay.put(StoreKey::Member(game, ts, oracle).encode(), vec![1]);
    Ok(slot)
}

/// Oracle registered in `slot`.
pub fn oracle_at<R: KvRead + ?Sized>(
    store: &R,
    game: &GameTypeId,
    ts: BucketTs,
    slot: u32,
) -> Result<Option<AccountId>> {
    match store.get(&StoreKey::Slot(game, ts, slot).encode())? {
        Some(bytes) => Ok(Some(codec::decode_account(&bytes)?)),
        None => Ok(None),
    }
}

/// Registered oracles in slot order.
pub fn oracles<R: KvRead + ?Sized>(
    store: &R,
    game: &GameTypeId,
    ts: BucketTs,
    header: &InstanceHeader,
) -> Result<Vec<AccountId>> {
    let mut out = Vec::with_capacity(header.oracle_count as usize);
    for slot in 0..header.oracle_count {
        if let Some(oracle) = oracle_at(store, game, ts, slot)? {
            out.push(oracle);
        }
    }
    Ok(out)
}

/// Record `oracle`'s value. Predictions are write-once; a second write for
/// the same oracle is ignored and returns `false`.
pub fn record_prediction(
    overlay: &mut Overlay<'_>,
    game: &GameTypeId,
    ts: BucketTs,
    oracle: &AccountId,
    value: PredictionValue,
) -> Result<bool> {
    let key = StoreKey::Prediction(game, ts, oracle).encode();
    if overlay.get(&key)?.is_some() {
        return Ok(false);
    }
    overlay.put(key, codec::encode_i64(value));
    Ok(true)
}

/// Value submitted by `oracle`, if any.
pub fn prediction<R: KvRead + ?Sized>(
    store: &R,
    game: &GameTypeId,
    ts: BucketTs,
    oracle: &AccountId,
) -> Result<Option<PredictionValue>> {
    match store.get(&StoreKey::Prediction(game, ts, oracle).encode())? {
        Some(bytes) => Ok(Some(codec::decode_i64(&bytes)?)),
        None => Ok(None),
    }
}

/// Votes cast for `value`.
pub fn vote_count<R: KvRead + ?Sized>(
    store: &R,
    game: &GameTypeId,
    ts: BucketTs,
    value: PredictionValue,
) -> Result<u64> {
    match store.get(&StoreKey::VoteCount(game, ts, value).encode())? {
        Some(bytes) => Ok(codec::decode_u64(&bytes)?),
        None => Ok(0),
    }
}

/// Count one vote for `value` and update the running leader. Returns the
/// new count for `value`.
pub fn tally(
    overlay: &mut Overlay<'_>,
    game: &GameTypeId,
    ts: BucketTs,
    value: PredictionValue,
    header: &mut InstanceHeader,
) -> Result<u64> {
    let count = vote_count(overlay, game, ts, value)?
        .checked_add(1)
        .ok_or(JudgeError::Overflow("vote count"))?;
    overlay.put(
        StoreKey::VoteCount(game, ts, value).encode(),
        codec::encode_u64(count),
    );
    // Strictly greater: a value that only ties keeps the earlier leader.
    if count > header.leader_count {
        header.leader_value = value;
        header.leader_count = count;
    }
    Ok(count)
}
