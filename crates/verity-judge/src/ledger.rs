//! Available/locked balance accounting.
//!
//! Balances are plain 8-byte counters under [`StoreKey::Available`] and
//! [`StoreKey::Locked`]; a missing key reads as zero. Writes always go
//! through an [`Overlay`] so they commit or vanish with the enclosing
//! operation.

use verity_store::{codec, KvRead, Overlay, StoreKey};
use verity_types::{AccountId, Amount};

use crate::{JudgeError, Result};

/// Available balance of `account`.
pub fn available<R: KvRead + ?Sized>(store: &R, account: &AccountId) -> Result<Amount> {
    read(store, StoreKey::Available(account))
}

/// Locked balance of `account`.
pub fn locked<R: KvRead + ?Sized>(store: &R, account: &AccountId) -> Result<Amount> {
    read(store, StoreKey::Locked(account))
}

fn read<R: KvRead + ?Sized>(store: &R, key: StoreKey<'_>) -> Result<Amount> {
    match store.get(&key.encode())? {
        Some(bytes) => Ok(codec::decode_u64(&bytes)?),
        None => Ok(0),
    }
}

fn write(overlay: &mut Overlay<'_>, key: StoreKey<'_>, amount: Amount) {
    overlay.put(key.encode(), codec::encode_u64(amount));
}

/// Move `amount` from available to locked.
///
/// # Errors
///
/// - [`JudgeError::InsufficientBalance`] if available is below `amount`
pub fn stake(overlay: &mut Overlay<'_>, account: &AccountId, amount: Amount) -> Result<()> {
    let avail = available(overlay, account)?;
    if avail < amount {
        return Err(JudgeError::InsufficientBalance {
            required: amount,
            available: avail,
        });
    }
    let lock = locked(overlay, account)?
        .checked_add(amount)
        .ok_or(JudgeError::Overflow("locked balance"))?;
    write(overlay, StoreKey::Available(account), avail - amount);
    write(overlay, StoreKey::Locked(account), lock);
    Ok(())
}

/// Move up to `amount` from locked back to available. Returns the amount
/// actually moved, which is less than `amount` when part of the lock was
/// already seized.
pub fn release(overlay: &mut Overlay<'_>, account: &AccountId, amount: Amount) -> Result<Amount> {
    let lock = locked(overlay, account)?;
    let moved = lock.min(amount);
    if moved < amount {
        tracing::warn!(
            account = %account,
            requested = amount,
            locked = lock,
            "release capped at locked balance"
        );
    }
    if moved == 0 {
        return Ok(0);
    }
    let avail = available(overlay, account)?
        .checked_add(moved)
        .ok_or(JudgeError::Overflow("available balance"))?;
    write(overlay, StoreKey::Locked(account), lock - moved);
    write(overlay, StoreKey::Available(account), avail);
    Ok(moved)
}

/// Zero both balances of `account`, returning their former sum.
pub fn seize(overlay: &mut Overlay<'_>, account: &AccountId) -> Result<Amount> {
    let total = available(overlay, account)?
        .checked_add(locked(overlay, account)?)
        .ok_or(JudgeError::Overflow("seized balance"))?;
    if total > 0 {
        write(overlay, StoreKey::Available(account), 0);
        write(overlay, StoreKey::Locked(account), 0);
    }
    Ok(total)
}

/// Add `amount` to the available balance of `account`.
pub fn credit(overlay: &mut Overlay<'_>, account: &AccountId, amount: Amount) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let avail = available(overlay, account)?
        .checked_add(amount)
        .ok_or(JudgeError::Overflow("available balance"))?;
    write(overlay, StoreKey::Available(account), avail);
    Ok(())
}
