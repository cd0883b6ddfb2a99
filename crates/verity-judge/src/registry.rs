//! Game type registration.

use serde::{Deserialize, Serialize};
use verity_store::{codec, KvRead, Overlay, StoreKey};
use verity_types::{AccountId, GameTypeId};

use crate::Result;

/// A live game type. Created once and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTypeRecord {
    pub creator: AccountId,
    pub created_at: u64,
}

/// Look up a game type.
pub fn get<R: KvRead + ?Sized>(store: &R, game: &GameTypeId) -> Result<Option<GameTypeRecord>> {
    match store.get(&StoreKey::GameType(game).encode())? {
        Some(bytes) => Ok(Some(codec::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Whether `game` has been created.
pub fn is_live<R: KvRead + ?Sized>(store: &R, game: &GameTypeId) -> Result<bool> {
    Ok(store.get(&StoreKey::GameType(game).encode())?.is_some())
}

/// Buffer the record for a new game type.
pub fn insert(overlay: &mut Overlay<'_>, game: &GameTypeId, record: &GameTypeRecord) -> Result<()> {
    overlay.put(StoreKey::GameType(game).encode(), codec::to_vec(record)?);
    Ok(())
}
