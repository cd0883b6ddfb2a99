//! Balance commands.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use verity_types::AccountId;

use super::{parse, Result};
use crate::NodeState;

#[derive(Deserialize)]
struct AccountParams {
    account: AccountId,
}

/// Available balance of an account.
pub async fn get_available_balance(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: AccountParams = parse(params)?;
    let engine = state.engine.lock().await;
    let available = engine.get_available_balance(&p.account)?;
    Ok(serde_json::json!({
        "account": p.account,
        "available": available,
    }))
}

/// Locked balance of an account.
pub async fn get_locked_balance(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: AccountParams = parse(params)?;
    let engine = state.engine.lock().await;
    let locked = engine.get_locked_balance(&p.account)?;
    Ok(serde_json::json!({
        "account": p.account,
        "locked": locked,
    }))
}
