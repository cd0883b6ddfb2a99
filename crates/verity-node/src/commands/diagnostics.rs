//! Diagnostics command handlers.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::{parse, to_json, Result};
use crate::rpc::RpcError;
use crate::NodeState;

#[derive(Deserialize)]
struct RawParams {
    /// Hex-encoded store key.
    key: String,
}

/// Raw stored bytes under a key, hex-encoded.
pub async fn debug_get_raw(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: RawParams = parse(params)?;
    let key = hex::decode(p.key.trim_start_matches("0x"))
        .map_err(|e| RpcError::invalid_params(&format!("key: {e}")))?;

    let engine = state.engine.lock().await;
    let value = engine.debug_get_raw(&key)?;
    Ok(serde_json::json!({
        "key": hex::encode(&key),
        "value": value.map(hex::encode),
    }))
}

/// Effective judge configuration.
pub async fn get_config(state: &Arc<NodeState>) -> Result {
    let engine = state.engine.lock().await;
    to_json(engine.config())
}

#[cfg(test)]
mod tests {
    use verity_store::StoreKey;
    use verity_types::AccountId;

    use super::*;
    use crate::commands::game;
    use crate::test_support::{state_at, ORACLE_1};

    #[tokio::test]
    async fn test_debug_get_raw_reads_balance() {
        let state = state_at(1500);
        game::submit_prediction(
            &state,
            &serde_json::json!({
                "caller": ORACLE_1,
                "game_type": "NEO-USD",
                "ts": 1480,
                "value": 1,
                "stake_amount": 5,
            }),
        )
        .await
        .expect("submit");

        let oracle: AccountId = ORACLE_1.parse().expect("account");
        let key = hex::encode(StoreKey::Locked(&oracle).encode());
        let raw = debug_get_raw(&state, &serde_json::json!({ "key": key }))
            .await
            .expect("raw");
        assert_eq!(raw["value"], "0000000000000005");

        let missing = debug_get_raw(&state, &serde_json::json!({"key": "0x09"}))
            .await
            .expect("raw");
        assert!(missing["value"].is_null());
    }

    #[tokio::test]
    async fn test_debug_get_raw_bad_hex() {
        let state = state_at(1500);
        let err = debug_get_raw(&state, &serde_json::json!({"key": "xyz"}))
            .await
            .expect_err("bad hex");
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_get_config() {
        let state = state_at(1500);
        let config = get_config(&state).await.expect("config");
        assert_eq!(config["bucket_width"], 480);
        assert_eq!(config["starting_epoch"], 1000);
        assert_eq!(
            config["system_account"],
            "7a5d1610adcec3511a264676fa1a73a445a033ef"
        );
    }
}
