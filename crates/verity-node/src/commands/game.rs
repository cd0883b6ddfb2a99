//! Game type, submission and judging commands.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use verity_judge::{CallContext, Submission};
use verity_types::{AccountId, Amount, BucketTs, GameTypeId, PredictionValue};

use super::{parse, to_json, Result};
use crate::NodeState;

#[derive(Deserialize)]
struct CreateParams {
    caller: AccountId,
    /// Defaults to the caller.
    creator: Option<AccountId>,
    game_type: GameTypeId,
}

#[derive(Deserialize)]
struct SubmitParams {
    caller: AccountId,
    /// Defaults to the caller.
    oracle: Option<AccountId>,
    game_type: GameTypeId,
    ts: BucketTs,
    value: PredictionValue,
    #[serde(default)]
    stake_amount: Amount,
}

#[derive(Deserialize)]
struct InstanceParams {
    game_type: GameTypeId,
    ts: BucketTs,
}

#[derive(Deserialize)]
struct GameParams {
    game_type: GameTypeId,
}

#[derive(Deserialize)]
struct VoteParams {
    game_type: GameTypeId,
    ts: BucketTs,
    value: PredictionValue,
}

#[derive(Deserialize)]
struct OraclePredictionParams {
    game_type: GameTypeId,
    ts: BucketTs,
    oracle: AccountId,
}

/// Create a game type.
pub async fn create_game_type(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: CreateParams = parse(params)?;
    let ctx = CallContext {
        caller: p.caller,
        now: state.now(),
    };
    let creator = p.creator.unwrap_or(p.caller);

    let mut engine = state.engine.lock().await;
    let record = engine.create_game_type(&ctx, &creator, &p.game_type)?;
    to_json(&record)
}

/// Submit a prediction.
pub async fn submit_prediction(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: SubmitParams = parse(params)?;
    let ctx = CallContext {
        caller: p.caller,
        now: state.now(),
    };
    let submission = Submission {
        oracle: p.oracle.unwrap_or(p.caller),
        game_type: p.game_type,
        ts: p.ts,
        value: p.value,
        stake_amount: p.stake_amount,
    };

    let mut engine = state.engine.lock().await;
    let receipt = engine.submit_prediction(&ctx, &submission)?;
    to_json(&receipt)
}

/// Judge an instance.
pub async fn judge_instance(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: InstanceParams = parse(params)?;
    let now = state.now();
    let mut engine = state.engine.lock().await;
    let judgement = engine.judge_instance(&p.game_type, p.ts, now)?;
    to_json(&judgement)
}

/// Accepted value of an instance.
pub async fn get_prediction(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: InstanceParams = parse(params)?;
    let now = state.now();
    let mut engine = state.engine.lock().await;
    let value = engine.get_prediction(&p.game_type, p.ts, now)?;
    Ok(serde_json::json!({ "value": value }))
}

/// Number of correct oracles of an instance.
pub async fn get_correct_oracle_count(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: InstanceParams = parse(params)?;
    let now = state.now();
    let mut engine = state.engine.lock().await;
    let count = engine.get_correct_oracle_count(&p.game_type, p.ts, now)?;
    Ok(serde_json::json!({ "count": count }))
}

/// Game type record, or null.
pub async fn get_game_type(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: GameParams = parse(params)?;
    let engine = state.engine.lock().await;
    to_json(&engine.get_game_type(&p.game_type)?)
}

/// Instance header. Does not judge.
pub async fn get_instance(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: InstanceParams = parse(params)?;
    let engine = state.engine.lock().await;
    to_json(&engine.get_instance(&p.game_type, p.ts)?)
}

pub async fn get_vote_count(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: VoteParams = parse(params)?;
    let engine = state.engine.lock().await;
    let count = engine.get_vote_count(&p.game_type, p.ts, p.value)?;
    Ok(serde_json::json!({ "count": count }))
}

pub async fn get_oracle_prediction(state: &Arc<NodeState>, params: &Value) -> Result {
    let p: OraclePredictionParams = parse(params)?;
    let engine = state.engine.lock().await;
    let value = engine.get_oracle_prediction(&p.game_type, p.ts, &p.oracle)?;
    Ok(serde_json::json!({ "value": value }))
}
