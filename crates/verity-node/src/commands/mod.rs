//! RPC command handlers.
//!
//! Each submodule implements the commands for one category. Handlers take
//! the raw `params` value and return a JSON result or an [`RpcError`].

pub mod diagnostics;
pub mod game;
pub mod ledger;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::rpc::RpcError;

pub(crate) type Result = std::result::Result<Value, RpcError>;

/// Deserialize `params` into a typed parameter struct.
pub(crate) fn parse<T: DeserializeOwned>(params: &Value) -> std::result::Result<T, RpcError> {
    serde_json::from_value(params.clone()).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Serialize a handler result.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("encode error: {e}")))
}
