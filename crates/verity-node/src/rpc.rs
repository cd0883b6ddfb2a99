//! JSON-RPC over stdin/stdout.
//!
//! One request per input line, one response per output line. Events from the
//! [`EventBus`](crate::events::EventBus) are interleaved on the same output
//! as `event` notifications.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use verity_judge::{ErrorKind, JudgeError};

use crate::commands;
use crate::events::Notification;
use crate::NodeState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Server-initiated notification.
#[derive(Debug, Serialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Notification,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcNotification {
    pub fn event(params: Notification) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: "event".to_string(),
            params,
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    fn judge(code: i32, err: &JudgeError) -> Self {
        Self {
            code,
            message: err.name().to_string(),
            data: Some(serde_json::json!({"detail": err.to_string()})),
        }
    }
}

impl From<JudgeError> for RpcError {
    fn from(err: JudgeError) -> Self {
        let code = match err.kind() {
            ErrorKind::Authorization => -32010,
            ErrorKind::Validation => -32020,
            ErrorKind::StateConflict => -32030,
            ErrorKind::InsufficientResource => -32040,
            ErrorKind::Internal => {
                warn!("internal error: {err}");
                return Self::internal_error(&err.to_string());
            }
        };
        let mut rpc = Self::judge(code, &err);
        if let JudgeError::InsufficientBalance {
            required,
            available,
        } = err
        {
            rpc.data = Some(serde_json::json!({"required": required, "available": available}));
        }
        rpc
    }
}

/// Serve requests from `reader` until EOF, writing responses and event
/// notifications to `writer`.
pub async fn serve<R, W>(state: Arc<NodeState>, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = state.event_bus.subscribe();
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = handle_line(&state, &line).await;
                write_line(&mut writer, &response).await?;
            }
            received = events.recv() => match received {
                Ok(notification) => {
                    write_line(&mut writer, &RpcNotification::event(notification)).await?;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber lagged, {skipped} events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    // Deliver whatever the last requests produced.
    while let Ok(notification) = events.try_recv() {
        write_line(&mut writer, &RpcNotification::event(notification)).await?;
    }
    writer.flush().await?;
    Ok(())
}

async fn write_line<W, T>(writer: &mut W, value: &T) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut json = serde_json::to_string(value)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Parse and dispatch one request line.
pub async fn handle_line(state: &Arc<NodeState>, line: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) if request.jsonrpc != "2.0" => {
            RpcResponse::error(request.id, RpcError::invalid_request())
        }
        Ok(request) => dispatch_request(state, request).await,
        Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: &Arc<NodeState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();
    let params = &request.params;

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Game commands
        "create_game_type" => commands::game::create_game_type(state, params).await,
        "submit_prediction" => commands::game::submit_prediction(state, params).await,
        "judge_instance" => commands::game::judge_instance(state, params).await,
        "get_prediction" => commands::game::get_prediction(state, params).await,
        "get_correct_oracle_count" => {
            commands::game::get_correct_oracle_count(state, params).await
        }
        "get_game_type" => commands::game::get_game_type(state, params).await,
        "get_instance" => commands::game::get_instance(state, params).await,
        "get_vote_count" => commands::game::get_vote_count(state, params).await,
        "get_oracle_prediction" => commands::game::get_oracle_prediction(state, params).await,

        // Ledger commands
        "get_available_balance" => commands::ledger::get_available_balance(state, params).await,
        "get_locked_balance" => commands::ledger::get_locked_balance(state, params).await,

        // Diagnostics commands
        "debug_get_raw" => commands::diagnostics::debug_get_raw(state, params).await,
        "get_config" => commands::diagnostics::get_config(state).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
