//! JSON-RPC 2.0 wire types for the Proprio socket protocol.
//!
//! Frames are newline-delimited: exactly one JSON object per `\n`-terminated
//! line in each direction. Proprio servers tolerate the trailing newline
//! (it is whitespace to a JSON parser), and the framing lets the client
//! reassemble responses regardless of how the kernel chops up the stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Reserved method: fetch the app's tool manifest right after connecting.
pub const MANIFEST_METHOD: &str = "__proprio_manifest__";
/// Reserved method: liveness probe, replies `"pong"`.
pub const PING_METHOD: &str = "__proprio_ping__";

// ─── Envelopes ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RpcResponse {
    /// Collapse a decoded response into its payload.
    ///
    /// Exactly one of `result`/`error` must be present in a well-formed
    /// response; anything else is a protocol violation, not a remote error.
    pub fn into_result(self) -> Result<Value, Error> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(result),
            // `error: null` is how some servers spell "no error".
            (Some(result), Some(Value::Null)) => Ok(result),
            (Some(_), Some(_)) => Err(Error::Protocol(
                "response carries both result and error".into(),
            )),
            (None, Some(error)) if !error.is_null() => Err(Error::Remote(error)),
            _ => Err(Error::Protocol(
                "response carries neither result nor error".into(),
            )),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
