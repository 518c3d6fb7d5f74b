use serde_json::Value;

/// Everything that can go wrong between a caller and a Proprio app.
///
/// The variants split along lines callers actually branch on: "the app is not
/// registered" (`NotFound`) vs "registered but not listening"
/// (`ConnectionRefused`) vs "something else at the transport level"
/// (`ConnectionFailed`) get different user guidance, so they are distinct
/// variants rather than one wrapped `io::Error`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registry record exists for the application id.
    #[error("app '{0}' not found in the registry — is it running?")]
    NotFound(String),

    /// A registry record exists but cannot be parsed or lacks the endpoint.
    #[error("registry record for '{app_id}' is invalid: {reason}")]
    InvalidRegistryRecord { app_id: String, reason: String },

    /// The endpoint exists but nothing is accepting connections on it.
    /// Usually a stale registry record from an app that exited uncleanly.
    #[error("connection refused at {endpoint} — the app registered but is not listening")]
    ConnectionRefused { endpoint: String },

    /// Any other transport-level connect failure (permissions, path length, ...).
    #[error("could not connect to {endpoint}: {source}")]
    ConnectionFailed {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer closed the stream mid-session. The connection is unusable
    /// until explicitly reconnected.
    #[error("connection to the app was lost")]
    Disconnected,

    /// Received bytes that do not decode as a JSON-RPC frame, or a decoded
    /// message missing required fields.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The call did not complete within the requested deadline. The pending
    /// request id is retired; a late response is discarded.
    #[error("call to '{method}' timed out after {after:?}")]
    Timeout {
        method: String,
        after: std::time::Duration,
    },

    /// The remote replied with a well-formed JSON-RPC error. Carries the raw
    /// error payload verbatim.
    #[error("remote error: {0}")]
    Remote(Value),

    /// Operation attempted on a closed client.
    #[error("not connected — the client has been closed")]
    NotConnected,

    /// Caller-supplied params do not match the manifest's declared types for
    /// the invoked tool. Nothing was sent to the remote.
    #[error("invalid params for tool '{tool}': {reason}")]
    Validation { tool: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
