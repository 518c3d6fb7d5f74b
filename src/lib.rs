//! Client SDK for talking to locally running Proprio apps.
//!
//! Every Proprio app listens on its own Unix domain socket and announces
//! itself through a per-user registry (`~/.proprio/registry/<app_id>.json`).
//! This crate discovers an app by id, connects, fetches its self-declared
//! tool manifest, and then lets callers invoke any remote tool by name over
//! JSON-RPC 2.0 — with no compile-time knowledge of what the app exposes.
//!
//! ```no_run
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), proprio_client::Error> {
//! let mut client = proprio_client::connect("com.test.dummy").await?;
//! for tool in client.tools() {
//!     println!("{}: {}", tool.name, tool.description);
//! }
//! let result = client
//!     .invoke("draw_rectangle", json!({"width": 50, "height": 80}))
//!     .await?;
//! println!("{result}");
//! client.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module map
//!
//! | Module | Role |
//! |--------|------|
//! | `registry` | resolve app id → socket endpoint from the per-user registry |
//! | `connection` | open/close one stream-socket connection |
//! | `transport` | JSON-RPC framing, id correlation, timeouts |
//! | `client` | the [`ProprioClient`] capability proxy |
//! | `manifest` | tool descriptors + advisory param validation |
//! | `protocol` | JSON-RPC 2.0 envelopes and reserved method names |

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod manifest;
pub mod protocol;
pub mod registry;
pub mod transport;

// ─── Flat re-exports ──────────────────────────────────────────────────────────

pub use client::ProprioClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use manifest::{Manifest, ToolDescriptor};
pub use registry::RegistryRecord;

/// Connect to a running app by id with default configuration.
///
/// Shorthand for [`ProprioClient::connect`].
pub async fn connect(app_id: &str) -> Result<ProprioClient> {
    ProprioClient::connect(app_id).await
}

/// List every app currently registered for this user.
pub fn list_apps() -> Result<Vec<RegistryRecord>> {
    let config = ClientConfig::default();
    registry::list(config.registry_dir().as_deref())
}
