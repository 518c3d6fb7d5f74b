//! The caller-facing proxy for one running Proprio app.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::manifest::{validate_params, Manifest, ToolDescriptor};
use crate::protocol::{MANIFEST_METHOD, PING_METHOD};
use crate::registry;
use crate::transport::RpcTransport;

/// A live handle to one app: registry lookup, socket connection, manifest
/// handshake and dynamic tool dispatch, in that order.
///
/// Construction drives resolver → connection → transport and then fetches
/// the tool manifest. Resolver and connection failures abort construction;
/// a failed manifest fetch does not — introspection is advisory, and an app
/// that has not implemented it yet can still be called by name.
///
/// There is no compile-time knowledge of what the app exposes:
/// [`invoke`](Self::invoke) resolves tools by name at call time, whether or
/// not they appear in the cached manifest.
pub struct ProprioClient {
    app_id: String,
    config: ClientConfig,
    endpoint: PathBuf,
    transport: Option<RpcTransport>,
    manifest: Manifest,
}

impl ProprioClient {
    /// Connect to `app_id` with default configuration.
    pub async fn connect(app_id: &str) -> Result<Self> {
        Self::connect_with(app_id, ClientConfig::default()).await
    }

    /// Connect to `app_id` with explicit configuration.
    pub async fn connect_with(app_id: &str, config: ClientConfig) -> Result<Self> {
        let registry_dir = config.registry_dir();
        let endpoint = registry::resolve(registry_dir.as_deref(), app_id)?;
        let conn = Connection::open(&endpoint).await?;
        let transport = RpcTransport::new(conn);

        let manifest = fetch_manifest(app_id, &transport, config.call_timeout).await;
        info!(
            app_id,
            endpoint = %endpoint.display(),
            tools = manifest.tools.len(),
            "connected"
        );

        Ok(Self {
            app_id: app_id.to_string(),
            config,
            endpoint,
            transport: Some(transport),
            manifest,
        })
    }

    // ─── Introspection ───────────────────────────────────────────────────────

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The cached tool manifest, in the order the app returned it.
    /// Empty when the app does not implement introspection.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.manifest.tools
    }

    /// Whether this client still has a usable connection.
    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| !t.is_broken())
    }

    // ─── Invocation ──────────────────────────────────────────────────────────

    /// Invoke a remote tool by name.
    ///
    /// The manifest is advisory, not a gate: a name the app never declared is
    /// still sent — the remote is the source of truth and replies with its
    /// own error if the tool does not exist. When the name *is* declared,
    /// `params` are checked against the declared type tags first and
    /// mismatches fail locally with [`Error::Validation`] before any bytes
    /// hit the socket.
    pub async fn invoke(&self, tool: &str, params: Value) -> Result<Value> {
        self.invoke_inner(tool, params, self.config.call_timeout)
            .await
    }

    /// Like [`invoke`](Self::invoke), with a per-call deadline overriding the
    /// configured default.
    pub async fn invoke_with_timeout(
        &self,
        tool: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value> {
        self.invoke_inner(tool, params, Some(timeout)).await
    }

    /// Liveness probe via the reserved ping method.
    pub async fn ping(&self) -> Result<()> {
        let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;
        let reply = transport
            .call(PING_METHOD, json!({}), self.config.call_timeout)
            .await?;
        if reply == json!("pong") {
            Ok(())
        } else {
            Err(Error::Protocol(format!("unexpected ping reply: {reply}")))
        }
    }

    async fn invoke_inner(
        &self,
        tool: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let transport = self.transport.as_ref().ok_or(Error::NotConnected)?;
        if let Some(descriptor) = self.manifest.find(tool) {
            validate_params(descriptor, &params)?;
        }
        debug!(app_id = %self.app_id, tool, "invoking");
        transport.call(tool, params, timeout).await
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Tear down the connection. Idempotent — closing twice is a no-op.
    /// Subsequent invocations fail with [`Error::NotConnected`].
    pub async fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
            debug!(app_id = %self.app_id, "closed");
        }
    }

    /// Explicitly re-establish the connection after a loss.
    ///
    /// Re-resolves the registry (the app may have come back on a different
    /// socket) and refetches the manifest. Never triggered implicitly: a lost
    /// connection surfaces as [`Error::Disconnected`] until this is called.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.close().await;

        let registry_dir = self.config.registry_dir();
        self.endpoint = registry::resolve(registry_dir.as_deref(), &self.app_id)?;
        let conn = Connection::open(&self.endpoint).await?;
        let transport = RpcTransport::new(conn);
        self.manifest = fetch_manifest(&self.app_id, &transport, self.config.call_timeout).await;
        self.transport = Some(transport);
        info!(app_id = %self.app_id, endpoint = %self.endpoint.display(), "reconnected");
        Ok(())
    }

    /// The endpoint this client resolved at construction (or last reconnect).
    pub fn endpoint(&self) -> &std::path::Path {
        &self.endpoint
    }
}

/// Manifest handshake. Failure is soft: the app may predate introspection,
/// so a diagnostic is logged and the tool list stays empty.
async fn fetch_manifest(
    app_id: &str,
    transport: &RpcTransport,
    timeout: Option<Duration>,
) -> Manifest {
    let reply = match transport.call(MANIFEST_METHOD, json!({}), timeout).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(app_id, err = %e, "could not fetch tool manifest — continuing without it");
            return Manifest::default();
        }
    };
    match serde_json::from_value::<Manifest>(reply) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(app_id, err = %e, "malformed tool manifest — continuing without it");
            Manifest::default()
        }
    }
}
