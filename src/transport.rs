//! RPC transport — framing, correlation and timeouts over one connection.
//!
//! The stream has no message boundaries of its own, so every JSON-RPC
//! message travels as one `\n`-terminated line and received bytes are
//! buffered until a full line is available. A response may arrive split
//! across any number of reads, or several responses may arrive in one read;
//! neither changes what the caller sees.
//!
//! Correlation is by `id`, never by arrival order: each call allocates a
//! fresh id from a per-connection counter, and frames for other ids are
//! parked (pending) or dropped (retired by a timed-out caller) instead of
//! being handed to the wrong waiter.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::{RpcRequest, RpcResponse};

/// JSON-RPC transport over one [`Connection`].
///
/// One request in flight at a time: the read half is held by a single
/// mutual-exclusion region spanning "send → await matching response".
/// Concurrent callers queue on the locks and still get the right frames,
/// because every decoded frame is routed by id through the pending map.
pub struct RpcTransport {
    writer: Mutex<OwnedWriteHalf>,
    reader: Mutex<ReadState>,
    next_id: AtomicU64,
    /// Latched on EOF or a write failure. Once set, every call fails with
    /// `Disconnected` until the caller explicitly reconnects.
    broken: AtomicBool,
}

struct ReadState {
    stream: BufReader<OwnedReadHalf>,
    /// Bytes of the frame currently being assembled. Lives here, not on the
    /// reader's stack: a caller cancelled (timed out) mid-frame must leave
    /// the partial frame in place for the next waiter, not drop it.
    buf: Vec<u8>,
    /// Frames decoded while draining the stream for some other id.
    parked: HashMap<u64, RpcResponse>,
    /// Ids abandoned by timeout; their late frames are discarded on arrival.
    retired: HashSet<u64>,
}

impl RpcTransport {
    pub fn new(conn: Connection) -> Self {
        let (read_half, write_half) = conn.into_stream().into_split();
        Self {
            writer: Mutex::new(write_half),
            reader: Mutex::new(ReadState {
                stream: BufReader::new(read_half),
                buf: Vec::new(),
                parked: HashMap::new(),
                retired: HashSet::new(),
            }),
            next_id: AtomicU64::new(1),
            broken: AtomicBool::new(false),
        }
    }

    /// Whether the peer is known to be gone.
    pub fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Relaxed)
    }

    /// Issue one JSON-RPC call and await its response.
    ///
    /// On timeout the pending id is retired locally: a late frame for it is
    /// discarded when it eventually arrives, never delivered to a newer
    /// caller. The connection itself stays usable.
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        if self.is_broken() {
            return Err(Error::Disconnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.send(RpcRequest::new(method, params, id)).await?;

        match timeout {
            None => self.recv(id).await,
            Some(after) => match tokio::time::timeout(after, self.recv(id)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.retire(id).await;
                    debug!(method, id, ?after, "call timed out — id retired");
                    Err(Error::Timeout {
                        method: method.to_string(),
                        after,
                    })
                }
            },
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    async fn send(&self, req: RpcRequest) -> Result<()> {
        let mut frame = serde_json::to_string(&req)
            .map_err(|e| Error::Protocol(format!("unencodable request: {e}")))?;
        frame.push('\n');

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.write_all(frame.as_bytes()).await {
            warn!(err = %e, "write failed — marking connection broken");
            self.broken.store(true, Ordering::Relaxed);
            return Err(Error::Disconnected);
        }
        writer.flush().await.map_err(|_| {
            self.broken.store(true, Ordering::Relaxed);
            Error::Disconnected
        })
    }

    /// Drain frames until the one with `id` shows up.
    async fn recv(&self, id: u64) -> Result<Value> {
        let mut state = self.reader.lock().await;
        loop {
            // A previous caller may already have read our frame past us.
            if let Some(resp) = state.parked.remove(&id) {
                return resp.into_result();
            }

            // Accumulate until a full frame is buffered. `read_until` appends
            // into `state.buf` as bytes arrive, so cancellation at the await
            // point leaves everything read so far in the shared state.
            let frame: Vec<u8> = loop {
                if let Some(pos) = state.buf.iter().position(|&b| b == b'\n') {
                    break state.buf.drain(..=pos).collect();
                }
                let ReadState { stream, buf, .. } = &mut *state;
                let n = match stream.read_until(b'\n', buf).await {
                    Ok(n) => n,
                    Err(e) => {
                        self.broken.store(true, Ordering::Relaxed);
                        warn!(err = %e, "read failed — marking connection broken");
                        return Err(Error::Disconnected);
                    }
                };
                if n == 0 {
                    // EOF: the app closed the stream mid-session.
                    self.broken.store(true, Ordering::Relaxed);
                    return Err(Error::Disconnected);
                }
            };

            let line = std::str::from_utf8(&frame)
                .map_err(|e| Error::Protocol(format!("non-UTF-8 frame: {e}")))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let resp: RpcResponse = serde_json::from_str(trimmed)
                .map_err(|e| Error::Protocol(format!("undecodable frame: {e}")))?;

            match resp.id {
                Some(rid) if rid == id => return resp.into_result(),
                Some(rid) => {
                    if state.retired.remove(&rid) {
                        debug!(id = rid, "discarding late response for retired request");
                    } else {
                        state.parked.insert(rid, resp);
                    }
                }
                // We never send requests without ids, so an id-less frame
                // cannot be correlated to any waiter.
                None => {
                    return Err(Error::Protocol(format!(
                        "response frame has no id: {trimmed}"
                    )))
                }
            }
        }
    }

    /// Abandon an in-flight id after timeout/cancellation.
    async fn retire(&self, id: u64) {
        let mut state = self.reader.lock().await;
        // The frame may have landed while this caller was being cancelled.
        if state.parked.remove(&id).is_none() {
            state.retired.insert(id);
        }
    }

    /// Graceful shutdown of the write side. Errors are ignored: the peer may
    /// already be gone, and close must never fail.
    pub async fn shutdown(&self) {
        self.broken.store(true, Ordering::Relaxed);
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
