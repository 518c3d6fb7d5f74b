//! Connection manager — lifecycle of one Unix stream socket.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{Error, Result};

/// One live bidirectional stream to an app's endpoint.
///
/// Owned exclusively by the transport built on top of it; dropping it
/// releases the descriptor.
#[derive(Debug)]
pub struct Connection {
    stream: UnixStream,
    endpoint: PathBuf,
}

impl Connection {
    /// Open a stream connection to `endpoint`.
    ///
    /// Refusal and an absent socket file both mean "registered but not
    /// listening" (a stale record from an exited app) and map to
    /// [`Error::ConnectionRefused`]; every other transport failure —
    /// permissions, path length — is [`Error::ConnectionFailed`] so callers
    /// can give different guidance.
    pub async fn open(endpoint: &Path) -> Result<Self> {
        match UnixStream::connect(endpoint).await {
            Ok(stream) => {
                debug!(endpoint = %endpoint.display(), "connected");
                Ok(Self {
                    stream,
                    endpoint: endpoint.to_path_buf(),
                })
            }
            Err(e) if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::NotFound) => {
                Err(Error::ConnectionRefused {
                    endpoint: endpoint.display().to_string(),
                })
            }
            Err(e) => Err(Error::ConnectionFailed {
                endpoint: endpoint.display().to_string(),
                source: e,
            }),
        }
    }

    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    pub(crate) fn into_stream(self) -> UnixStream {
        self.stream
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
