use std::path::PathBuf;
use std::time::Duration;

/// Client construction options.
///
/// Everything is an explicit value passed at construction — no process-wide
/// mutable state. The defaults match what running Proprio apps write:
/// registry records under `~/.proprio/registry/`, and no call deadline.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Where to look for registry records. `None` = `$HOME/.proprio/registry`.
    pub registry_dir: Option<PathBuf>,
    /// Default deadline applied to every call. `None` = wait indefinitely.
    /// Individual calls can still override via [`crate::ProprioClient::invoke_with_timeout`].
    pub call_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Resolve the effective registry directory.
    ///
    /// `None` when neither an override nor `$HOME` is available, which callers
    /// treat the same as an empty registry.
    pub fn registry_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.registry_dir {
            return Some(dir.clone());
        }
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".proprio").join("registry"))
    }
}
