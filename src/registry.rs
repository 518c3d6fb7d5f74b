//! Registry resolver — maps an application id to its socket endpoint.
//!
//! Each running app writes one JSON record to `<registry_dir>/<app_id>.json`
//! when it starts listening and owns that file's lifecycle; this side only
//! reads. An absent file means the app is not registered (likely not
//! running). A present-but-unreadable record is a distinct failure so the
//! caller can tell "start the app" apart from "the record is corrupt".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// One app's registry record, as written by the app itself.
///
/// Only `socket_path` is load-bearing here; `name` and `pid` are advisory
/// metadata apps include for listings and diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryRecord {
    pub app_id: String,
    #[serde(default)]
    pub name: String,
    pub socket_path: String,
    #[serde(default)]
    pub pid: Option<u32>,
}

impl RegistryRecord {
    pub fn endpoint(&self) -> &Path {
        Path::new(&self.socket_path)
    }
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Resolve `app_id` to its socket endpoint. Pure read, no socket I/O.
pub fn resolve(registry_dir: Option<&Path>, app_id: &str) -> Result<PathBuf> {
    let record = load_record(registry_dir, app_id)?;
    debug!(app_id, endpoint = %record.socket_path, "resolved registry record");
    Ok(PathBuf::from(record.socket_path))
}

/// Read and parse the registry record for `app_id`.
pub fn load_record(registry_dir: Option<&Path>, app_id: &str) -> Result<RegistryRecord> {
    let dir = registry_dir
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::NotFound(app_id.to_string()))?;
    let path = dir.join(format!("{app_id}.json"));

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(app_id.to_string()))
        }
        Err(e) => {
            return Err(Error::InvalidRegistryRecord {
                app_id: app_id.to_string(),
                reason: format!("unreadable record at {}: {e}", path.display()),
            })
        }
    };

    let record: RegistryRecord =
        serde_json::from_str(&raw).map_err(|e| Error::InvalidRegistryRecord {
            app_id: app_id.to_string(),
            reason: e.to_string(),
        })?;

    if record.socket_path.is_empty() {
        return Err(Error::InvalidRegistryRecord {
            app_id: app_id.to_string(),
            reason: "record has no socket_path".into(),
        });
    }
    Ok(record)
}

/// List every well-formed record in the registry, keyed by app id.
///
/// Corrupt or foreign files are skipped, not errors — the registry dir is a
/// shared dumping ground and one crashed app must not break discovery for
/// the rest. An absent dir is simply an empty registry.
pub fn list(registry_dir: Option<&Path>) -> Result<Vec<RegistryRecord>> {
    let Some(dir) = registry_dir.map(Path::to_path_buf) else {
        return Ok(Vec::new());
    };
    if !dir.exists() {
        return Ok(Vec::new());
    }

    // BTreeMap for a stable listing order.
    let mut records = BTreeMap::new();
    let entries = std::fs::read_dir(&dir).map_err(|e| Error::InvalidRegistryRecord {
        app_id: "*".to_string(),
        reason: format!("unreadable registry dir {}: {e}", dir.display()),
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let Ok(raw) = std::fs::read_to_string(&path) else {
            continue;
        };
        match serde_json::from_str::<RegistryRecord>(&raw) {
            Ok(record) if !record.socket_path.is_empty() => {
                records.insert(record.app_id.clone(), record);
            }
            _ => debug!(path = %path.display(), "skipping malformed registry record"),
        }
    }
    Ok(records.into_values().collect())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_record(dir: &Path, app_id: &str, body: &str) {
        std::fs::write(dir.join(format!("{app_id}.json")), body).unwrap();
    }

    #[test]
    fn resolves_a_well_formed_record() {
        let dir = tempfile::tempdir().unwrap();
        write_record(
            dir.path(),
            "com.test.dummy",
            &json!({
                "app_id": "com.test.dummy",
                "name": "Dummy App",
                "socket_path": "/tmp/dummy.sock",
                "pid": 4242
            })
            .to_string(),
        );

        let endpoint = resolve(Some(dir.path()), "com.test.dummy").unwrap();
        assert_eq!(endpoint, PathBuf::from("/tmp/dummy.sock"));
    }

    #[test]
    fn missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        match resolve(Some(dir.path()), "com.test.absent") {
            Err(Error::NotFound(id)) => assert_eq!(id, "com.test.absent"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn malformed_record_is_distinct_from_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_record(dir.path(), "com.test.broken", "{ not json");
        assert!(matches!(
            resolve(Some(dir.path()), "com.test.broken"),
            Err(Error::InvalidRegistryRecord { .. })
        ));
    }

    #[test]
    fn record_without_endpoint_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write_record(
            dir.path(),
            "com.test.noend",
            r#"{"app_id": "com.test.noend", "socket_path": ""}"#,
        );
        assert!(matches!(
            resolve(Some(dir.path()), "com.test.noend"),
            Err(Error::InvalidRegistryRecord { .. })
        ));
    }

    #[test]
    fn list_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        write_record(
            dir.path(),
            "com.test.ok",
            r#"{"app_id": "com.test.ok", "socket_path": "/tmp/ok.sock"}"#,
        );
        write_record(dir.path(), "com.test.corrupt", "garbage");
        std::fs::write(dir.path().join("notes.txt"), "not a record").unwrap();

        let records = list(Some(dir.path())).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].app_id, "com.test.ok");
    }

    #[test]
    fn absent_registry_dir_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        assert!(list(Some(&gone)).unwrap().is_empty());
        assert!(list(None).unwrap().is_empty());
    }
}
