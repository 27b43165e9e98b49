//! Persisted build state (`build-info.json`).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use tutpage_shared::{BuildInfo, Result, TutpageError};

/// On-disk shape, tolerant of nulls and the legacy `builtAtMs` key.
#[derive(Debug, Deserialize)]
struct StoredBuildInfo {
    #[serde(default)]
    sha: Option<String>,
    #[serde(default, rename = "buildAtMs", alias = "builtAtMs")]
    build_at_ms: Option<i64>,
}

/// Reads and writes the single [`BuildInfo`] record.
#[derive(Debug, Clone)]
pub struct BuildStateStore {
    path: PathBuf,
}

impl BuildStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last build record.
    ///
    /// A missing, unreadable or corrupt file, or one without a `sha`, reads
    /// as "no previous build".
    pub async fn load(&self) -> Option<BuildInfo> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no build state yet");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "build state unreadable, treating as first build");
                return None;
            }
        };

        let stored: StoredBuildInfo = match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "build state corrupt, treating as first build");
                return None;
            }
        };

        let Some(sha) = stored.sha.filter(|s| !s.is_empty()) else {
            debug!(path = %self.path.display(), "build state has no sha");
            return None;
        };

        Some(BuildInfo {
            sha,
            build_at_ms: stored.build_at_ms.unwrap_or_default(),
        })
    }

    /// Replace the build record atomically (temp file in the same
    /// directory, then rename).
    pub async fn save(&self, info: &BuildInfo) -> Result<()> {
        let persist = |reason: String| TutpageError::PersistFailed {
            path: self.path.clone(),
            reason,
        };

        let json = serde_json::to_string_pretty(info).map_err(|e| persist(e.to_string()))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| persist(format!("create {}: {e}", dir.display())))?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| persist("path has no file name".into()))?;
        let temp = dir.join(format!(".{file_name}.{}.tmp", uuid::Uuid::now_v7()));

        tokio::fs::write(&temp, format!("{json}\n"))
            .await
            .map_err(|e| persist(format!("write {}: {e}", temp.display())))?;

        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(persist(format!("rename into place: {e}")));
        }

        info!(path = %self.path.display(), sha = %info.sha, "build state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tutpage-state-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = temp_dir();
        let store = BuildStateStore::new(dir.join("build-info.json"));
        assert!(store.load().await.is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = temp_dir();
        let store = BuildStateStore::new(dir.join("build-info.json"));
        let info = BuildInfo {
            sha: "abc123".into(),
            build_at_ms: 1_577_836_800_000,
        };

        store.save(&info).await.unwrap();
        assert_eq!(store.load().await, Some(info));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"buildAtMs\""));

        // No temp files left behind.
        let leftovers: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let dir = temp_dir();
        let store = BuildStateStore::new(dir.join("nested/build-info.json"));

        for sha in ["one", "two"] {
            store
                .save(&BuildInfo {
                    sha: sha.into(),
                    build_at_ms: 1,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.load().await.unwrap().sha, "two");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn corrupt_or_null_state_is_none() {
        let dir = temp_dir();
        let path = dir.join("build-info.json");
        let store = BuildStateStore::new(&path);

        for contents in ["{ nope", r#"{"sha": null, "buildAtMs": null}"#, "{}", "[]"] {
            std::fs::write(&path, contents).unwrap();
            assert!(store.load().await.is_none(), "{contents}");
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn legacy_key_is_accepted() {
        let dir = temp_dir();
        let path = dir.join("build-info.json");
        std::fs::write(&path, r#"{"sha":"abc","builtAtMs":42}"#).unwrap();

        let info = BuildStateStore::new(&path).load().await.unwrap();
        assert_eq!(info.build_at_ms, 42);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn unwritable_location_is_persist_failed() {
        let dir = temp_dir();
        let blocker = dir.join("file");
        std::fs::write(&blocker, "x").unwrap();

        // Parent "directory" is a regular file.
        let store = BuildStateStore::new(blocker.join("build-info.json"));
        let err = store
            .save(&BuildInfo {
                sha: "a".into(),
                build_at_ms: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TutpageError::PersistFailed { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
