//! JSON session files.
//!
//! Each session is stored as `<session><suffix>` in a single directory:
//!
//! ```json
//! {"signals": [[0.1, 0.2], [1.0, 1.1]], "labels": ["Resp", "GSR"], "sampling_rate": 100.0}
//! ```

use crate::core::session::Session;
use crate::source::{SignalSource, SourceError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk layout of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub signals: Vec<Vec<f64>>,
    pub labels: Vec<String>,
    pub sampling_rate: f64,
}

impl SessionFile {
    pub fn into_session(self) -> Result<Session, SourceError> {
        Ok(Session::new(self.signals, self.labels, self.sampling_rate)?)
    }
}

/// Reads sessions from JSON files in a directory.
#[derive(Debug, Clone)]
pub struct JsonSessionSource {
    dir: PathBuf,
    suffix: String,
}

impl JsonSessionSource {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    /// Path of the file backing a session.
    pub fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}{}", self.suffix))
    }

    /// All session identifiers present in the directory.
    pub fn discover(&self) -> Result<Vec<String>, SourceError> {
        discover_sessions(&self.dir, &self.suffix)
    }
}

impl SignalSource for JsonSessionSource {
    fn load(&self, session_id: &str) -> Result<Session, SourceError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| SourceError::IoError(e.to_string()))?;
        let file: SessionFile =
            serde_json::from_str(&content).map_err(|e| SourceError::ParseError(e.to_string()))?;

        file.into_session()
    }
}

/// List session identifiers for files in `dir` whose names end with `suffix`.
///
/// Identifiers are the file names with the suffix removed, sorted so a batch
/// always visits sessions in the same order.
pub fn discover_sessions(dir: &Path, suffix: &str) -> Result<Vec<String>, SourceError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| SourceError::IoError(format!("{}: {e}", dir.display())))?;

    let mut ids: Vec<String> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {}: {e}", dir.display());
                None
            }
        })
        .filter(|p| p.is_file())
        .filter_map(|p| {
            let name = p.file_name()?.to_str()?;
            name.strip_suffix(suffix)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .collect();

    ids.sort();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("polygraph-source-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_and_discover() {
        let dir = scratch_dir();
        let file = SessionFile {
            signals: vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            labels: vec!["Resp".into(), "GSR".into()],
            sampling_rate: 50.0,
        };
        std::fs::write(
            dir.join("b_processed.json"),
            serde_json::to_string(&file).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.join("a_processed.json"), "{}").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let source = JsonSessionSource::new(&dir, "_processed.json");
        assert_eq!(source.discover().unwrap(), vec!["a", "b"]);

        let session = source.load("b").unwrap();
        assert_eq!(session.channel_count(), 2);
        assert_eq!(session.sample_count(), 3);
        assert_eq!(session.sampling_rate(), 50.0);

        assert!(matches!(source.load("a"), Err(SourceError::ParseError(_))));
        assert!(matches!(source.load("zzz"), Err(SourceError::NotFound(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_discover_skips_directories_and_bare_suffix() {
        let dir = scratch_dir();
        std::fs::create_dir_all(dir.join("nested_processed.json")).unwrap();
        std::fs::write(dir.join("_processed.json"), "{}").unwrap();
        std::fs::write(dir.join("s01_processed.json"), "{}").unwrap();

        let ids = discover_sessions(&dir, "_processed.json").unwrap();
        assert_eq!(ids, vec!["s01"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_session_file() {
        let file = SessionFile {
            signals: vec![vec![1.0]],
            labels: vec![],
            sampling_rate: 10.0,
        };
        assert!(matches!(file.into_session(), Err(SourceError::Invalid(_))));
    }
}
