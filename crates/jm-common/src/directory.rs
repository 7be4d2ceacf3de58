//! Lookup of candidate profiles and job postings.
//!
//! The matching engine never fetches data itself; callers resolve ids through
//! a [`ProfileDirectory`] and hand the records to the engine.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::semantic::{candidate_document, job_document};
use crate::{CandidateProfile, JobPosting};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait ProfileDirectory: Send + Sync {
    fn candidate(&self, id: &str) -> Option<CandidateProfile>;
    fn job(&self, id: &str) -> Option<JobPosting>;
    /// Every candidate, in a stable order.
    fn candidates(&self) -> Arc<Vec<CandidateProfile>>;
    /// Every posting regardless of status, in a stable order.
    fn jobs(&self) -> Arc<Vec<JobPosting>>;
}

/// Source of the documents a semantic model is fitted over.
pub trait CorpusProvider {
    fn corpus(&self) -> Vec<String>;
}

/// Every non-blank candidate and job document, candidates first.
impl<D: ProfileDirectory + ?Sized> CorpusProvider for D {
    fn corpus(&self) -> Vec<String> {
        let candidates = self.candidates();
        let jobs = self.jobs();
        candidates
            .iter()
            .map(candidate_document)
            .chain(jobs.iter().map(job_document))
            .filter(|document| !document.trim().is_empty())
            .collect()
    }
}

/// On-disk form: `{"candidates": [...], "jobs": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySnapshot {
    pub candidates: Vec<CandidateProfile>,
    pub jobs: Vec<JobPosting>,
}

impl DirectorySnapshot {
    /// Parses a snapshot, skipping entries that do not deserialize. Only a
    /// document that is not a snapshot at all is an error.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let entries: RawSnapshot = serde_json::from_str(raw)?;
        Ok(Self {
            candidates: parse_entries(entries.candidates, "candidate"),
            jobs: parse_entries(entries.jobs, "job"),
        })
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSnapshot {
    candidates: Vec<serde_json::Value>,
    jobs: Vec<serde_json::Value>,
}

fn parse_entries<T: DeserializeOwned>(values: Vec<serde_json::Value>, kind: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(kind, position, error = %err, "skipping malformed snapshot entry");
                None
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct Indexed {
    candidates: Arc<Vec<CandidateProfile>>,
    jobs: Arc<Vec<JobPosting>>,
    candidate_index: HashMap<String, usize>,
    job_index: HashMap<String, usize>,
}

fn index_by_id<T>(items: &[T], id_of: impl Fn(&T) -> &str, kind: &str) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let id = id_of(item);
        if id.trim().is_empty() {
            continue;
        }
        if index.contains_key(id) {
            tracing::warn!(kind, id, "duplicate id in snapshot, keeping the first entry");
            continue;
        }
        index.insert(id.to_string(), position);
    }
    index
}

impl From<DirectorySnapshot> for Indexed {
    fn from(snapshot: DirectorySnapshot) -> Self {
        let candidate_index = index_by_id(&snapshot.candidates, |c| c.id.as_str(), "candidate");
        let job_index = index_by_id(&snapshot.jobs, |j| j.id.as_str(), "job");
        Self {
            candidates: Arc::new(snapshot.candidates),
            jobs: Arc::new(snapshot.jobs),
            candidate_index,
            job_index,
        }
    }
}

/// Directory backed by an in-memory snapshot that can be swapped at runtime.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Arc<Indexed>>,
}

impl InMemoryDirectory {
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self {
            inner: RwLock::new(Arc::new(Indexed::from(snapshot))),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        Ok(Self::new(DirectorySnapshot::from_json(raw)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let directory = Self::from_json(&raw)?;
        let (candidates, jobs) = directory.counts();
        tracing::info!(path = %path.display(), candidates, jobs, "loaded directory snapshot");
        Ok(directory)
    }

    /// Replaces the whole snapshot. Readers holding the previous lists keep them.
    pub fn replace(&self, snapshot: DirectorySnapshot) {
        let indexed = Arc::new(Indexed::from(snapshot));
        let mut slot = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = indexed;
    }

    /// (candidates, jobs)
    pub fn counts(&self) -> (usize, usize) {
        let snapshot = self.snapshot();
        (snapshot.candidates.len(), snapshot.jobs.len())
    }

    fn snapshot(&self) -> Arc<Indexed> {
        Arc::clone(
            &self
                .inner
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl ProfileDirectory for InMemoryDirectory {
    fn candidate(&self, id: &str) -> Option<CandidateProfile> {
        let snapshot = self.snapshot();
        let position = *snapshot.candidate_index.get(id.trim())?;
        snapshot.candidates.get(position).cloned()
    }

    fn job(&self, id: &str) -> Option<JobPosting> {
        let snapshot = self.snapshot();
        let position = *snapshot.job_index.get(id.trim())?;
        snapshot.jobs.get(position).cloned()
    }

    fn candidates(&self) -> Arc<Vec<CandidateProfile>> {
        Arc::clone(&self.snapshot().candidates)
    }

    fn jobs(&self) -> Arc<Vec<JobPosting>> {
        Arc::clone(&self.snapshot().jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "candidates": [
            {"id": "c-1", "name": "Ada", "skills": [{"name": "Rust", "proficiency": "expert"}]},
            {"id": "c-1", "name": "Shadow"},
            {"id": "c-2"}
        ],
        "jobs": [
            {"id": "j-1", "title": "Rust engineer", "status": "closed"}
        ]
    }"#;

    #[test]
    fn loads_and_looks_up_by_id() {
        let directory = InMemoryDirectory::from_json(SNAPSHOT).unwrap();
        assert_eq!(directory.counts(), (3, 1));
        let ada = directory.candidate(" c-1 ").unwrap();
        assert_eq!(ada.name.as_deref(), Some("Ada"));
        assert_eq!(directory.job("j-1").unwrap().status, crate::JobStatus::Closed);
        assert!(directory.candidate("missing").is_none());
    }

    #[test]
    fn replace_keeps_old_lists_alive() {
        let directory = InMemoryDirectory::from_json(SNAPSHOT).unwrap();
        let before = directory.candidates();
        directory.replace(DirectorySnapshot::default());
        assert_eq!(before.len(), 3);
        assert!(directory.candidates().is_empty());
        assert!(directory.job("j-1").is_none());
    }

    #[test]
    fn corpus_skips_blank_documents() {
        let directory = InMemoryDirectory::from_json(SNAPSHOT).unwrap();
        let corpus = directory.corpus();
        // Only c-1 and j-1 carry any text.
        assert_eq!(corpus.len(), 2);
        assert!(corpus.iter().any(|doc| doc.contains("Rust engineer")));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let raw = r#"{
            "candidates": [{"id": "c-1", "skills": "rust"}, {"id": "c-2"}],
            "jobs": [
                {"id": "j-1"},
                {"id": "j-2", "status": "draft", "posted_at": "2024-01-05"},
                {"id": "j-3", "status": "bogus"}
            ]
        }"#;
        let directory = InMemoryDirectory::from_json(raw).unwrap();
        assert_eq!(directory.counts(), (1, 2));
        assert!(directory.candidate("c-1").is_none());
        assert_eq!(directory.job("j-2").unwrap().status, crate::JobStatus::Paused);
        assert!(directory.job("j-3").is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            InMemoryDirectory::from_json("{\"candidates\": 3}"),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            InMemoryDirectory::load("/nonexistent/snapshot.json"),
            Err(SnapshotError::Io { .. })
        ));
    }
}
