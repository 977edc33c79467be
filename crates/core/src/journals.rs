//! Journal fixtures on disk.
//!
//! The development journal service and the CLI's `--local` mode read patients from a plain
//! directory layout:
//!
//! ```text
//! data/
//!   journals/
//!     Ola Hansen - 120384 12345.txt       # one journal per patient, stem = label
//!   emergency_call_logs/
//!     Ola Hansen - 120384 12345.yaml      # optional list of EmergencyLog
//! ```
//!
//! The file stem is the canonical search-result label, so whatever the search returns can be
//! fed straight into [`crate::label::resolve`] and back into [`JournalIndex::load_journal`].

use crate::config::CoreConfig;
use crate::constants::{EMERGENCY_LOG_EXTENSION, JOURNAL_EXTENSION, SUMMARY_POINTS};
use crate::fuzzy::fuzzy_search;
use crate::label::resolve;
use crate::lookup::{JournalSource, PatientDirectory};
use crate::record::{EmergencyLog, SearchResult};
use crate::{CoreError, CoreResult, FetchFailure};
use ambu_types::NonEmptyText;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Journal text together with its short summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalDocument {
    pub text: String,
    pub summary: String,
}

/// In-memory index of the journals directory, keyed by label.
#[derive(Clone, Debug)]
pub struct JournalIndex {
    journals: BTreeMap<String, PathBuf>,
    search_threshold: u8,
    max_matches: usize,
}

impl JournalIndex {
    /// Builds the index from the journals directory named in `cfg`.
    pub fn load(cfg: &CoreConfig) -> CoreResult<Self> {
        Self::from_dir(cfg.journals_dir(), cfg.search_threshold(), cfg.max_matches())
    }

    /// Scans `dir` for journal files.
    ///
    /// Entries that are not `.txt` files or whose names are not valid UTF-8 are skipped.
    /// Labels that do not follow the `<name> - <DDMMYY> <number>` layout are kept but logged.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::DirRead` if the directory cannot be listed.
    pub fn from_dir(dir: &Path, search_threshold: u8, max_matches: usize) -> CoreResult<Self> {
        let entries = fs::read_dir(dir).map_err(|source| CoreError::DirRead {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut journals = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(JOURNAL_EXTENSION)
            {
                continue;
            }
            let Some(label) = path.file_stem().and_then(|s| s.to_str()) else {
                tracing::warn!("skipping journal with non UTF-8 name: {}", path.display());
                continue;
            };

            let resolved = resolve(label);
            if resolved.is_degraded() {
                tracing::warn!(
                    label,
                    degradations = ?resolved.degradations,
                    "journal label does not follow the name - DDMMYY number layout"
                );
            }
            journals.insert(label.to_string(), path);
        }

        tracing::info!("indexed {} journals from {}", journals.len(), dir.display());

        Ok(Self {
            journals,
            search_threshold,
            max_matches,
        })
    }

    pub fn len(&self) -> usize {
        self.journals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journals.is_empty()
    }

    /// All labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.journals.keys().map(String::as_str)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.journals.contains_key(identifier)
    }

    /// Fuzzy search over labels; best matches first, at most `max_matches`.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        fuzzy_search(query, self.labels(), self.search_threshold)
            .into_iter()
            .take(self.max_matches)
            .map(|(label, score)| SearchResult {
                label: label.to_string(),
                score,
            })
            .collect()
    }

    /// Reads a journal and summarises it.
    ///
    /// # Errors
    ///
    /// - `CoreError::UnknownPatient` if `identifier` is not an indexed label.
    /// - `CoreError::FileRead` if the journal file cannot be read.
    pub fn load_journal(&self, identifier: &str) -> CoreResult<JournalDocument> {
        let path = self
            .journals
            .get(identifier)
            .ok_or_else(|| CoreError::UnknownPatient(identifier.to_string()))?;
        let text = fs::read_to_string(path).map_err(CoreError::FileRead)?;
        let summary = summarise(&text);
        Ok(JournalDocument { text, summary })
    }
}

/// Extractive summary: the first few non-empty lines as bullet points.
pub fn summarise(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(SUMMARY_POINTS)
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Emergency call history per patient, stored as YAML lists.
#[derive(Clone, Debug)]
pub struct EmergencyLogStore {
    dir: PathBuf,
}

impl EmergencyLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Loads the calls recorded for `identifier`, most recent first.
    ///
    /// A patient without a log file has no recorded calls and gets an empty list.
    ///
    /// # Errors
    ///
    /// - `CoreError::InvalidInput` if the identifier would escape the log directory.
    /// - `CoreError::FileRead` / `CoreError::YamlDeserialization` for unreadable files.
    pub fn load(&self, identifier: &str) -> CoreResult<Vec<EmergencyLog>> {
        if identifier.contains(['/', '\\']) || identifier.starts_with('.') {
            return Err(CoreError::InvalidInput(format!(
                "identifier cannot be used as a file name: {identifier}"
            )));
        }

        let path = self
            .dir
            .join(format!("{identifier}.{EMERGENCY_LOG_EXTENSION}"));
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path).map_err(CoreError::FileRead)?;
        let mut logs: Vec<EmergencyLog> =
            serde_yaml::from_str(&contents).map_err(CoreError::YamlDeserialization)?;
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(logs)
    }
}

/// Journal index plus emergency logs, served in-process.
#[derive(Clone, Debug)]
pub struct LocalJournals {
    index: JournalIndex,
    logs: EmergencyLogStore,
}

impl LocalJournals {
    pub fn new(index: JournalIndex, logs: EmergencyLogStore) -> Self {
        Self { index, logs }
    }

    pub fn load(cfg: &CoreConfig) -> CoreResult<Self> {
        Ok(Self::new(
            JournalIndex::load(cfg)?,
            EmergencyLogStore::new(cfg.emergency_logs_dir()),
        ))
    }

    pub fn index(&self) -> &JournalIndex {
        &self.index
    }

    pub fn logs(&self) -> &EmergencyLogStore {
        &self.logs
    }
}

fn local_failure(err: CoreError) -> FetchFailure {
    match err {
        CoreError::UnknownPatient(_) | CoreError::InvalidInput(_) => FetchFailure::Status {
            status: 400,
            body: err.to_string(),
        },
        other => FetchFailure::Status {
            status: 500,
            body: other.to_string(),
        },
    }
}

#[async_trait]
impl PatientDirectory for LocalJournals {
    async fn search_patients(&self, query: &str) -> Result<Vec<SearchResult>, FetchFailure> {
        Ok(self.index.search(query))
    }
}

#[async_trait]
impl JournalSource for LocalJournals {
    async fn load_journal(&self, identifier: &NonEmptyText) -> Result<JournalDocument, FetchFailure> {
        self.index
            .load_journal(identifier.as_str())
            .map_err(local_failure)
    }

    async fn load_emergency_logs(
        &self,
        identifier: &NonEmptyText,
    ) -> Result<Vec<EmergencyLog>, FetchFailure> {
        if !self.index.contains(identifier.as_str()) {
            return Err(local_failure(CoreError::UnknownPatient(
                identifier.to_string(),
            )));
        }
        self.logs.load(identifier.as_str()).map_err(local_failure)
    }
}
