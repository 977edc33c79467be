//! Patient search and journal enrichment.
//!
//! The search service and the journal service are external collaborators. They are reached
//! through two traits so that the HTTP client, the in-process fixture index and test doubles
//! are interchangeable.

use crate::journals::JournalDocument;
use crate::record::{EmergencyLog, JournalCategory, JournalEntry, SearchResult};
use crate::FetchFailure;
use ambu_types::NonEmptyText;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

/// Finds patients by free-text query.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn search_patients(&self, query: &str) -> Result<Vec<SearchResult>, FetchFailure>;
}

/// Loads journal content for a patient identifier.
#[async_trait]
pub trait JournalSource: Send + Sync {
    async fn load_journal(&self, identifier: &NonEmptyText)
        -> Result<JournalDocument, FetchFailure>;

    /// Emergency call history. Sources without call logs report none.
    async fn load_emergency_logs(
        &self,
        _identifier: &NonEmptyText,
    ) -> Result<Vec<EmergencyLog>, FetchFailure> {
        Ok(Vec::new())
    }
}

/// What a search produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query was blank; nothing was sent.
    EmptyQuery,
    /// The service answered with zero hits.
    NoMatches,
    Matches(Vec<SearchResult>),
}

/// Sends `query` to the directory unless it is blank.
pub async fn search(
    directory: &(impl PatientDirectory + ?Sized),
    query: &str,
) -> Result<SearchOutcome, FetchFailure> {
    if query.trim().is_empty() {
        return Ok(SearchOutcome::EmptyQuery);
    }

    let matches = directory.search_patients(query).await?;
    tracing::debug!(query, hits = matches.len(), "patient search finished");
    if matches.is_empty() {
        Ok(SearchOutcome::NoMatches)
    } else {
        Ok(SearchOutcome::Matches(matches))
    }
}

/// Fetches the journal for `identifier` and wraps it as a single journal entry dated now.
///
/// No retry and no caching: a failed fetch is returned as-is so the caller can tell it apart
/// from a patient with an empty journal.
pub async fn enrich(
    source: &(impl JournalSource + ?Sized),
    identifier: &NonEmptyText,
) -> Result<Vec<JournalEntry>, FetchFailure> {
    let document = source.load_journal(identifier).await?;
    Ok(vec![journal_entry_from_document(document)])
}

fn journal_entry_from_document(document: JournalDocument) -> JournalEntry {
    let summary = Some(document.summary).filter(|s| !s.trim().is_empty());
    JournalEntry {
        id: uuid::Uuid::new_v4().simple().to_string(),
        date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        description: document.text,
        category: JournalCategory::Regular,
        summary,
        symptoms: None,
        medications: None,
    }
}
