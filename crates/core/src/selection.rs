//! Turning a chosen search result into a [`PatientRecord`].
//!
//! Each selection takes a [`SelectionToken`] before it starts fetching. When the fetch comes
//! back the token is checked against the tracker; if the user has picked someone else (or gone
//! back to search) in the meantime the response is dropped and the outcome is
//! [`SelectionOutcome::Superseded`].

use crate::constants::DEFAULT_ENRICH_TIMEOUT;
use crate::label::{resolve, ParseDegraded};
use crate::lookup::{enrich, JournalSource};
use crate::record::PatientRecord;
use crate::FetchFailure;
use ambu_types::NonEmptyText;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Identifies one selection attempt. Later selections get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionToken(u64);

impl SelectionToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Hands out selection tokens and remembers the latest one.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    latest: AtomicU64,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new selection, invalidating every earlier token.
    pub fn begin(&self) -> SelectionToken {
        SelectionToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: SelectionToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

/// A completed selection.
///
/// Fetch failures do not abort the selection: the record is built with whatever arrived and
/// the failures are kept here so the UI can show them.
#[derive(Debug, Clone)]
pub struct Selection {
    pub token: SelectionToken,
    pub record: PatientRecord,
    pub degradations: Vec<ParseDegraded>,
    pub journal_failure: Option<FetchFailure>,
    pub emergency_log_failure: Option<FetchFailure>,
}

#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    Selected(Box<Selection>),
    /// A newer selection started while this one was fetching.
    Superseded(SelectionToken),
}

/// Resolves labels and enriches them through a [`JournalSource`].
pub struct PatientSelector<S: ?Sized> {
    source: Arc<S>,
    tracker: SelectionTracker,
    timeout: Duration,
}

impl<S: JournalSource + ?Sized> PatientSelector<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            tracker: SelectionTracker::new(),
            timeout: DEFAULT_ENRICH_TIMEOUT,
        }
    }

    /// Bounds each fetch made during a selection.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Invalidates any selection still in flight.
    pub fn cancel(&self) {
        self.tracker.begin();
    }

    /// Resolves `label` and loads the patient's journal and call history.
    pub async fn select(&self, label: &str) -> SelectionOutcome {
        let token = self.tracker.begin();
        let resolved = resolve(label);
        let degradations = resolved.degradations.clone();

        let mut journal_entries = Vec::new();
        let mut emergency_logs = Vec::new();
        let mut journal_failure = None;
        let mut emergency_log_failure = None;

        match NonEmptyText::new(resolved.identifier.clone()) {
            Ok(identifier) => {
                match self.bounded(enrich(self.source.as_ref(), &identifier)).await {
                    Ok(entries) => journal_entries = entries,
                    Err(failure) => {
                        tracing::warn!(%failure, "journal enrichment failed");
                        journal_failure = Some(failure);
                    }
                }

                if !self.tracker.is_current(token) {
                    return self.superseded(token);
                }

                match self
                    .bounded(self.source.load_emergency_logs(&identifier))
                    .await
                {
                    Ok(logs) => emergency_logs = logs,
                    Err(failure) => {
                        tracing::warn!(%failure, "loading emergency logs failed");
                        emergency_log_failure = Some(failure);
                    }
                }
            }
            Err(_) => tracing::warn!("selected a blank label, skipping enrichment"),
        }

        if !self.tracker.is_current(token) {
            return self.superseded(token);
        }

        SelectionOutcome::Selected(Box::new(Selection {
            token,
            record: PatientRecord::from_resolution(resolved, journal_entries, emergency_logs),
            degradations,
            journal_failure,
            emergency_log_failure,
        }))
    }

    async fn bounded<T>(
        &self,
        fetch: impl Future<Output = Result<T, FetchFailure>>,
    ) -> Result<T, FetchFailure> {
        tokio::time::timeout(self.timeout, fetch)
            .await
            .unwrap_or(Err(FetchFailure::Timeout(self.timeout)))
    }

    fn superseded(&self, token: SelectionToken) -> SelectionOutcome {
        tracing::debug!(token = token.value(), "discarding stale selection");
        SelectionOutcome::Superseded(token)
    }
}
