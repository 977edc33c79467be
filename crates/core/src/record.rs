//! Patient record types.
//!
//! These mirror the JSON shapes the point-of-care UI works with (camelCase keys, journal
//! category under `type`). A [`PatientRecord`] is assembled once per selection and is
//! read-only afterwards.

use crate::constants::BRIEF_RECENT_ENTRIES;
use crate::label::ResolvedLabel;
use ambu_types::MatchScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category tag of a journal entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalCategory {
    Regular,
    Emergency,
    Followup,
}

/// One entry in a patient's journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    /// ISO 8601 date or timestamp.
    pub date: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: JournalCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<String>>,
}

/// Urgency assigned by dispatch to an emergency call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// A logged emergency call concerning the patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyLog {
    pub id: String,
    pub date: DateTime<Utc>,
    pub caller: String,
    pub description: String,
    pub urgency_level: UrgencyLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
}

/// A patient search hit: the raw label the service returned and how well it matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "name")]
    pub label: String,
    pub score: MatchScore,
}

/// The patient currently under care.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    id: String,
    name: String,
    date_of_birth: String,
    journal_entries: Vec<JournalEntry>,
    emergency_logs: Vec<EmergencyLog>,
}

impl PatientRecord {
    /// Assembles a record from a resolved label and whatever enrichment produced.
    pub fn from_resolution(
        resolved: ResolvedLabel,
        journal_entries: Vec<JournalEntry>,
        emergency_logs: Vec<EmergencyLog>,
    ) -> Self {
        Self {
            id: resolved.identifier,
            name: resolved.name,
            date_of_birth: resolved.date_of_birth,
            journal_entries,
            emergency_logs,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display form `dd.mm.yy`, or empty when the label carried no usable date.
    pub fn date_of_birth(&self) -> &str {
        &self.date_of_birth
    }

    pub fn journal_entries(&self) -> &[JournalEntry] {
        &self.journal_entries
    }

    pub fn emergency_logs(&self) -> &[EmergencyLog] {
        &self.emergency_logs
    }

    /// The emergency brief: latest call plus the most recent journal entries.
    pub fn brief(&self) -> EmergencyBrief<'_> {
        let recent = self.journal_entries.len().min(BRIEF_RECENT_ENTRIES);
        EmergencyBrief {
            latest_emergency: self.emergency_logs.first(),
            recent_entries: &self.journal_entries[..recent],
        }
    }
}

/// Borrowed view over the parts of a record shown before assessment.
#[derive(Debug, Clone, Copy)]
pub struct EmergencyBrief<'a> {
    pub latest_emergency: Option<&'a EmergencyLog>,
    pub recent_entries: &'a [JournalEntry],
}
