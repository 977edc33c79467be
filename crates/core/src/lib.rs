//! # Ambulance Assistant Core
//!
//! Core logic for the point-of-care ambulance assistant.
//!
//! This crate contains the data model and the operations behind the crew's workflow:
//! - Resolving patient search labels (`Name - DDMMYY PNR`) into structured fields
//! - Fuzzy patient search over the local journal index
//! - Journal and emergency call log loading
//! - Patient selection with stale-response suppression
//! - The case session step machine, mock case assistant, photo capture and read-aloud
//!
//! **No API concerns**: HTTP servers and clients belong in `api-rest` and `ambu-client`.

pub mod assistant;
pub mod capture;
pub mod config;
pub mod constants;
pub mod error;
pub mod fuzzy;
pub mod journals;
pub mod label;
pub mod lookup;
pub mod record;
pub mod selection;
pub mod session;

pub use config::CoreConfig;
pub use error::{AssistantError, CoreError, CoreResult, FetchFailure};
pub use journals::{EmergencyLogStore, JournalDocument, JournalIndex, LocalJournals};
pub use label::{resolve, ParseDegraded, ResolvedLabel};
pub use lookup::{enrich, search, JournalSource, PatientDirectory, SearchOutcome};
pub use record::{EmergencyLog, JournalCategory, JournalEntry, PatientRecord, SearchResult};
pub use selection::{PatientSelector, Selection, SelectionOutcome};
