//! Constants used throughout the Ambulance Assistant core crate.
//!
//! This module contains directory names, file extensions and tuning defaults so that the
//! journal service, the client and the CLI agree on them.

use std::time::Duration;

/// Default directory holding one journal text file per patient.
pub const DEFAULT_JOURNALS_DIR: &str = "data/journals";

/// Default directory holding emergency call logs, one YAML file per patient.
pub const DEFAULT_EMERGENCY_LOGS_DIR: &str = "data/emergency_call_logs";

/// Default directory where captured patient photos are stored.
pub const DEFAULT_PATIENT_IMAGES_DIR: &str = "data/patient_images";

/// Extension of journal files inside the journals directory.
pub const JOURNAL_EXTENSION: &str = "txt";

/// Extension of emergency call log files.
pub const EMERGENCY_LOG_EXTENSION: &str = "yaml";

/// Minimum fuzzy score for a journal to count as a search match.
pub const DEFAULT_SEARCH_THRESHOLD: u8 = 65;

/// Maximum number of matches returned by a search.
pub const DEFAULT_MAX_MATCHES: usize = 3;

/// Number of lines kept by the extractive journal summary.
pub const SUMMARY_POINTS: usize = 3;

/// Number of journal entries shown in the emergency brief.
pub const BRIEF_RECENT_ENTRIES: usize = 3;

/// Upper bound on a single enrichment fetch.
pub const DEFAULT_ENRICH_TIMEOUT: Duration = Duration::from_secs(10);

/// Filename prefix for stored patient photos.
pub const PATIENT_PHOTO_PREFIX: &str = "patient_photo_";

/// Timestamp layout used in stored photo filenames.
pub const PATIENT_PHOTO_TIMESTAMP: &str = "%Y%m%d_%H%M%S";
