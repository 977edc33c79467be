//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    DEFAULT_EMERGENCY_LOGS_DIR, DEFAULT_JOURNALS_DIR, DEFAULT_MAX_MATCHES,
    DEFAULT_PATIENT_IMAGES_DIR, DEFAULT_SEARCH_THRESHOLD,
};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    journals_dir: PathBuf,
    emergency_logs_dir: PathBuf,
    patient_images_dir: PathBuf,
    search_threshold: u8,
    max_matches: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the threshold is above 100 or `max_matches` is zero.
    pub fn new(
        journals_dir: PathBuf,
        emergency_logs_dir: PathBuf,
        patient_images_dir: PathBuf,
        search_threshold: u8,
        max_matches: usize,
    ) -> CoreResult<Self> {
        if search_threshold > 100 {
            return Err(CoreError::InvalidInput(format!(
                "search threshold must be within 0..=100, got {search_threshold}"
            )));
        }
        if max_matches == 0 {
            return Err(CoreError::InvalidInput(
                "max matches must be at least 1".into(),
            ));
        }

        Ok(Self {
            journals_dir,
            emergency_logs_dir,
            patient_images_dir,
            search_threshold,
            max_matches,
        })
    }

    /// Configuration rooted at `data_dir`, using the default sub-directory names and limits.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        let strip = |default: &str| {
            data_dir.join(default.strip_prefix("data/").unwrap_or(default))
        };
        Self {
            journals_dir: strip(DEFAULT_JOURNALS_DIR),
            emergency_logs_dir: strip(DEFAULT_EMERGENCY_LOGS_DIR),
            patient_images_dir: strip(DEFAULT_PATIENT_IMAGES_DIR),
            search_threshold: DEFAULT_SEARCH_THRESHOLD,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }

    pub fn journals_dir(&self) -> &Path {
        &self.journals_dir
    }

    pub fn emergency_logs_dir(&self) -> &Path {
        &self.emergency_logs_dir
    }

    pub fn patient_images_dir(&self) -> &Path {
        &self.patient_images_dir
    }

    pub fn search_threshold(&self) -> u8 {
        self.search_threshold
    }

    pub fn max_matches(&self) -> usize {
        self.max_matches
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            journals_dir: PathBuf::from(DEFAULT_JOURNALS_DIR),
            emergency_logs_dir: PathBuf::from(DEFAULT_EMERGENCY_LOGS_DIR),
            patient_images_dir: PathBuf::from(DEFAULT_PATIENT_IMAGES_DIR),
            search_threshold: DEFAULT_SEARCH_THRESHOLD,
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

/// Parse the search threshold from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default threshold.
pub fn search_threshold_from_env_value(value: Option<String>) -> CoreResult<u8> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<u8>().map_err(|_| {
                CoreError::InvalidInput(format!("SEARCH_THRESHOLD is not a number in 0..=100: {v}"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_SEARCH_THRESHOLD))
}

/// Parse the maximum number of search matches from an optional string value.
pub fn max_matches_from_env_value(value: Option<String>) -> CoreResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<usize>().map_err(|_| {
                CoreError::InvalidInput(format!("SEARCH_MAX_MATCHES is not a number: {v}"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_MAX_MATCHES))
}

/// Resolve a directory from an optional override, falling back to `default`.
pub fn dir_from_env_value(value: Option<String>, default: &str) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_threshold_above_100() {
        let err = CoreConfig::new("j".into(), "e".into(), "i".into(), 101, 3)
            .expect_err("threshold 101 should be rejected");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_max_matches() {
        let err = CoreConfig::new("j".into(), "e".into(), "i".into(), 65, 0)
            .expect_err("zero matches should be rejected");
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn env_values_fall_back_to_defaults() {
        assert_eq!(search_threshold_from_env_value(None).unwrap(), 65);
        assert_eq!(search_threshold_from_env_value(Some("  ".into())).unwrap(), 65);
        assert_eq!(search_threshold_from_env_value(Some(" 80 ".into())).unwrap(), 80);
        assert!(search_threshold_from_env_value(Some("high".into())).is_err());
        assert_eq!(max_matches_from_env_value(None).unwrap(), 3);
        assert_eq!(max_matches_from_env_value(Some("5".into())).unwrap(), 5);
    }

    #[test]
    fn with_data_dir_uses_default_layout() {
        let cfg = CoreConfig::with_data_dir(Path::new("/tmp/fixtures"));
        assert_eq!(cfg.journals_dir(), Path::new("/tmp/fixtures/journals"));
        assert_eq!(
            cfg.emergency_logs_dir(),
            Path::new("/tmp/fixtures/emergency_call_logs")
        );
        assert_eq!(
            cfg.patient_images_dir(),
            Path::new("/tmp/fixtures/patient_images")
        );
    }

    #[test]
    fn dir_override_is_trimmed() {
        assert_eq!(
            dir_from_env_value(Some(" /srv/journals ".into()), "data/journals"),
            PathBuf::from("/srv/journals")
        );
        assert_eq!(
            dir_from_env_value(None, "data/journals"),
            PathBuf::from("data/journals")
        );
    }
}
