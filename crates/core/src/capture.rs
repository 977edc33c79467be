//! Camera capture, photo storage and read-aloud output.
//!
//! ## Purpose
//! The assessment step needs at least one photo of the patient, and the brief can be read out
//! loud while the crew is busy. Both devices sit behind traits so the CLI and tests can plug in
//! their own implementations.
//!
//! ## Intended use
//! Open a [`CameraSession`] to take a single picture; the camera is released when the session
//! captures or is dropped, whichever comes first. Persist pictures with [`ImageStore`].

use crate::constants::{PATIENT_PHOTO_PREFIX, PATIENT_PHOTO_TIMESTAMP};
use crate::error::{CoreError, CoreResult};
use crate::record::PatientRecord;
use std::fs;
use std::path::{Path, PathBuf};

/// A captured picture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl CapturedImage {
    /// Wraps raw bytes, detecting the image type from its magic number.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotAnImage`] if the bytes are not a recognised image format.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CaptureError> {
        match infer::get(&bytes) {
            Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(Self {
                mime_type: kind.mime_type().to_string(),
                bytes,
            }),
            _ => Err(CaptureError::NotAnImage),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("capture failed: {0}")]
    Failed(String),
    #[error("captured data is not an image")]
    NotAnImage,
}

/// A device that can take pictures.
pub trait ImageCapture {
    fn acquire(&mut self) -> Result<(), CaptureError>;
    fn capture(&mut self) -> Result<CapturedImage, CaptureError>;
    fn release(&mut self);
}

/// Holds a camera between acquire and release.
///
/// Release happens exactly once: after [`CameraSession::capture`], or on drop if nothing was
/// captured.
pub struct CameraSession<'a, C: ImageCapture + ?Sized> {
    camera: &'a mut C,
    released: bool,
}

impl<'a, C: ImageCapture + ?Sized> CameraSession<'a, C> {
    pub fn open(camera: &'a mut C) -> Result<Self, CaptureError> {
        camera.acquire()?;
        Ok(Self {
            camera,
            released: false,
        })
    }

    /// Takes one picture and releases the camera, whether or not capture succeeded.
    pub fn capture(mut self) -> Result<CapturedImage, CaptureError> {
        let image = self.camera.capture();
        self.release();
        image
    }

    fn release(&mut self) {
        if !self.released {
            self.camera.release();
            self.released = true;
        }
    }
}

impl<C: ImageCapture + ?Sized> Drop for CameraSession<'_, C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Writes captured photos to the patient images directory.
#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves `image` as `patient_photo_<timestamp>.jpg` and returns the path written.
    ///
    /// # Errors
    ///
    /// Returns `CoreError` if:
    /// - the bytes are not an image
    /// - the directory cannot be created
    /// - the file cannot be written
    pub fn save(&self, image: &CapturedImage) -> CoreResult<PathBuf> {
        if !infer::is_image(&image.bytes) {
            return Err(CoreError::InvalidInput(
                "captured data is not an image".into(),
            ));
        }

        fs::create_dir_all(&self.dir).map_err(CoreError::StorageDirCreation)?;

        let stamp = chrono::Local::now().format(PATIENT_PHOTO_TIMESTAMP);
        let path = self.dir.join(format!("{PATIENT_PHOTO_PREFIX}{stamp}.jpg"));
        fs::write(&path, &image.bytes).map_err(CoreError::FileWrite)?;

        tracing::info!(path = %path.display(), bytes = image.bytes.len(), "stored patient photo");
        Ok(path)
    }
}

/// Reads text aloud.
pub trait SpeechOutput {
    fn speak(&mut self, text: &str);
    fn cancel(&mut self);
    fn is_speaking(&self) -> bool;

    /// Starts speaking, or stops if already speaking.
    fn toggle(&mut self, text: &str) {
        if self.is_speaking() {
            self.cancel();
        } else {
            self.speak(text);
        }
    }
}

/// The read-aloud version of a patient's emergency brief.
pub fn brief_script(record: &PatientRecord) -> String {
    let brief = record.brief();

    let history = match brief.latest_emergency {
        Some(log) => format!("{} ({} urgency, caller: {})", log.description, log.urgency_level, log.caller),
        None => "No recent emergency calls.".to_string(),
    };

    let summaries: Vec<&str> = brief
        .recent_entries
        .iter()
        .map(|entry| entry.summary.as_deref().unwrap_or(&entry.description))
        .collect();
    let summary = if summaries.is_empty() {
        "No journal entries.".to_string()
    } else {
        summaries.join(" ")
    };

    format!("Emergency Call History: {history}\n\nJournal Summary: {summary}")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::label::resolve;
    use crate::record::{EmergencyLog, JournalCategory, JournalEntry, UrgencyLevel};
    use tempfile::TempDir;

    /// Smallest byte sequence `infer` recognises as JPEG.
    pub(crate) fn jpeg_image() -> CapturedImage {
        CapturedImage {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'],
            mime_type: "image/jpeg".into(),
        }
    }

    #[derive(Default)]
    struct FakeCamera {
        acquired: usize,
        released: usize,
        fail_capture: bool,
    }

    impl ImageCapture for FakeCamera {
        fn acquire(&mut self) -> Result<(), CaptureError> {
            self.acquired += 1;
            Ok(())
        }

        fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
            if self.fail_capture {
                Err(CaptureError::Failed("shutter jammed".into()))
            } else {
                Ok(jpeg_image())
            }
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    #[derive(Default)]
    struct RecordingSpeech {
        spoken: Vec<String>,
        speaking: bool,
    }

    impl SpeechOutput for RecordingSpeech {
        fn speak(&mut self, text: &str) {
            self.spoken.push(text.to_string());
            self.speaking = true;
        }

        fn cancel(&mut self) {
            self.speaking = false;
        }

        fn is_speaking(&self) -> bool {
            self.speaking
        }
    }

    #[test]
    fn session_releases_once_after_capture() {
        let mut camera = FakeCamera::default();
        let image = CameraSession::open(&mut camera)
            .expect("open")
            .capture()
            .expect("capture");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(camera.acquired, 1);
        assert_eq!(camera.released, 1, "release must happen exactly once");
    }

    #[test]
    fn session_releases_on_drop_and_on_failed_capture() {
        let mut camera = FakeCamera::default();
        {
            let _session = CameraSession::open(&mut camera).expect("open");
        }
        assert_eq!(camera.released, 1);

        camera.fail_capture = true;
        let result = CameraSession::open(&mut camera).expect("open").capture();
        assert!(matches!(result, Err(CaptureError::Failed(_))));
        assert_eq!(camera.released, 2);
    }

    #[test]
    fn from_bytes_detects_images() {
        let image = CapturedImage::from_bytes(jpeg_image().bytes).expect("jpeg");
        assert_eq!(image.mime_type, "image/jpeg");
        assert!(matches!(
            CapturedImage::from_bytes(b"plain text".to_vec()),
            Err(CaptureError::NotAnImage)
        ));
    }

    #[test]
    fn store_writes_timestamped_photo() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ImageStore::new(temp_dir.path().join("patient_images"));

        let path = store.save(&jpeg_image()).expect("save photo");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("patient_photo_"), "unexpected name {name}");
        assert!(name.ends_with(".jpg"));
        // patient_photo_ + YYYYmmdd_HHMMSS + .jpg
        assert_eq!(name.len(), "patient_photo_".len() + 15 + 4);
        assert_eq!(fs::read(&path).unwrap(), jpeg_image().bytes);
    }

    #[test]
    fn store_rejects_non_images() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = ImageStore::new(temp_dir.path());
        let text = CapturedImage {
            bytes: b"not a photo".to_vec(),
            mime_type: "image/jpeg".into(),
        };
        assert!(matches!(store.save(&text), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn brief_script_reads_latest_call_and_summaries() {
        let log = EmergencyLog {
            id: "e1".into(),
            date: chrono::Utc::now(),
            caller: "Spouse".into(),
            description: "Severe chest pain".into(),
            urgency_level: UrgencyLevel::High,
            dispatch_notes: None,
            location: None,
            response_time: None,
        };
        let entry = JournalEntry {
            id: "j1".into(),
            date: "2024-01-28".into(),
            description: "Long journal text".into(),
            category: JournalCategory::Regular,
            summary: Some("- Angina since 2019".into()),
            symptoms: None,
            medications: None,
        };
        let record = PatientRecord::from_resolution(
            resolve("Ola Hansen - 120384 12345"),
            vec![entry],
            vec![log],
        );

        let script = brief_script(&record);
        assert!(script.starts_with("Emergency Call History: Severe chest pain (high urgency"));
        assert!(script.ends_with("Journal Summary: - Angina since 2019"));
    }

    #[test]
    fn brief_script_without_history() {
        let record =
            PatientRecord::from_resolution(resolve("Ola Hansen"), Vec::new(), Vec::new());
        let script = brief_script(&record);
        assert!(script.contains("No recent emergency calls."));
        assert!(script.contains("No journal entries."));
    }

    #[test]
    fn toggle_speaks_then_cancels() {
        let mut speech = RecordingSpeech::default();
        speech.toggle("hello");
        assert!(speech.is_speaking());
        speech.toggle("hello");
        assert!(!speech.is_speaking());
        assert_eq!(speech.spoken, vec!["hello".to_string()]);
    }
}
