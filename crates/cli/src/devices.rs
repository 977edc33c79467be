//! Terminal stand-ins for the camera and the speech synthesiser.

use ambu_core::capture::{CaptureError, CapturedImage, ImageCapture, SpeechOutput};
use std::fs;
use std::path::PathBuf;

/// "Captures" a photo by reading an image file from disk.
pub struct FileCamera {
    path: PathBuf,
    acquired: bool,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            acquired: false,
        }
    }
}

impl ImageCapture for FileCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        if !self.path.is_file() {
            return Err(CaptureError::Unavailable(format!(
                "no image at {}",
                self.path.display()
            )));
        }
        self.acquired = true;
        Ok(())
    }

    fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
        if !self.acquired {
            return Err(CaptureError::Unavailable("camera not acquired".into()));
        }
        let bytes = fs::read(&self.path).map_err(|e| CaptureError::Failed(e.to_string()))?;
        CapturedImage::from_bytes(bytes)
    }

    fn release(&mut self) {
        self.acquired = false;
    }
}

/// Prints text instead of speaking it.
#[derive(Default)]
pub struct ConsoleSpeech {
    speaking: bool,
}

impl SpeechOutput for ConsoleSpeech {
    fn speak(&mut self, text: &str) {
        self.speaking = true;
        for line in text.lines() {
            println!("[speech] {line}");
        }
    }

    fn cancel(&mut self) {
        self.speaking = false;
    }

    fn is_speaking(&self) -> bool {
        self.speaking
    }
}
