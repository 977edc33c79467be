/// Errors raised by the journal index, emergency log store and configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read directory {path}: {source}", path = path.display())]
    DirRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("unknown patient: {0}")]
    UnknownPatient(String),
    #[error("invalid text: {0}")]
    Text(#[from] ambu_types::TextError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Failure of a call to the patient search or journal service.
///
/// Surfaced to the caller rather than folded into an empty result, so that "the service could
/// not be reached" never looks like "the patient has no journal".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl FetchFailure {
    /// Message suitable for showing to the crew.
    pub fn user_message(&self) -> String {
        match self {
            FetchFailure::Timeout(_) => "The journal service did not answer in time.".into(),
            FetchFailure::Status { status, .. } if *status < 500 => {
                "The journal service rejected the request.".into()
            }
            _ => "Failed to load patient journal. Please try again.".into(),
        }
    }
}

/// Failure of the case assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("an image is required for case analysis")]
    MissingImage,
    #[error("assistant unavailable: {0}")]
    Unavailable(String),
}
