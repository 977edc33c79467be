//! The case workflow a crew walks through for one patient.
//!
//! ## Purpose
//! Tracks which step the crew is on (search, brief, assessment, chat) and holds the state each
//! step produces: the selected record, captured photos, free-text notes, the case analysis and
//! the chat transcript.
//!
//! ## Intended use
//! Each transition checks the current step and returns [`SessionError::WrongStep`] otherwise,
//! so the UI can never show the assessment for a patient that was never selected.

use crate::assistant::CaseAnalysis;
use crate::capture::CapturedImage;
use crate::record::{EmergencyBrief, PatientRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Search,
    Brief,
    Assessment,
    Chat,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Step::Search => "search",
            Step::Brief => "brief",
            Step::Assessment => "assessment",
            Step::Chat => "chat",
        };
        f.write_str(s)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} during the {current} step")]
    WrongStep { action: &'static str, current: Step },
    #[error("at least one photo is required before analysis")]
    NoImages,
    #[error("no photo at position {0}")]
    NoSuchImage(usize),
    #[error("message is empty")]
    EmptyMessage,
    #[error("waiting for the assistant to reply")]
    ReplyPending,
    #[error("no reply is pending")]
    NoPendingReply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// One patient case from selection to chat.
#[derive(Debug)]
pub struct CaseSession {
    step: Step,
    record: Option<PatientRecord>,
    images: Vec<CapturedImage>,
    notes: String,
    analysis: Option<CaseAnalysis>,
    messages: Vec<ChatMessage>,
    awaiting_reply: bool,
}

impl Default for CaseSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseSession {
    pub fn new() -> Self {
        Self {
            step: Step::Search,
            record: None,
            images: Vec::new(),
            notes: String::new(),
            analysis: None,
            messages: Vec::new(),
            awaiting_reply: false,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn record(&self) -> Option<&PatientRecord> {
        self.record.as_ref()
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn analysis(&self) -> Option<&CaseAnalysis> {
        self.analysis.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// The emergency brief of the selected patient, if any.
    pub fn brief(&self) -> Option<EmergencyBrief<'_>> {
        self.record.as_ref().map(PatientRecord::brief)
    }

    fn expect_step(&self, expected: Step, action: &'static str) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::WrongStep {
                action,
                current: self.step,
            })
        }
    }

    pub fn select_patient(&mut self, record: PatientRecord) -> Result<(), SessionError> {
        self.expect_step(Step::Search, "select a patient")?;
        tracing::info!(patient_id = record.id(), "patient selected");
        self.record = Some(record);
        self.step = Step::Brief;
        Ok(())
    }

    pub fn continue_to_assessment(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::Brief, "continue to assessment")?;
        self.step = Step::Assessment;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), SessionError> {
        self.expect_step(Step::Assessment, "edit notes")?;
        self.notes = notes.into();
        Ok(())
    }

    pub fn add_image(&mut self, image: CapturedImage) -> Result<(), SessionError> {
        self.expect_step(Step::Assessment, "add a photo")?;
        self.images.push(image);
        Ok(())
    }

    pub fn remove_image(&mut self, index: usize) -> Result<CapturedImage, SessionError> {
        self.expect_step(Step::Assessment, "remove a photo")?;
        if index >= self.images.len() {
            return Err(SessionError::NoSuchImage(index));
        }
        Ok(self.images.remove(index))
    }

    pub fn clear_images(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::Assessment, "clear photos")?;
        self.images.clear();
        Ok(())
    }

    /// Records the analysis and opens the chat. Requires at least one photo.
    pub fn complete_analysis(&mut self, analysis: CaseAnalysis) -> Result<(), SessionError> {
        self.expect_step(Step::Assessment, "complete the analysis")?;
        if self.images.is_empty() {
            return Err(SessionError::NoImages);
        }
        tracing::info!(risk = ?analysis.risk_level, "case analysis completed");
        self.analysis = Some(analysis);
        self.step = Step::Chat;
        Ok(())
    }

    /// Appends the crew's message and marks a reply as pending.
    ///
    /// # Errors
    ///
    /// Blank messages are rejected, as is sending while the previous reply is outstanding.
    pub fn push_user_message(&mut self, content: &str) -> Result<&ChatMessage, SessionError> {
        self.expect_step(Step::Chat, "send a message")?;
        if content.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.awaiting_reply {
            return Err(SessionError::ReplyPending);
        }
        self.awaiting_reply = true;
        self.messages
            .push(ChatMessage::new(ChatRole::User, content.to_string()));
        Ok(&self.messages[self.messages.len() - 1])
    }

    pub fn push_assistant_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<&ChatMessage, SessionError> {
        self.expect_step(Step::Chat, "receive a reply")?;
        if !self.awaiting_reply {
            return Err(SessionError::NoPendingReply);
        }
        self.awaiting_reply = false;
        self.messages
            .push(ChatMessage::new(ChatRole::Assistant, content.into()));
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Gives up on the pending reply after the assistant failed, so the crew can send again.
    /// The unanswered message stays in the transcript.
    pub fn fail_pending_reply(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::Chat, "fail a reply")?;
        if !self.awaiting_reply {
            return Err(SessionError::NoPendingReply);
        }
        tracing::warn!("assistant reply failed");
        self.awaiting_reply = false;
        Ok(())
    }

    /// Drops everything about the current patient and goes back to search.
    pub fn return_to_search(&mut self) {
        tracing::debug!(from = %self.step, "returning to search");
        *self = Self::new();
    }
}
