//! Case analysis and chat assistant.
//!
//! There is no real model behind this yet. [`MockAssistant`] produces the canned assessment
//! and replies the crews train with, after a short artificial delay.

use crate::capture::CapturedImage;
use crate::error::AssistantError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Immediate,
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Medical,
    Safety,
    Followup,
    Medication,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// High and critical cases are highlighted in red on the chat screen.
    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPoint {
    pub id: String,
    pub priority: ActionPriority,
    pub description: String,
    pub status: ActionStatus,
    pub category: ActionCategory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseAnalysis {
    pub summary: String,
    pub action_points: Vec<ActionPoint>,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

impl CaseAnalysis {
    /// Lower-cased words of five or more letters from the summary, action points and
    /// recommendations.
    fn terms(&self) -> HashSet<String> {
        std::iter::once(self.summary.as_str())
            .chain(self.action_points.iter().map(|p| p.description.as_str()))
            .chain(self.recommendations.iter().map(String::as_str))
            .flat_map(|text| text.split(|c: char| !c.is_alphanumeric()))
            .filter(|word| word.chars().count() >= 5)
            .map(str::to_lowercase)
            .collect()
    }
}

/// Journal lines that mention a term from `analysis`, in journal order.
///
/// Returns `None` when the journal is blank or nothing in it relates to the analysis.
pub fn relevant_journal_lines(journal_text: &str, analysis: &CaseAnalysis) -> Option<String> {
    let terms = analysis.terms();
    let lines: Vec<&str> = journal_text
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.split(|c: char| !c.is_alphanumeric())
                .any(|word| terms.contains(&word.to_lowercase()))
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Analyses an on-scene case and answers follow-up questions about it.
#[async_trait]
pub trait CaseAssistant: Send + Sync {
    async fn analyze_case(
        &self,
        patient_id: &str,
        image: &CapturedImage,
        notes: &str,
    ) -> Result<CaseAnalysis, AssistantError>;

    async fn chat(&self, message: &str) -> Result<String, AssistantError>;
}

pub const CHAT_RESPONSES: [&str; 4] = [
    "Based on the patient's history, this could indicate an acute cardiac event. Continue monitoring vital signs.",
    "The current symptoms align with previous episodes. Consider administering prescribed medication.",
    "Given the patient's age and medical history, these symptoms require immediate attention.",
    "Previous emergency logs show similar patterns. Recommend following established treatment protocol.",
];

/// Canned assistant with configurable latency.
#[derive(Clone, Debug)]
pub struct MockAssistant {
    analysis_delay: Duration,
    chat_delay: Duration,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self {
            analysis_delay: Duration::from_secs(2),
            chat_delay: Duration::from_secs(1),
        }
    }

    /// No artificial latency.
    pub fn instant() -> Self {
        Self::with_delays(Duration::ZERO, Duration::ZERO)
    }

    pub fn with_delays(analysis_delay: Duration, chat_delay: Duration) -> Self {
        Self {
            analysis_delay,
            chat_delay,
        }
    }

    fn canned_analysis() -> CaseAnalysis {
        let point = |id: &str, priority, description: &str, category| ActionPoint {
            id: id.into(),
            priority,
            description: description.into(),
            status: ActionStatus::Pending,
            category,
        };

        CaseAnalysis {
            summary: "Based on the image analysis and patient history, patient shows signs of acute cardiac distress with concurrent hypertension symptoms.".into(),
            action_points: vec![
                point("ap1", ActionPriority::Immediate, "Administer sublingual nitroglycerin if prescribed", ActionCategory::Medical),
                point("ap2", ActionPriority::Immediate, "Monitor vital signs - BP, heart rate, O2 saturation", ActionCategory::Medical),
                point("ap3", ActionPriority::High, "Prepare 12-lead ECG", ActionCategory::Medical),
                point("ap4", ActionPriority::Medium, "Review current medication list for interactions", ActionCategory::Medication),
            ],
            risk_level: RiskLevel::High,
            recommendations: vec![
                "Consider immediate hospital transport".into(),
                "Monitor for signs of acute MI".into(),
                "Have defibrillator ready".into(),
                "Establish IV access if possible".into(),
            ],
        }
    }
}

impl Default for MockAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaseAssistant for MockAssistant {
    async fn analyze_case(
        &self,
        patient_id: &str,
        image: &CapturedImage,
        notes: &str,
    ) -> Result<CaseAnalysis, AssistantError> {
        if image.bytes.is_empty() {
            return Err(AssistantError::MissingImage);
        }
        tracing::info!(
            patient_id,
            image_bytes = image.bytes.len(),
            notes_len = notes.len(),
            "analysing case"
        );
        tokio::time::sleep(self.analysis_delay).await;
        Ok(Self::canned_analysis())
    }

    async fn chat(&self, message: &str) -> Result<String, AssistantError> {
        tracing::debug!(message_len = message.len(), "chat message received");
        tokio::time::sleep(self.chat_delay).await;
        let reply = CHAT_RESPONSES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CHAT_RESPONSES[0]);
        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::jpeg_image;

    #[tokio::test]
    async fn mock_analysis_is_high_risk_with_four_action_points() {
        let assistant = MockAssistant::instant();
        let analysis = assistant
            .analyze_case("Ola Hansen - 120384 12345", &jpeg_image(), "pale, sweating")
            .await
            .expect("mock analysis");

        assert_eq!(analysis.risk_level, RiskLevel::High);
        assert!(analysis.risk_level.is_elevated());
        assert_eq!(analysis.action_points.len(), 4);
        assert_eq!(analysis.action_points[0].priority, ActionPriority::Immediate);
        assert_eq!(analysis.recommendations.len(), 4);
    }

    #[tokio::test]
    async fn analysis_without_image_bytes_is_rejected() {
        let assistant = MockAssistant::instant();
        let empty = CapturedImage {
            bytes: Vec::new(),
            mime_type: "image/jpeg".into(),
        };
        let err = assistant
            .analyze_case("Ola Hansen - 120384 12345", &empty, "")
            .await
            .expect_err("empty image should be rejected");
        assert!(matches!(err, AssistantError::MissingImage));
    }

    #[tokio::test]
    async fn mock_chat_answers_with_a_canned_reply() {
        let assistant = MockAssistant::instant();
        let reply = assistant.chat("Should we give aspirin?").await.expect("reply");
        assert!(CHAT_RESPONSES.contains(&reply.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn default_mock_waits_before_answering() {
        let assistant = MockAssistant::new();
        let started = tokio::time::Instant::now();
        assistant.chat("status?").await.expect("reply");
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[test]
    fn relevant_lines_share_terms_with_the_analysis() {
        let analysis = MockAssistant::canned_analysis();
        let journal = "Hypertension diagnosed 2019\nKnee surgery 2015\n  Nitroglycerin spray as needed\n";
        assert_eq!(
            relevant_journal_lines(journal, &analysis).as_deref(),
            Some("Hypertension diagnosed 2019\nNitroglycerin spray as needed")
        );
        assert_eq!(relevant_journal_lines("Knee surgery 2015", &analysis), None);
        assert_eq!(relevant_journal_lines("", &analysis), None);
    }

    #[test]
    fn analysis_serialises_like_the_ui_expects() {
        let json = serde_json::to_value(MockAssistant::canned_analysis()).expect("serialise");
        assert_eq!(json["riskLevel"], "high");
        assert_eq!(json["actionPoints"][0]["status"], "pending");
        assert_eq!(json["actionPoints"][3]["category"], "medication");
        assert_eq!(
            serde_json::to_value(ActionStatus::InProgress).unwrap(),
            "in-progress"
        );
    }
}
