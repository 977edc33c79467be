//! JSON bodies exchanged with the journal API.

use ambu_types::MatchScore;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const QUERY_REQUIRED: &str = "Query parameter is required";
pub const INVALID_PATIENT_ID: &str = "Invalid patient_id";
pub const QUESTION_AND_TEXT_REQUIRED: &str = "Question and text are required";
pub const INTERNAL_ERROR: &str = "Internal error";
pub const NO_IMAGE_PROVIDED: &str = "No image file provided";
pub const NO_SELECTED_FILE: &str = "No selected file";
pub const NOT_AN_IMAGE: &str = "Uploaded file is not an image";
pub const INVALID_UPLOAD: &str = "Invalid multipart body";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned with every 4xx/5xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchPatientsQuery {
    /// Free-text query: name, birth date or personal number.
    pub query: Option<String>,
}

/// One search hit. `name` is the full patient label, e.g. `Ola Hansen - 120384 12345`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientMatch {
    pub name: String,
    /// Similarity in percent, 0-100. Fractional scores are rounded when read.
    #[schema(value_type = u8)]
    pub score: MatchScore,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchPatientsRes {
    pub matches: Vec<PatientMatch>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientIdQuery {
    /// Patient label as returned by the search.
    pub patient_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LoadJournalRes {
    pub text: String,
    pub summary: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyLogItem {
    pub id: String,
    /// RFC 3339 timestamp of the call.
    pub date: String,
    pub caller: String,
    pub description: String,
    /// `low`, `medium` or `high`.
    pub urgency_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmergencyLogsRes {
    pub logs: Vec<EmergencyLogItem>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AskQuestionReq {
    #[serde(default)]
    pub question: String,
    /// Journal text the question is about.
    #[serde(default)]
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AskQuestionRes {
    pub response: String,
}

/// Multipart form of `POST /api/analyze_image`.
#[derive(ToSchema)]
pub struct AnalyzeImageForm {
    /// The patient photo.
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
    /// Journal text to search for lines relevant to the analysis.
    pub journal_text: Option<String>,
    pub patient_id: Option<String>,
    /// Crew observations.
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeImageRes {
    /// Stored photo, `patient_photo_<YYYYmmdd_HHMMSS>.jpg`.
    pub filename: String,
    /// `summary`, `actionPoints`, `riskLevel` and `recommendations`.
    #[schema(value_type = Object)]
    pub analysis: serde_json::Value,
    /// Journal lines related to the analysis; null without journal text or matches.
    pub relevant_info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_log_item_uses_camel_case_and_skips_absent_fields() {
        let item = EmergencyLogItem {
            id: "e1".into(),
            date: "2024-02-01T15:23:00Z".into(),
            caller: "Spouse".into(),
            description: "Severe chest pain".into(),
            urgency_level: "high".into(),
            dispatch_notes: None,
            location: Some("Home".into()),
            response_time: None,
        };
        let json = serde_json::to_value(&item).expect("serialise");
        assert_eq!(json["urgencyLevel"], "high");
        assert_eq!(json["location"], "Home");
        assert!(json.get("dispatchNotes").is_none());
    }

    #[test]
    fn patient_match_reads_fractional_scores() {
        let hit: PatientMatch =
            serde_json::from_str(r#"{"name": "Ola Hansen - 120384 12345", "score": 86.6}"#)
                .expect("fractional score");
        assert_eq!(hit.score.value(), 87);
        assert_eq!(serde_json::to_value(&hit).expect("serialise")["score"], 87);
        assert!(serde_json::from_str::<PatientMatch>(r#"{"name": "x", "score": 140}"#).is_err());
    }

    #[test]
    fn ask_question_fields_default_to_empty() {
        let req: AskQuestionReq = serde_json::from_str(r#"{"question": "why?"}"#).expect("parse");
        assert_eq!(req.question, "why?");
        assert_eq!(req.text, "");
    }
}
