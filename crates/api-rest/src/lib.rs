//! # API REST
//!
//! REST API for the Ambulance Assistant journal service.
//!
//! Handles:
//! - HTTP endpoints with axum (patient search, journal, emergency call logs, questions,
//!   photo analysis)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! Uses `api-shared` for the request and response bodies and `ambu-core` for the journal index.

#![warn(rust_2018_idioms)]

use ambu_core::assistant::{relevant_journal_lines, CaseAssistant, MockAssistant};
use ambu_core::capture::{CapturedImage, ImageStore};
use ambu_core::config::{dir_from_env_value, max_matches_from_env_value, search_threshold_from_env_value};
use ambu_core::constants::{DEFAULT_EMERGENCY_LOGS_DIR, DEFAULT_JOURNALS_DIR, DEFAULT_PATIENT_IMAGES_DIR};
use ambu_core::{CoreConfig, CoreError, EmergencyLog, LocalJournals};
use api_shared::{
    AnalyzeImageForm, AnalyzeImageRes, AskQuestionReq, AskQuestionRes, EmergencyLogItem,
    EmergencyLogsRes, ErrorRes, HealthRes, HealthService, LoadJournalRes, PatientIdQuery,
    PatientMatch, SearchPatientsQuery, SearchPatientsRes, INTERNAL_ERROR, INVALID_PATIENT_ID,
    INVALID_UPLOAD, NOT_AN_IMAGE, NO_IMAGE_PROVIDED, NO_SELECTED_FILE, QUERY_REQUIRED,
    QUESTION_AND_TEXT_REQUIRED,
};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Origins of the development front ends.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5173"];

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5000";

/// Largest accepted photo upload.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

type ApiError = (StatusCode, Json<ErrorRes>);

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorRes::new(message)))
}

fn internal_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorRes::new(INTERNAL_ERROR)),
    )
}

/// Settings for the REST server, resolved once at startup.
#[derive(Clone, Debug)]
pub struct RestConfig {
    pub addr: String,
    pub core: CoreConfig,
    pub cors_origins: Vec<String>,
}

impl RestConfig {
    /// Reads the server settings from the process environment.
    ///
    /// # Environment Variables
    /// - `AMBU_REST_ADDR`: Server address (default: "0.0.0.0:5000")
    /// - `PORT`: Overrides the port of `AMBU_REST_ADDR`
    /// - `JOURNALS_DIR`, `EMERGENCY_LOGS_DIR`, `PATIENT_IMAGES_DIR`: Data directories
    /// - `SEARCH_THRESHOLD`, `SEARCH_MAX_MATCHES`: Search tuning
    /// - `AMBU_CORS_ORIGINS`: Comma-separated extra allowed origins
    ///
    /// # Errors
    /// Returns an error if any value is present but malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        let env = |key: &str| std::env::var(key).ok();

        let core = CoreConfig::new(
            dir_from_env_value(env("JOURNALS_DIR"), DEFAULT_JOURNALS_DIR),
            dir_from_env_value(env("EMERGENCY_LOGS_DIR"), DEFAULT_EMERGENCY_LOGS_DIR),
            dir_from_env_value(env("PATIENT_IMAGES_DIR"), DEFAULT_PATIENT_IMAGES_DIR),
            search_threshold_from_env_value(env("SEARCH_THRESHOLD"))?,
            max_matches_from_env_value(env("SEARCH_MAX_MATCHES"))?,
        )?;

        Ok(Self {
            addr: rest_addr_from_env_values(env("AMBU_REST_ADDR"), env("PORT"))?,
            core,
            cors_origins: cors_origins_from_env_value(env("AMBU_CORS_ORIGINS")),
        })
    }
}

/// Resolves the listen address, letting `port` replace the port of `addr`.
pub fn rest_addr_from_env_values(
    addr: Option<String>,
    port: Option<String>,
) -> anyhow::Result<String> {
    let addr = addr
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_REST_ADDR.into());

    let Some(port) = port.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) else {
        return Ok(addr);
    };
    let port: u16 = port
        .parse()
        .map_err(|_| anyhow::anyhow!("PORT must be a number between 0 and 65535, got {port}"))?;

    let host = addr.rsplit_once(':').map_or(addr.as_str(), |(host, _)| host);
    Ok(format!("{host}:{port}"))
}

/// The development origins plus any comma-separated extras.
pub fn cors_origins_from_env_value(value: Option<String>) -> Vec<String> {
    let mut origins: Vec<String> = DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect();
    for origin in value.iter().flat_map(|v| v.split(',')) {
        let origin = origin.trim();
        if !origin.is_empty() && !origins.iter().any(|o| o == origin) {
            origins.push(origin.to_string());
        }
    }
    origins
}

/// Builds the CORS layer for the given origins, allowing GET, POST and OPTIONS.
///
/// # Errors
/// Returns an error if an origin is not a valid header value.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
#[derive(Clone)]
pub struct AppState {
    journals: Arc<LocalJournals>,
    assistant: Arc<dyn CaseAssistant>,
    images: Arc<ImageStore>,
}

impl AppState {
    pub fn new(
        journals: Arc<LocalJournals>,
        assistant: Arc<dyn CaseAssistant>,
        images: ImageStore,
    ) -> Self {
        Self {
            journals,
            assistant,
            images: Arc::new(images),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, search_patients, load_journal, emergency_logs, ask_question, analyze_image),
    components(schemas(
        HealthRes,
        ErrorRes,
        PatientMatch,
        SearchPatientsRes,
        LoadJournalRes,
        EmergencyLogItem,
        EmergencyLogsRes,
        AskQuestionReq,
        AskQuestionRes,
        AnalyzeImageForm,
        AnalyzeImageRes,
    ))
)]
pub struct ApiDoc;

/// Assembles the router with Swagger UI at `/docs`.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/search_patients", get(search_patients))
        .route("/api/load_journal", get(load_journal))
        .route("/api/emergency_logs", get(emergency_logs))
        .route("/api/ask_question", post(ask_question))
        .route(
            "/api/analyze_image",
            post(analyze_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

/// Loads the journal index and serves the API until the process is stopped.
///
/// # Errors
/// Returns an error if:
/// - the journals directory cannot be read,
/// - a CORS origin is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
pub async fn serve(cfg: RestConfig) -> anyhow::Result<()> {
    let journals = LocalJournals::load(&cfg.core)?;
    tracing::info!("-- Serving {} journals", journals.index().len());

    let images = ImageStore::new(cfg.core.patient_images_dir());
    let state = AppState::new(Arc::new(journals), Arc::new(MockAssistant::new()), images);
    let app = router(state, cors_layer(&cfg.cors_origins)?);

    tracing::info!("-- Starting Ambulance Assistant REST API on {}", cfg.addr);
    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn log_item(log: EmergencyLog) -> EmergencyLogItem {
    EmergencyLogItem {
        id: log.id,
        date: log.date.to_rfc3339(),
        caller: log.caller,
        description: log.description,
        urgency_level: log.urgency_level.to_string(),
        dispatch_notes: log.dispatch_notes,
        location: log.location,
        response_time: log.response_time,
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/search_patients",
    params(SearchPatientsQuery),
    responses(
        (status = 200, description = "Best matching patients", body = SearchPatientsRes),
        (status = 400, description = "Query parameter is required", body = ErrorRes)
    )
)]
/// Fuzzy search over patient labels
///
/// Returns at most the configured number of matches, best first.
///
/// # Errors
/// Returns `400 Bad Request` if the query is missing or blank.
#[axum::debug_handler]
async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<SearchPatientsQuery>,
) -> Result<Json<SearchPatientsRes>, ApiError> {
    let query = required(params.query).ok_or_else(|| bad_request(QUERY_REQUIRED))?;

    let matches = state
        .journals
        .index()
        .search(&query)
        .into_iter()
        .map(|hit| PatientMatch {
            name: hit.label,
            score: hit.score,
        })
        .collect::<Vec<_>>();
    tracing::info!(hits = matches.len(), "search_patients served");

    Ok(Json(SearchPatientsRes { matches }))
}

#[utoipa::path(
    get,
    path = "/api/load_journal",
    params(PatientIdQuery),
    responses(
        (status = 200, description = "Journal text and summary", body = LoadJournalRes),
        (status = 400, description = "Invalid patient_id", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Load the journal of one patient
///
/// # Arguments
/// * `patient_id` - The label returned by the search
///
/// # Errors
/// Returns `400 Bad Request` if the id is missing or not a known patient, and
/// `500 Internal Server Error` if the journal cannot be read.
#[axum::debug_handler]
async fn load_journal(
    State(state): State<AppState>,
    Query(params): Query<PatientIdQuery>,
) -> Result<Json<LoadJournalRes>, ApiError> {
    let patient_id = required(params.patient_id).ok_or_else(|| bad_request(INVALID_PATIENT_ID))?;

    match state.journals.index().load_journal(&patient_id) {
        Ok(document) => Ok(Json(LoadJournalRes {
            text: document.text,
            summary: document.summary,
        })),
        Err(CoreError::UnknownPatient(_)) => Err(bad_request(INVALID_PATIENT_ID)),
        Err(e) => {
            tracing::error!("Load journal error: {:?}", e);
            Err(internal_error())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/emergency_logs",
    params(PatientIdQuery),
    responses(
        (status = 200, description = "Emergency calls, most recent first", body = EmergencyLogsRes),
        (status = 400, description = "Invalid patient_id", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Emergency call history of one patient
///
/// Patients without recorded calls get an empty list.
#[axum::debug_handler]
async fn emergency_logs(
    State(state): State<AppState>,
    Query(params): Query<PatientIdQuery>,
) -> Result<Json<EmergencyLogsRes>, ApiError> {
    let patient_id = required(params.patient_id).ok_or_else(|| bad_request(INVALID_PATIENT_ID))?;
    if !state.journals.index().contains(&patient_id) {
        return Err(bad_request(INVALID_PATIENT_ID));
    }

    match state.journals.logs().load(&patient_id) {
        Ok(logs) => Ok(Json(EmergencyLogsRes {
            logs: logs.into_iter().map(log_item).collect(),
        })),
        Err(e) => {
            tracing::error!("Emergency logs error: {:?}", e);
            Err(internal_error())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/ask_question",
    request_body = AskQuestionReq,
    responses(
        (status = 200, description = "Assistant answer", body = AskQuestionRes),
        (status = 400, description = "Question and text are required", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Ask the assistant a question about a journal
///
/// # Errors
/// Returns `400 Bad Request` if either the question or the journal text is blank.
#[axum::debug_handler]
async fn ask_question(
    State(state): State<AppState>,
    Json(req): Json<AskQuestionReq>,
) -> Result<Json<AskQuestionRes>, ApiError> {
    if req.question.trim().is_empty() || req.text.trim().is_empty() {
        return Err(bad_request(QUESTION_AND_TEXT_REQUIRED));
    }

    match state.assistant.chat(&req.question).await {
        Ok(response) => Ok(Json(AskQuestionRes { response })),
        Err(e) => {
            tracing::error!("Ask question error: {:?}", e);
            Err(internal_error())
        }
    }
}

#[derive(Default)]
struct AnalyzeImageUpload {
    image: Option<(Option<String>, Vec<u8>)>,
    journal_text: Option<String>,
    patient_id: Option<String>,
    notes: Option<String>,
}

fn invalid_upload(e: MultipartError) -> ApiError {
    tracing::warn!("Rejected upload: {}", e);
    bad_request(INVALID_UPLOAD)
}

async fn read_upload(mut multipart: Multipart) -> Result<AnalyzeImageUpload, ApiError> {
    let mut upload = AnalyzeImageUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field.bytes().await.map_err(invalid_upload)?;
                upload.image = Some((file_name, bytes.to_vec()));
            }
            Some("journal_text") => {
                upload.journal_text = Some(field.text().await.map_err(invalid_upload)?)
            }
            Some("patient_id") => {
                upload.patient_id = Some(field.text().await.map_err(invalid_upload)?)
            }
            Some("notes") => upload.notes = Some(field.text().await.map_err(invalid_upload)?),
            _ => {}
        }
    }
    Ok(upload)
}

#[utoipa::path(
    post,
    path = "/api/analyze_image",
    request_body(content = AnalyzeImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored photo and case analysis", body = AnalyzeImageRes),
        (status = 400, description = "Missing, unnamed or non-image upload", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Store a patient photo and analyse it
///
/// The photo is kept as `patient_photo_<YYYYmmdd_HHMMSS>.jpg` in the patient images directory.
/// When `journal_text` is sent, the journal lines related to the analysis are returned as
/// `relevant_info`.
///
/// # Errors
/// Returns `400 Bad Request` if the `image` part is missing, has an empty file name or is not
/// an image, and `500 Internal Server Error` if the photo cannot be stored or analysed.
#[axum::debug_handler]
async fn analyze_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeImageRes>, ApiError> {
    let upload = read_upload(multipart).await?;

    let (file_name, bytes) = upload.image.ok_or_else(|| bad_request(NO_IMAGE_PROVIDED))?;
    if file_name.as_deref().map_or(true, str::is_empty) {
        return Err(bad_request(NO_SELECTED_FILE));
    }
    let image = CapturedImage::from_bytes(bytes).map_err(|_| bad_request(NOT_AN_IMAGE))?;

    let path = state.images.save(&image).map_err(|e| {
        tracing::error!("Store photo error: {:?}", e);
        internal_error()
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let analysis = state
        .assistant
        .analyze_case(
            upload.patient_id.as_deref().unwrap_or_default(),
            &image,
            upload.notes.as_deref().unwrap_or_default(),
        )
        .await
        .map_err(|e| {
            tracing::error!("Analyze image error: {:?}", e);
            internal_error()
        })?;

    let relevant_info = upload
        .journal_text
        .as_deref()
        .and_then(|text| relevant_journal_lines(text, &analysis));
    let analysis = serde_json::to_value(&analysis).map_err(|e| {
        tracing::error!("Analysis serialisation error: {:?}", e);
        internal_error()
    })?;

    Ok(Json(AnalyzeImageRes {
        filename,
        analysis,
        relevant_info,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambu_core::assistant::CHAT_RESPONSES;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const OLA: &str = "Ola Hansen - 120384 12345";
    const KARI: &str = "Kari Nordmann – 250795 67890";

    const JPEG: [u8; 10] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    fn app(temp_dir: &TempDir) -> Router {
        let cfg = CoreConfig::with_data_dir(temp_dir.path());
        fs::create_dir_all(cfg.journals_dir()).expect("create journals dir");
        fs::create_dir_all(cfg.emergency_logs_dir()).expect("create logs dir");
        fs::write(
            cfg.journals_dir().join(format!("{OLA}.txt")),
            "Høyt blodtrykk\nAngina pectoris\nNitroglyserin ved behov\nFysioterapi\n",
        )
        .expect("write journal");
        fs::write(cfg.journals_dir().join(format!("{KARI}.txt")), "Type 2 Diabetes\n")
            .expect("write journal");
        fs::write(
            cfg.emergency_logs_dir().join(format!("{OLA}.yaml")),
            "- id: e1\n  date: 2024-02-01T15:23:00Z\n  caller: Spouse\n  description: Chest pain\n  urgencyLevel: high\n",
        )
        .expect("write logs");

        let journals = LocalJournals::load(&cfg).expect("load journals");
        let images = ImageStore::new(cfg.patient_images_dir());
        let state = AppState::new(Arc::new(journals), Arc::new(MockAssistant::instant()), images);
        let origins = cors_origins_from_env_value(None);
        router(state, cors_layer(&origins).expect("cors layer"))
    }

    fn encode(value: &str) -> String {
        value
            .bytes()
            .map(|b| {
                if b.is_ascii_alphanumeric() {
                    (b as char).to_string()
                } else {
                    format!("%{b:02X}")
                }
            })
            .collect()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    /// `(field name, file name, content)` parts of a multipart upload.
    async fn post_multipart(
        app: Router,
        parts: &[(&str, Option<&str>, &[u8])],
    ) -> (StatusCode, serde_json::Value) {
        const BOUNDARY: &str = "ambu-upload-boundary";
        let mut body = Vec::new();
        for (name, file_name, content) in parts {
            let disposition = match file_name {
                Some(file_name) => format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n"
                ),
                None => format!("Content-Disposition: form-data; name=\"{name}\"\r\n"),
            };
            body.extend_from_slice(format!("--{BOUNDARY}\r\n{disposition}\r\n").as_bytes());
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/analyze_image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) = get_json(app(&temp_dir), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn search_returns_best_matches() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) =
            get_json(app(&temp_dir), &format!("/api/search_patients?query={}", encode("ola hansen"))).await;
        assert_eq!(status, StatusCode::OK);
        let matches = body["matches"].as_array().expect("matches array");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["name"], OLA);
        assert_eq!(matches[0]["score"], 100);
    }

    #[tokio::test]
    async fn search_without_query_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) = get_json(app(&temp_dir), "/api/search_patients").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], QUERY_REQUIRED);

        let (status, _) = get_json(app(&temp_dir), "/api/search_patients?query=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "blank query counts as missing");
    }

    #[tokio::test]
    async fn load_journal_returns_text_and_summary() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let uri = format!("/api/load_journal?patient_id={}", encode(KARI));
        let (status, body) = get_json(app(&temp_dir), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "Type 2 Diabetes\n");
        assert_eq!(body["summary"], "- Type 2 Diabetes");
    }

    #[tokio::test]
    async fn load_journal_rejects_unknown_and_missing_ids() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) =
            get_json(app(&temp_dir), "/api/load_journal?patient_id=Nobody").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_PATIENT_ID);

        let (status, _) = get_json(app(&temp_dir), "/api/load_journal").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn emergency_logs_for_known_patients() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let uri = format!("/api/emergency_logs?patient_id={}", encode(OLA));
        let (status, body) = get_json(app(&temp_dir), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logs"][0]["urgencyLevel"], "high");
        assert_eq!(body["logs"][0]["caller"], "Spouse");

        let uri = format!("/api/emergency_logs?patient_id={}", encode(KARI));
        let (status, body) = get_json(app(&temp_dir), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["logs"].as_array().unwrap().is_empty());

        let (status, _) = get_json(app(&temp_dir), "/api/emergency_logs?patient_id=Nobody").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ask_question_answers_and_validates() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) = post_json(
            app(&temp_dir),
            "/api/ask_question",
            serde_json::json!({"question": "Any allergies?", "text": "Type 2 Diabetes"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(CHAT_RESPONSES.contains(&body["response"].as_str().unwrap()));

        let (status, body) = post_json(
            app(&temp_dir),
            "/api/ask_question",
            serde_json::json!({"question": "Any allergies?"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], QUESTION_AND_TEXT_REQUIRED);
    }

    #[tokio::test]
    async fn analyze_image_stores_photo_and_returns_analysis() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) = post_multipart(
            app(&temp_dir),
            &[
                ("image", Some("photo.jpg"), &JPEG[..]),
                ("journal_text", None, &b"Hypertension diagnosed 2019\nKnee surgery 2015"[..]),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let filename = body["filename"].as_str().expect("filename");
        assert!(filename.starts_with("patient_photo_") && filename.ends_with(".jpg"));
        let stored = CoreConfig::with_data_dir(temp_dir.path())
            .patient_images_dir()
            .join(filename);
        assert_eq!(fs::read(stored).expect("stored photo"), JPEG);

        assert_eq!(body["analysis"]["riskLevel"], "high");
        assert_eq!(body["analysis"]["actionPoints"].as_array().unwrap().len(), 4);
        assert_eq!(body["relevant_info"], "Hypertension diagnosed 2019");
    }

    #[tokio::test]
    async fn analyze_image_without_journal_has_no_relevant_info() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) =
            post_multipart(app(&temp_dir), &[("image", Some("photo.jpg"), &JPEG[..])]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["relevant_info"].is_null());
    }

    #[tokio::test]
    async fn analyze_image_rejects_missing_unnamed_and_non_image_uploads() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let (status, body) =
            post_multipart(app(&temp_dir), &[("journal_text", None, &b"Type 2 Diabetes"[..])]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NO_IMAGE_PROVIDED);

        let (status, body) = post_multipart(app(&temp_dir), &[("image", Some(""), &JPEG[..])]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NO_SELECTED_FILE);

        let (status, body) =
            post_multipart(app(&temp_dir), &[("image", Some("notes.txt"), &b"hello there"[..])]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], NOT_AN_IMAGE);

        let images_dir = CoreConfig::with_data_dir(temp_dir.path()).patient_images_dir().to_path_buf();
        assert!(!images_dir.exists() || fs::read_dir(images_dir).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn openapi_document_lists_endpoints() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (status, body) = get_json(app(&temp_dir), "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/search_patients"].is_object());
        assert!(body["paths"]["/api/ask_question"].is_object());
        assert!(body["paths"]["/api/analyze_image"]["post"].is_object());
    }

    #[test]
    fn port_overrides_address_port() {
        assert_eq!(rest_addr_from_env_values(None, None).unwrap(), "0.0.0.0:5000");
        assert_eq!(
            rest_addr_from_env_values(Some("127.0.0.1:8080".into()), Some("9000".into())).unwrap(),
            "127.0.0.1:9000"
        );
        assert!(rest_addr_from_env_values(None, Some("not-a-port".into())).is_err());
    }

    #[test]
    fn cors_origins_extend_the_defaults() {
        let origins = cors_origins_from_env_value(Some(
            "https://crew.example, http://localhost:3000,".into(),
        ));
        assert_eq!(
            origins,
            vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "https://crew.example".to_string(),
            ]
        );
    }
}
