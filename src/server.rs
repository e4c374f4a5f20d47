use crate::autofill::{self, FormPatch, FormValues};
use crate::config::Config;
use crate::engine::OcrEngine;
use crate::engines::{EngineInfo, EngineRegistry};
use crate::error::OcrError;
use crate::mrz::{self, PassportRecord};
use crate::preprocessing::{Pipeline, PreprocessingResult, Preset};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and the non-file fields
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engines: Arc<EngineRegistry>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engines: EngineRegistry, config: Config) -> Self {
        Self {
            engines: Arc::new(engines),
            config: Arc::new(config),
        }
    }
}

/// Successful scan
#[derive(Serialize)]
pub struct ScanResponse {
    pub record: PassportRecord,
    pub engine: String,
    pub processing_time_ms: u64,
    pub preprocessing: PreprocessingResult,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeRequest {
    pub text: String,
    /// OCR engine confidence, 0-100; the nominal confidence is used if absent
    #[serde(default)]
    pub confidence_percent: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillRequest {
    pub record: PassportRecord,
    #[serde(default)]
    pub current: FormValues,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub default_engine: String,
    pub available_engines: Vec<EngineInfo>,
    pub max_file_size_bytes: usize,
    pub default_preset: String,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/scan", post(handle_scan))
        .route("/scan/:engine", post(handle_scan_with_engine))
        .route("/decode", post(handle_decode))
        .route("/autofill", post(handle_autofill))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engines = EngineRegistry::new(&config)?;
    let addr = format!("{}:{}", config.host, config.port);

    let app = router(AppState::new(engines, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Scan with the default engine
async fn handle_scan(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, OcrError> {
    let engine = state
        .engines
        .default()
        .ok_or_else(|| OcrError::Internal("No default engine configured".to_string()))?;
    scan_upload(state, engine, multipart).await
}

/// Scan with a named engine
async fn handle_scan_with_engine(
    State(state): State<AppState>,
    Path(engine_name): Path<String>,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, OcrError> {
    let engine = state
        .engines
        .get(&engine_name)
        .ok_or(OcrError::UnknownEngine(engine_name))?;
    scan_upload(state, engine, multipart).await
}

struct Upload {
    data: Bytes,
    content_type: Option<String>,
    preset: Option<Preset>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, OcrError> {
    let mut data = None;
    let mut content_type = None;
    let mut preset = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                content_type = field.content_type().map(|s| s.to_string());
                data = Some(field.bytes().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "preset" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| OcrError::InvalidRequest(format!("Invalid preset: {}", e)))?;
                preset = Some(value.parse::<Preset>().map_err(OcrError::InvalidRequest)?);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    Ok(Upload {
        data: data.ok_or(OcrError::MissingFile)?,
        content_type,
        preset,
    })
}

async fn scan_upload(
    state: AppState,
    engine: Arc<dyn OcrEngine>,
    multipart: Multipart,
) -> Result<Json<ScanResponse>, OcrError> {
    let start = Instant::now();
    let upload = read_upload(multipart).await?;

    if upload.data.len() > state.config.max_file_size {
        return Err(OcrError::ImageTooLarge {
            size: upload.data.len(),
            max: state.config.max_file_size,
        });
    }

    let mime = upload
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    if !engine.supported_formats().contains(&mime) {
        tracing::warn!("Received file with content type: {}", mime);
    }

    let preset = upload.preset.unwrap_or(state.config.preset);
    let engine_name = engine.name().to_string();
    let data = upload.data;

    // Image decoding and recognition are CPU bound
    let (recognition, preprocessing) = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&data)
            .map_err(|e| OcrError::InvalidRequest(format!("Failed to decode image: {}", e)))?;
        let preprocessing = Pipeline::new(preset).process(image)?;
        let recognition = engine.recognize(&preprocessing.image)?;
        Ok::<_, OcrError>((recognition, preprocessing))
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Scan task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    let record = mrz::scan(&recognition.text, recognition.confidence_percent).map_err(|e| {
        tracing::info!(
            "No usable MRZ after {}ms ({}): {}",
            processing_time_ms,
            engine_name,
            e
        );
        e
    })?;

    tracing::info!(
        "Scan completed in {}ms with {}, confidence: {:.2}",
        processing_time_ms,
        engine_name,
        record.confidence
    );

    Ok(Json(ScanResponse {
        record,
        engine: engine_name,
        processing_time_ms,
        preprocessing,
        warnings: recognition.warnings,
    }))
}

/// Decode MRZ text that was recognized elsewhere
async fn handle_decode(
    Json(request): Json<DecodeRequest>,
) -> Result<Json<PassportRecord>, OcrError> {
    let confidence_percent = request
        .confidence_percent
        .unwrap_or(mrz::NOMINAL_CONFIDENCE * 100.0);
    let record = mrz::scan(&request.text, confidence_percent)?;
    Ok(Json(record))
}

/// Turn a scanned record into form field writes
async fn handle_autofill(
    Json(request): Json<AutofillRequest>,
) -> Result<Json<FormPatch>, OcrError> {
    let patch = autofill::apply(&request.record, &request.current, request.prefix.as_deref())?;
    Ok(Json(patch))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_engine: state.engines.default_name().to_string(),
        available_engines: state.engines.info(),
        max_file_size_bytes: state.config.max_file_size,
        default_preset: state.config.preset.to_string(),
    })
}
