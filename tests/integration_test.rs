use image::{DynamicImage, ImageFormat, Luma, GrayImage};
use passport_mrz::config::Config;
use passport_mrz::engine::{OcrEngine, Recognition};
use passport_mrz::engines::EngineRegistry;
use passport_mrz::error::OcrError;
use passport_mrz::preprocessing::Preset;
use passport_mrz::server::{self, AppState};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;

const MRZ_TEXT: &str = "REPUBLIC OF UTOPIA\n\
                        P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\n\
                        L898902C36UTO7408122F1204159ZE184226B<<<<<10\n";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct Record {
    passport_number: String,
    nationality: String,
    birth_date: String,
    expiry_date: String,
    sex: String,
    given_names: String,
    surname: String,
    is_valid: bool,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct StepTiming {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Preprocessing {
    preset: String,
    steps: Vec<StepTiming>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ScanResponse {
    record: Record,
    engine: String,
    processing_time_ms: u64,
    preprocessing: Preprocessing,
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: String,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct EngineInfo {
    name: String,
    description: String,
    supported_formats: Vec<String>,
    supported_languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct InfoResponse {
    version: String,
    default_engine: String,
    available_engines: Vec<EngineInfo>,
    max_file_size_bytes: usize,
    default_preset: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Engine that ignores the image and returns fixed text
struct CannedEngine {
    name: &'static str,
    text: &'static str,
    confidence_percent: f32,
}

impl OcrEngine for CannedEngine {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Returns canned text"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<Recognition, OcrError> {
        Ok(Recognition {
            text: self.text.to_string(),
            confidence_percent: self.confidence_percent,
            warnings: Vec::new(),
        })
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(Config::default()).await
    }

    async fn start_with(config: Config) -> Self {
        let engines: Vec<Arc<dyn OcrEngine>> = vec![
            Arc::new(CannedEngine {
                name: "canned",
                text: MRZ_TEXT,
                confidence_percent: 92.0,
            }),
            Arc::new(CannedEngine {
                name: "blank",
                text: "nothing to see here",
                confidence_percent: 12.0,
            }),
        ];
        let registry = EngineRegistry::from_engines(engines).expect("registry");
        let app = server::router(AppState::new(registry, config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn scan(&self, path: &str, form: Form) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// A page-shaped PNG: light background with a dark band near the bottom
fn passport_png() -> Vec<u8> {
    let img = GrayImage::from_fn(500, 350, |_, y| {
        if (280..300).contains(&y) {
            Luma([30])
        } else {
            Luma([220])
        }
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn image_form(bytes: Vec<u8>) -> Form {
    let part = Part::bytes(bytes)
        .file_name("passport.png")
        .mime_str("image/png")
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start().await;

    let response: HealthResponse = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.status, "ok");
    assert!(!response.version.is_empty());
}

#[tokio::test]
async fn test_info_endpoint() {
    let server = TestServer::start().await;

    let response: InfoResponse = server
        .client
        .get(server.url("/info"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(response.default_engine, "canned");
    assert_eq!(response.default_preset, "mrz");
    assert_eq!(response.max_file_size_bytes, 10 * 1024 * 1024);

    let names: Vec<&str> = response
        .available_engines
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, vec!["canned", "blank"]);
    assert!(response.available_engines[0]
        .supported_formats
        .contains(&"image/png".to_string()));
}

#[tokio::test]
async fn test_scan_decodes_passport() {
    let server = TestServer::start().await;

    let response = server.scan("/scan", image_form(passport_png())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let result: ScanResponse = response.json().await.unwrap();
    assert_eq!(result.engine, "canned");
    assert_eq!(result.record.passport_number, "L898902C3");
    assert_eq!(result.record.nationality, "UTO");
    assert_eq!(result.record.surname, "ERIKSSON");
    assert_eq!(result.record.given_names, "ANNA MARIA");
    assert_eq!(result.record.birth_date, "1974-08-12");
    assert_eq!(result.record.expiry_date, "2012-04-15");
    assert_eq!(result.record.sex, "FEMALE");
    assert!(result.record.is_valid);
    assert!((result.record.confidence - 0.92).abs() < 1e-6);

    assert_eq!(result.preprocessing.preset, "mrz");
    let steps: Vec<&str> = result
        .preprocessing
        .steps
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(steps, vec!["grayscale", "mrz_band", "resize", "normalize"]);
}

#[tokio::test]
async fn test_scan_with_preset_field() {
    let server = TestServer::start().await;

    let form = image_form(passport_png()).text("preset", "none");
    let result: ScanResponse = server.scan("/scan", form).await.json().await.unwrap();

    assert_eq!(result.preprocessing.preset, "none");
    assert!(result.preprocessing.steps.is_empty());
}

#[tokio::test]
async fn test_scan_with_unknown_preset() {
    let server = TestServer::start().await;

    let form = image_form(passport_png()).text("preset", "sepia");
    let response = server.scan("/scan", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "INVALID_REQUEST");
}

#[tokio::test]
async fn test_scan_without_mrz_is_not_found() {
    let server = TestServer::start().await;

    let response = server.scan("/scan/blank", image_form(passport_png())).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "MRZ_NOT_FOUND");
    assert!(error.message.unwrap().contains("Machine Readable Zone"));
}

#[tokio::test]
async fn test_scan_with_explicit_engine() {
    let server = TestServer::start().await;

    let result: ScanResponse = server
        .scan("/scan/canned", image_form(passport_png()))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(result.engine, "canned");
}

#[tokio::test]
async fn test_scan_with_unknown_engine() {
    let server = TestServer::start().await;

    let response = server.scan("/scan/nope", image_form(passport_png())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "UNKNOWN_ENGINE");
}

#[tokio::test]
async fn test_scan_missing_file() {
    let server = TestServer::start().await;

    let form = Form::new().text("preset", "mrz");
    let response = server.scan("/scan", form).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "MISSING_FILE");
}

#[tokio::test]
async fn test_scan_undecodable_image() {
    let server = TestServer::start().await;

    let response = server
        .scan("/scan", image_form(b"definitely not a png".to_vec()))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "INVALID_REQUEST");
}

#[tokio::test]
async fn test_scan_rejects_oversized_upload() {
    let config = Config {
        max_file_size: 1024,
        preset: Preset::Minimal,
        ..Config::default()
    };
    let server = TestServer::start_with(config).await;

    let response = server.scan("/scan", image_form(vec![0u8; 4096])).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "IMAGE_TOO_LARGE");
}

#[tokio::test]
async fn test_decode_endpoint() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/decode"))
        .json(&json!({ "text": MRZ_TEXT, "confidencePercent": 64.0 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let record: Record = response.json().await.unwrap();
    assert_eq!(record.passport_number, "L898902C3");
    assert!((record.confidence - 0.64).abs() < 1e-6);
}

#[tokio::test]
async fn test_decode_without_confidence_uses_nominal() {
    let server = TestServer::start().await;

    let record: Record = server
        .client
        .post(server.url("/decode"))
        .json(&json!({ "text": MRZ_TEXT }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!((record.confidence - 0.85).abs() < 1e-6);
}

#[tokio::test]
async fn test_decode_invalid_record() {
    let server = TestServer::start().await;

    let text = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\n\
                L8989<<<<6UTO7408122F1204159ZE184226B<<<<<10";
    let response = server
        .client
        .post(server.url("/decode"))
        .json(&json!({ "text": text }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = response.json().await.unwrap();
    assert_eq!(error.code, "MRZ_INVALID");
}

#[tokio::test]
async fn test_autofill_endpoint() {
    let server = TestServer::start().await;

    let record: Value = server
        .client
        .post(server.url("/decode"))
        .json(&json!({ "text": MRZ_TEXT }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = server
        .client
        .post(server.url("/autofill"))
        .json(&json!({
            "record": record,
            "current": { "travelers[1].personalInfo.firstName": "Anna" },
            "prefix": "travelers[1]",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let patch: Value = response.json().await.unwrap();
    let updates = patch["updates"].as_array().unwrap();

    let value_of = |path: &str| {
        updates
            .iter()
            .find(|u| u["path"] == path)
            .map(|u| u["value"].as_str().unwrap().to_string())
    };

    assert_eq!(
        value_of("travelers[1].personalInfo.passport.number").as_deref(),
        Some("L898902C3")
    );
    assert_eq!(
        value_of("travelers[1].personalInfo.lastName").as_deref(),
        Some("ERIKSSON")
    );
    assert_eq!(value_of("travelers[1].personalInfo.firstName"), None);
}
