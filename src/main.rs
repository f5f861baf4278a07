//! Prescription Reader - handwritten prescription scanning server.
//!
//! Accepts a prescription photo, hands it to an external detection +
//! recognition sidecar, corrects each recognized fragment against the
//! medicine vocabulary, and can speak a result back as an MP3 clip.

mod config;
mod matcher;
mod ocr;
mod tts;
mod vocabulary;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use config::AppConfig;
use ocr::{paddle_sidecar::PaddleSidecarProvider, RecognitionProvider, ScanInput};
use tts::{google::GoogleTranslateTts, SpeechProvider};
use vocabulary::Vocabulary;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
    vocabulary: Arc<Vocabulary>,
    recognizer: Arc<dyn RecognitionProvider>,
    speech: Arc<dyn SpeechProvider>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "prescription_reader=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // The vocabulary is the one resource the service cannot run without.
    let vocabulary = Vocabulary::load(&config.vocabulary_path)
        .with_context(|| format!("cannot load vocabulary from {:?}", config.vocabulary_path))?;
    info!(
        "Vocabulary ready: {} entries, default threshold {}",
        vocabulary.len(),
        config.match_threshold
    );

    std::fs::create_dir_all(&config.upload_dir)
        .with_context(|| format!("cannot create upload dir {:?}", config.upload_dir))?;
    std::fs::create_dir_all(&config.audio_dir)
        .with_context(|| format!("cannot create audio dir {:?}", config.audio_dir))?;

    let client = reqwest::Client::new();
    let recognizer = PaddleSidecarProvider::new(client.clone(), config.recognizer_url.clone());
    let speech = GoogleTranslateTts::new(client, config.tts_language.clone());
    info!(
        "Providers ready: recognition={}, speech={}",
        recognizer.name(),
        speech.name()
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        config: Arc::new(config),
        vocabulary: Arc::new(vocabulary),
        recognizer: Arc::new(recognizer),
        speech: Arc::new(speech),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/scan-prescription", post(scan_prescription))
        .route("/hear-medicines", post(hear_medicines))
        .layer(DefaultBodyLimit::max(25 * 1024 * 1024)) // 25MB
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Run server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(serde::Deserialize)]
struct ScanQuery {
    threshold: Option<u8>,
}

#[derive(serde::Serialize)]
struct ScanResponse {
    medicines: Vec<String>,
}

/// Upload a prescription photo and get the corrected medicine names.
async fn scan_prescription(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
    mut multipart: Multipart,
) -> Result<Json<ScanResponse>, ApiError> {
    let threshold = query.threshold.unwrap_or(state.config.match_threshold);
    if threshold > 100 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("threshold must be in 0..=100, got {}", threshold),
        ));
    }

    // Read the uploaded image
    let mut filename = String::new();
    let mut image_data = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, format!("Multipart error: {}", e))
    })? {
        if field.name() == Some("image") {
            filename = sanitize_filename(field.file_name().unwrap_or("prescription"));
            image_data = field
                .bytes()
                .await
                .map_err(|e| {
                    api_error(StatusCode::BAD_REQUEST, format!("Failed to read image: {}", e))
                })?
                .to_vec();
            break;
        }
    }

    if image_data.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No image uploaded"));
    }

    info!(
        "Received image: {} ({} bytes), threshold {}",
        filename,
        image_data.len(),
        threshold
    );

    // Keep a copy of the upload, UUID-prefixed to avoid collisions
    let upload_path = state
        .config
        .upload_dir
        .join(format!("{}_{}", Uuid::new_v4().simple(), filename));
    tokio::fs::write(&upload_path, &image_data).await.map_err(|e| {
        error!("Failed to save upload to {:?}: {}", upload_path, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save upload")
    })?;

    // Detection + recognition
    let input = ScanInput {
        filename,
        data: image_data,
    };
    let recognition = state.recognizer.recognize(&input).await.map_err(|e| {
        error!("Recognition failed: {}", e);
        api_error(StatusCode::BAD_GATEWAY, format!("Recognition failed: {}", e))
    })?;

    // Correct each fragment against the vocabulary, dropping the misses
    let medicines: Vec<String> = recognition
        .fragments
        .iter()
        .inspect(|f| debug!("Fragment {:?} (confidence {:?})", f.text, f.confidence))
        .filter_map(|f| matcher::best_match(&state.vocabulary, &f.text, threshold))
        .map(|m| m.name)
        .collect();

    if medicines.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "No valid medicine names detected.",
        ));
    }

    info!(
        "Scan complete via {}: {}/{} fragment(s) matched",
        recognition.provider_name,
        medicines.len(),
        recognition.fragments.len()
    );
    Ok(Json(ScanResponse { medicines }))
}

#[derive(serde::Deserialize)]
struct TextRequest {
    text: String,
}

/// Convert a text string to a spoken MP3 clip.
async fn hear_medicines(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Text must not be empty"));
    }

    let audio = state.speech.synthesize(&request.text).await.map_err(|e| {
        error!("Speech synthesis failed: {}", e);
        api_error(
            StatusCode::BAD_GATEWAY,
            format!("Speech synthesis failed: {}", e),
        )
    })?;

    let audio_path = state
        .config
        .audio_dir
        .join(format!("{}_output.mp3", Uuid::new_v4().simple()));
    tokio::fs::write(&audio_path, &audio).await.map_err(|e| {
        error!("Failed to save audio to {:?}: {}", audio_path, e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save audio")
    })?;
    info!("Audio clip saved: {:?} ({} bytes)", audio_path, audio.len());

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

// ============================================================================
// Helper functions
// ============================================================================

/// Reduce a client-supplied filename to its final path component so the
/// upload path stays inside the upload directory.
fn sanitize_filename(raw: &str) -> String {
    // Path::file_name is None for paths ending in "..", "." or a separator.
    std::path::Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("prescription")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_plain() {
        assert_eq!(sanitize_filename("scan.jpg"), "scan.jpg");
    }

    #[test]
    fn test_sanitize_filename_strips_path_components() {
        assert_eq!(sanitize_filename("a/../../x.png"), "x.png");
        assert_eq!(sanitize_filename("/etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("dir/sub/scan.jpg"), "scan.jpg");
    }

    #[test]
    fn test_sanitize_filename_rejects_degenerate_names() {
        assert_eq!(sanitize_filename(""), "prescription");
        assert_eq!(sanitize_filename(".."), "prescription");
        assert_eq!(sanitize_filename("a/.."), "prescription");
        assert_eq!(sanitize_filename("/"), "prescription");
    }
}
