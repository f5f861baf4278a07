//! Recognition boundary for the external detection + recognition stage.
//!
//! Defines the [`RecognitionProvider`] trait and unified types so the model
//! backend (a YOLO + PaddleOCR sidecar today) can be swapped without touching
//! the request layer. The stage supplies zero or more raw text fragments per
//! submitted image; correcting them is the matcher's job.

pub mod paddle_sidecar;

/// An uploaded prescription image handed to the recognition stage.
pub struct ScanInput {
    pub filename: String,
    pub data: Vec<u8>,
}

/// One raw text fragment recognized inside a detected medicine-name region.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub text: String,
    pub confidence: Option<f64>,
}

/// Unified recognition output returned by every provider.
#[derive(Debug, Clone)]
pub struct RecognitionResult {
    pub fragments: Vec<TextFragment>,
    pub provider_name: String,
}

/// Async trait implemented by each recognition backend.
#[async_trait::async_trait]
pub trait RecognitionProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn recognize(&self, input: &ScanInput) -> anyhow::Result<RecognitionResult>;
}
