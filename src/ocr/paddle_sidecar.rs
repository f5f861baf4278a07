//! YOLO + PaddleOCR sidecar recognition provider.

use serde::Deserialize;
use tracing::info;

use super::{RecognitionProvider, RecognitionResult, ScanInput, TextFragment};

/// Sidecar response (private deserialization types).
///
/// The sidecar detects medicine-name boxes, crops and preprocesses them, and
/// runs text recognition on each crop. Regions with no recognizable text are
/// omitted, so `fragments` may be empty.
#[derive(Debug, Deserialize)]
struct SidecarResponse {
    fragments: Vec<SidecarFragment>,
}

#[derive(Debug, Deserialize)]
struct SidecarFragment {
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
}

pub struct PaddleSidecarProvider {
    url: String,
    client: reqwest::Client,
}

impl PaddleSidecarProvider {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { url, client }
    }
}

#[async_trait::async_trait]
impl RecognitionProvider for PaddleSidecarProvider {
    fn name(&self) -> &str {
        "paddle_sidecar"
    }

    async fn recognize(&self, input: &ScanInput) -> anyhow::Result<RecognitionResult> {
        use reqwest::multipart::{Form, Part};

        let part = Part::bytes(input.data.clone())
            .file_name(input.filename.clone())
            .mime_str("application/octet-stream")?;

        let form = Form::new().part("image", part);

        info!(
            "PaddleSidecarProvider: sending {} ({} bytes) for recognition",
            input.filename,
            input.data.len()
        );

        let response = self
            .client
            .post(format!("{}/recognize", self.url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Recognition sidecar error ({}): {}", status, error_text);
        }

        let sidecar: SidecarResponse = response.json().await?;
        info!(
            "PaddleSidecarProvider: {} fragment(s) recognized",
            sidecar.fragments.len()
        );

        Ok(RecognitionResult {
            fragments: sidecar
                .fragments
                .into_iter()
                .map(|f| TextFragment {
                    text: f.text,
                    confidence: f.confidence,
                })
                .collect(),
            provider_name: "paddle_sidecar".to_string(),
        })
    }
}
