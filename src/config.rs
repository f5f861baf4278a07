//! Environment-driven service configuration, loaded once at startup.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Runtime configuration for the prescription reader service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Path to the single-column medicine-name CSV.
    pub vocabulary_path: PathBuf,
    /// Default fuzzy-match acceptance threshold in 0..=100.
    pub match_threshold: u8,
    /// Base URL of the detection + recognition sidecar.
    pub recognizer_url: String,
    /// Language code for speech synthesis.
    pub tts_language: String,
    /// Directory uploaded prescription images are saved to.
    pub upload_dir: PathBuf,
    /// Directory synthesized audio clips are saved to.
    pub audio_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let match_threshold = match std::env::var("MATCH_THRESHOLD") {
            Ok(raw) => {
                let threshold: u8 = raw
                    .parse()
                    .with_context(|| format!("invalid MATCH_THRESHOLD: {}", raw))?;
                anyhow::ensure!(
                    threshold <= 100,
                    "MATCH_THRESHOLD must be in 0..=100, got {}",
                    threshold
                );
                threshold
            }
            Err(_) => crate::matcher::DEFAULT_THRESHOLD,
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            vocabulary_path: std::env::var("VOCABULARY_PATH")
                .unwrap_or_else(|_| "data/medicines.csv".to_string())
                .into(),
            match_threshold,
            recognizer_url: std::env::var("RECOGNIZER_URL")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            tts_language: std::env::var("TTS_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            audio_dir: std::env::var("AUDIO_DIR")
                .unwrap_or_else(|_| "audio".to_string())
                .into(),
        })
    }
}
