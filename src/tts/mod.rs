//! Speech synthesis boundary.
//!
//! [`SpeechProvider`] turns a text string into a spoken MP3 clip. The default
//! backend calls the Google Translate TTS endpoint.

pub mod google;

/// Async trait implemented by each speech backend.
#[async_trait::async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>>;
}
