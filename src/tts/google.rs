//! Google Translate TTS provider.
//!
//! The endpoint caps the query text per request, so longer input is split on
//! whitespace into chunks and the resulting MP3 segments are concatenated
//! (MP3 frames are self-contained, so concatenation plays back fine).

use tracing::{debug, info};

use super::SpeechProvider;

const TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Maximum characters the endpoint accepts per request.
const MAX_CHUNK_CHARS: usize = 200;

pub struct GoogleTranslateTts {
    client: reqwest::Client,
    language: String,
}

impl GoogleTranslateTts {
    pub fn new(client: reqwest::Client, language: String) -> Self {
        Self { client, language }
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> anyhow::Result<Vec<u8>> {
        let textlen = chunk.chars().count().to_string();
        let response = self
            .client
            .get(TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", chunk),
                ("idx", idx.to_string().as_str()),
                ("total", total.to_string().as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("TTS endpoint error ({}): {}", status, text);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl SpeechProvider for GoogleTranslateTts {
    fn name(&self) -> &str {
        "google_translate_tts"
    }

    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            anyhow::bail!("Cannot synthesize empty text");
        }

        info!(
            "GoogleTranslateTts: synthesizing {} chunk(s), lang={}",
            chunks.len(),
            self.language
        );

        let total = chunks.len();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            debug!(
                "GoogleTranslateTts: chunk {}/{} ({} chars)",
                idx + 1,
                total,
                chunk.chars().count()
            );
            audio.extend(self.fetch_chunk(chunk, idx, total).await?);
        }

        Ok(audio)
    }
}

/// Split text into whitespace-respecting chunks of at most `max_chars`
/// characters. Words longer than `max_chars` become their own chunk rather
/// than being split mid-word.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current_chars > 0 && current_chars + 1 + word_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        if current_chars > 0 {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_short_text() {
        assert_eq!(chunk_text("paracetamol amoxicillin", 200), vec![
            "paracetamol amoxicillin".to_string()
        ]);
    }

    #[test]
    fn test_chunk_respects_limit() {
        let text = "one two three four five";
        let chunks = chunk_text(text, 9);
        assert_eq!(chunks, vec!["one two", "three", "four five"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 9);
        }
    }

    #[test]
    fn test_chunk_oversized_word_kept_whole() {
        let chunks = chunk_text("hydroxychloroquine", 5);
        assert_eq!(chunks, vec!["hydroxychloroquine"]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("   ", 200).is_empty());
        assert!(chunk_text("", 200).is_empty());
    }
}
