//! Medicine-name vocabulary loaded once at startup.
//!
//! Reads the first column of a CSV resource, lowercases and trims each name,
//! and keeps them in file order for the process lifetime. Duplicates are
//! preserved. A missing, unreadable, or empty resource is fatal — the process
//! must not serve matches without a vocabulary.

use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to open vocabulary file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse vocabulary CSV {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("vocabulary file {path:?} contains no entries")]
    Empty { path: PathBuf },
}

/// Immutable, ordered list of known medicine names.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entries: Vec<String>,
}

impl Vocabulary {
    /// Load names from a single-column CSV file.
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let file = File::open(path).map_err(|source| VocabularyError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| VocabularyError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

            if let Some(first) = record.get(0) {
                let name = first.trim().to_lowercase();
                if !name.is_empty() {
                    entries.push(name);
                }
            }
        }

        if entries.is_empty() {
            return Err(VocabularyError::Empty {
                path: path.to_path_buf(),
            });
        }

        info!("Loaded {} medicine names from {:?}", entries.len(), path);
        Ok(Self { entries })
    }

    /// Build a vocabulary from in-memory names, applying the same
    /// normalization as [`Vocabulary::load`].
    pub fn from_names(names: Vec<String>) -> Self {
        let entries = names
            .into_iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_normalizes_entries() {
        let file = write_csv("Paracetamol\n  AMOXICILLIN  \nibuprofen\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.entries(), ["paracetamol", "amoxicillin", "ibuprofen"]);
    }

    #[test]
    fn test_load_keeps_order_and_duplicates() {
        let file = write_csv("aspirin\nparacetamol\naspirin\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.entries()[0], "aspirin");
        assert_eq!(vocab.entries()[2], "aspirin");
    }

    #[test]
    fn test_load_takes_first_column_only() {
        let file = write_csv("Metformin,500mg,tablet\nCetirizine,10mg\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.entries(), ["metformin", "cetirizine"]);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Vocabulary::load(Path::new("/nonexistent/medicines.csv")).unwrap_err();
        assert!(matches!(err, VocabularyError::Open { .. }));
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let file = write_csv("");
        let err = Vocabulary::load(file.path()).unwrap_err();
        assert!(matches!(err, VocabularyError::Empty { .. }));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let file = write_csv("aspirin\n   \n\nparacetamol\n");
        let vocab = Vocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.entries(), ["aspirin", "paracetamol"]);
    }
}
