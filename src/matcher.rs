//! Fuzzy correction of recognized text against the medicine vocabulary.
//!
//! Pure functions, no async — easily testable. Scores a noisy OCR fragment
//! against every vocabulary entry with a token-set ratio and returns the best
//! entry when it clears the acceptance threshold.

use std::collections::BTreeSet;

use tracing::debug;

use crate::vocabulary::Vocabulary;

/// Default acceptance threshold for handwritten prescription scans.
pub const DEFAULT_THRESHOLD: u8 = 55;

/// A vocabulary entry accepted as the correction for a query, with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub name: String,
    pub score: u8,
}

/// Find the vocabulary entry closest to `query`.
///
/// The query is lowercased and trimmed before scoring. An empty query is a
/// "no match", not an error. Ties go to the first entry in vocabulary order.
/// Returns `None` when the best score is below `threshold`.
pub fn best_match(vocabulary: &Vocabulary, query: &str, threshold: u8) -> Option<Match> {
    let normalized = query.trim().to_lowercase();

    if normalized.is_empty() {
        debug!("Empty query, skipping fuzzy matching");
        return None;
    }

    let mut best: Option<Match> = None;
    for entry in vocabulary.entries() {
        let score = token_set_ratio(&normalized, entry);
        if best.as_ref().map_or(true, |m| score > m.score) {
            best = Some(Match {
                name: entry.clone(),
                score,
            });
        }
    }

    let best = best?;
    debug!(
        "Fuzzy match: {} -> {} (score {})",
        query, best.name, best.score
    );

    if best.score >= threshold {
        Some(best)
    } else {
        None
    }
}

/// Token-set similarity between two strings, as an integer in 0..=100.
///
/// Both strings are split into whitespace-delimited token sets (order- and
/// duplicate-insensitive). When one token set contains the other the score
/// is 100; otherwise the score is the best edit-distance ratio among the
/// shared-token string and the two combined sorted-token strings.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0;
    }

    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    // One set containing the other (identical sets included) is a full match.
    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100;
    }

    let sect = shared.join(" ");
    let combined_a = join_tokens(&sect, &only_a);
    let combined_b = join_tokens(&sect, &only_b);

    let mut score = string_ratio(&combined_a, &combined_b);
    if !sect.is_empty() {
        score = score
            .max(string_ratio(&sect, &combined_a))
            .max(string_ratio(&sect, &combined_b));
    }
    score
}

/// Join the shared-token string with the remaining tokens of one side.
fn join_tokens(sect: &str, rest: &[&str]) -> String {
    if sect.is_empty() {
        rest.join(" ")
    } else if rest.is_empty() {
        sect.to_string()
    } else {
        format!("{} {}", sect, rest.join(" "))
    }
}

/// Normalized Levenshtein ratio scaled to an integer in 0..=100.
fn string_ratio(a: &str, b: &str) -> u8 {
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::from_names(vec![
            "paracetamol".to_string(),
            "amoxicillin".to_string(),
        ])
    }

    #[test]
    fn test_dropped_character_still_matches() {
        let m = best_match(&vocab(), "paracetmol", 55).unwrap();
        assert_eq!(m.name, "paracetamol");
        assert!(m.score >= 55);
    }

    #[test]
    fn test_garbage_query_does_not_match() {
        assert!(best_match(&vocab(), "xyzabc", 55).is_none());
    }

    #[test]
    fn test_extra_token_does_not_prevent_match() {
        let m = best_match(&vocab(), "amoxicillin 500mg", 55).unwrap();
        assert_eq!(m.name, "amoxicillin");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn test_threshold_sensitivity() {
        assert!(best_match(&vocab(), "PARA", 90).is_none());
        let m = best_match(&vocab(), "PARA", 20).unwrap();
        assert_eq!(m.name, "paracetamol");
    }

    #[test]
    fn test_empty_query_is_no_match() {
        for threshold in [0, 55, 100] {
            assert!(best_match(&vocab(), "", threshold).is_none());
            assert!(best_match(&vocab(), "   \t ", threshold).is_none());
        }
    }

    #[test]
    fn test_query_normalization() {
        let m = best_match(&vocab(), "  PARACETAMOL  ", 100).unwrap();
        assert_eq!(m.name, "paracetamol");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn test_token_multiset_identical_matches_at_full_threshold() {
        // Same token set after normalization, duplicates ignored.
        let m = best_match(&vocab(), "amoxicillin amoxicillin", 100).unwrap();
        assert_eq!(m.name, "amoxicillin");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn test_threshold_monotonicity() {
        let queries = ["paracetmol", "amoxicillin 500mg", "para", "xyzabc"];
        for query in queries {
            let mut previously_matched = true;
            for threshold in 0..=100u8 {
                let matched = best_match(&vocab(), query, threshold).is_some();
                // Raising the threshold can only lose a match, never gain one.
                assert!(previously_matched || !matched, "query {:?} at {}", query, threshold);
                previously_matched = matched;
            }
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let a = token_set_ratio("paracetmol", "paracetamol");
        let b = token_set_ratio("paracetmol", "paracetamol");
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_order_insensitive() {
        assert_eq!(token_set_ratio("500mg amoxicillin", "amoxicillin 500mg"), 100);
    }

    #[test]
    fn test_first_entry_wins_ties() {
        let duplicates = Vocabulary::from_names(vec![
            "ibuprofen".to_string(),
            "ibuprofen".to_string(),
        ]);
        let m = best_match(&duplicates, "ibuprofen", 55).unwrap();
        assert_eq!(m.name, "ibuprofen");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn test_token_set_ratio_empty_inputs() {
        assert_eq!(token_set_ratio("", "paracetamol"), 0);
        assert_eq!(token_set_ratio("paracetamol", ""), 0);
        assert_eq!(token_set_ratio("", ""), 0);
    }
}
