//! Token-aware lexical similarity.
//!
//! Scores are the max over a few strsim strategies so that misspellings
//! ("jon smyth" ~ "john smith") and word reordering ("smith john" ~
//! "john smith") both land high. Inputs are expected to be
//! [`crate::normalize::normalize`]d already.

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::normalize::tokens;

/// Lexical similarity between two normalized strings, in `[0, 1]`.
///
/// Pure function of its inputs; 1.0 means identical.
pub fn fuzzy_score(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return 1.0;
    }

    let direct = jaro_winkler(query, candidate).max(normalized_levenshtein(query, candidate));
    direct.max(token_sort_score(query, candidate)).clamp(0.0, 1.0)
}

/// Jaro-Winkler over alphabetically sorted tokens, so word order is free.
fn token_sort_score(a: &str, b: &str) -> f64 {
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);

    if sorted_a.is_empty() || sorted_b.is_empty() {
        return 0.0;
    }
    jaro_winkler(&sorted_a, &sorted_b)
}

fn sorted_tokens(s: &str) -> String {
    let mut toks: Vec<&str> = tokens(s).collect();
    toks.sort_unstable();
    toks.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(fuzzy_score("john smith", "john smith"), 1.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(fuzzy_score("", "john smith"), 0.0);
        assert_eq!(fuzzy_score("john smith", ""), 0.0);
    }

    #[test]
    fn misspelling_scores_high() {
        let score = fuzzy_score("jon smyth", "john smith");
        assert!(score > 0.8, "score was {score}");
    }

    #[test]
    fn reordered_tokens_score_high() {
        let score = fuzzy_score("smith john", "john smith");
        assert!(score > 0.95, "score was {score}");
    }

    #[test]
    fn unrelated_strings_score_low() {
        let score = fuzzy_score("xyzzy unmatched", "john smith");
        assert!(score < 0.6, "score was {score}");
    }

    #[test]
    fn symmetric_enough_for_ranking() {
        let a = fuzzy_score("jane smith", "john smith");
        let b = fuzzy_score("john smith", "jane smith");
        assert!((a - b).abs() < 1e-9);
    }
}
