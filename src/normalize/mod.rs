//! Query and record-name canonicalization.
//!
//! Every string entering the matching path goes through [`normalize`] first,
//! so fuzzy scores, embeddings, and cache keys all agree on one spelling.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonicalizes raw text: NFD decomposition, combining marks stripped,
/// lowercased, internal whitespace collapsed to single spaces, trimmed.
///
/// Pure and idempotent; empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Splits normalized text into its whitespace-delimited tokens.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(normalize("  John SMITH  "), "john smith");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("Jörg Müller"), "jorg muller");
        assert_eq!(normalize("José"), "jose");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("john\t\t smith\n jr"), "john smith jr");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
    }

    #[test]
    fn is_idempotent() {
        for raw in ["  John  SMITH ", "Jörg  Müller", "", "a\u{0301}bc  DEF"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn tokens_skip_empties() {
        let norm = normalize("  john   smith ");
        let toks: Vec<&str> = tokens(&norm).collect();
        assert_eq!(toks, vec!["john", "smith"]);
    }
}
