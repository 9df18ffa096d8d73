//! Text to identifier transform shared by anchors and generated urls.
//!
//! The output alphabet is `[a-z0-9_-]`, hyphen separated, with no leading, trailing or doubled
//! hyphens. Other crates generating anchors for this corpus rely on that exact shape.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

static NON_WORD_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("static regex compiles"));
static OUTSIDE_SLUG_ALPHABET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^-A-Za-z0-9_]").expect("static regex compiles"));
static REPEATED_HYPHENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-{2,}").expect("static regex compiles"));

/// Best-effort ASCII transliteration: compatibility decomposition, then drop combining marks.
///
/// Characters with no ASCII decomposition (e.g. `ß`, `æ`, CJK) survive this step and are removed
/// by the alphabet filter afterwards.
fn transliterate(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Turn arbitrary text into a lowercase, hyphen separated, ASCII-safe identifier.
///
/// Returns an empty string when nothing in `text` survives the transform.
///
/// ```
/// use noet_xref::paths::slugify;
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("Café Société"), "cafe-societe");
/// assert_eq!(slugify("!!!"), "");
/// ```
pub fn slugify(text: &str) -> String {
    let hyphenated = NON_WORD_RUNS.replace_all(text, "-");
    let ascii = transliterate(&hyphenated);
    let filtered = OUTSIDE_SLUG_ALPHABET.replace_all(&ascii, "");
    let trimmed = filtered.trim_matches('-');
    REPEATED_HYPHENS
        .replace_all(trimmed, "-")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Section One"), "section-one");
        assert_eq!(slugify("API & Reference"), "api-reference");
        assert_eq!(slugify("  leading and trailing  "), "leading-and-trailing");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
        assert_eq!(slugify("Chapter 3.2"), "chapter-3-2");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Über Straße"), "uber-strae");
        assert_eq!(slugify("naïve résumé"), "naive-resume");
        assert_eq!(slugify("ﬁle"), "file");
    }

    #[test]
    fn test_slugify_empty_results() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn test_slugify_idempotent() {
        for input in [
            "Hello, World!",
            "already-clean",
            "x--y",
            "Über Straße",
            "日本 語 mixed Text",
            "-a-",
            "A_B",
        ] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "slugify not idempotent for {input:?}");
        }
    }
}
