//! Canonical form of questions used as knowledge-base keys.

/// Normalizes free text into a comparable knowledge-base key.
///
/// - Lowercases (Unicode-aware).
/// - Removes every ASCII punctuation character.
/// - Collapses whitespace runs into a single space and trims both ends.
///
/// The result is idempotent: `normalize(&normalize(x)) == normalize(x)`.
///
/// # Example
/// ```
/// assert_eq!(qa_engine::normalize("  Hello,   World!! "), "hello world");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize("Hello, World!!"), "hello world");
        assert_eq!(normalize("What is your name?"), "what is your name");
        assert_eq!(normalize("it's (really) \"fine\"; ok?"), "its really fine ok");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("  a \t b\n\nc  "), "a b c");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn punctuation_only_input_becomes_empty() {
        assert_eq!(normalize("?!..."), "");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(normalize("Où est la GARE?"), "où est la gare");
    }

    #[test]
    fn is_idempotent() {
        for raw in [
            "Hello, World!!",
            "  MIXED case -- and   spaces ",
            "Straße?",
            "no",
            "1.",
            "",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "input: {raw:?}");
        }
    }
}
