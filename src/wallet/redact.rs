//! Short, non-reversible renderings of secrets for confirmation prompts.

const VISIBLE_EDGE: usize = 4;

/// `abcd…wxyz` for anything longer than eight characters, `****` otherwise.
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.trim().chars().collect();
    if chars.len() <= VISIBLE_EDGE * 2 {
        return "****".to_string();
    }
    let head: String = chars[..VISIBLE_EDGE].iter().collect();
    let tail: String = chars[chars.len() - VISIBLE_EDGE..].iter().collect();
    format!("{}…{}", head, tail)
}

/// First and last word plus the word count, e.g. `abandon … about (12 words)`.
pub fn mnemonic_fragment(phrase: &str) -> String {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    match words.as_slice() {
        [] => "(empty)".to_string(),
        [only] => format!("{} (1 word)", redact(only)),
        [first, .., last] => format!(
            "{} … {} ({} words)",
            first.to_lowercase(),
            last.to_lowercase(),
            words.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_short_input() {
        assert_eq!(redact(""), "****");
        assert_eq!(redact("12345678"), "****");
    }

    #[test]
    fn test_redact_keeps_edges() {
        assert_eq!(redact("abcdefghijkl"), "abcd…ijkl");
        assert_eq!(redact("  abcdefghijkl \n"), "abcd…ijkl");
    }

    #[test]
    fn test_redact_hides_middle() {
        let secret = "4uQeVj5tqViQh7yWWGStvkEG1Zmhx6uasJtWCJziofM";
        let shown = redact(secret);
        assert!(!shown.contains("tqViQh7yWW"));
        assert_eq!(shown.chars().count(), 9);
    }

    #[test]
    fn test_mnemonic_fragment() {
        let phrase = "Abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon ABOUT";
        assert_eq!(mnemonic_fragment(phrase), "abandon … about (12 words)");
        assert_eq!(mnemonic_fragment("   "), "(empty)");
    }
}
