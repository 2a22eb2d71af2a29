//! Code token pattern and the line regexes built from it.
//!
//! A code is one letter, one digit, one alphanumeric, and an optional
//! dotted suffix of one to four alphanumerics (`E11`, `J45.909`, `S72.001A`).
//! Some letters are excluded from the first position; `U` by default.

use regex::Regex;
use thiserror::Error;

/// Letters excluded from the first position unless configured otherwise.
pub const DEFAULT_EXCLUDED_LETTERS: &str = "U";

/// Separator characters accepted between a code and its description.
pub const SEPARATORS: &[char] = &[':', '-', '\u{2013}', '\u{2014}'];

/// Errors building a [`CodePattern`].
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("every letter is excluded; no code can match")]
    NoLetters,

    #[error("invalid code pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Compiled code-matching regexes.
#[derive(Debug, Clone)]
pub struct CodePattern {
    excluded: Vec<char>,
    /// `CODE : description` (also `-`, en-dash, em-dash), optional bullet.
    separated_line: Regex,
    /// `CODE description`, optional bullet.
    spaced_line: Regex,
    /// A code anywhere in text.
    inline: Regex,
}

impl CodePattern {
    /// Build the pattern with the given letters excluded from the first
    /// position. Non-letters in `excluded_letters` are ignored.
    pub fn new(excluded_letters: &str) -> Result<Self, PatternError> {
        let excluded: Vec<char> = excluded_letters
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let letters: String = ('A'..='Z').filter(|c| !excluded.contains(c)).collect();
        if letters.is_empty() {
            return Err(PatternError::NoLetters);
        }
        // ASCII letters only, in both cases.
        let code = format!(
            r"[{letters}{lower}][0-9][0-9A-Za-z](?:\.[0-9A-Za-z]{{1,4}})?",
            lower = letters.to_ascii_lowercase()
        );

        Ok(Self {
            separated_line: Regex::new(&format!(
                r"^\s*[-*•]?\s*({code})\s*[:\-–—]\s*(.+)\s*$"
            ))?,
            spaced_line: Regex::new(&format!(r"^\s*[-*•]?\s*({code})\s+(.+)\s*$"))?,
            inline: Regex::new(&format!(r"\b({code})\b"))?,
            excluded,
        })
    }

    /// Letters excluded from the first position.
    pub fn excluded_letters(&self) -> &[char] {
        &self.excluded
    }

    /// Match a whole line as `code + description`, trying the separator
    /// form before the whitespace form. Returns the uppercased code and the
    /// trimmed description.
    pub fn match_line(&self, line: &str) -> Option<(String, String)> {
        let caps = self
            .separated_line
            .captures(line)
            .or_else(|| self.spaced_line.captures(line))?;
        let code = caps.get(1)?.as_str().to_ascii_uppercase();
        let description = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        Some((code, description))
    }

    /// All code tokens in `text`, uppercased, in order of appearance.
    pub fn find_codes<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        self.inline
            .find_iter(text)
            .map(|m| m.as_str().to_ascii_uppercase())
    }

    /// Whether `code` is exactly one code token.
    pub fn is_code(&self, code: &str) -> bool {
        self.inline
            .find(code)
            .is_some_and(|m| m.start() == 0 && m.end() == code.len())
    }
}

impl Default for CodePattern {
    fn default() -> Self {
        // The default letter set always yields a valid character class.
        Self::new(DEFAULT_EXCLUDED_LETTERS).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_forms() {
        let pattern = CodePattern::default();
        for line in [
            "J45.909: Asthma, unspecified",
            "- J45.909 - Asthma, unspecified",
            "* j45.909 – Asthma, unspecified",
            "• J45.909 — Asthma, unspecified",
        ] {
            assert_eq!(
                pattern.match_line(line),
                Some(("J45.909".to_string(), "Asthma, unspecified".to_string())),
                "line: {line}"
            );
        }
    }

    #[test]
    fn test_space_form() {
        let pattern = CodePattern::default();
        assert_eq!(
            pattern.match_line("  I10   Essential hypertension  "),
            Some(("I10".to_string(), "Essential hypertension".to_string()))
        );
    }

    #[test]
    fn test_u_excluded_by_default() {
        let pattern = CodePattern::default();
        assert!(pattern.match_line("U07.1: COVID-19").is_none());
        assert!(!pattern.is_code("U07.1"));
        assert!(pattern.is_code("E11.9"));
    }

    #[test]
    fn test_configurable_exclusion() {
        let pattern = CodePattern::new("").unwrap();
        assert!(pattern.is_code("U07.1"));
        assert!(pattern.excluded_letters().is_empty());

        let pattern = CodePattern::new("u, z").unwrap();
        assert_eq!(pattern.excluded_letters(), &['U', 'Z']);
        assert!(!pattern.is_code("Z79.4"));
    }

    #[test]
    fn test_excluding_every_letter_is_an_error() {
        assert!(matches!(
            CodePattern::new("ABCDEFGHIJKLMNOPQRSTUVWXYZ"),
            Err(PatternError::NoLetters)
        ));
    }

    #[test]
    fn test_find_codes_inline() {
        let pattern = CodePattern::default();
        let codes: Vec<String> = pattern
            .find_codes("Consistent with e11.9 and I10; rule out U07.1.")
            .collect();
        assert_eq!(codes, vec!["E11.9", "I10"]);
    }

    #[test]
    fn test_suffix_limited_to_four() {
        let pattern = CodePattern::default();
        assert!(pattern.is_code("S72.001A"));
        assert!(!pattern.is_code("S72.001AB"));
    }

    #[test]
    fn test_non_ascii_lookalikes_do_not_match() {
        let pattern = CodePattern::default();
        // KELVIN SIGN and LONG S fold to ASCII letters case-insensitively.
        assert!(pattern.match_line("\u{212A}21.9: GERD").is_none());
        assert!(!pattern.is_code("\u{212A}21.9"));
        let codes: Vec<String> = pattern.find_codes("s72.\u{17F}01 and \u{212A}21.9").collect();
        assert!(codes.iter().all(|code| code.is_ascii()));
        assert!(!codes.contains(&"K21.9".to_string()));
    }

    #[test]
    fn test_prose_line_does_not_match() {
        let pattern = CodePattern::default();
        assert!(pattern.match_line("The patient reports chest pain").is_none());
    }
}
