//! Free-text code recovery.
//!
//! Two passes over the same text. The line scan takes lines shaped like
//! `CODE: description` or `CODE description`; the inline sweep then picks up
//! any remaining code tokens and guesses a description from the line they
//! first appear on.

use std::collections::{HashMap, HashSet};

use super::pattern::{CodePattern, SEPARATORS};
use super::strategy::{ExtractionInput, ExtractionSource, ExtractionStrategy};
use crate::models::CodedFinding;

/// Line-by-line scan. The first match on a line is used; the first line to
/// name a code wins. Lines with an empty description are skipped and their
/// codes are left for the inline sweep.
pub fn scan_lines(text: &str, pattern: &CodePattern) -> (Vec<CodedFinding>, HashSet<String>) {
    let mut findings = Vec::new();
    let mut seen = HashSet::new();

    for line in text.lines() {
        let Some((code, description)) = pattern.match_line(line) else {
            continue;
        };
        if description.is_empty() || seen.contains(&code) {
            continue;
        }
        seen.insert(code.clone());
        findings.push(CodedFinding::new(code, description));
    }

    (findings, seen)
}

/// Sweep for code tokens anywhere in `text` that are not in `seen`.
///
/// Each new code is described from the first line containing it
/// (case-insensitive): text after a separator if one follows the code,
/// otherwise the remainder when it has more than one word, otherwise empty.
pub fn sweep_inline(
    text: &str,
    pattern: &CodePattern,
    seen: &mut HashSet<String>,
) -> Vec<CodedFinding> {
    let lines: Vec<&str> = text.lines().collect();
    let mut findings = Vec::new();

    for code in pattern.find_codes(text) {
        if seen.contains(&code) {
            continue;
        }
        let description = lines
            .iter()
            .find(|line| line.to_ascii_uppercase().contains(&code))
            .map(|line| describe_after_code(line, &code))
            .unwrap_or_default();
        seen.insert(code.clone());
        findings.push(CodedFinding::new(code, description));
    }

    findings
}

/// Description for `code` taken from the rest of `line`.
fn describe_after_code(line: &str, code: &str) -> String {
    // ASCII uppercasing keeps byte offsets aligned with `line`.
    let Some(idx) = line.to_ascii_uppercase().find(code) else {
        return String::new();
    };
    let after = &line[idx + code.len()..];

    if let Some(pos) = after.find(SEPARATORS) {
        let sep_len = after[pos..].chars().next().map_or(1, char::len_utf8);
        return after[pos + sep_len..].trim().to_string();
    }

    let tail = after.trim();
    if tail.split_whitespace().count() > 1 {
        tail.to_string()
    } else {
        String::new()
    }
}

/// Code to description map from the line patterns alone. The first
/// non-empty description for each code wins.
pub fn description_map(text: &str, pattern: &CodePattern) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        if let Some((code, description)) = pattern.match_line(line) {
            if !description.is_empty() {
                map.entry(code).or_insert(description);
            }
        }
    }
    map
}

/// Scrapes codes from `raw_response`, falling back to `summary`.
pub struct FreeTextStrategy;

impl ExtractionStrategy for FreeTextStrategy {
    fn source(&self) -> ExtractionSource {
        ExtractionSource::FreeText
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> Option<Vec<CodedFinding>> {
        let text = input.free_text();
        if text.trim().is_empty() {
            return None;
        }

        let (mut findings, mut seen) = scan_lines(text, input.pattern);
        findings.extend(sweep_inline(text, input.pattern, &mut seen));
        Some(findings).filter(|findings| !findings.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(findings: &[CodedFinding]) -> Vec<&str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn test_scan_bulleted_list() {
        let pattern = CodePattern::default();
        let (findings, seen) = scan_lines(
            "- J45.909: Asthma, unspecified\n- I10: Essential hypertension",
            &pattern,
        );
        assert_eq!(
            findings,
            vec![
                CodedFinding::new("J45.909", "Asthma, unspecified"),
                CodedFinding::new("I10", "Essential hypertension"),
            ]
        );
        assert!(seen.contains("I10"));
    }

    #[test]
    fn test_scan_first_occurrence_wins() {
        let pattern = CodePattern::default();
        let (findings, _) = scan_lines("I10: First\nE11.9 - Diabetes\ni10: Second", &pattern);
        assert_eq!(codes(&findings), vec!["I10", "E11.9"]);
        assert_eq!(findings[0].description, "First");
    }

    #[test]
    fn test_scan_handles_crlf() {
        let pattern = CodePattern::default();
        let (findings, _) = scan_lines("I10: Hypertension\r\nE78.5: Hyperlipidemia\r\n", &pattern);
        assert_eq!(findings[0].description, "Hypertension");
        assert_eq!(findings[1].description, "Hyperlipidemia");
    }

    #[test]
    fn test_sweep_separator_and_words() {
        let pattern = CodePattern::default();
        let text = "Findings consistent with E11.9 (see note): diabetes\n\
                    Also noted K21.9 gastro reflux disease\n\
                    Rule out Z87.891";
        let mut seen = HashSet::new();
        let findings = sweep_inline(text, &pattern, &mut seen);
        assert_eq!(codes(&findings), vec!["E11.9", "K21.9", "Z87.891"]);
        assert_eq!(findings[0].description, "diabetes");
        assert_eq!(findings[1].description, "gastro reflux disease");
        assert_eq!(findings[2].description, "");
    }

    #[test]
    fn test_sweep_single_word_tail_is_dropped() {
        let pattern = CodePattern::default();
        let mut seen = HashSet::new();
        let findings = sweep_inline("Coded as I10 today", &pattern, &mut seen);
        assert_eq!(findings[0].description, "");
    }

    #[test]
    fn test_sweep_skips_seen_codes() {
        let pattern = CodePattern::default();
        let mut seen: HashSet<String> = ["I10".to_string()].into_iter().collect();
        let findings = sweep_inline("I10 and E11.9 noted", &pattern, &mut seen);
        assert_eq!(codes(&findings), vec!["E11.9"]);
        assert!(seen.contains("E11.9"));
    }

    #[test]
    fn test_sweep_en_dash_separator() {
        let pattern = CodePattern::default();
        let mut seen = HashSet::new();
        let findings = sweep_inline("Dx (primary) R07.9 – chest pain", &pattern, &mut seen);
        assert_eq!(findings[0].description, "chest pain");
    }

    #[test]
    fn test_description_map_first_wins() {
        let pattern = CodePattern::default();
        let map = description_map("I10: Hypertension\nI10 - Other\nE11.9:   ", &pattern);
        assert_eq!(map.get("I10").map(String::as_str), Some("Hypertension"));
        assert!(!map.contains_key("E11.9"));
    }
}
