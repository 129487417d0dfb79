//! Reference URL extraction and merging.
//!
//! KEV required-action text embeds URLs in square brackets, e.g.
//! `Apply mitigations per vendor instructions [https://...]`. This module
//! reconciles those embedded URLs with the record's explicit reference list
//! into one ordered, deduplicated set. The text itself is never rewritten;
//! extraction is read-only.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a bracket-delimited candidate: `[` up to the next `]`.
static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("bracket regex"));

/// Accepted scheme prefixes for bracket-embedded candidates. Matching is
/// prefix-only and case-sensitive; no URI grammar validation is applied, so
/// extraction never fails on odd input, it just skips it.
const URL_SCHEMES: [&str; 2] = ["https://", "http://"];

/// Whether a bracketed substring is a syntactically plausible URL.
fn is_url_candidate(candidate: &str) -> bool {
    URL_SCHEMES.iter().any(|s| candidate.starts_with(s))
}

/// Scan free text left-to-right for bracket-embedded URLs, in order of first
/// appearance.
pub fn extract_urls(text: &str) -> Vec<String> {
    BRACKET_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|candidate| is_url_candidate(candidate))
        .collect()
}

/// Build the final URL set for a record: the explicit reference list in its
/// original order, followed by extracted candidates not already present.
///
/// Deduplication is exact-string; two spellings of the same URL (e.g. with
/// and without a trailing slash) are distinct.
pub fn merge_urls(explicit: &[String], text: &str) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(explicit.len());

    for url in explicit {
        if !merged.contains(url) {
            merged.push(url.clone());
        }
    }

    for candidate in extract_urls(text) {
        if !merged.contains(&candidate) {
            merged.push(candidate);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extract_finds_bracketed_urls_in_order() {
        let text = "Apply mitigations per vendor instructions \
                    [https://www.vendor.com/instructions] or discontinue use of the \
                    product if mitigations are unavailable [https://www.vendor.com/something-else].";

        assert_eq!(
            extract_urls(text),
            strings(&[
                "https://www.vendor.com/instructions",
                "https://www.vendor.com/something-else",
            ])
        );
    }

    #[test]
    fn extract_skips_non_url_brackets() {
        let text = "See [the advisory] and [KB-1234] for details [http://example.com/a].";
        assert_eq!(extract_urls(text), strings(&["http://example.com/a"]));
    }

    #[test]
    fn merge_appends_unseen_candidates_after_explicit_list() {
        let explicit = strings(&["https://r1.example.com", "https://r2.example.com"]);
        let text = "Do the thing [https://u1.example.com] then verify [https://u2.example.com].";

        assert_eq!(
            merge_urls(&explicit, text),
            strings(&[
                "https://r1.example.com",
                "https://r2.example.com",
                "https://u1.example.com",
                "https://u2.example.com",
            ])
        );
    }

    #[test]
    fn merge_with_no_brackets_returns_explicit_list() {
        let explicit = strings(&["https://r1.example.com"]);
        assert_eq!(merge_urls(&explicit, "no links here"), explicit);
    }

    #[test]
    fn merge_with_empty_explicit_list_is_extraction_order() {
        let text = "[https://b.example.com] then [https://a.example.com]";
        assert_eq!(
            merge_urls(&[], text),
            strings(&["https://b.example.com", "https://a.example.com"])
        );
    }

    #[test]
    fn candidate_already_explicit_keeps_explicit_position() {
        let explicit = strings(&["https://shared.example.com", "https://r2.example.com"]);
        let text = "Mitigate [https://u1.example.com] per [https://shared.example.com].";

        assert_eq!(
            merge_urls(&explicit, text),
            strings(&[
                "https://shared.example.com",
                "https://r2.example.com",
                "https://u1.example.com",
            ])
        );
    }

    #[test]
    fn repeated_candidate_appended_once() {
        let text = "[https://u1.example.com] and again [https://u1.example.com]";
        assert_eq!(merge_urls(&[], text), strings(&["https://u1.example.com"]));
    }

    #[test]
    fn merge_is_idempotent() {
        let explicit = strings(&["https://r1.example.com"]);
        let text = "Fix it [https://u1.example.com].";

        let once = merge_urls(&explicit, text);
        let twice = merge_urls(&once, text);
        assert_eq!(once, twice);
    }

    #[test]
    fn dedup_is_exact_string_match() {
        let explicit = strings(&["https://example.com/path"]);
        let text = "[https://example.com/path/]";

        // Trailing slash makes it a different URL; no normalization.
        assert_eq!(
            merge_urls(&explicit, text),
            strings(&["https://example.com/path", "https://example.com/path/"])
        );
    }
}
