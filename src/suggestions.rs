//! # Error Suggestions
//!
//! Helpers for building error messages that say what went wrong AND how
//! to fix it. Commands use these instead of bare `anyhow::bail!` so every
//! user-facing failure carries at least one actionable hint.

use std::path::Path;

use crate::manifest::FormatName;

/// The project manifest was not found in or above the working directory.
///
/// Hints at running `init` and at the `--config` flag.
pub fn manifest_not_found(start_dir: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No project manifest found in {dir}\n\n\
         hint: Run 'contexture init' to create .contexture.yaml\n\
         hint: Use --config to point at a manifest in another location\n\
         hint: The manifest may also live at .config/.contexture.yaml",
        dir = start_dir.display()
    )
}

/// An unrecognized output format name, with a did-you-mean when a known
/// format is within edit distance.
pub fn unknown_format(name: &str) -> anyhow::Error {
    let valid: Vec<&str> = FormatName::all().iter().map(|f| f.as_str()).collect();

    let suggestion = find_similar(name, &valid);
    let did_you_mean = suggestion
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown format: {name}{did_you_mean}\n\n\
         Valid formats are: {formats}",
        formats = valid.join(", ")
    )
}

/// A rule identifier token that failed to parse.
///
/// Shows the expected shapes before surfacing the parser's own message.
pub fn malformed_rule_token(token: &str, message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid rule identifier: {token}\n\
         error: {message}\n\n\
         hint: Plain form: 'go/testing' (default source and branch)\n\
         hint: Bracketed form: '[contexture(owner/repo):go/testing,main]'\n\
         hint: The ref after the comma is optional and defaults to 'main'"
    )
}

/// `cache clean` was invoked without saying what to remove.
pub fn cache_clean_no_filter() -> anyhow::Error {
    anyhow::anyhow!(
        "At least one filter must be specified for cache clean\n\n\
         hint: Use --all to remove every cached checkout"
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_not_found_includes_hints() {
        let error = manifest_not_found(Path::new("/some/project"));
        let message = error.to_string();

        assert!(message.contains("No project manifest found"));
        assert!(message.contains("/some/project"));
        assert!(message.contains("contexture init"));
        assert!(message.contains("--config"));
    }

    #[test]
    fn test_unknown_format_suggests_similar() {
        let error = unknown_format("curser");
        let message = error.to_string();

        assert!(message.contains("Unknown format: curser"));
        assert!(message.contains("Did you mean 'cursor'?"));
        assert!(message.contains("Valid formats are:"));
    }

    #[test]
    fn test_unknown_format_no_suggestion_for_very_different() {
        let error = unknown_format("zzzzzz");
        let message = error.to_string();

        assert!(message.contains("Unknown format: zzzzzz"));
        assert!(!message.contains("Did you mean"));
    }

    #[test]
    fn test_malformed_token_shows_both_shapes() {
        let error = malformed_rule_token("[contexture(:go", "unterminated bracket");
        let message = error.to_string();

        assert!(message.contains("Invalid rule identifier"));
        assert!(message.contains("unterminated bracket"));
        assert!(message.contains("Bracketed form"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("cursor", "cursor"), 0);
        assert_eq!(edit_distance("curser", "cursor"), 1);
        assert_eq!(edit_distance("claud", "claude"), 1);
        assert_eq!(edit_distance("zzzzzz", "cursor"), 6);
    }

    #[test]
    fn test_find_similar() {
        let candidates = ["cursor", "claude", "copilot"];

        assert_eq!(find_similar("curser", &candidates), Some("cursor"));
        assert_eq!(find_similar("claud", &candidates), Some("claude"));
        assert_eq!(find_similar("zzzzzz", &candidates), None);
    }
}
