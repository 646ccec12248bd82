//! Property-based tests for rule identifier parsing.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::cache::cache_key;
    use crate::reference::parse;
    use proptest::prelude::*;

    // ============================================================================
    // parse property tests
    // ============================================================================

    proptest! {
        /// Property: parsing never panics, whatever the token looks like
        #[test]
        fn parse_never_panics(token in ".*") {
            let _ = parse(&token, None, None);
        }

        /// Property: parse is deterministic (same input = same output)
        #[test]
        fn parse_is_deterministic(token in ".*") {
            let result1 = parse(&token, None, None);
            let result2 = parse(&token, None, None);

            prop_assert_eq!(result1.is_ok(), result2.is_ok());
            if let (Ok(a), Ok(b)) = (result1, result2) {
                prop_assert_eq!(a, b);
            }
        }

        /// Property: a bare path parses and keeps the path verbatim
        #[test]
        fn bare_path_preserved(path in "[a-zA-Z0-9_.-]+(/[a-zA-Z0-9_.-]+){0,3}") {
            let reference = parse(&path, None, None).unwrap();
            prop_assert_eq!(reference.path, path);
        }

        /// Property: the canonical display form re-parses to an equal value
        #[test]
        fn display_roundtrips(
            path in "[a-zA-Z0-9_-]+(/[a-zA-Z0-9_-]+){0,2}",
            r#ref in "[a-zA-Z0-9._-]{1,12}",
        ) {
            let reference = parse(&path, None, Some(&r#ref)).unwrap();
            let reparsed = parse(&reference.to_string(), None, None).unwrap();
            prop_assert_eq!(reference, reparsed);
        }

        /// Property: the --ref flag always wins over the token's own ref
        #[test]
        fn flag_ref_always_wins(
            path in "[a-zA-Z0-9_-]{1,10}",
            token_ref in "[a-zA-Z0-9_-]{1,10}",
            flag_ref in "[a-zA-Z0-9_-]{1,10}",
        ) {
            let token = format!("[contexture:{},{}]", path, token_ref);
            let reference = parse(&token, None, Some(&flag_ref)).unwrap();
            prop_assert_eq!(reference.r#ref, flag_ref);
        }
    }

    // ============================================================================
    // cache_key property tests
    // ============================================================================

    proptest! {
        /// Property: cache keys never contain path separators or colons
        #[test]
        fn cache_key_is_filesystem_safe(
            url in "[a-zA-Z0-9:/@._-]{1,40}",
            r#ref in "[a-zA-Z0-9._/-]{1,16}",
        ) {
            let key = cache_key(&url, &r#ref);
            prop_assert!(!key.contains('/'));
            prop_assert!(!key.contains('\\'));
            prop_assert!(!key.contains(':'));
        }

        /// Property: SSH and HTTPS spellings of a GitHub repo share a key
        #[test]
        fn cache_key_unifies_github_spellings(
            owner in "[a-z][a-z0-9-]{0,10}",
            repo in "[a-z][a-z0-9-]{0,10}",
            r#ref in "[a-z][a-z0-9.-]{0,10}",
        ) {
            let ssh = format!("git@github.com:{}/{}.git", owner, repo);
            let https = format!("https://github.com/{}/{}", owner, repo);
            prop_assert_eq!(cache_key(&ssh, &r#ref), cache_key(&https, &r#ref));
        }

        /// Property: refs that sanitize to the same text still get
        /// distinct keys
        #[test]
        fn cache_key_separates_sanitized_refs(
            r#ref in "[a-z]{1,6}(/[a-z]{1,6}){1,2}",
        ) {
            let url = "https://github.com/acme/rules";
            let flattened = r#ref.replace('/', "_");
            prop_assert_ne!(cache_key(url, &r#ref), cache_key(url, &flattened));
        }

        /// Property: distinct refs of the same repository get distinct keys
        #[test]
        fn cache_key_separates_refs(
            repo in "[a-z][a-z0-9-]{0,10}",
            ref_a in "[a-z][a-z0-9]{0,8}",
            ref_b in "[A-Z][A-Z0-9]{0,8}",
        ) {
            let url = format!("https://github.com/acme/{}", repo);
            // Case differs by construction, so the refs differ.
            prop_assert_ne!(cache_key(&url, &ref_a), cache_key(&url, &ref_b));
        }
    }
}
