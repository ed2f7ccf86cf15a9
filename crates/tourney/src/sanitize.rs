//! Cleaning user-typed codes before they go on the wire.

/// Keeps only `[0-9a-zA-Z:,]`, dropping everything else.
///
/// Applied to access keys and linking codes. Idempotent.
pub fn sanitize_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | ','))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_code_strips_disallowed_characters() {
        assert_eq!(sanitize_code(" ab-12 :x,\"y\"\n"), "ab12:x,y");
    }

    #[test]
    fn test_sanitize_code_drops_non_ascii_letters() {
        assert_eq!(sanitize_code("café✓9"), "caf9");
    }

    #[test]
    fn test_sanitize_code_keeps_clean_input() {
        assert_eq!(sanitize_code("AbC:1,2"), "AbC:1,2");
    }

    #[test]
    fn test_sanitize_code_is_idempotent() {
        for input in ["", "a b", "{\"k\":1}", "ünï:cödé,,", "<script>", "x\u{0}y"] {
            let once = sanitize_code(input);
            assert_eq!(sanitize_code(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn test_sanitize_code_json_injection_is_neutralised() {
        let cleaned = sanitize_code(r#"key","isAdmin":"true"#);
        assert!(!cleaned.contains('"'));
    }
}
