/// Splits on runs of whitespace. No quoting; multi-word values come from
/// variadic arguments.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
    }

    #[test]
    fn separators_collapse() {
        assert_eq!(tokenize("a  b"), vec!["a", "b"]);
        assert_eq!(tokenize("  a   b "), vec!["a", "b"]);
        assert_eq!(tokenize("role\tadd\n<@1>"), vec!["role", "add", "<@1>"]);
    }
}
