//! Whitespace tokenization of raw status lines.

/// Split a line into its non-empty whitespace-separated tokens.
///
/// Runs of spaces, tabs, or a stray trailing `\r` never produce empty
/// tokens. Tokenization cannot fail; downstream stages validate count and
/// content.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_single_spaces() {
        assert_eq!(tokenize("BLOCK 3 RUNNING"), vec!["BLOCK", "3", "RUNNING"]);
    }

    #[test]
    fn tolerates_repeated_and_mixed_separators() {
        assert_eq!(
            tokenize("  TRAIN\t1   STATUS  NORTH \r"),
            vec!["TRAIN", "1", "STATUS", "NORTH"]
        );
    }

    #[test]
    fn empty_and_blank_lines_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t ").is_empty());
    }
}
