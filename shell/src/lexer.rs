//! Splitting one line of input into words.
//!
//! There is no quoting and no escaping: a word is any run of non-whitespace
//! characters. Operators are ordinary words at this stage and are only told
//! apart later by the scanner.

/// Words of one line, plus whether the configured bound cut some of them off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Words {
    /// The words kept, in input order.
    pub tokens: Vec<String>,
    /// How many words the line really had when `tokens` was truncated.
    pub dropped_from: Option<usize>,
}

impl Words {
    pub fn is_truncated(&self) -> bool {
        self.dropped_from.is_some()
    }
}

/// Split `line` on ASCII whitespace, keeping at most `limit` words.
///
/// A `limit` of 0 means there is no bound.
pub fn split_into_words(line: &str, limit: usize) -> Words {
    let mut tokens: Vec<String> = line.split_ascii_whitespace().map(String::from).collect();
    let mut dropped_from = None;
    if limit > 0 && tokens.len() > limit {
        dropped_from = Some(tokens.len());
        tokens.truncate(limit);
    }
    Words {
        tokens,
        dropped_from,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_spaces_and_newline() {
        let words = split_into_words("ls  -l\t/tmp\n", 0);
        assert_eq!(words.tokens, vec!["ls", "-l", "/tmp"]);
        assert!(!words.is_truncated());
    }

    #[test]
    fn test_empty_line_has_no_words() {
        assert!(split_into_words("   \n", 51).tokens.is_empty());
    }

    #[test]
    fn test_operators_stay_separate_words() {
        let words = split_into_words("cat < in | sort > out &", 0);
        assert_eq!(
            words.tokens,
            vec!["cat", "<", "in", "|", "sort", ">", "out", "&"]
        );
    }

    #[test]
    fn test_limit_truncates_and_remembers_original_count() {
        let words = split_into_words("a b c d e", 3);
        assert_eq!(words.tokens, vec!["a", "b", "c"]);
        assert_eq!(words.dropped_from, Some(5));
    }

    #[test]
    fn test_line_exactly_at_limit_is_not_truncated() {
        let words = split_into_words("a b c", 3);
        assert_eq!(words.tokens.len(), 3);
        assert!(!words.is_truncated());
    }
}
