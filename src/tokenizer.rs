//! Splitting records into words.

use wcbench_mr::task::Mapper;

/// Bytes separating words: space, tab, newline, carriage return and form feed.
pub const DELIMITERS: [u8; 5] = [b' ', b'\t', b'\n', b'\r', 0x0C];

fn is_delimiter(byte: &u8) -> bool {
    DELIMITERS.contains(byte)
}

/// Iterates over the words of a record from left to right.
///
/// Words are kept as is: no case folding, no punctuation stripping. Runs of delimiters
/// never produce empty words.
pub fn tokenize(record: &[u8]) -> impl Iterator<Item = &[u8]> {
    record.split(is_delimiter).filter(|token| !token.is_empty())
}

/// Emits `(word, 1)` for every word of a record.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenizerMapper;

impl Mapper for TokenizerMapper {
    type Value = u64;

    fn map<'a>(&'a self, record: &'a [u8]) -> impl Iterator<Item = (&'a [u8], u64)> + 'a {
        tokenize(record).map(|word| (word, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(record: &str) -> Vec<&str> {
        tokenize(record.as_bytes())
            .map(|w| std::str::from_utf8(w).unwrap())
            .collect()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(words("the cat  sat\ton\x0cthe\r\nmat"), vec!["the", "cat", "sat", "on", "the", "mat"]);
        assert_eq!(words("Hello, hello!"), vec!["Hello,", "hello!"]);
        assert!(words("").is_empty());
        assert!(words(" \t \r ").is_empty());
    }

    #[test]
    fn other_whitespace_is_part_of_word() {
        assert_eq!(words("a\x0bb c\u{a0}d"), vec!["a\x0bb", "c\u{a0}d"]);
    }

    #[test]
    fn maps_to_ones() {
        let pairs = TokenizerMapper.map(b"to be or not to be").collect::<Vec<_>>();
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|(_, count)| *count == 1));
        assert_eq!(pairs[4].0, b"to");
    }
}
