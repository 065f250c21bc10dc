//! The escape table shared by the encoder and the decoder.
//!
//! Characters that are either forbidden in a URL query or meaningful to the
//! jsurl grammar are written as `*` followed by a designator. Space is the one
//! exception: it becomes a bare `_`, which is why `_` itself needs escaping.
//! Everything else, including all non-ASCII characters, passes through as is.

/// Starts an escape sequence (and prefixes strings that need disambiguation).
pub const ESCAPE: char = '*';

/// Replacement for a space character.
pub const SPACE: char = '_';

/// Returns the designator that follows `*` when `ch` must be escaped.
///
/// Space is not covered here because it maps to a bare `_`.
///
/// # Examples
///
/// ```rust
/// use serde_jsurl::escape::designator;
///
/// assert_eq!(designator('('), Some('C'));
/// assert_eq!(designator('~'), Some('-'));
/// assert_eq!(designator('a'), None);
/// ```
#[inline]
#[must_use]
pub const fn designator(ch: char) -> Option<char> {
    let d = match ch {
        '#' => 'H',
        '$' => 'S',
        '%' => '.',
        '&' => 'A',
        '\'' => '"',
        '(' => 'C',
        ')' => 'D',
        '*' => '*',
        '+' => 'P',
        '<' => 'L',
        '=' => 'E',
        '>' => 'G',
        '?' => 'Q',
        '\\' => 'B',
        '_' => '_',
        '\n' => 'N',
        '\r' => 'R',
        '\0' => 'Z',
        '~' => '-',
        _ => return None,
    };
    Some(d)
}

/// Inverse of [`designator`]: the character an escape sequence stands for.
#[inline]
#[must_use]
pub const fn unescape(designator: char) -> Option<char> {
    let ch = match designator {
        'H' => '#',
        'S' => '$',
        '.' => '%',
        'A' => '&',
        '"' => '\'',
        'C' => '(',
        'D' => ')',
        '*' => '*',
        'P' => '+',
        'L' => '<',
        'E' => '=',
        'G' => '>',
        'Q' => '?',
        'B' => '\\',
        '_' => '_',
        'N' => '\n',
        'R' => '\r',
        'Z' => '\0',
        '-' => '~',
        _ => return None,
    };
    Some(ch)
}

/// Appends `text` to `output` with every unsafe character escaped.
///
/// No disambiguation prefix is written; see [`needs_prefix`].
pub fn write_escaped(output: &mut String, text: &str) {
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        if ch == ' ' {
            output.push_str(&text[start..i]);
            output.push(SPACE);
        } else if let Some(d) = designator(ch) {
            output.push_str(&text[start..i]);
            output.push(ESCAPE);
            output.push(d);
        } else {
            continue;
        }
        start = i + ch.len_utf8();
    }
    output.push_str(&text[start..]);
}

/// Whether a string value must carry the leading `*` marker.
///
/// Only text that begins with an ASCII letter can be told apart from numbers,
/// tags and structural markers without it.
#[inline]
#[must_use]
pub fn needs_prefix(text: &str) -> bool {
    !text
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic())
}

/// Whether the byte is one of the characters the encoder never emits.
#[inline]
#[must_use]
pub const fn is_forbidden(byte: u8) -> bool {
    matches!(
        byte,
        b'%' | b'?' | b'#' | b'&' | b'=' | b'\n' | b'\r' | b'\0' | b'\'' | b'<' | b'\\'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(text: &str) -> String {
        let mut out = String::new();
        write_escaped(&mut out, text);
        out
    }

    #[test]
    fn test_escape_table_is_invertible() {
        for ch in "#$%&'()*+<=>?\\_\n\r\0~".chars() {
            let d = designator(ch).unwrap();
            assert_eq!(unescape(d), Some(ch), "designator {:?}", d);
        }
    }

    #[test]
    fn test_unknown_designator() {
        assert_eq!(unescape('x'), None);
        assert_eq!(unescape('c'), None);
    }

    #[test]
    fn test_write_escaped_ascii() {
        assert_eq!(
            escaped(" !\"#$%&'()*+,-./09:;<=>?@AZ[\\]^_`az{|}\n\r\0~"),
            "_!\"*H*S*.*A*\"*C*D***P,-./09:;*L*E*G*Q@AZ[*B]^*_`az{|}*N*R*Z*-"
        );
    }

    #[test]
    fn test_write_escaped_passes_unicode_through() {
        assert_eq!(escaped("hello world\u{203c}"), "hello_world\u{203c}");
        assert_eq!(escaped("Ľồťś ǒƒ"), "Ľồťś_ǒƒ");
    }

    #[test]
    fn test_output_has_no_forbidden_bytes() {
        let all: String = (0u8..128).map(char::from).collect();
        assert!(!escaped(&all).bytes().any(is_forbidden));
    }

    #[test]
    fn test_needs_prefix() {
        assert!(needs_prefix(""));
        assert!(needs_prefix("1abc"));
        assert!(needs_prefix("-"));
        assert!(needs_prefix(" lead"));
        assert!(needs_prefix("Ľồťś"));
        assert!(!needs_prefix("hello"));
        assert!(!needs_prefix("Z"));
    }
}
