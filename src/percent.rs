//! URL-encoding of form values: `%XX` escapes and `+` for space.

/// URL-encodes a string.
///
/// Bytes outside `[A-Za-z0-9_.-]` become `%XX` with uppercase hex digits, a
/// space becomes `+`.
///
/// # Examples
///
/// ```
/// assert_eq!(cgi_params::escape("'Stop!' said Fred"), "%27Stop%21%27+said+Fred");
/// ```
pub fn escape<T: AsRef<[u8]>>(input: T) -> String {
    let input = input.as_ref();
    let mut result = String::with_capacity(input.len() * 3);

    for &byte in input {
        if is_unescaped(byte) {
            result.push(byte as char);
        } else if byte == b' ' {
            result.push('+');
        } else {
            result.push('%');
            result.push(to_hex_char(byte >> 4));
            result.push(to_hex_char(byte & 0x0F));
        }
    }

    result
}

/// URL-decodes a string into raw bytes.
///
/// `+` decodes to a space and every `%XX` group to the byte it names. A `%`
/// that is not followed by two hex digits is kept as is.
pub fn unescape_bytes<T: AsRef<[u8]>>(input: T) -> Vec<u8> {
    let input = input.as_ref();

    if memchr::memchr2(b'%', b'+', input).is_none() {
        return input.to_vec();
    }

    let mut result = Vec::with_capacity(input.len());
    let mut idx = 0;

    while idx < input.len() {
        match input[idx] {
            b'+' => {
                result.push(b' ');
                idx += 1;
            }
            b'%' => match decode_hex_pair(&input[idx + 1..]) {
                Some(byte) => {
                    result.push(byte);
                    idx += 3;
                }
                None => {
                    result.push(b'%');
                    idx += 1;
                }
            },
            byte => {
                result.push(byte);
                idx += 1;
            }
        }
    }

    result
}

/// URL-decodes a string.
///
/// Adjacent `%XX` groups are decoded together, so multi-byte UTF-8 sequences
/// come back intact. Decoded bytes that do not form valid UTF-8 are replaced
/// with `U+FFFD`; use [`unescape_bytes`] to keep them.
///
/// # Examples
///
/// ```
/// assert_eq!(cgi_params::unescape("%27Stop%21%27+said+Fred"), "'Stop!' said Fred");
/// assert_eq!(cgi_params::unescape("%E6%97%A5%E6%9C%AC"), "日本");
/// assert_eq!(cgi_params::unescape("100%"), "100%");
/// ```
pub fn unescape<T: AsRef<[u8]>>(input: T) -> String {
    match String::from_utf8(unescape_bytes(input)) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

fn is_unescaped(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-')
}

fn to_hex_char(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'A' + nibble - 10) as char,
    }
}

fn from_hex_char(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

fn decode_hex_pair(rest: &[u8]) -> Option<u8> {
    match rest {
        [high, low, ..] => Some((from_hex_char(*high)? << 4) | from_hex_char(*low)?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("abc-XYZ_0.9"), "abc-XYZ_0.9");
        assert_eq!(escape("a b"), "a+b");
        assert_eq!(escape("a+b"), "a%2Bb");
        assert_eq!(escape("日本"), "%E6%97%A5%E6%9C%AC");
        assert_eq!(escape([0x00u8, 0xff]), "%00%FF");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a+b"), "a b");
        assert_eq!(unescape("a%2Bb"), "a+b");
        assert_eq!(unescape("%e6%97%a5"), "日");
        assert_eq!(unescape("plain"), "plain");
    }

    #[test]
    fn test_unescape_malformed_is_literal() {
        assert_eq!(unescape("%"), "%");
        assert_eq!(unescape("%4"), "%4");
        assert_eq!(unescape("%zz"), "%zz");
        assert_eq!(unescape("%%41"), "%A");
        assert_eq!(unescape("%+41"), "% 41");
    }

    #[test]
    fn test_unescape_bytes_keeps_invalid_utf8() {
        assert_eq!(unescape_bytes("%FF%FE"), vec![0xff, 0xfe]);
        assert_eq!(unescape("%FF"), "\u{FFFD}");
    }
}
