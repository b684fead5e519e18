use crate::constants;
use http::header::{HeaderMap, HeaderName, HeaderValue};

/// Collects the `name: value` lines of a part's header block into a
/// [`HeaderMap`], keeping every occurrence in order.
///
/// Lines that are not valid HTTP headers are skipped rather than failing the
/// part.
pub(crate) fn parse_part_headers(block: &[u8]) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for line in block.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            continue;
        }

        let colon = match memchr::memchr(b':', line) {
            Some(idx) => idx,
            None => {
                log::debug!("skipping part header line without a colon: {:?}", String::from_utf8_lossy(line));
                continue;
            }
        };

        let name = HeaderName::from_bytes(trim_bytes(&line[..colon]));
        let value = HeaderValue::from_bytes(trim_bytes(&line[colon + 1..]));

        match (name, value) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => log::debug!("skipping invalid part header line: {:?}", String::from_utf8_lossy(line)),
        }
    }

    headers
}

/// The part's `Content-Type` line, empty if it has none.
pub(crate) fn parse_content_type(block: &[u8]) -> String {
    constants::CONTENT_TYPE_RE
        .captures(block)
        .and_then(|cap| cap.get(1))
        .map(|m| String::from_utf8_lossy(trim_bytes(m.as_bytes())).into_owned())
        .unwrap_or_default()
}

pub(crate) fn trim_bytes(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |idx| idx + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    #[test]
    fn test_parse_part_headers() {
        let block = b"content-disposition: form-data; name=\"a\"\r\nContent-Type: text/plain\r\n\r\n";
        let headers = parse_part_headers(block);

        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "form-data; name=\"a\""
        );
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_parse_empty_header_block() {
        assert!(parse_part_headers(b"\r\n").is_empty());
    }

    #[test]
    fn test_repeated_header_keeps_first() {
        let block = b"Content-Type: a/b\r\nContent-Type: c/d\r\n\r\n";
        let headers = parse_part_headers(block);
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "a/b");
        assert_eq!(headers.get_all(header::CONTENT_TYPE).iter().count(), 2);
    }

    #[test]
    fn test_bad_header_lines_are_skipped() {
        let block = b"not a header\r\nX Weird Header: y\r\nX-Good: yes\r\n\r\n";
        let headers = parse_part_headers(block);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-good").unwrap(), "yes");
    }

    #[test]
    fn test_many_headers() {
        let mut block = Vec::new();
        for i in 0..40 {
            block.extend_from_slice(format!("X-H{}: {}\r\n", i, i).as_bytes());
        }
        block.extend_from_slice(b"\r\n");

        assert_eq!(parse_part_headers(&block).len(), 40);
    }

    #[test]
    fn test_parse_content_type() {
        let block = b"Content-Disposition: form-data; name=\"f\"\r\ncontent-type:   image/png  \r\n\r\n";
        assert_eq!(parse_content_type(block), "image/png");
        assert_eq!(parse_content_type(b"\r\n"), "");
    }

    #[test]
    fn test_trim_bytes() {
        assert_eq!(trim_bytes(b"  a b \t"), b"a b");
        assert_eq!(trim_bytes(b"   "), b"");
        assert_eq!(trim_bytes(b""), b"");
    }
}
