use lazy_static::lazy_static;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;

pub(crate) const DEFAULT_WHOLE_STREAM_SIZE_LIMIT: u64 = 128 * 1024 * 1024;
pub(crate) const DEFAULT_PER_FIELD_SIZE_LIMIT: u64 = u64::MAX;
pub(crate) const DEFAULT_MAX_PARTS: usize = 128;

/// Upper bound on a single read against the input stream.
pub(crate) const READ_CHUNK_SIZE: usize = 10 * 1024;

pub(crate) const DEFAULT_SPOOL_THRESHOLD: usize = 10 * 1024;

pub(crate) const DEFAULT_OFFLINE_QUERY: &str = "offline=true";

pub(crate) const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub(crate) const BOUNDARY_EXT: &str = "--";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const CRLF_CRLF: &str = "\r\n\r\n";

lazy_static! {
    pub(crate) static ref MULTIPART_BOUNDARY_RE: Regex =
        Regex::new(r#"(?i)\Amultipart/form-data.*boundary="?([^";,]+)"?"#).unwrap();

    // Matched against a part's raw header block. The first occurrence wins;
    // group 1 holds a quoted value and group 2 a bare one.
    pub(crate) static ref CONTENT_DISPOSITION_FIELD_NAME_RE: BytesRegex =
        BytesRegex::new(r#"(?im-u)^content-disposition:[^\r\n]*?[ \t;]name=(?:"([^"\r\n]*)"|([^;\r\n]*))"#).unwrap();
    pub(crate) static ref CONTENT_DISPOSITION_FILE_NAME_RE: BytesRegex =
        BytesRegex::new(r#"(?im-u)^content-disposition:[^\r\n]*?[ \t;]filename=(?:"([^"\r\n]*)"|([^;\r\n]*))"#).unwrap();
    pub(crate) static ref CONTENT_TYPE_RE: BytesRegex =
        BytesRegex::new(r#"(?im-u)^content-type:[ \t]*([^\r\n]*)"#).unwrap();
}

/// The opening delimiter line: `--boundary\r\n`.
pub(crate) fn opening_boundary(boundary: &str) -> String {
    format!("{}{}{}", BOUNDARY_EXT, boundary, CRLF)
}

/// The needle searched for inside part bodies: `--boundary`.
pub(crate) fn boundary_marker(boundary: &str) -> String {
    format!("{}{}", BOUNDARY_EXT, boundary)
}

/// Size of a full inter-part delimiter line, `\r\n--boundary\r\n`.
///
/// This many trailing bytes are held back when flushing a part body, so a
/// delimiter split across two reads is still seen whole.
pub(crate) fn boundary_line_len(boundary: &str) -> usize {
    CRLF.len() + BOUNDARY_EXT.len() + boundary.len() + CRLF.len()
}
