//! A blocking decoder for HTTP request parameters.
//!
//! Parameters arrive either as a URL-encoded string (a query string or an
//! `application/x-www-form-urlencoded` body) or as a `multipart/form-data`
//! body. Both decode into the same ordered, multivalued [`Params`] store; file
//! uploads in a multipart body become [`FilePart`] values whose content lives
//! in a [`BodySink`], in memory or spooled to a temporary file.
//!
//! # Examples
//!
//! ```
//! use cgi_params::{parse_query, Multipart};
//!
//! let params = parse_query("a=1&a=2;b=hello+world");
//! assert_eq!(params.text("b"), "hello world");
//!
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"My Field\"\r\n\r\nabcd\r\n--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"File Field\"; filename=\"a-text-file.txt\"\r\nContent-Type: text/plain\r\n\r\nHello world\r\n--X-BOUNDARY--\r\n";
//!
//! let params = Multipart::new(data.as_bytes(), "X-BOUNDARY", data.len() as u64)
//!     .decode()
//!     .unwrap();
//!
//! assert_eq!(params.text("My Field"), "abcd");
//!
//! let file = params.file("File Field").unwrap();
//! assert_eq!(file.file_name(), "a-text-file.txt");
//! assert_eq!(file.text().unwrap(), "Hello world");
//! ```

pub use encoding_rs;
pub use http;
pub use mime;

pub use constraints::Constraints;
pub use error::Error;
pub use field::FilePart;
pub use form::{Form, RequestMeta};
pub use multipart::Multipart;
pub use params::{Params, Value};
pub use percent::{escape, unescape, unescape_bytes};
pub use query::parse_query;
pub use sink::{BodySink, MemorySink, SinkFactory, SinkPolicy, SpooledSink, TempFileSink};
pub use size_limit::SizeLimit;

mod buffer;
mod constants;
mod constraints;
mod content_disposition;
mod error;
mod field;
mod form;
mod helpers;
mod multipart;
mod params;
mod percent;
mod query;
mod sink;
mod size_limit;
mod state;

/// A Result type often returned from methods that can have `cgi-params` errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
///
/// The content type must start with `multipart/form-data` (in any case). The
/// boundary may be quoted and runs to the next `"`, `;` or `,`.
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let content_type = content_type.as_ref();

    let is_multipart = content_type
        .get(..constants::MULTIPART_FORM_DATA.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(constants::MULTIPART_FORM_DATA));
    if !is_multipart {
        return Err(crate::Error::NoMultipart);
    }

    constants::MULTIPART_BOUNDARY_RE
        .captures(content_type)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_owned())
        .ok_or(crate::Error::NoBoundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary() {
        let content_type = "multipart/form-data; boundary=ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("ABCDEFG".to_owned()));

        let content_type = "multipart/form-data; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("------ABCDEFG".to_owned()));

        let content_type = "Multipart/Form-Data; boundary=\"AaB03x\"";
        assert_eq!(parse_boundary(content_type), Ok("AaB03x".to_owned()));

        let content_type = "multipart/form-data; boundary=AaB03x; charset=utf-8";
        assert_eq!(parse_boundary(content_type), Ok("AaB03x".to_owned()));

        let content_type = "multipart/form-data";
        assert_eq!(parse_boundary(content_type), Err(Error::NoBoundary));

        let content_type = "boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Err(Error::NoMultipart));

        let content_type = "text/plain";
        assert_eq!(parse_boundary(content_type), Err(Error::NoMultipart));

        let content_type = "text/plain; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Err(Error::NoMultipart));
    }

    #[test]
    fn test_parse_boundary_with_non_token_chars() {
        for boundary in ["----=_Part_0_123", "abc/def", "a:b", "(x)"] {
            let content_type = format!("multipart/form-data; boundary={}", boundary);
            assert_eq!(parse_boundary(&content_type), Ok(boundary.to_owned()));

            let content_type = format!("multipart/form-data; boundary=\"{}\"", boundary);
            assert_eq!(parse_boundary(&content_type), Ok(boundary.to_owned()));
        }
    }
}
