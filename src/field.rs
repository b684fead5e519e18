use crate::sink::BodySink;
use encoding_rs::{Encoding, UTF_8};
use http::header::HeaderMap;
use std::path::Path;

/// An uploaded file: a multipart part that carried a non-empty `filename`.
///
/// The part's body is held by its [`BodySink`], already sealed, so the content
/// can be read any number of times. Any temporary file backing the body is
/// removed when the `FilePart` is dropped.
#[derive(Debug)]
pub struct FilePart {
    headers: HeaderMap,
    sink: Box<dyn BodySink>,
    meta: FileMeta,
}

#[derive(Debug)]
struct FileMeta {
    name: String,
    file_name: String,
    content_type: String,
    idx: usize,
}

impl FilePart {
    pub(crate) fn new(
        name: String,
        file_name: String,
        content_type: String,
        headers: HeaderMap,
        idx: usize,
        sink: Box<dyn BodySink>,
    ) -> Self {
        FilePart {
            headers,
            sink,
            meta: FileMeta {
                name,
                file_name,
                content_type,
                idx,
            },
        }
    }

    /// The form field name from the `Content-Disposition` header.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// The client-side file name, percent-decoded.
    pub fn file_name(&self) -> &str {
        &self.meta.file_name
    }

    /// The raw `Content-Type` of the part, empty if none was sent.
    pub fn content_type(&self) -> &str {
        &self.meta.content_type
    }

    /// The `Content-Type` parsed as [`mime::Mime`], if it parses.
    pub fn mime(&self) -> Option<mime::Mime> {
        self.meta.content_type.parse().ok()
    }

    /// All headers of the part.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Position of the part within the multipart body, starting at zero.
    pub fn index(&self) -> usize {
        self.meta.idx
    }

    /// Size of the body in bytes.
    pub fn size(&self) -> u64 {
        self.sink.len()
    }

    /// Path of the temporary file holding the body, if it was written to disk.
    pub fn local_path(&self) -> Option<&Path> {
        self.sink.path()
    }

    /// Reads the whole body.
    pub fn bytes(&self) -> crate::Result<Vec<u8>> {
        self.sink.read_all().map_err(crate::Error::StorageError)
    }

    /// Reads the body as text, decoded with the `charset` of the part's
    /// `Content-Type` or UTF-8 if it names none.
    pub fn text(&self) -> crate::Result<String> {
        self.text_with_charset("utf-8")
    }

    /// Reads the body as text, decoded with the `charset` of the part's
    /// `Content-Type` or `default_encoding` if it names none.
    ///
    /// Malformed sequences are replaced with `U+FFFD`.
    pub fn text_with_charset(&self, default_encoding: &str) -> crate::Result<String> {
        let mime = self.mime();

        let encoding_name = mime
            .as_ref()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_encoding);

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let bytes = self.bytes()?;
        let (text, _, _) = encoding.decode(&bytes);

        Ok(text.into_owned())
    }
}
