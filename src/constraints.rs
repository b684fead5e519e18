use crate::constants;
use crate::sink::{SinkFactory, SinkPolicy};
use crate::size_limit::SizeLimit;
use encoding_rs::{Encoding, UTF_8};
use std::fmt;
use std::sync::Arc;

type InvalidEncodingHandler = dyn Fn(&str, &[u8]) + Send + Sync;

/// Represents the settings a decode call runs with.
///
/// Every decode gets its own copy, so independent requests never share
/// configuration state.
///
/// # Examples
///
/// ```
/// use cgi_params::{Constraints, SinkPolicy, SizeLimit};
///
/// let constraints = Constraints::new()
///     .size_limit(SizeLimit::new().whole_stream(16 * 1024 * 1024))
///     .max_parts(32)
///     .accept_charset(cgi_params::encoding_rs::EUC_JP)
///     .sink_factory(SinkPolicy::Memory)
///     .on_invalid_encoding(|name, raw| eprintln!("bad text in {}: {} bytes", name, raw.len()));
/// ```
#[derive(Clone)]
pub struct Constraints {
    pub(crate) size_limit: SizeLimit,
    pub(crate) max_parts: usize,
    pub(crate) charset: &'static Encoding,
    pub(crate) sink_factory: Arc<dyn SinkFactory>,
    pub(crate) on_invalid_encoding: Option<Arc<InvalidEncodingHandler>>,
}

impl Constraints {
    /// Creates the default constraints.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Applies the given size limits.
    pub fn size_limit(mut self, size_limit: SizeLimit) -> Constraints {
        self.size_limit = size_limit;
        self
    }

    /// Sets the maximum number of parts in a multipart body.
    pub fn max_parts(mut self, max_parts: usize) -> Constraints {
        self.max_parts = max_parts;
        self
    }

    /// Sets the character set plain text values must be well-formed in.
    pub fn accept_charset(mut self, charset: &'static Encoding) -> Constraints {
        self.charset = charset;
        self
    }

    /// Sets how body sinks are allocated for each part.
    pub fn sink_factory<F: SinkFactory + 'static>(mut self, factory: F) -> Constraints {
        self.sink_factory = Arc::new(factory);
        self
    }

    /// Installs a callback receiving the name and raw bytes of any text value
    /// that is not valid in the accepted charset.
    ///
    /// Without a callback such a value fails the decode with
    /// [`Error::InvalidEncoding`](crate::Error::InvalidEncoding).
    pub fn on_invalid_encoding<F>(mut self, handler: F) -> Constraints
    where
        F: Fn(&str, &[u8]) + Send + Sync + 'static,
    {
        self.on_invalid_encoding = Some(Arc::new(handler));
        self
    }

    /// The accepted charset.
    pub fn charset(&self) -> &'static Encoding {
        self.charset
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            size_limit: SizeLimit::default(),
            max_parts: constants::DEFAULT_MAX_PARTS,
            charset: UTF_8,
            sink_factory: Arc::new(SinkPolicy::default()),
            on_invalid_encoding: None,
        }
    }
}

impl fmt::Debug for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraints")
            .field("size_limit", &self.size_limit)
            .field("max_parts", &self.max_parts)
            .field("charset", &self.charset.name())
            .field("on_invalid_encoding", &self.on_invalid_encoding.is_some())
            .finish()
    }
}
