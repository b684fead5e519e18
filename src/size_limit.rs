use crate::constants;

/// Represents size limits applied to a multipart body.
///
/// Please refer [`Constraints`](crate::Constraints) for more info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimit {
    pub(crate) whole_stream: u64,
    pub(crate) per_field: u64,
}

impl SizeLimit {
    /// Creates the default size limit: 128 MiB for the whole body and no
    /// limit for a single part.
    pub fn new() -> SizeLimit {
        SizeLimit::default()
    }

    /// Sets the maximum declared content length of a multipart body.
    ///
    /// A larger declared length is rejected before anything is read.
    pub fn whole_stream(mut self, limit: u64) -> SizeLimit {
        self.whole_stream = limit;
        self
    }

    /// Sets the size limit for the body of each part.
    pub fn per_field(mut self, limit: u64) -> SizeLimit {
        self.per_field = limit;
        self
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit {
            whole_stream: constants::DEFAULT_WHOLE_STREAM_SIZE_LIMIT,
            per_field: constants::DEFAULT_PER_FIELD_SIZE_LIMIT,
        }
    }
}
