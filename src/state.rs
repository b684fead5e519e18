use crate::buffer::StreamBuffer;
use crate::constants;
use memchr::memmem::Finder;

/// Per-call decoder state; never shared between requests.
pub(crate) struct MultipartState<R> {
    pub(crate) buffer: StreamBuffer<R>,
    pub(crate) boundary: String,
    pub(crate) marker: Finder<'static>,
    pub(crate) stage: StreamingStage,
    pub(crate) next_field_idx: usize,
    pub(crate) curr_field_name: Option<String>,
    pub(crate) curr_field_size_limit: u64,
}

impl<R> MultipartState<R> {
    pub(crate) fn new(buffer: StreamBuffer<R>, boundary: String, field_size_limit: u64) -> Self {
        let marker = Finder::new(constants::boundary_marker(&boundary).as_bytes()).into_owned();

        MultipartState {
            buffer,
            boundary,
            marker,
            stage: StreamingStage::FindingFirstBoundary,
            next_field_idx: 0,
            curr_field_name: None,
            curr_field_size_limit: field_size_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    FindingFirstBoundary,
    ReadingFieldHeaders,
    ReadingFieldData,
    Eof,
}
