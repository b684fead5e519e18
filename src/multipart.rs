use crate::buffer::{Delimiter, StreamBuffer};
use crate::constants;
use crate::constraints::Constraints;
use crate::content_disposition::ContentDisposition;
use crate::field::FilePart;
use crate::helpers;
use crate::params::Params;
use crate::sink::BodySink;
use crate::state::{MultipartState, StreamingStage};
use bytes::Bytes;
use http::header::HeaderMap;
use std::io::Read;

/// Decodes a `multipart/form-data` body into [`Params`].
///
/// The body is pulled from a blocking [`Read`] in chunks of at most 10 KiB and
/// never past the declared content length. Each part's body goes to a fresh
/// [`BodySink`](crate::BodySink): parts without a file name become
/// [`Value::Text`](crate::Value::Text) entries, parts with one become
/// [`Value::File`](crate::Value::File) entries.
///
/// Any failure aborts the whole decode; no partial result is returned.
///
/// # Examples
///
/// ```
/// use cgi_params::Multipart;
///
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let multipart = Multipart::new(data.as_bytes(), "X-BOUNDARY", data.len() as u64);
///
/// let params = multipart.decode().unwrap();
/// assert_eq!(params.text("my_text_field"), "abcd");
/// ```
pub struct Multipart<R> {
    reader: R,
    boundary: String,
    content_length: u64,
    constraints: Constraints,
}

impl<R: Read> Multipart<R> {
    /// Construct a new `Multipart` instance with the given reader, boundary and
    /// declared content length.
    pub fn new<B: Into<String>>(reader: R, boundary: B, content_length: u64) -> Multipart<R> {
        Multipart::with_constraints(reader, boundary, content_length, Constraints::default())
    }

    /// Construct a new `Multipart` instance with the given reader, boundary,
    /// declared content length and constraints.
    pub fn with_constraints<B: Into<String>>(
        reader: R,
        boundary: B,
        content_length: u64,
        constraints: Constraints,
    ) -> Multipart<R> {
        Multipart {
            reader,
            boundary: boundary.into(),
            content_length,
            constraints,
        }
    }

    /// Reads the whole body and returns the decoded parameters.
    pub fn decode(self) -> crate::Result<Params> {
        let Multipart {
            reader,
            boundary,
            content_length,
            constraints,
        } = self;

        let limit = constraints.size_limit.whole_stream;
        if content_length > limit {
            return Err(crate::Error::TooLarge { content_length, limit });
        }

        let buffer = StreamBuffer::new(reader, content_length);
        let mut state = MultipartState::new(buffer, boundary, constraints.size_limit.per_field);
        let mut params = Params::new();
        let mut pending: Option<PendingPart> = None;

        loop {
            match state.stage {
                StreamingStage::FindingFirstBoundary => {
                    read_opening_boundary(&mut state)?;
                    state.stage = StreamingStage::ReadingFieldHeaders;
                }
                StreamingStage::ReadingFieldHeaders => {
                    if state.next_field_idx >= constraints.max_parts {
                        return Err(crate::Error::TooManyParts {
                            limit: constraints.max_parts,
                        });
                    }

                    let sink = constraints
                        .sink_factory
                        .create_sink()
                        .map_err(crate::Error::StorageError)?;

                    let block = read_part_headers(&mut state)?;
                    let headers = helpers::parse_part_headers(&block);
                    let content_disposition = ContentDisposition::parse(&block);
                    let content_type = helpers::parse_content_type(&block);

                    log::debug!(
                        "reading part {} name={:?} filename={:?}",
                        state.next_field_idx,
                        content_disposition.field_name,
                        content_disposition.file_name
                    );

                    state.curr_field_name = Some(content_disposition.field_name.clone());
                    state.stage = StreamingStage::ReadingFieldData;

                    pending = Some(PendingPart {
                        headers,
                        content_disposition,
                        content_type,
                        sink,
                    });
                }
                StreamingStage::ReadingFieldData => {
                    let PendingPart {
                        headers,
                        content_disposition,
                        content_type,
                        mut sink,
                    } = match pending.take() {
                        Some(part) => part,
                        None => {
                            return Err(crate::Error::MalformedBody {
                                reason: "part body without headers",
                            })
                        }
                    };

                    let delimiter = read_part_body(&mut state, sink.as_mut())?;
                    route_part(
                        &mut params,
                        &constraints,
                        headers,
                        content_disposition,
                        content_type,
                        state.next_field_idx,
                        sink,
                    )?;

                    state.next_field_idx += 1;
                    state.curr_field_name = None;

                    state.stage = match delimiter {
                        Delimiter::Close => StreamingStage::Eof,
                        Delimiter::Next if state.buffer.is_exhausted() && state.buffer.buf.is_empty() => {
                            log::debug!("declared content length exhausted without a closing boundary");
                            StreamingStage::Eof
                        }
                        Delimiter::Next => StreamingStage::ReadingFieldHeaders,
                    };
                }
                StreamingStage::Eof => break,
            }
        }

        log::debug!(
            "decoded {} parts, {} declared bytes left unread",
            state.next_field_idx,
            state.buffer.remaining
        );

        Ok(params)
    }
}

struct PendingPart {
    headers: HeaderMap,
    content_disposition: ContentDisposition,
    content_type: String,
    sink: Box<dyn BodySink>,
}

fn read_opening_boundary<R: Read>(state: &mut MultipartState<R>) -> crate::Result<()> {
    let expected = constants::opening_boundary(&state.boundary);

    let line = match state.buffer.read_exact(expected.len()) {
        Ok(Some(line)) => line,
        Ok(None) | Err(crate::Error::UnexpectedEof) => {
            return Err(crate::Error::MalformedBody {
                reason: "no content body",
            })
        }
        Err(err) => return Err(err),
    };

    if line != expected.as_bytes() {
        return Err(crate::Error::MalformedBody {
            reason: "bad opening boundary",
        });
    }

    Ok(())
}

/// Reads a part's raw header block, terminating blank line included.
fn read_part_headers<R: Read>(state: &mut MultipartState<R>) -> crate::Result<Bytes> {
    loop {
        if let Some(block) = state.buffer.read_header_block() {
            return Ok(block);
        }

        if state.buffer.fill(constants::READ_CHUNK_SIZE)? == 0 {
            return Err(crate::Error::MalformedBody {
                reason: "part header block never terminated",
            });
        }
    }
}

/// Streams a part body into `sink` up to the next boundary marker, then seals
/// the sink.
fn read_part_body<R: Read>(state: &mut MultipartState<R>, sink: &mut dyn BodySink) -> crate::Result<Delimiter> {
    let keep = constants::boundary_line_len(&state.boundary);
    let marker_len = state.marker.needle().len();

    loop {
        if let Some((idx, delimiter)) = state.buffer.find_boundary(&state.marker) {
            let data = state.buffer.read_field_data(idx, marker_len);
            append_field_data(state, sink, &data)?;
            sink.seal().map_err(crate::Error::StorageError)?;

            return Ok(delimiter);
        }

        if let Some(data) = state.buffer.read_excess(keep) {
            log::trace!("flushing {} bytes to part body", data.len());
            append_field_data(state, sink, &data)?;
        }

        if state.buffer.fill(constants::READ_CHUNK_SIZE)? == 0 {
            return Err(crate::Error::UnexpectedEof);
        }
    }
}

fn append_field_data<R>(state: &MultipartState<R>, sink: &mut dyn BodySink, data: &[u8]) -> crate::Result<()> {
    if sink.len().saturating_add(data.len() as u64) > state.curr_field_size_limit {
        return Err(crate::Error::FieldSizeExceeded {
            limit: state.curr_field_size_limit,
            field_name: state.curr_field_name.clone(),
        });
    }

    sink.append(data).map_err(crate::Error::StorageError)
}

fn route_part(
    params: &mut Params,
    constraints: &Constraints,
    headers: HeaderMap,
    content_disposition: ContentDisposition,
    content_type: String,
    idx: usize,
    sink: Box<dyn BodySink>,
) -> crate::Result<()> {
    let ContentDisposition { field_name, file_name } = content_disposition;

    if file_name.is_empty() {
        let raw = sink.read_all().map_err(crate::Error::StorageError)?;
        drop(sink);

        let text = decode_text(constraints, &field_name, &raw)?;
        params.append(&field_name, text);
        return Ok(());
    }

    log::debug!(
        "part {} is file {:?} ({} bytes, {:?})",
        idx,
        file_name,
        sink.len(),
        content_type
    );

    let file = FilePart::new(field_name.clone(), file_name, content_type, headers, idx, sink);
    params.append(&field_name, file);

    Ok(())
}

/// Decodes a plain value in the accepted charset.
///
/// Malformed input goes to the configured callback, if any, and is then kept
/// with replacement characters. Without a callback it fails the decode.
fn decode_text(constraints: &Constraints, field_name: &str, raw: &[u8]) -> crate::Result<String> {
    let charset = constraints.charset;

    if let Some(text) = charset.decode_without_bom_handling_and_without_replacement(raw) {
        return Ok(text.into_owned());
    }

    match &constraints.on_invalid_encoding {
        Some(handler) => {
            log::warn!("field {:?} is not valid {}", field_name, charset.name());
            handler(field_name, raw);

            let (text, _) = charset.decode_without_bom_handling(raw);
            Ok(text.into_owned())
        }
        None => Err(crate::Error::InvalidEncoding {
            field_name: field_name.to_owned(),
            charset: charset.name(),
        }),
    }
}
