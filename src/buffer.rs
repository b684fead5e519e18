use crate::constants;
use bytes::{Buf, Bytes, BytesMut};
use memchr::memmem::Finder;
use std::io::{self, Read};

/// How a boundary marker found in the buffer was terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    /// `--boundary\r\n`: another part follows.
    Next,
    /// `--boundary--`: this was the last part.
    Close,
}

/// Read buffer over the input stream, bounded by the declared content length.
///
/// `remaining` only ever shrinks by what a read actually returned, and no
/// read asks for more than `remaining`, so it cannot underflow.
pub(crate) struct StreamBuffer<R> {
    pub(crate) buf: BytesMut,
    pub(crate) remaining: u64,
    pub(crate) reader: R,
}

impl<R: Read> StreamBuffer<R> {
    pub fn new(reader: R, content_length: u64) -> Self {
        StreamBuffer {
            buf: BytesMut::with_capacity(constants::READ_CHUNK_SIZE),
            remaining: content_length,
            reader,
        }
    }

    /// Whether the declared content length has been fully read.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Reads up to `max` more bytes into the buffer.
    ///
    /// Returns `Ok(0)` once the declared length is exhausted. A stream that
    /// ends while declared bytes remain is [`Error::UnexpectedEof`](crate::Error::UnexpectedEof).
    pub fn fill(&mut self, max: usize) -> crate::Result<usize> {
        let want = self.remaining.min(max as u64) as usize;
        if want == 0 {
            return Ok(0);
        }

        let start = self.buf.len();
        self.buf.resize(start + want, 0);

        let read = loop {
            match self.reader.read(&mut self.buf[start..]) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(crate::Error::StreamReadFailed(err));
                }
            }
        };

        self.buf.truncate(start + read);

        if read == 0 {
            log::debug!("stream ended with {} declared bytes unread", self.remaining);
            return Err(crate::Error::UnexpectedEof);
        }

        self.remaining -= read as u64;
        log::trace!("read chunk of {} bytes, {} remaining", read, self.remaining);

        Ok(read)
    }

    /// Reads exactly `size` bytes, pulling no more than needed from the stream.
    ///
    /// Returns `Ok(None)` if the declared length runs out first.
    pub fn read_exact(&mut self, size: usize) -> crate::Result<Option<Bytes>> {
        while self.buf.len() < size {
            if self.fill(size - self.buf.len())? == 0 {
                return Ok(None);
            }
        }

        Ok(Some(self.buf.split_to(size).freeze()))
    }

    /// Splits off everything up to and including the first `pattern`.
    pub fn read_until(&mut self, pattern: &[u8]) -> Option<Bytes> {
        memchr::memmem::find(&self.buf, pattern).map(|idx| self.buf.split_to(idx + pattern.len()).freeze())
    }

    /// Splits off a part's header block, including its terminating blank line.
    ///
    /// A part without headers starts right away with the blank line.
    pub fn read_header_block(&mut self) -> Option<Bytes> {
        if self.buf.starts_with(constants::CRLF.as_bytes()) {
            return Some(self.buf.split_to(constants::CRLF.len()).freeze());
        }

        self.read_until(constants::CRLF_CRLF.as_bytes())
    }

    /// Finds the first complete boundary marker, `--boundary` followed by
    /// `\r\n` or `--`.
    ///
    /// Returns the marker's start offset and its delimiter. A marker at the
    /// very end of the buffer whose suffix has not arrived yet is not a match.
    pub fn find_boundary(&self, marker: &Finder<'_>) -> Option<(usize, Delimiter)> {
        let mut offset = 0;

        while let Some(rel_idx) = marker.find(&self.buf[offset..]) {
            let idx = offset + rel_idx;
            let suffix_idx = idx + marker.needle().len();

            match self.buf.get(suffix_idx..suffix_idx + 2) {
                Some(suffix) if suffix == constants::CRLF.as_bytes() => return Some((idx, Delimiter::Next)),
                Some(suffix) if suffix == constants::BOUNDARY_EXT.as_bytes() => return Some((idx, Delimiter::Close)),
                Some(_) => offset = idx + 1,
                None => return None,
            }
        }

        None
    }

    /// Splits off the body bytes before a boundary marker found at `idx`,
    /// minus the one line break that belongs to the delimiter line, and
    /// discards the marker itself.
    pub fn read_field_data(&mut self, idx: usize, marker_len: usize) -> Bytes {
        let mut data = self.buf.split_to(idx);

        if data.ends_with(constants::CRLF.as_bytes()) {
            data.truncate(data.len() - constants::CRLF.len());
        } else if data.ends_with(b"\n") {
            data.truncate(data.len() - 1);
        }

        self.buf.advance(marker_len + 2);
        data.freeze()
    }

    /// Splits off everything except the last `keep` bytes.
    ///
    /// The retained tail is long enough to hold a delimiter line that is
    /// still arriving.
    pub fn read_excess(&mut self, keep: usize) -> Option<Bytes> {
        if self.buf.len() > keep {
            let len = self.buf.len() - keep;
            Some(self.buf.split_to(len).freeze())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `step` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_fill_respects_declared_length() {
        let mut buffer = StreamBuffer::new(&b"abcdefgh"[..], 5);
        assert_eq!(buffer.fill(100), Ok(5));
        assert_eq!(&buffer.buf[..], b"abcde");
        assert!(buffer.is_exhausted());
        assert_eq!(buffer.fill(100), Ok(0));
    }

    #[test]
    fn test_fill_reports_early_eof() {
        let mut buffer = StreamBuffer::new(&b"abc"[..], 10);
        assert_eq!(buffer.fill(100), Ok(3));
        assert_eq!(buffer.fill(100), Err(crate::Error::UnexpectedEof));
    }

    #[test]
    fn test_read_exact_does_not_overread() {
        let reader = Trickle {
            data: b"--X\r\nrest",
            step: 2,
        };
        let mut buffer = StreamBuffer::new(reader, 9);

        let line = buffer.read_exact(5).unwrap().unwrap();
        assert_eq!(&line[..], b"--X\r\n");
        assert!(buffer.buf.is_empty());
        assert_eq!(buffer.remaining, 4);
    }

    #[test]
    fn test_read_exact_short() {
        let mut buffer = StreamBuffer::new(&b"--X"[..], 3);
        assert_eq!(buffer.read_exact(5), Ok(None));
    }

    #[test]
    fn test_read_header_block() {
        let mut buffer = StreamBuffer::new(&b""[..], 0);
        buffer.buf.extend_from_slice(b"A: b\r\n\r\nbody");
        assert_eq!(&buffer.read_header_block().unwrap()[..], b"A: b\r\n\r\n");
        assert_eq!(&buffer.buf[..], b"body");

        buffer.buf.clear();
        buffer.buf.extend_from_slice(b"\r\nbody");
        assert_eq!(&buffer.read_header_block().unwrap()[..], b"\r\n");

        buffer.buf.clear();
        buffer.buf.extend_from_slice(b"A: b\r\n");
        assert!(buffer.read_header_block().is_none());
    }

    #[test]
    fn test_find_boundary() {
        let finder = Finder::new(b"--XB");
        let mut buffer = StreamBuffer::new(&b""[..], 0);

        buffer.buf.extend_from_slice(b"data--XBad\r\n--XB\r\nmore");
        assert_eq!(buffer.find_boundary(&finder), Some((12, Delimiter::Next)));

        buffer.buf.clear();
        buffer.buf.extend_from_slice(b"data\r\n--XB--\r\n");
        assert_eq!(buffer.find_boundary(&finder), Some((6, Delimiter::Close)));

        buffer.buf.clear();
        buffer.buf.extend_from_slice(b"data\r\n--XB-");
        assert_eq!(buffer.find_boundary(&finder), None);
    }

    #[test]
    fn test_read_field_data_strips_one_line_break() {
        let mut buffer = StreamBuffer::new(&b""[..], 0);
        buffer.buf.extend_from_slice(b"hello\r\n\r\n--XB\r\nnext");

        let data = buffer.read_field_data(9, 4);
        assert_eq!(&data[..], b"hello\r\n");
        assert_eq!(&buffer.buf[..], b"next");
    }

    #[test]
    fn test_read_excess() {
        let mut buffer = StreamBuffer::new(&b""[..], 0);
        buffer.buf.extend_from_slice(b"0123456789");

        assert_eq!(&buffer.read_excess(4).unwrap()[..], b"012345");
        assert_eq!(&buffer.buf[..], b"6789");
        assert!(buffer.read_excess(4).is_none());
    }
}
