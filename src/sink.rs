//! Storage targets for part bodies.
//!
//! A [`BodySink`] is created when a part begins, written to as the decoder
//! finds body bytes, and sealed once the part's closing boundary is located.
//! Only a sealed sink can be read back.
//!
//! Which sink a part gets is decided by a [`SinkFactory`] supplied through
//! [`Constraints`](crate::Constraints). [`SinkPolicy`] covers the usual
//! choices; any closure returning a boxed sink works as well.

use bytes::BytesMut;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::constants;

/// Storage for the body of a single part.
pub trait BodySink: fmt::Debug + Send + Sync {
    /// Appends body bytes. Fails once the sink is sealed.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flushes pending writes and rewinds the sink for reading.
    fn seal(&mut self) -> io::Result<()>;

    /// Reads the whole body. Fails if the sink is not sealed yet.
    fn read_all(&self) -> io::Result<Vec<u8>>;

    /// Number of body bytes written so far.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the backing file, if the body lives on disk.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// Creates a fresh [`BodySink`] for every part.
pub trait SinkFactory: Send + Sync {
    fn create_sink(&self) -> io::Result<Box<dyn BodySink>>;
}

impl<F> SinkFactory for F
where
    F: Fn() -> io::Result<Box<dyn BodySink>> + Send + Sync,
{
    fn create_sink(&self) -> io::Result<Box<dyn BodySink>> {
        self()
    }
}

/// The built-in sink choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkPolicy {
    /// Keep every body in memory.
    Memory,
    /// Write every body to its own temporary file.
    TempFile,
    /// Keep a body in memory until it grows past `threshold` bytes, then move
    /// it to a temporary file.
    Spooled { threshold: usize },
}

impl Default for SinkPolicy {
    fn default() -> Self {
        SinkPolicy::Spooled {
            threshold: constants::DEFAULT_SPOOL_THRESHOLD,
        }
    }
}

impl SinkFactory for SinkPolicy {
    fn create_sink(&self) -> io::Result<Box<dyn BodySink>> {
        Ok(match *self {
            SinkPolicy::Memory => Box::new(MemorySink::new()),
            SinkPolicy::TempFile => Box::new(TempFileSink::new()?),
            SinkPolicy::Spooled { threshold } => Box::new(SpooledSink::new(threshold)),
        })
    }
}

fn sealed_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "body sink is already sealed")
}

fn unsealed_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "body sink read before it was sealed")
}

/// An in-memory body.
#[derive(Debug, Default)]
pub struct MemorySink {
    buf: BytesMut,
    sealed: bool,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }
}

impl BodySink for MemorySink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.sealed {
            return Err(sealed_error());
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn seal(&mut self) -> io::Result<()> {
        self.sealed = true;
        Ok(())
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        if !self.sealed {
            return Err(unsealed_error());
        }
        Ok(self.buf.to_vec())
    }

    fn len(&self) -> u64 {
        self.buf.len() as u64
    }
}

/// A body backed by a temporary file, removed when the sink is dropped.
#[derive(Debug)]
pub struct TempFileSink {
    file: NamedTempFile,
    len: u64,
    sealed: bool,
}

impl TempFileSink {
    pub fn new() -> io::Result<TempFileSink> {
        let file = tempfile::Builder::new().prefix("cgi-params-").tempfile()?;

        Ok(TempFileSink {
            file,
            len: 0,
            sealed: false,
        })
    }
}

impl BodySink for TempFileSink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.sealed {
            return Err(sealed_error());
        }
        self.file.write_all(bytes)?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn seal(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.seek(SeekFrom::Start(0))?;
        self.sealed = true;
        Ok(())
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        if !self.sealed {
            return Err(unsealed_error());
        }

        let mut file = self.file.as_file();
        file.seek(SeekFrom::Start(0))?;

        let mut data = Vec::with_capacity(self.len as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn path(&self) -> Option<&Path> {
        Some(self.file.path())
    }
}

#[derive(Debug)]
enum Spool {
    Memory(MemorySink),
    File(TempFileSink),
}

/// A body kept in memory up to a threshold and moved to a temporary file
/// past it.
#[derive(Debug)]
pub struct SpooledSink {
    threshold: usize,
    spool: Spool,
}

impl SpooledSink {
    pub fn new(threshold: usize) -> SpooledSink {
        SpooledSink {
            threshold,
            spool: Spool::Memory(MemorySink::new()),
        }
    }

    /// Whether the body has been moved to disk.
    pub fn is_spooled(&self) -> bool {
        matches!(self.spool, Spool::File(_))
    }
}

impl BodySink for SpooledSink {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = match &mut self.spool {
            Spool::Memory(mem) if mem.buf.len() + bytes.len() > self.threshold => {
                if mem.sealed {
                    return Err(sealed_error());
                }

                let mut file = TempFileSink::new()?;
                file.append(&mem.buf)?;
                file.append(bytes)?;
                file
            }
            Spool::Memory(mem) => return mem.append(bytes),
            Spool::File(file) => return file.append(bytes),
        };

        log::trace!("spooled part body to {:?} after {} bytes", file.path(), file.len());
        self.spool = Spool::File(file);
        Ok(())
    }

    fn seal(&mut self) -> io::Result<()> {
        match &mut self.spool {
            Spool::Memory(mem) => mem.seal(),
            Spool::File(file) => file.seal(),
        }
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        match &self.spool {
            Spool::Memory(mem) => mem.read_all(),
            Spool::File(file) => file.read_all(),
        }
    }

    fn len(&self) -> u64 {
        match &self.spool {
            Spool::Memory(mem) => mem.len(),
            Spool::File(file) => file.len(),
        }
    }

    fn path(&self) -> Option<&Path> {
        match &self.spool {
            Spool::Memory(_) => None,
            Spool::File(file) => file.path(),
        }
    }
}
