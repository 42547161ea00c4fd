use std::fmt;
use std::io::{self, Cursor, Read};

use crate::error::{Error, Result};

const READ_CHUNK: usize = 1024;

/// Readable view over a request or response body.
///
/// Absent and zero-length payloads both map to [`BodyStream::EMPTY`], which
/// reports end-of-stream on the first read. Every call that produces a
/// non-empty view starts from the beginning of the payload, so concurrent
/// readers never share a cursor.
pub enum BodyStream<'a> {
    Empty,
    Bytes(Cursor<&'a [u8]>),
    Reader(Box<dyn Read + Send + 'a>),
}

impl<'a> BodyStream<'a> {
    pub const EMPTY: BodyStream<'static> = BodyStream::Empty;

    pub fn from_bytes(bytes: Option<&'a [u8]>) -> Self {
        match bytes {
            Some(bytes) if !bytes.is_empty() => BodyStream::Bytes(Cursor::new(bytes)),
            _ => BodyStream::Empty,
        }
    }

    /// Wraps an arbitrary byte source, e.g. a body spooled to disk.
    pub fn from_reader(reader: impl Read + Send + 'a) -> Self {
        BodyStream::Reader(Box::new(reader))
    }

    pub fn is_empty_stream(&self) -> bool {
        matches!(self, BodyStream::Empty)
    }

    /// Drains the stream to the end.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        if self.is_empty_stream() {
            return Ok(Vec::new());
        }
        let mut result = Vec::new();
        let mut buffer = [0u8; READ_CHUNK];
        loop {
            match self.read(&mut buffer) {
                Ok(0) => return Ok(result),
                Ok(length) => result.extend_from_slice(&buffer[..length]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::PayloadRead(e)),
            }
        }
    }

    /// Drains the stream and decodes it as UTF-8, replacing invalid sequences.
    pub fn into_string(self) -> Result<String> {
        let bytes = self.into_bytes()?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

impl Read for BodyStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BodyStream::Empty => Ok(0),
            BodyStream::Bytes(cursor) => cursor.read(buf),
            BodyStream::Reader(reader) => reader.read(buf),
        }
    }
}

impl fmt::Debug for BodyStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyStream::Empty => f.write_str("BodyStream::Empty"),
            BodyStream::Bytes(cursor) => f
                .debug_struct("BodyStream::Bytes")
                .field("len", &cursor.get_ref().len())
                .field("position", &cursor.position())
                .finish(),
            BodyStream::Reader(_) => f.write_str("BodyStream::Reader(..)"),
        }
    }
}
