use std::io;
use std::path::Path;

use crate::Error;

/// Default number of bytes requested from the underlying reader per read.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Lazily splits a byte stream into trimmed, non-empty lines.
///
/// Bytes are pulled from the reader in fixed-size chunks. A line that spans
/// two chunks stays in the buffer until its newline (or the end of the
/// stream) arrives.
pub struct LineReader<R: io::Read> {
    /// Handle to the underlying reader (byte stream)
    reader: R,
    /// Bytes read but not yet handed out as lines
    buffer: Vec<u8>,
    /// Start of the unconsumed region of the buffer
    pos: usize,
    /// Track the last byte position we've searched for newlines
    last_searched_pos: usize,
    /// Number of bytes to request per read
    chunk_size: usize,
    /// Flag to indicate end of file
    eof: bool,
}

impl LineReader<Box<dyn io::Read + Send>> {
    /// Open a file, transparently decompressing gzip input.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let (reader, _format) = niffler::send::from_path(path)?;
        Ok(Self::new(reader))
    }
}

impl<R: io::Read> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(chunk_size),
            pos: 0,
            last_searched_pos: 0,
            chunk_size: chunk_size.max(1),
            eof: false,
        }
    }

    /// Drop consumed bytes from the front of the buffer
    fn compact(&mut self) {
        if self.pos > 0 {
            self.buffer.drain(..self.pos);
            self.last_searched_pos -= self.pos;
            self.pos = 0;
        }
    }

    /// Read the next chunk into the end of the buffer
    fn fill(&mut self) -> Result<(), Error> {
        self.compact();
        let current_pos = self.buffer.len();
        self.buffer.resize(current_pos + self.chunk_size, 0);
        loop {
            match self.reader.read(&mut self.buffer[current_pos..]) {
                Ok(0) => {
                    self.buffer.truncate(current_pos);
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buffer.truncate(current_pos + n);
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buffer.truncate(current_pos);
                    self.eof = true;
                    return Err(e.into());
                }
            }
        }
    }

    /// Returns the next raw line (without its newline), or `None` at EOF.
    fn next_raw(&mut self) -> Option<Result<(usize, usize), Error>> {
        loop {
            let search_buffer = &self.buffer[self.last_searched_pos..];
            if let Some(i) = memchr::memchr(b'\n', search_buffer) {
                let start = self.pos;
                let end = self.last_searched_pos + i;
                self.pos = end + 1;
                self.last_searched_pos = self.pos;
                return Some(Ok((start, end)));
            }
            self.last_searched_pos = self.buffer.len();

            if self.eof {
                if self.pos < self.buffer.len() {
                    let start = self.pos;
                    self.pos = self.buffer.len();
                    return Some(Ok((start, self.buffer.len())));
                }
                return None;
            }

            if let Err(e) = self.fill() {
                return Some(Err(e));
            }
        }
    }
}

impl<R: io::Read> Iterator for LineReader<R> {
    type Item = Result<Vec<u8>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_raw()? {
                Ok((start, end)) => {
                    let line = self.buffer[start..end].trim_ascii();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(Ok(line.to_vec()));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
