use std::io::{self, Write};
use std::path::Path;

use crate::format::Format;
use crate::lines::LineReader;
use crate::record::split_header;
use crate::{Error, Record};

/// Marks the start of a FASTA header line.
pub const DELIMITER: u8 = b'>';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// Header line without the leading '>'
    header: Vec<u8>,
    /// Sequence with all line breaks removed
    seq: Vec<u8>,
}

impl FastaRecord {
    /// Build a record from a header (without '>') and an unwrapped sequence.
    pub fn new(header: Vec<u8>, seq: Vec<u8>) -> Result<Self, Error> {
        if memchr::memchr(b'\n', &header).is_some()
            || memchr::memchr2(b'\n', DELIMITER, &seq).is_some()
        {
            return Err(Error::InvalidRecord(
                String::from_utf8_lossy(&header).into_owned(),
            ));
        }
        Ok(Self { header, seq })
    }

    /// Parse one buffered record: a header line followed by sequence lines.
    fn from_lines(header: Vec<u8>, seq: Vec<u8>, seq_lines: usize) -> Result<Self, Error> {
        match header.first() {
            Some(&DELIMITER) => {}
            Some(&c) => return Err(Error::InvalidHeader(c.into(), DELIMITER.into())),
            None => return Err(Error::InvalidHeader('\n', DELIMITER.into())),
        }
        if seq_lines == 0 {
            return Err(Error::MissingSequence(
                String::from_utf8_lossy(&header[1..]).into_owned(),
            ));
        }
        let mut header = header;
        header.remove(0);
        Self::new(header, seq)
    }

    /// Full header text
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Header text after the identifier (empty if none)
    pub fn description(&self) -> &[u8] {
        split_header(&self.header).1
    }
}

impl Record for FastaRecord {
    fn id(&self) -> &[u8] {
        split_header(&self.header).0
    }

    fn seq(&self) -> &[u8] {
        &self.seq
    }

    fn qual(&self) -> Option<&[u8]> {
        None
    }

    fn write_record<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[DELIMITER])?;
        writer.write_all(&self.header)?;
        writer.write_all(b"\n")?;
        writer.write_all(&self.seq)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Streams FASTA records out of a line source.
///
/// Lines accumulate until the next header line arrives, at which point the
/// buffered lines are flushed as one record. Sequence line wrapping and blank
/// lines have no effect on the parsed records.
pub struct Reader<R: io::Read> {
    lines: LineReader<R>,
    /// First line of the record being accumulated
    header: Option<Vec<u8>>,
    /// Concatenated sequence lines of the record being accumulated
    seq: Vec<u8>,
    /// Number of sequence lines accumulated
    seq_lines: usize,
    /// Set once the stream is exhausted or an error was returned
    finished: bool,
}

impl Reader<Box<dyn io::Read + Send>> {
    /// Open a FASTA file (optionally gzip-compressed).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Format::Fasta.check_path(&path)?;
        Ok(Self::from_lines(LineReader::from_path(path)?))
    }
}

impl<R: io::Read> Reader<R> {
    pub fn new(reader: R) -> Self {
        Self::from_lines(LineReader::new(reader))
    }

    pub fn from_lines(lines: LineReader<R>) -> Self {
        Self {
            lines,
            header: None,
            seq: Vec::new(),
            seq_lines: 0,
            finished: false,
        }
    }

    /// Flush the buffered lines as a record and reset the buffer
    fn flush(&mut self) -> Option<Result<FastaRecord, Error>> {
        let header = self.header.take()?;
        let seq = std::mem::take(&mut self.seq);
        let seq_lines = std::mem::replace(&mut self.seq_lines, 0);
        Some(FastaRecord::from_lines(header, seq, seq_lines))
    }

    fn fuse(&mut self, item: Result<FastaRecord, Error>) -> Result<FastaRecord, Error> {
        if item.is_err() {
            self.finished = true;
        }
        item
    }
}

impl<R: io::Read> Iterator for Reader<R> {
    type Item = Result<FastaRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if self.header.is_none() {
                        self.header = Some(line);
                    } else if line[0] == DELIMITER {
                        let record = self.flush()?;
                        self.header = Some(line);
                        return Some(self.fuse(record));
                    } else {
                        self.seq.extend_from_slice(&line);
                        self.seq_lines += 1;
                    }
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    return self.flush();
                }
            }
        }
    }
}
