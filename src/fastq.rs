use std::io::{self, Write};
use std::path::Path;

use crate::format::Format;
use crate::lines::LineReader;
use crate::record::split_header;
use crate::{Error, Record};

/// Marks the start of a FASTQ identifier line.
pub const HEADER_MARKER: u8 = b'@';

/// Marks the start of a FASTQ separator line.
pub const SEPARATOR_MARKER: u8 = b'+';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    /// Identifier line without the leading '@'
    identifier: Vec<u8>,
    seq: Vec<u8>,
    /// Raw separator line (including the '+'), kept verbatim
    separator: Vec<u8>,
    qual: Vec<u8>,
}

impl FastqRecord {
    /// Build a record from its four lines.
    ///
    /// The identifier is given without its '@' marker, the separator with
    /// its '+' marker.
    pub fn new(identifier: Vec<u8>, seq: Vec<u8>, separator: Vec<u8>, qual: Vec<u8>) -> Self {
        Self {
            identifier,
            seq,
            separator,
            qual,
        }
    }

    /// Validate and assemble the four raw lines of a record
    fn from_lines(lines: [Vec<u8>; 4], check_quality: bool) -> Result<Self, Error> {
        let [header, seq, separator, qual] = lines;

        // Lines from the line source are never empty
        if header[0] != HEADER_MARKER {
            return Err(Error::InvalidHeader(header[0].into(), HEADER_MARKER.into()));
        }
        if separator[0] != SEPARATOR_MARKER {
            return Err(Error::InvalidSeparator(separator[0].into()));
        }
        if check_quality && seq.len() != qual.len() {
            return Err(Error::UnequalLengths(seq.len(), qual.len()));
        }

        let mut identifier = header;
        identifier.remove(0);
        Ok(Self::new(identifier, seq, separator, qual))
    }

    /// Full identifier line (without '@')
    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    /// Separator line as it appeared in the input
    pub fn separator(&self) -> &[u8] {
        &self.separator
    }

    /// Returns a new record with `left` bases removed from the start and
    /// `right` bases removed from the end of both sequence and quality.
    ///
    /// Trimming more bases than available yields an empty sequence.
    #[must_use]
    pub fn trim(&self, left: usize, right: usize) -> Self {
        Self {
            identifier: self.identifier.clone(),
            seq: trim_slice(&self.seq, left, right).to_vec(),
            separator: self.separator.clone(),
            qual: trim_slice(&self.qual, left, right).to_vec(),
        }
    }
}

fn trim_slice(slice: &[u8], left: usize, right: usize) -> &[u8] {
    let end = slice.len().saturating_sub(right);
    let start = left.min(end);
    &slice[start..end]
}

impl Record for FastqRecord {
    fn id(&self) -> &[u8] {
        split_header(&self.identifier).0
    }

    fn seq(&self) -> &[u8] {
        &self.seq
    }

    fn qual(&self) -> Option<&[u8]> {
        Some(&self.qual)
    }

    fn write_record<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[HEADER_MARKER])?;
        writer.write_all(&self.identifier)?;
        writer.write_all(b"\n")?;
        writer.write_all(&self.seq)?;
        writer.write_all(b"\n")?;
        writer.write_all(&self.separator)?;
        writer.write_all(b"\n")?;
        writer.write_all(&self.qual)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Streams FASTQ records out of a line source, four lines at a time.
pub struct Reader<R: io::Read> {
    lines: LineReader<R>,
    /// Reject records whose quality length differs from their sequence length
    check_quality: bool,
    /// Set once the stream is exhausted or an error was returned
    finished: bool,
}

impl Reader<Box<dyn io::Read + Send>> {
    /// Open a FASTQ file (optionally gzip-compressed).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Format::Fastq.check_path(&path)?;
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
            check_quality: false,
            finished: false,
        }
    }

    /// Enable or disable the sequence/quality length check.
    #[must_use]
    pub fn with_quality_check(mut self, check_quality: bool) -> Self {
        self.check_quality = check_quality;
        self
    }

    fn next_group(&mut self) -> Option<Result<FastqRecord, Error>> {
        let mut group: [Vec<u8>; 4] = Default::default();
        for (filled, slot) in group.iter_mut().enumerate() {
            match self.lines.next() {
                Some(Ok(line)) => *slot = line,
                Some(Err(e)) => return Some(Err(e)),
                None if filled == 0 => return None,
                None => return Some(Err(Error::IncompleteRecord(filled))),
            }
        }
        Some(FastqRecord::from_lines(group, self.check_quality))
    }
}

impl<R: io::Read> Iterator for Reader<R> {
    type Item = Result<FastqRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_group();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}
