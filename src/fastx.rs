use std::io::{self, Write};
use std::path::Path;

use super::{fasta, fastq, format, Error, Record};

pub use crate::format::Format;

/// A record of either format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeqRecord {
    Fasta(fasta::FastaRecord),
    Fastq(fastq::FastqRecord),
}

impl SeqRecord {
    pub fn format(&self) -> Format {
        match self {
            Self::Fasta(_) => Format::Fasta,
            Self::Fastq(_) => Format::Fastq,
        }
    }
}

impl Record for SeqRecord {
    fn id(&self) -> &[u8] {
        match self {
            Self::Fasta(rec) => rec.id(),
            Self::Fastq(rec) => rec.id(),
        }
    }

    fn seq(&self) -> &[u8] {
        match self {
            Self::Fasta(rec) => rec.seq(),
            Self::Fastq(rec) => rec.seq(),
        }
    }

    fn qual(&self) -> Option<&[u8]> {
        match self {
            Self::Fasta(rec) => rec.qual(),
            Self::Fastq(rec) => rec.qual(),
        }
    }

    fn write_record<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Self::Fasta(rec) => rec.write_record(writer),
            Self::Fastq(rec) => rec.write_record(writer),
        }
    }
}

pub enum Reader<R: io::Read> {
    Fasta(fasta::Reader<R>),
    Fastq(fastq::Reader<R>),
}

impl Reader<Box<dyn io::Read + Send>> {
    /// Open a sequence file, choosing the parser from its suffix.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let (_prefix, format) = format::detect(&path)?;
        match format {
            Format::Fasta => Ok(Self::Fasta(fasta::Reader::from_path(path)?)),
            Format::Fastq => Ok(Self::Fastq(fastq::Reader::from_path(path)?)),
        }
    }
}

impl<R: io::Read> Reader<R> {
    pub fn new(reader: R, format: Format) -> Self {
        match format {
            Format::Fasta => Self::Fasta(fasta::Reader::new(reader)),
            Format::Fastq => Self::Fastq(fastq::Reader::new(reader)),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Self::Fasta(_) => Format::Fasta,
            Self::Fastq(_) => Format::Fastq,
        }
    }
}

impl<R: io::Read> Iterator for Reader<R> {
    type Item = Result<SeqRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Fasta(rdr) => rdr.next().map(|rec| rec.map(SeqRecord::Fasta)),
            Self::Fastq(rdr) => rdr.next().map(|rec| rec.map(SeqRecord::Fastq)),
        }
    }
}

/// Collect the sequence lengths of a file, dropping records shorter than `min_len`.
pub fn read_lengths<P: AsRef<Path>>(path: P, min_len: u64) -> Result<Vec<u64>, Error> {
    let mut lengths = Vec::new();
    for record in Reader::from_path(path)? {
        let length = record?.len() as u64;
        if length >= min_len {
            lengths.push(length);
        }
    }
    Ok(lengths)
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    const FORMAT_EXTENSIONS: &[&str] = &[".fasta", ".fa", ".fastq", ".fq"];
    const COMPRESSION_EXTENSIONS: &[&str] = &["", ".gz"];

    fn sample_text(format_ext: &str) -> String {
        (0..100)
            .map(|i| {
                let seq = "ACGT".repeat(i % 7 + 1);
                if format_ext.contains('q') {
                    format!("@read{i}\n{seq}\n+\n{}\n", "I".repeat(seq.len()))
                } else {
                    format!(">read{i} sample\n{seq}\n")
                }
            })
            .collect()
    }

    fn write_sample(dir: &Path, format_ext: &str, compression_ext: &str) -> std::path::PathBuf {
        let path = dir.join(format!("sample{format_ext}{compression_ext}"));
        let text = sample_text(format_ext);
        if compression_ext.is_empty() {
            fs::write(&path, text).unwrap();
        } else {
            let mut writer = niffler::send::to_path(
                &path,
                niffler::send::compression::Format::Gzip,
                niffler::Level::One,
            )
            .unwrap();
            writer.write_all(text.as_bytes()).unwrap();
        }
        path
    }

    #[test]
    fn test_fastx_reader_from_path() {
        let dir = tempfile::tempdir().unwrap();
        for format_ext in FORMAT_EXTENSIONS {
            for compression_ext in COMPRESSION_EXTENSIONS {
                let path = write_sample(dir.path(), format_ext, compression_ext);
                let reader = Reader::from_path(&path).unwrap();
                let expected = if format_ext.contains('q') {
                    Format::Fastq
                } else {
                    Format::Fasta
                };
                assert_eq!(reader.format(), expected);

                let records: Vec<SeqRecord> = reader.collect::<Result<_, _>>().unwrap();
                assert_eq!(records.len(), 100, "{path:?}");
                assert!(records.iter().all(|r| r.format() == expected));
                assert_eq!(records[3].id_str(), "read3");
            }
        }
    }

    #[test]
    fn test_read_lengths_with_min_len() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sample(dir.path(), ".fa", ".gz");

        let all = read_lengths(&path, 0).unwrap();
        assert_eq!(all.len(), 100);

        let long = read_lengths(&path, 20).unwrap();
        assert!(long.iter().all(|&len| len >= 20));
        assert_eq!(long.len(), all.iter().filter(|&&len| len >= 20).count());
    }

    #[test]
    fn test_unsupported_path() {
        assert!(matches!(
            Reader::from_path("reads.sam"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_reader_from_stream() {
        let reader = Reader::new(Cursor::new("@r1\nAC\n+\nII\n"), Format::Fastq);
        let records: Vec<SeqRecord> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(records[0].qual(), Some(&b"II"[..]));
    }
}
