use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Error reading from buffer: {0}")]
    Io(#[from] io::Error),

    #[error("Error reading from file: {0}")]
    Niffler(#[from] niffler::Error),

    #[error("Invalid header: ({0}): expected ({1})")]
    InvalidHeader(char, char),

    #[error("Invalid FASTQ separator: {0}, expected '+'")]
    InvalidSeparator(char),

    #[error("Incomplete FASTQ record: found {0} trailing line(s), expected 4")]
    IncompleteRecord(usize),

    #[error("FASTA record ({0}) has no sequence")]
    MissingSequence(String),

    #[error("Invalid FASTA record data ({0})")]
    InvalidRecord(String),

    #[error("FASTQ Sequence length ({0}) and quality length ({1}) do not match")]
    UnequalLengths(usize, usize),

    #[error("No lengths to summarize")]
    EmptyInput,

    #[error("Invalid percentile ({0}), must be within 0..=100")]
    InvalidPercentile(u32),

    #[error("Split produces more than {0} parts")]
    TooManyPartitions(usize),

    #[error("Invalid split mode ({0}), expected either 'number' or 'length'")]
    InvalidSplitMode(String),

    #[error("{0} file(s) failed to process")]
    BatchFailed(usize),

    #[error("{path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns true for structural violations of the FASTA/FASTQ grammar.
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::InvalidHeader(..)
            | Self::InvalidSeparator(_)
            | Self::IncompleteRecord(_)
            | Self::MissingSequence(_)
            | Self::InvalidRecord(_)
            | Self::UnequalLengths(..) => true,
            Self::File { source, .. } => source.is_malformed(),
            _ => false,
        }
    }

    /// Attach the offending path to an error.
    pub fn in_file<P: Into<PathBuf>>(self, path: P) -> Self {
        match self {
            Self::File { .. } => self,
            other => Self::File {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}
