pub use crate::{
    driver::{seq_split, seq_stat, SplitConfig, StatConfig},
    fasta::FastaRecord,
    fastq::FastqRecord,
    fastx::{Format, SeqRecord},
    parallel::{FileProcessor, ProcessError},
    split::{Partitioner, SplitMode, UnitSink},
    stats::{Accumulation, LengthStats},
    Error, Record,
};
