use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::format::{self, Format};
use crate::{fasta, fastq, Error, Record};

/// Default ceiling on the number of units a single file may be split into.
pub const DEFAULT_MAX_UNITS: usize = 1_000_000;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Close a unit after a fixed number of records
    Count,
    /// Close a unit once its summed sequence length reaches the threshold
    #[default]
    Length,
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Count => write!(f, "number"),
            Self::Length => write!(f, "length"),
        }
    }
}

impl FromStr for SplitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "number" | "count" => Ok(Self::Count),
            "length" => Ok(Self::Length),
            val => Err(Error::InvalidSplitMode(val.to_string())),
        }
    }
}

/// Destination for the units produced by a [`Partitioner`].
///
/// Units are opened lazily, so `open_unit` is only called once a record is
/// ready to be written into the unit.
pub trait UnitSink<Rf: Record> {
    /// Begin the unit with the given 1-based index
    fn open_unit(&mut self, index: usize) -> Result<(), Error>;

    /// Append a record to the open unit
    fn write_record(&mut self, record: &Rf) -> Result<(), Error>;

    /// Finish the open unit and return its name
    fn close_unit(&mut self) -> Result<String, Error>;
}

#[derive(Debug, Clone, Copy)]
pub struct Partitioner {
    pub mode: SplitMode,
    pub threshold: u64,
    pub max_units: usize,
}

impl Partitioner {
    pub fn new(mode: SplitMode, threshold: u64) -> Self {
        Self {
            mode,
            threshold,
            max_units: DEFAULT_MAX_UNITS,
        }
    }

    #[must_use]
    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = max_units;
        self
    }

    fn weight<Rf: Record>(&self, record: &Rf) -> u64 {
        match self.mode {
            SplitMode::Count => 1,
            SplitMode::Length => record.len() as u64,
        }
    }

    /// Distribute a record stream over consecutive units of `sink`.
    ///
    /// The threshold is checked after each record is written, so the record
    /// that reaches it closes the unit it belongs to. Returns the names of
    /// all closed units in order.
    pub fn partition<Rf, I, S>(&self, records: I, sink: &mut S) -> Result<Vec<String>, Error>
    where
        Rf: Record,
        I: IntoIterator<Item = Result<Rf, Error>>,
        S: UnitSink<Rf>,
    {
        let mut units = Vec::new();
        let mut index = 0;
        let mut is_open = false;
        let mut accumulated = 0u64;

        for record in records {
            let record = record?;

            if !is_open {
                index += 1;
                if index > self.max_units {
                    return Err(Error::TooManyPartitions(self.max_units));
                }
                sink.open_unit(index)?;
                is_open = true;
                accumulated = 0;
            }

            sink.write_record(&record)?;
            let next = accumulated.saturating_add(self.weight(&record));
            let grew = next > accumulated;
            accumulated = next;

            if grew && accumulated >= self.threshold {
                units.push(sink.close_unit()?);
                is_open = false;
            }
        }

        if is_open {
            units.push(sink.close_unit()?);
        }
        Ok(units)
    }
}

/// Filename template for the units cut from one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitNaming {
    head: String,
    separator: &'static str,
    tail: String,
}

impl UnitNaming {
    /// `{prefix}.{n}.fasta`
    pub fn fasta(prefix: &str) -> Self {
        Self {
            head: prefix.to_string(),
            separator: ".",
            tail: ".fasta".to_string(),
        }
    }

    /// `{prefix}_{n}.fastq`, keeping a trailing `.R1`/`.R2` mate tag last.
    pub fn fastq(prefix: &str) -> Self {
        for mate in [".R1", ".R2"] {
            if let Some(stem) = prefix.strip_suffix(mate) {
                return Self {
                    head: stem.to_string(),
                    separator: "_",
                    tail: format!("{mate}.fastq"),
                };
            }
        }
        Self {
            head: prefix.to_string(),
            separator: "_",
            tail: ".fastq".to_string(),
        }
    }

    pub fn for_format(prefix: &str, format: Format) -> Self {
        match format {
            Format::Fasta => Self::fasta(prefix),
            Format::Fastq => Self::fastq(prefix),
        }
    }

    pub fn name(&self, index: usize) -> String {
        format!("{}{}{}{}", self.head, self.separator, index, self.tail)
    }
}

/// Writes each unit to its own file inside an output directory.
///
/// With `positions` enabled, every unit gets a `.bed` companion listing
/// `id`, `1` and the sequence length of each record it holds.
pub struct FileSink {
    out_dir: PathBuf,
    naming: UnitNaming,
    positions: bool,
    current: Option<OpenUnit>,
}

struct OpenUnit {
    path: PathBuf,
    records: BufWriter<File>,
    bed: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(out_dir: P, naming: UnitNaming, positions: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            naming,
            positions,
            current: None,
        }
    }

    fn bed_path(path: &Path) -> PathBuf {
        let mut bed = path.as_os_str().to_owned();
        bed.push(".bed");
        PathBuf::from(bed)
    }

    fn unit(&mut self) -> Result<&mut OpenUnit, Error> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::Io(std::io::Error::other("no open unit")))
    }
}

impl<Rf: Record> UnitSink<Rf> for FileSink {
    fn open_unit(&mut self, index: usize) -> Result<(), Error> {
        let path = self.out_dir.join(self.naming.name(index));
        let records = BufWriter::new(File::create(&path)?);
        let bed = if self.positions {
            Some(BufWriter::new(File::create(Self::bed_path(&path))?))
        } else {
            None
        };
        self.current = Some(OpenUnit { path, records, bed });
        Ok(())
    }

    fn write_record(&mut self, record: &Rf) -> Result<(), Error> {
        let unit = self.unit()?;
        record.write_record(&mut unit.records)?;
        if let Some(bed) = unit.bed.as_mut() {
            bed.write_all(record.id())?;
            writeln!(bed, "\t1\t{}", record.len())?;
        }
        Ok(())
    }

    fn close_unit(&mut self) -> Result<String, Error> {
        let mut unit = self
            .current
            .take()
            .ok_or_else(|| Error::Io(std::io::Error::other("no open unit")))?;
        unit.records.flush()?;
        if let Some(bed) = unit.bed.as_mut() {
            bed.flush()?;
        }
        debug!("wrote {:?}", unit.path);
        Ok(unit.path.to_string_lossy().into_owned())
    }
}

/// Collects units in memory.
#[derive(Debug, Clone)]
pub struct MemorySink<Rf> {
    pub units: Vec<(String, Vec<Rf>)>,
}

impl<Rf> Default for MemorySink<Rf> {
    fn default() -> Self {
        Self { units: Vec::new() }
    }
}

impl<Rf: Record + Clone> UnitSink<Rf> for MemorySink<Rf> {
    fn open_unit(&mut self, index: usize) -> Result<(), Error> {
        self.units.push((format!("unit_{index}"), Vec::new()));
        Ok(())
    }

    fn write_record(&mut self, record: &Rf) -> Result<(), Error> {
        match self.units.last_mut() {
            Some((_, records)) => {
                records.push(record.clone());
                Ok(())
            }
            None => Err(Error::Io(std::io::Error::other("no open unit"))),
        }
    }

    fn close_unit(&mut self) -> Result<String, Error> {
        match self.units.last() {
            Some((name, _)) => Ok(name.clone()),
            None => Err(Error::Io(std::io::Error::other("no open unit"))),
        }
    }
}

/// Split one sequence file into units inside `out_dir`.
///
/// FASTA units are written with a `.bed` position companion; FASTQ units are
/// written alone. Returns the unit paths in order.
pub fn split_file<P: AsRef<Path>, O: AsRef<Path>>(
    path: P,
    out_dir: O,
    partitioner: &Partitioner,
) -> Result<Vec<String>, Error> {
    let path = path.as_ref();
    let run = || -> Result<Vec<String>, Error> {
        let (prefix, format) = format::detect(path)?;
        let naming = UnitNaming::for_format(&prefix, format);
        match format {
            Format::Fasta => {
                let mut sink = FileSink::new(out_dir.as_ref(), naming, true);
                partitioner.partition(fasta::Reader::from_path(path)?, &mut sink)
            }
            Format::Fastq => {
                let mut sink = FileSink::new(out_dir.as_ref(), naming, false);
                partitioner.partition(fastq::Reader::from_path(path)?, &mut sink)
            }
        }
    };
    run().map_err(|e| e.in_file(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::FastaRecord;
    use crate::fastq::FastqRecord;
    use std::fs;

    fn fasta_records(lengths: &[usize]) -> Vec<FastaRecord> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                FastaRecord::new(format!("rec{} sample", i + 1).into_bytes(), vec![b'A'; len])
                    .unwrap()
            })
            .collect()
    }

    fn run_memory(
        partitioner: Partitioner,
        records: &[FastaRecord],
    ) -> Result<MemorySink<FastaRecord>, Error> {
        let mut sink = MemorySink::default();
        partitioner.partition(records.iter().cloned().map(Ok), &mut sink)?;
        Ok(sink)
    }

    fn unit_ids(sink: &MemorySink<FastaRecord>) -> Vec<Vec<String>> {
        sink.units
            .iter()
            .map(|(_, recs)| recs.iter().map(|r| r.id_str().into_owned()).collect())
            .collect()
    }

    #[test]
    fn test_split_mode_from_str() {
        assert_eq!("number".parse::<SplitMode>().unwrap(), SplitMode::Count);
        assert_eq!("Length".parse::<SplitMode>().unwrap(), SplitMode::Length);
        assert!(matches!(
            "bytes".parse::<SplitMode>(),
            Err(Error::InvalidSplitMode(_))
        ));
    }

    #[test]
    fn test_split_by_length() {
        let records = fasta_records(&[3, 3, 3, 3, 3]);
        let sink = run_memory(Partitioner::new(SplitMode::Length, 7), &records).unwrap();
        assert_eq!(
            unit_ids(&sink),
            vec![vec!["rec1", "rec2", "rec3"], vec!["rec4", "rec5"]]
        );
    }

    #[test]
    fn test_split_by_count() {
        let records = fasta_records(&[1, 2, 3, 4, 5, 6, 7]);
        let sink = run_memory(Partitioner::new(SplitMode::Count, 3), &records).unwrap();
        let sizes: Vec<usize> = sink.units.iter().map(|(_, r)| r.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_no_empty_trailing_unit() {
        let records = fasta_records(&[5, 5, 5, 5]);
        let sink = run_memory(Partitioner::new(SplitMode::Count, 2), &records).unwrap();
        assert_eq!(sink.units.len(), 2);

        let sink = run_memory(Partitioner::new(SplitMode::Length, 10), &records).unwrap();
        assert_eq!(sink.units.len(), 2);
        assert!(sink.units.iter().all(|(_, recs)| !recs.is_empty()));

        let sink = run_memory(Partitioner::new(SplitMode::Length, 10), &[]).unwrap();
        assert!(sink.units.is_empty());
    }

    #[test]
    fn test_zero_length_records_do_not_roll_over() {
        let records = fasta_records(&[0, 4, 0, 0, 4]);
        let sink = run_memory(Partitioner::new(SplitMode::Length, 4), &records).unwrap();
        assert_eq!(
            unit_ids(&sink),
            vec![vec!["rec1", "rec2"], vec!["rec3", "rec4", "rec5"]]
        );
    }

    #[test]
    fn test_partition_is_exhaustive_and_ordered() {
        let lengths: Vec<usize> = (0..57).map(|i| (i * 37) % 23 + 1).collect();
        let records = fasta_records(&lengths);
        for (mode, threshold) in [
            (SplitMode::Count, 1),
            (SplitMode::Count, 4),
            (SplitMode::Count, 100),
            (SplitMode::Length, 1),
            (SplitMode::Length, 30),
            (SplitMode::Length, 10_000),
        ] {
            let sink = run_memory(Partitioner::new(mode, threshold), &records).unwrap();
            assert!(sink.units.iter().all(|(_, recs)| !recs.is_empty()));
            let joined: Vec<FastaRecord> = sink
                .units
                .iter()
                .flat_map(|(_, recs)| recs.iter().cloned())
                .collect();
            assert_eq!(joined, records, "{mode:?} {threshold}");
        }
    }

    #[test]
    fn test_too_many_partitions() {
        let records = fasta_records(&[10; 5]);
        let partitioner = Partitioner::new(SplitMode::Length, 1).with_max_units(4);
        assert!(matches!(
            run_memory(partitioner, &records),
            Err(Error::TooManyPartitions(4))
        ));

        let partitioner = Partitioner::new(SplitMode::Length, 1).with_max_units(5);
        assert_eq!(run_memory(partitioner, &records).unwrap().units.len(), 5);
    }

    #[test]
    fn test_default_ceiling_allows_large_splits() {
        let records = fasta_records(&[1; 2500]);
        let sink = run_memory(Partitioner::new(SplitMode::Count, 1), &records).unwrap();
        assert_eq!(sink.units.len(), 2500);
        assert_eq!(sink.units[2499].0, "unit_2500");
    }

    #[test]
    fn test_parse_error_aborts() {
        let records = vec![
            Ok(fasta_records(&[2])[0].clone()),
            Err(Error::MissingSequence("broken".to_string())),
        ];
        let mut sink = MemorySink::default();
        let result = Partitioner::new(SplitMode::Count, 10).partition(records, &mut sink);
        assert!(matches!(result, Err(Error::MissingSequence(_))));
    }

    #[test]
    fn test_unit_naming() {
        assert_eq!(UnitNaming::fasta("contigs").name(1), "contigs.1.fasta");
        assert_eq!(UnitNaming::fastq("reads").name(12), "reads_12.fastq");
        assert_eq!(UnitNaming::fastq("lib.R1").name(3), "lib_3.R1.fastq");
        assert_eq!(UnitNaming::fastq("lib.R2").name(3), "lib_3.R2.fastq");
        assert_eq!(UnitNaming::fastq("libR1").name(1), "libR1_1.fastq");
        assert_eq!(
            UnitNaming::for_format("x.R1", Format::Fasta).name(2),
            "x.R1.2.fasta"
        );
    }

    #[test]
    fn test_split_fasta_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("asm.fa");
        fs::write(&input, ">c1 first\nAAA\n>c2\nCC\nC\n>c3\nGGG\n>c4\nTTT\n>c5\nAAA\n").unwrap();
        let out_dir = dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();

        let units = split_file(&input, &out_dir, &Partitioner::new(SplitMode::Length, 7)).unwrap();
        let expected: Vec<String> = ["asm.1.fasta", "asm.2.fasta"]
            .iter()
            .map(|name| out_dir.join(name).to_string_lossy().into_owned())
            .collect();
        assert_eq!(units, expected);

        assert_eq!(
            fs::read_to_string(&units[0]).unwrap(),
            ">c1 first\nAAA\n>c2\nCCC\n>c3\nGGG\n"
        );
        assert_eq!(
            fs::read_to_string(format!("{}.bed", units[0])).unwrap(),
            "c1\t1\t3\nc2\t1\t3\nc3\t1\t3\n"
        );
        assert_eq!(
            fs::read_to_string(&units[1]).unwrap(),
            ">c4\nTTT\n>c5\nAAA\n"
        );
        assert_eq!(
            fs::read_to_string(format!("{}.bed", units[1])).unwrap(),
            "c4\t1\t3\nc5\t1\t3\n"
        );
        assert!(!out_dir.join("asm.3.fasta").exists());
    }

    #[test]
    fn test_split_fastq_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.R2.fastq");
        let text: String = (0..5)
            .map(|i| format!("@r{i}\nACGT\n+\nIIII\n"))
            .collect();
        fs::write(&input, &text).unwrap();

        let units =
            split_file(&input, dir.path(), &Partitioner::new(SplitMode::Count, 2)).unwrap();
        assert_eq!(units.len(), 3);
        assert!(units[0].ends_with("run_1.R2.fastq"));
        assert!(units[2].ends_with("run_3.R2.fastq"));

        let rejoined: String = units
            .iter()
            .map(|unit| fs::read_to_string(unit).unwrap())
            .collect();
        assert_eq!(rejoined, text);
        assert!(!dir.path().join("run_1.R2.fastq.bed").exists());

        let record: FastqRecord = fastq::Reader::from_path(&units[2])
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(record.id_str(), "r4");
    }

    #[test]
    fn test_split_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.fq");
        fs::write(&input, "@r1\nACGT\n+\n").unwrap();

        let err = split_file(&input, dir.path(), &Partitioner::new(SplitMode::Count, 2))
            .unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, Error::File { ref path, .. } if path == &input));
    }

    mod properties {
        use proptest::prelude::*;

        use super::fasta_records;
        use crate::fasta::FastaRecord;
        use crate::split::{MemorySink, Partitioner, SplitMode};
        use crate::Record;

        fn arb_mode() -> impl Strategy<Value = SplitMode> {
            prop_oneof![Just(SplitMode::Count), Just(SplitMode::Length)]
        }

        fn weight(mode: SplitMode, record: &FastaRecord) -> u64 {
            match mode {
                SplitMode::Count => 1,
                SplitMode::Length => record.len() as u64,
            }
        }

        proptest! {
            #[test]
            fn units_are_exhaustive_ordered_and_full(
                lengths in prop::collection::vec(0usize..50, 0..60),
                mode in arb_mode(),
                threshold in 1u64..200,
            ) {
                let records = fasta_records(&lengths);
                let mut sink = MemorySink::default();
                let names = Partitioner::new(mode, threshold)
                    .partition(records.iter().cloned().map(Ok), &mut sink)
                    .unwrap();
                prop_assert_eq!(names.len(), sink.units.len());

                let joined: Vec<FastaRecord> = sink
                    .units
                    .iter()
                    .flat_map(|(_, recs)| recs.iter().cloned())
                    .collect();
                prop_assert_eq!(&joined, &records);

                let last = sink.units.len().saturating_sub(1);
                for (i, (_, recs)) in sink.units.iter().enumerate() {
                    prop_assert!(!recs.is_empty());
                    let total: u64 = recs.iter().map(|r| weight(mode, r)).sum();
                    let before_last: u64 = total - weight(mode, &recs[recs.len() - 1]);
                    // a unit never keeps going once it reached the threshold
                    prop_assert!(before_last < threshold);
                    if i < last {
                        prop_assert!(total >= threshold);
                    }
                }
            }
        }
    }
}
