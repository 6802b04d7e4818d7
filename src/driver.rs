//! Multi-file `stat` and `split` runs.
//!
//! Each input file is handled by one worker from [`crate::parallel`]; a file
//! that fails is reported and skipped without stopping its siblings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::fastx::read_lengths;
use crate::manifest::{self, DONE_MARKER_NAME, MANIFEST_NAME};
use crate::parallel::{self, FileProcessor, FileResult};
use crate::split::{split_file, Partitioner, SplitMode, DEFAULT_MAX_UNITS};
use crate::stats::{LengthStats, Report, DEFAULT_KB_THRESHOLDS, DEFAULT_PERCENTILES};
use crate::Error;

/// Default output directory of split runs.
pub const DEFAULT_SPLIT_DIR: &str = "split";

/// Default path of the length list written by stat runs.
pub const DEFAULT_LENGTHS_PATH: &str = "record.len";

#[derive(Debug, Clone)]
pub struct SplitConfig {
    pub inputs: Vec<PathBuf>,
    pub mode: SplitMode,
    pub threshold: u64,
    pub out_dir: PathBuf,
    pub concurrent: usize,
    pub max_units: usize,
}

impl SplitConfig {
    pub fn new(inputs: Vec<PathBuf>, mode: SplitMode, threshold: u64) -> Self {
        Self {
            inputs,
            mode,
            threshold,
            out_dir: PathBuf::from(DEFAULT_SPLIT_DIR),
            concurrent: 1,
            max_units: DEFAULT_MAX_UNITS,
        }
    }
}

#[derive(Clone)]
struct SplitProcessor {
    partitioner: Partitioner,
    out_dir: PathBuf,
    total: usize,
    thread_id: usize,
}

impl FileProcessor for SplitProcessor {
    type Output = Vec<String>;

    fn process_file(&mut self, index: usize, path: &Path) -> FileResult<Vec<String>> {
        info!("{}/{} process {:?}", index + 1, self.total, path);
        debug!("worker {} splits {:?}", self.thread_id, path);
        split_file(path, &self.out_dir, &self.partitioner)
    }

    fn set_thread_id(&mut self, thread_id: usize) {
        self.thread_id = thread_id;
    }
}

/// Split every input file into units inside the configured output directory.
///
/// A completed run leaves a manifest of unit paths and a marker file behind.
/// When the marker already exists, the manifest is returned as-is and no
/// input is read.
pub fn seq_split(config: &SplitConfig) -> parallel::Result<Vec<String>> {
    let out_dir = manifest::ensure_dir(&config.out_dir)?;
    let manifest_path = out_dir.join(MANIFEST_NAME);
    let done_path = out_dir.join(DONE_MARKER_NAME);

    if done_path.exists() {
        info!("{done_path:?} exists, pass this step; if you want to rerun, delete the file");
        return Ok(manifest::read_list(&manifest_path)?);
    }

    info!(
        "Split {:?} by sequence {} =~ {} per file",
        config.inputs, config.mode, config.threshold
    );

    let processor = SplitProcessor {
        partitioner: Partitioner::new(config.mode, config.threshold)
            .with_max_units(config.max_units),
        out_dir,
        total: config.inputs.len(),
        thread_id: 0,
    };

    let mut units = Vec::new();
    let mut failed = 0;
    for outcome in parallel::process_files(&config.inputs, &processor, config.concurrent)? {
        match outcome {
            Ok(file_units) => units.extend(file_units),
            Err(e) => {
                error!("{e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(Error::BatchFailed(failed).into());
    }

    manifest::write_list(&manifest_path, &units)?;
    manifest::touch(&done_path)?;
    Ok(units)
}

#[derive(Debug, Clone)]
pub struct StatConfig {
    pub inputs: Vec<PathBuf>,
    /// Treat the inputs as lists of sequence files
    pub fofn: bool,
    /// Short reads: only print the summary block
    pub ngs: bool,
    pub min_len: u64,
    pub concurrent: usize,
    pub percentiles: Vec<u32>,
    pub kb_thresholds: Vec<u64>,
    /// Where to write the sorted length list (skipped if `None` or in `ngs` mode)
    pub lengths_out: Option<PathBuf>,
}

impl StatConfig {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            fofn: false,
            ngs: false,
            min_len: 0,
            concurrent: 1,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            kb_thresholds: DEFAULT_KB_THRESHOLDS.to_vec(),
            lengths_out: Some(PathBuf::from(DEFAULT_LENGTHS_PATH)),
        }
    }
}

#[derive(Debug)]
pub struct StatSummary {
    pub stats: LengthStats,
    pub file_number: usize,
    /// Number of inputs that could not be read
    pub failed: usize,
}

#[derive(Clone)]
struct LengthCollector {
    min_len: u64,
    total: usize,
    thread_id: usize,
}

impl FileProcessor for LengthCollector {
    type Output = Vec<u64>;

    fn process_file(&mut self, index: usize, path: &Path) -> FileResult<Vec<u64>> {
        info!("{}/{} process {:?}", index + 1, self.total, path);
        debug!("worker {} reads {:?}", self.thread_id, path);
        read_lengths(path, self.min_len).map_err(|e| e.in_file(path))
    }

    fn set_thread_id(&mut self, thread_id: usize) {
        self.thread_id = thread_id;
    }
}

/// Resolve the input list, reading each input as a list file in `fofn` mode.
pub fn expand_inputs(inputs: &[PathBuf], fofn: bool) -> Result<Vec<PathBuf>, Error> {
    if !fofn {
        return Ok(inputs.to_vec());
    }
    let mut files = Vec::new();
    for list in inputs {
        let entries = manifest::read_list(list).map_err(|e| e.in_file(list))?;
        files.extend(entries.into_iter().map(PathBuf::from));
    }
    Ok(files)
}

/// Gather the lengths of every file, returning them with the number of failed files.
pub fn collect_lengths(
    files: &[PathBuf],
    min_len: u64,
    concurrent: usize,
) -> parallel::Result<(Vec<u64>, usize)> {
    let collector = LengthCollector {
        min_len,
        total: files.len(),
        thread_id: 0,
    };
    let outcomes = parallel::process_files(files, &collector, concurrent)?;

    let mut lengths = Vec::new();
    let mut failed = 0;
    for (i, outcome) in outcomes.into_iter().enumerate() {
        info!("{}/{} getting results of {:?}", i + 1, files.len(), files[i]);
        match outcome {
            Ok(file_lengths) => lengths.extend(file_lengths),
            Err(e) => {
                error!("{e}");
                failed += 1;
            }
        }
    }
    Ok((lengths, failed))
}

/// Compute length statistics over all inputs and render the report to `out`.
pub fn seq_stat<W: Write>(config: &StatConfig, out: &mut W) -> parallel::Result<StatSummary> {
    let files = expand_inputs(&config.inputs, config.fofn)?;
    let (lengths, failed) = collect_lengths(&files, config.min_len, config.concurrent)?;
    let stats = LengthStats::new(lengths);

    let report = Report {
        stats: &stats,
        file_number: files.len(),
        ngs: config.ngs,
        percentiles: &config.percentiles,
        kb_thresholds: &config.kb_thresholds,
    };
    out.write_all(report.render()?.as_bytes())?;

    // short-read runs stop at the summary and leave no length list behind
    if let Some(path) = config.lengths_out.as_ref().filter(|_| !config.ngs) {
        let mut writer = BufWriter::new(File::create(path)?);
        stats.write_lengths(&mut writer)?;
        writer.flush()?;
    }

    Ok(StatSummary {
        stats,
        file_number: files.len(),
        failed,
    })
}
