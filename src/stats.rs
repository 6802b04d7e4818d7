use std::io::{self, Write};

use num_format::{Locale, ToFormattedString};

use crate::Error;

/// Default N-value percentiles in the distribution report.
pub const DEFAULT_PERCENTILES: &[u32] = &[10, 20, 30, 40, 50, 60, 70, 80, 90];

/// Default length thresholds (in kb) in the distribution report.
pub const DEFAULT_KB_THRESHOLDS: &[u64] = &[1, 5, 10, 20, 30, 40, 50, 60];

/// Running totals at the point a statistic was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulation {
    /// Length at which the scan stopped
    pub length: u64,
    /// Number of lengths accumulated
    pub count: usize,
    /// Sum of the lengths accumulated
    pub sum: u64,
}

/// Aggregate statistics over a list of sequence lengths.
///
/// The lengths are sorted in descending order once on construction; every
/// statistic is a linear scan over that order.
#[derive(Debug, Clone, Default)]
pub struct LengthStats {
    lengths: Vec<u64>,
    total: u64,
}

impl LengthStats {
    pub fn new(mut lengths: Vec<u64>) -> Self {
        lengths.sort_unstable_by(|a, b| b.cmp(a));
        let total = lengths.iter().sum();
        Self { lengths, total }
    }

    /// Lengths in descending order
    pub fn lengths(&self) -> &[u64] {
        &self.lengths
    }

    pub fn count(&self) -> usize {
        self.lengths.len()
    }

    pub fn total_length(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    fn non_empty(&self) -> Result<&[u64], Error> {
        if self.lengths.is_empty() {
            Err(Error::EmptyInput)
        } else {
            Ok(&self.lengths)
        }
    }

    /// Integer mean of the lengths.
    pub fn average_length(&self) -> Result<u64, Error> {
        let lengths = self.non_empty()?;
        Ok(self.total / lengths.len() as u64)
    }

    pub fn longest(&self) -> Result<u64, Error> {
        Ok(self.non_empty()?[0])
    }

    /// The N-value for percentile `p` (e.g. 50 for N50).
    ///
    /// Returns the first length (in descending order) at which the
    /// accumulated sum reaches `p` percent of the total.
    pub fn n_value(&self, p: u32) -> Result<Accumulation, Error> {
        if p > 100 {
            return Err(Error::InvalidPercentile(p));
        }
        let lengths = self.non_empty()?;

        // N100 spans every length, including trailing zero-length records
        if p == 100 {
            return Ok(Accumulation {
                length: lengths[lengths.len() - 1],
                count: lengths.len(),
                sum: self.total,
            });
        }

        let target = u128::from(self.total) * u128::from(p);

        let mut acc = Accumulation {
            length: lengths[0],
            count: 0,
            sum: 0,
        };
        for &length in lengths {
            acc.length = length;
            acc.count += 1;
            acc.sum += length;
            if u128::from(acc.sum) * 100 >= target {
                break;
            }
        }
        Ok(acc)
    }

    /// Accumulation over all lengths greater than or equal to `threshold`.
    ///
    /// When a length below the threshold exists, `length` holds the first
    /// such value; otherwise it holds the shortest length.
    pub fn over(&self, threshold: u64) -> Result<Accumulation, Error> {
        let lengths = self.non_empty()?;
        let mut acc = Accumulation {
            length: lengths[0],
            count: 0,
            sum: 0,
        };
        for &length in lengths {
            acc.length = length;
            if length < threshold {
                break;
            }
            acc.count += 1;
            acc.sum += length;
        }
        Ok(acc)
    }

    /// Percentage of the total length covered by `sum`.
    pub fn percent_of_total(&self, sum: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * sum as f64 / self.total as f64
        }
    }

    /// Write the lengths one per line, longest first.
    pub fn write_lengths<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for length in &self.lengths {
            writeln!(writer, "{length}")?;
        }
        Ok(())
    }
}

/// Text report over a set of lengths, as printed by `fxkit stat`.
pub struct Report<'a> {
    pub stats: &'a LengthStats,
    pub file_number: usize,
    /// Skip the distribution table (short reads)
    pub ngs: bool,
    pub percentiles: &'a [u32],
    pub kb_thresholds: &'a [u64],
}

impl<'a> Report<'a> {
    pub fn new(stats: &'a LengthStats, file_number: usize) -> Self {
        Self {
            stats,
            file_number,
            ngs: false,
            percentiles: DEFAULT_PERCENTILES,
            kb_thresholds: DEFAULT_KB_THRESHOLDS,
        }
    }

    /// Render the report, failing with `EmptyInput` when there are no lengths.
    pub fn render(&self) -> Result<String, Error> {
        let stats = self.stats;
        let average = stats.average_length()?;
        let longest = stats.longest()?;
        let locale = &Locale::en;

        let mut out = String::new();
        out.push_str("\nStatistics for seq records\n\n");
        out.push_str(&format!(
            "file number:   \t{}\n",
            self.file_number.to_formatted_string(locale)
        ));
        out.push_str(&format!(
            "record number: \t{}\n",
            stats.count().to_formatted_string(locale)
        ));
        out.push_str(&format!(
            "sum of length: \t{}\n",
            stats.total_length().to_formatted_string(locale)
        ));
        out.push_str(&format!("average length:\t{}\n", average.to_formatted_string(locale)));
        out.push_str(&format!("longest length:\t{}\n\n", longest.to_formatted_string(locale)));

        if self.ngs {
            return Ok(out);
        }

        out.push_str("Distribution of record length\n");
        out.push_str(&format!(
            "{:>5}\t{:>15}\t{:>15}\t{:>10}\n",
            "Type", "Bases", "Count", "%Bases"
        ));
        for &p in self.percentiles {
            let acc = stats.n_value(p)?;
            out.push_str(&format!(
                "{:>5}\t{:>15}\t{:>15}\t{:>10.2}\n",
                format!("N{p}"),
                acc.length.to_formatted_string(locale),
                acc.count.to_formatted_string(locale),
                stats.percent_of_total(acc.sum)
            ));
        }
        for &kb in self.kb_thresholds {
            let acc = stats.over(kb.saturating_mul(1000))?;
            out.push_str(&format!(
                "{:>5}\t{:>15}\t{:>15}\t{:>10.2}\n",
                format!(">{kb}kb"),
                acc.sum.to_formatted_string(locale),
                acc.count.to_formatted_string(locale),
                stats.percent_of_total(acc.sum)
            ));
        }
        Ok(out)
    }
}
