use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::Error;

/// Suffix marking a gzip-compressed input.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Accepted FASTA file suffixes.
pub const FASTA_SUFFIXES: &[&str] = &[".fa", ".fasta", ".fa.gz", ".fasta.gz"];

/// Accepted FASTQ file suffixes.
pub const FASTQ_SUFFIXES: &[&str] = &[".fq", ".fastq", ".fq.gz", ".fastq.gz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Fasta,
    Fastq,
}

impl Format {
    pub fn suffixes(self) -> &'static [&'static str] {
        match self {
            Self::Fasta => FASTA_SUFFIXES,
            Self::Fastq => FASTQ_SUFFIXES,
        }
    }

    /// Check that a path carries one of this format's suffixes.
    pub fn check_path<P: AsRef<Path>>(self, path: P) -> Result<(), Error> {
        let name = file_name(path.as_ref()).to_ascii_lowercase();
        if self.suffixes().iter().any(|suffix| name.ends_with(suffix)) {
            Ok(())
        } else {
            Err(Error::UnsupportedFormat(format!(
                "{name:?} is not one of {:?}",
                self.suffixes()
            )))
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fasta => write!(f, "fasta"),
            Self::Fastq => write!(f, "fastq"),
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fasta" | "fa" => Ok(Self::Fasta),
            "fastq" | "fq" => Ok(Self::Fastq),
            val => Err(Error::UnsupportedFormat(val.to_string())),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split a filename into its name prefix and sequence format.
///
/// The compressed suffix (if any) and the format extension are both stripped
/// from the basename to form the prefix, so `reads/sample.R1.fq.gz` becomes
/// `("sample.R1", Format::Fastq)`.
pub fn detect<P: AsRef<Path>>(path: P) -> Result<(String, Format), Error> {
    let name = file_name(path.as_ref());
    let parts: Vec<&str> = name.split('.').collect();

    let ext_parts = if name.to_ascii_lowercase().ends_with(COMPRESSED_SUFFIX) {
        2
    } else {
        1
    };
    if parts.len() <= ext_parts {
        return Err(Error::UnsupportedFormat(name));
    }

    let split_at = parts.len() - ext_parts;
    let prefix = parts[..split_at].join(".");
    let extension = format!(".{}", parts[split_at..].join(".")).to_ascii_lowercase();

    let format = if FASTA_SUFFIXES.contains(&extension.as_str()) {
        Format::Fasta
    } else if FASTQ_SUFFIXES.contains(&extension.as_str()) {
        Format::Fastq
    } else {
        return Err(Error::UnsupportedFormat(name));
    };
    Ok((prefix, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_plain() {
        assert_eq!(
            detect("data/contigs.fasta").unwrap(),
            ("contigs".to_string(), Format::Fasta)
        );
        assert_eq!(
            detect("reads.fq").unwrap(),
            ("reads".to_string(), Format::Fastq)
        );
    }

    #[test]
    fn test_detect_compressed() {
        assert_eq!(
            detect("/tmp/run/sample.R1.fastq.gz").unwrap(),
            ("sample.R1".to_string(), Format::Fastq)
        );
        assert_eq!(
            detect("genome.v2.fa.gz").unwrap(),
            ("genome.v2".to_string(), Format::Fasta)
        );
    }

    #[test]
    fn test_detect_case_insensitive() {
        assert_eq!(
            detect("CONTIGS.FASTA").unwrap(),
            ("CONTIGS".to_string(), Format::Fasta)
        );
    }

    #[test]
    fn test_detect_unsupported() {
        for name in ["reads.txt", "reads.gz", "fasta", "reads.bam.gz", "reads.fa.bz2"] {
            assert!(
                matches!(detect(name), Err(Error::UnsupportedFormat(_))),
                "{name}"
            );
        }
    }

    #[test]
    fn test_check_path() {
        assert!(Format::Fasta.check_path("a.fa.gz").is_ok());
        assert!(Format::Fastq.check_path("dir/a.FQ").is_ok());
        assert!(matches!(
            Format::Fasta.check_path("a.fastq"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("FASTA".parse::<Format>().unwrap(), Format::Fasta);
        assert_eq!("fq".parse::<Format>().unwrap(), Format::Fastq);
        assert!("bam".parse::<Format>().is_err());
    }
}
