#![doc = include_str!("../README.md")]

pub mod driver;
pub mod error;
pub mod fasta;
pub mod fastq;
pub mod fastx;
pub mod format;
pub mod lines;
pub mod manifest;
pub mod parallel;
pub mod prelude;
pub mod record;
pub mod split;
pub mod stats;

pub use error::Error;
pub use record::Record;
