mod error;
mod pool;
mod processor;

pub use error::{ProcessError, Result};
pub use pool::process_files;
pub use processor::{FileProcessor, FileResult};
