use std::path::Path;

/// Outcome of processing a single file.
pub type FileResult<T> = std::result::Result<T, crate::Error>;

/// Trait implemented for a type that processes whole files on worker threads.
///
/// Each worker owns a clone of the processor, so implementations should keep
/// any per-file state local and return everything they produce.
pub trait FileProcessor: Send + Clone {
    type Output: Send;

    /// Called once per input file with its position in the input list.
    fn process_file(&mut self, index: usize, path: &Path) -> FileResult<Self::Output>;

    /// Sets the thread id for the processor
    #[allow(unused_variables)]
    fn set_thread_id(&mut self, thread_id: usize) {
        // Default implementation does nothing
    }
}
