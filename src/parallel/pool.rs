use std::path::PathBuf;
use std::thread;

use log::debug;
use parking_lot::Mutex;

use super::error::{ProcessError, Result};
use super::processor::{FileProcessor, FileResult};

fn process_sequential<T: FileProcessor>(
    paths: &[PathBuf],
    processor: &T,
) -> Vec<FileResult<T::Output>> {
    let mut worker = processor.clone();
    worker.set_thread_id(0);
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| worker.process_file(index, path))
        .collect()
}

/// Run `processor` over every path using up to `num_threads` worker threads.
///
/// Files are handed out through a shared job queue, and each worker runs on
/// its own clone of the processor. The per-file outcomes are returned in
/// input order; a failing file does not stop the others.
pub fn process_files<T: FileProcessor>(
    paths: &[PathBuf],
    processor: &T,
    num_threads: usize,
) -> Result<Vec<FileResult<T::Output>>> {
    if num_threads == 0 {
        return Err(ProcessError::InvalidThreadCount);
    }
    if num_threads == 1 || paths.len() <= 1 {
        return Ok(process_sequential(paths, processor));
    }

    let num_threads = num_threads.min(paths.len());
    debug!("num threads: {num_threads}");

    let (tx, rx) = crossbeam_channel::unbounded();
    for index in 0..paths.len() {
        tx.send(index)?;
    }
    drop(tx);

    let slots: Mutex<Vec<Option<FileResult<T::Output>>>> =
        Mutex::new((0..paths.len()).map(|_| None).collect());

    thread::scope(|scope| -> Result<()> {
        let slots = &slots;

        // Spawn worker threads
        let mut handles = Vec::new();
        for thread_id in 0..num_threads {
            let mut worker = processor.clone();
            let rx = rx.clone();

            let handle = scope.spawn(move || {
                worker.set_thread_id(thread_id);
                for index in rx.iter() {
                    let outcome = worker.process_file(index, &paths[index]);
                    slots.lock()[index] = Some(outcome);
                }
            });

            handles.push(handle);
        }

        // Wait for worker threads
        for handle in handles {
            if handle.join().is_err() {
                return Err(ProcessError::JoinError);
            }
        }

        Ok(())
    })?;

    slots
        .into_inner()
        .into_iter()
        .map(|slot| slot.ok_or(ProcessError::JoinError))
        .collect()
}
