use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a snapshot build. Everything else the sampler meets
/// (vanished processes, unreadable files, missing collaborators) degrades to a
/// sentinel value instead.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("stat for pid {requested} reported pid {parsed}")]
    PidMismatch { requested: u32, parsed: u32 },
    #[error("process {pid} has parent {ppid}, which is not in the snapshot")]
    OrphanedProcess { pid: u32, ppid: u32 },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SampleResult<T> = Result<T, SampleError>;
