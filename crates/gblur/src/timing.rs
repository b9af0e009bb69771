use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

/// A text file collecting one elapsed time per run.
///
/// The file lives in a chosen directory and is named after the input image and the
/// kernel size, `<input stem>_k<kernel size>.txt`, so repeated runs of the same
/// configuration accumulate in the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingLog {
    path: PathBuf,
}

impl TimingLog {
    /// Create the log handle. Nothing is written until [`TimingLog::append`].
    pub fn new(dir: impl AsRef<Path>, input_path: impl AsRef<Path>, kernel_size: usize) -> Self {
        let stem = input_path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Self {
            path: dir.as_ref().join(format!("{stem}_k{kernel_size}.txt")),
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the elapsed time in seconds as one line, creating the file if needed.
    pub fn append(&self, elapsed: Duration) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{:.6}", elapsed.as_secs_f64())
    }
}
