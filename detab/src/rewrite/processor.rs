use crossbeam_channel::Receiver;
use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::errors::{DetabError, DetabResult};
use crate::metrics::PipelineMetrics;
use crate::results::{FileResult, RunSummary};
use crate::tabconv::{count_tabs, TabConverters};

/// A text-to-text function applied to the whole content of each file
pub trait Transform {
    fn transform<'t>(&self, text: &'t str) -> Cow<'t, str>;
}

impl Transform for TabConverters {
    fn transform<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.apply(text)
    }
}

impl<F> Transform for F
where
    F: Fn(&str) -> String,
{
    fn transform<'t>(&self, text: &'t str) -> Cow<'t, str> {
        Cow::Owned(self(text))
    }
}

/// Reads, transforms and rewrites files in place
#[derive(Debug)]
pub struct FileProcessor<'a, T: ?Sized> {
    transform: &'a T,
    metrics: PipelineMetrics,
    dry_run: bool,
}

impl<'a, T: Transform + ?Sized> FileProcessor<'a, T> {
    /// Creates a new FileProcessor around the given transform
    pub fn new(transform: &'a T) -> Self {
        Self {
            transform,
            metrics: PipelineMetrics::new(),
            dry_run: false,
        }
    }

    /// Shares the given counters instead of private ones
    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Computes the transform without writing anything back
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Gets the counters this processor reports to
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Runs one file through read, transform, truncate, write.
    ///
    /// The file is only truncated once the new content has been fully computed,
    /// so a read or decode failure leaves it untouched.
    pub fn process_file(&self, path: &Path) -> DetabResult<FileResult> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(!self.dry_run)
            .open(path)
            .map_err(|e| DetabError::file_io(path, e))?;

        let bytes = read_contents(&mut file, path)?;
        let bytes_read = bytes.len() as u64;
        let contents = String::from_utf8(bytes).map_err(|e| DetabError::encoding(path, e))?;

        let transformed = self.transform.transform(&contents);
        let changed = transformed != contents.as_str();
        let tabs_replaced = count_tabs(&contents).saturating_sub(count_tabs(&transformed));

        let bytes_written = if self.dry_run {
            trace!("Dry run, leaving {} untouched", path.display());
            0
        } else {
            write_contents(&mut file, path, transformed.as_bytes())?;
            transformed.len() as u64
        };

        self.metrics.record_rewrite(bytes_read, bytes_written);
        debug!(
            "Processed {} ({} tabs replaced, changed: {})",
            path.display(),
            tabs_replaced,
            changed
        );

        Ok(FileResult {
            path: path.to_path_buf(),
            bytes_read,
            bytes_written,
            tabs_replaced,
            changed,
        })
    }

    /// Processes paths from `receiver` until the channel is closed and drained.
    ///
    /// A failing file is recorded in the returned summary and does not stop
    /// the loop.
    pub fn process_files(&self, receiver: &Receiver<PathBuf>) -> RunSummary {
        let mut summary = RunSummary::new();
        summary.dry_run = self.dry_run;

        for path in receiver.iter() {
            self.metrics.record_received();
            match self.process_file(&path) {
                Ok(result) => summary.add_file_result(result),
                Err(err) => {
                    warn!("Failed to process {}: {}", path.display(), err);
                    self.metrics.record_failure();
                    summary.add_failure(&path, &err);
                }
            }
        }

        summary
    }
}

/// Runs a single file through `transform` and writes the result back
pub fn process_file<T: Transform + ?Sized>(path: &Path, transform: &T) -> DetabResult<FileResult> {
    FileProcessor::new(transform).process_file(path)
}

/// Drains `receiver`, processing every path with `transform`
pub fn process_files<T: Transform + ?Sized>(
    receiver: &Receiver<PathBuf>,
    transform: &T,
) -> RunSummary {
    FileProcessor::new(transform).process_files(receiver)
}

/// Reads the open file from its current position to the end
fn read_contents(file: &mut File, path: &Path) -> DetabResult<Vec<u8>> {
    let capacity = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
    let mut bytes = Vec::with_capacity(capacity);
    file.read_to_end(&mut bytes)
        .map_err(|e| DetabError::file_io(path, e))?;
    Ok(bytes)
}

/// Replaces the whole content of the open file
fn write_contents(file: &mut File, path: &Path, contents: &[u8]) -> DetabResult<()> {
    file.set_len(0).map_err(|e| DetabError::file_io(path, e))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| DetabError::file_io(path, e))?;
    file.write_all(contents)
        .map_err(|e| DetabError::file_io(path, e))?;
    file.flush().map_err(|e| DetabError::file_io(path, e))
}
