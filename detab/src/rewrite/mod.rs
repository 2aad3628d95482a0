//! In-place rewriting of the files found by the scanner.
//!
//! A run wires three pieces together:
//!
//! 1. **Scanner** (`crate::scanner`) walks the tree on the calling thread and
//!    emits every file whose name matches the filter.
//! 2. **Pipeline** (`crate::pipeline`) hands each path to exactly one worker over
//!    a zero-capacity channel, so the scanner never runs more than one path ahead
//!    of the slowest free worker.
//! 3. **Processor** (`processor`) reads the file, runs it through the tab
//!    converters, truncates it and writes the result back.
//!
//! ```rust,ignore
//! let summary = detab::convert_tree("src", r"\.(c|h)$", 4)?;
//! println!("{} of {} files changed", summary.files_changed, summary.files_processed);
//! ```
//!
//! Failures on individual files are collected per worker and merged into the
//! returned summary, so one unreadable file never stops the others.
pub mod engine;
pub mod processor;

pub use engine::{convert_tree, execute, run};
pub use processor::{process_file, process_files, FileProcessor, Transform};
