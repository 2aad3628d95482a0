pub mod config;
pub mod errors;
pub mod metrics;
pub mod pipeline;
pub mod results;
pub mod rewrite;
pub mod scanner;
pub mod tabconv;

pub use config::{ConfigOverrides, PipelineConfig};
pub use errors::{DetabError, DetabResult};
pub use results::{FailureKind, FileFailure, FileResult, RunOutcome, RunSummary};
pub use rewrite::{convert_tree, execute, run};
pub use tabconv::{convert_tabs, TabConverters, MAX_TAB_WIDTH};
