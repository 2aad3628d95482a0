use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use super::processor::FileProcessor;
use crate::config::{PipelineConfig, RunPlan};
use crate::errors::DetabResult;
use crate::metrics::PipelineMetrics;
use crate::pipeline::{produce_sync_consume_async, send};
use crate::results::{RunOutcome, RunSummary};
use crate::scanner::scan_dir;

/// Rewrites every matching file under the configured root.
///
/// The configuration is validated before any thread starts. Per-file failures
/// end up in [`RunSummary::failures`]; a scan failure is returned as the error
/// once the files queued before it have been processed. Use [`execute`] to keep
/// the summary of such a run.
pub fn run(config: &PipelineConfig) -> DetabResult<RunSummary> {
    execute(config)?.into_result()
}

/// Like [`run`], but a scan failure is reported next to the summary of the
/// files handled before it. Only an invalid configuration is an `Err`.
pub fn execute(config: &PipelineConfig) -> DetabResult<RunOutcome> {
    let plan = config.validate()?;
    Ok(execute_plan(&plan, |emit| {
        scan_dir(&plan.root_path, &plan.filter, emit)
    }))
}

/// Runs `produce` on the calling thread against the worker pool; every path it
/// emits is rewritten with the plan's converters.
fn execute_plan<P>(plan: &RunPlan, produce: P) -> RunOutcome
where
    P: FnOnce(&mut dyn FnMut(PathBuf) -> DetabResult<()>) -> DetabResult<()>,
{
    info!(
        "Starting run in {} with filter /{}/, tab width {}, {} workers{}",
        plan.root_path.display(),
        plan.filter,
        plan.converters.tab_width(),
        plan.worker_count,
        if plan.dry_run { " (dry run)" } else { "" }
    );

    let start = Instant::now();
    let metrics = PipelineMetrics::new();
    let processor = FileProcessor::new(&plan.converters)
        .with_metrics(metrics.clone())
        .dry_run(plan.dry_run);

    let output = produce_sync_consume_async(
        plan.worker_count,
        |sender| {
            produce(&mut |path: PathBuf| {
                metrics.record_emitted();
                send(sender, path)
            })
        },
        |receiver| processor.process_files(receiver),
    );

    let mut summary = RunSummary::new();
    summary.dry_run = plan.dry_run;
    for worker_summary in output.consumed {
        summary.merge(worker_summary);
    }
    summary.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    metrics.log_stats();

    let scan_error = match output.produced {
        Ok(()) => {
            info!(
                "Run complete. Processed {} files, changed {}, {} failed",
                summary.files_processed,
                summary.files_changed,
                summary.files_failed()
            );
            None
        }
        Err(err) => {
            warn!(
                "Run aborted after {} files ({} changed, {} failed): {}",
                summary.files_seen(),
                summary.files_changed,
                summary.files_failed(),
                err
            );
            Some(err)
        }
    };

    RunOutcome {
        summary,
        scan_error,
    }
}

/// Rewrites every file under `root` whose name matches `pattern`, using the
/// default worker count
pub fn convert_tree(
    root: impl Into<PathBuf>,
    pattern: &str,
    tab_width: i64,
) -> DetabResult<RunSummary> {
    run(&PipelineConfig::new(root, pattern, tab_width))
}
