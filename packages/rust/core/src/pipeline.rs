//! End-to-end run: sources → drafts → reconcile → report.
//!
//! Sources run one at a time, in the order given, and each source's drafts
//! are reconciled in the order the source produced them. Page failures never
//! reach this level; a storage failure aborts the run.

use std::time::Instant;

use tracing::{info, instrument};

use releasewatch_shared::Result;
use releasewatch_sources::UpdateSource;

use crate::reconcile::{Reconciler, UpdateStore};
use crate::report::{RunReport, ToolReport};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a source starts fetching.
    fn source_started(&self, key: &str, tool: &str, index: usize, total: usize);
    /// Called once a source has returned its drafts.
    fn drafts_fetched(&self, key: &str, count: usize);
    /// Called after each draft is reconciled.
    fn draft_reconciled(&self, current: usize, total: usize);
    /// Called when a source's drafts are all reconciled.
    fn source_finished(&self, report: &ToolReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn source_started(&self, _key: &str, _tool: &str, _index: usize, _total: usize) {}
    fn drafts_fetched(&self, _key: &str, _count: usize) {}
    fn draft_reconciled(&self, _current: usize, _total: usize) {}
    fn source_finished(&self, _report: &ToolReport) {}
}

/// Run every source once and reconcile its drafts against `store`.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn run_sources(
    sources: &[&dyn UpdateSource],
    store: &dyn UpdateStore,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let reconciler = Reconciler::new(store);
    let mut run = RunReport::default();

    for (i, source) in sources.iter().enumerate() {
        progress.source_started(source.key(), source.tool_name(), i + 1, sources.len());
        let report = run_source(*source, &reconciler, progress).await?;
        progress.source_finished(&report);
        run.tools.push(report);
    }

    let totals = run.totals();
    info!(
        new = totals.new,
        updated = totals.updated,
        unchanged = totals.unchanged,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "run complete"
    );
    Ok(run)
}

/// Fetch one source and reconcile each of its drafts.
#[instrument(skip_all, fields(source = source.key(), tool = source.tool_name()))]
pub async fn run_source(
    source: &dyn UpdateSource,
    reconciler: &Reconciler<'_>,
    progress: &dyn ProgressReporter,
) -> Result<ToolReport> {
    let drafts = source.fetch_updates().await;
    progress.drafts_fetched(source.key(), drafts.len());

    let mut report = ToolReport::new(source.key(), source.tool_name());
    for (i, draft) in drafts.iter().enumerate() {
        let outcome = reconciler.reconcile(source.tool_name(), draft).await?;
        report.record(draft, outcome);
        progress.draft_reconciled(i + 1, drafts.len());
    }

    info!(
        drafts = drafts.len(),
        new = report.counts.new,
        updated = report.counts.updated,
        unchanged = report.counts.unchanged,
        "source reconciled"
    );
    Ok(report)
}
