//! Pipeline orchestration.
//!
//! Extraction runs through these states:
//! - Idle: nothing attempted yet
//! - Chunking: documents merged and split
//! - Extracting(i/N): chunk `i` of `N` being extracted
//! - Consolidating: partials merged into one PRD
//! - Done: PRD produced
//! - Failed: probe failed or the run was aborted
//!
//! Estimation groups the roster by role, generates each role's tasks and
//! submits them to a sink in small concurrent batches.

use std::fmt;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, debug_span, info, info_span, warn};

use crate::chunk::{chunk, DEFAULT_MAX_CHUNK_SIZE};
use crate::config::DEFAULT_PROJECT_NAME;
use crate::consolidate::{ConsolidatedPrd, ConsolidationStats, Consolidator};
use crate::corpus::{MergedCorpus, RawDocument};
use crate::engine::{Engine, EngineError};
use crate::error::{PipelineError, Result};
use crate::estimate::{EstimationEngine, EstimatorSettings, Role, RoleTask};
use crate::extract::{ChunkExtractor, ExtractionSource, ExtractorSettings, PartialExtraction};
use crate::roster::{group_by_role, PersonEntry};
use crate::shutdown::ShutdownSignal;
use crate::sink::{SinkError, WorkItem, WorkItemSink};

/// Granularity of the abort check while pacing.
const PACING_SLICE: Duration = Duration::from_millis(50);

/// Extraction pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Chunking,
    /// 1-based chunk position and chunk count.
    Extracting { index: usize, total: usize },
    Consolidating,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Chunking => write!(f, "chunking"),
            PipelineState::Extracting { index, total } => write!(f, "extracting({}/{})", index, total),
            PipelineState::Consolidating => write!(f, "consolidating"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed => write!(f, "failed"),
        }
    }
}

impl PipelineState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (*self, next) {
            (Done, _) | (Failed, _) => false,
            (_, Failed) => true,
            (Idle, Chunking) => true,
            (Chunking, Extracting { index: 1, .. }) => true,
            (Chunking, Consolidating) => true,
            (Extracting { index, total }, Extracting { index: next, total: next_total }) => {
                next == index + 1 && next_total == total && next <= total
            }
            (Extracting { .. }, Consolidating) => true,
            (Consolidating, Done) => true,
            _ => false,
        }
    }

    /// Check if the state is terminal.
    pub fn is_finished(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

/// One recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Validates and records transitions, notifying an optional observer.
struct StateMachine<'o> {
    state: PipelineState,
    transitions: Vec<Transition>,
    observer: Option<&'o dyn Fn(&Transition)>,
}

impl<'o> StateMachine<'o> {
    fn new(observer: Option<&'o dyn Fn(&Transition)>) -> Self {
        Self {
            state: PipelineState::Idle,
            transitions: Vec::new(),
            observer,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        if !self.state.can_transition_to(next) {
            debug!(from = %self.state, to = %next, "ignoring invalid transition");
            return;
        }
        let transition = Transition {
            from: self.state,
            to: next,
        };
        debug!(from = %transition.from, to = %transition.to, "pipeline transition");
        self.state = next;
        if let Some(observer) = self.observer {
            observer(&transition);
        }
        self.transitions.push(transition);
    }
}

/// Settings for [`run_extraction_pipeline`].
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub max_chunk_size: usize,
    pub min_content_chars: usize,
    /// Pause between successive engine calls.
    pub inter_call_delay: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub project_name: String,
    pub normalized_dedup: bool,
    pub prompts_dir: Option<PathBuf>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            min_content_chars: 50,
            inter_call_delay: Duration::from_millis(2000),
            temperature: 0.3,
            max_tokens: 2000,
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            normalized_dedup: false,
            prompts_dir: None,
        }
    }
}

/// Counters for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub chunks_total: usize,
    pub generated: usize,
    pub fallback: usize,
    pub minimal: usize,
    /// Fallbacks caused by engine failure or timeout.
    pub engine_failures: usize,
    pub valid_partials: usize,
    pub elapsed: Duration,
}

impl ExtractionStats {
    fn record(&mut self, partial: &PartialExtraction) {
        match partial.source {
            ExtractionSource::Generated => self.generated += 1,
            ExtractionSource::Fallback => {
                self.fallback += 1;
                if partial.fallback_reason.is_some_and(|r| r.is_engine_failure()) {
                    self.engine_failures += 1;
                }
            }
            ExtractionSource::MinimalContent => self.minimal += 1,
        }
    }
}

/// Everything an extraction run produced.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub prd: ConsolidatedPrd,
    pub corpus_label: String,
    pub partials: Vec<PartialExtraction>,
    pub stats: ExtractionStats,
    pub consolidation: ConsolidationStats,
    pub transitions: Vec<Transition>,
}

/// Sleep for `delay` in short slices, returning false if shutdown was requested.
fn pace(delay: Duration, signal: &ShutdownSignal) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if signal.is_shutdown() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(PACING_SLICE.min(deadline - now));
    }
}

fn unavailable_reason(err: EngineError) -> String {
    match err {
        EngineError::Unavailable(reason) => reason,
    }
}

/// Run documents through chunking, extraction and consolidation.
pub fn run_extraction_pipeline(
    engine: &dyn Engine,
    documents: &[RawDocument],
    options: &ExtractionOptions,
    signal: &ShutdownSignal,
) -> Result<ExtractionOutcome> {
    run_extraction(engine, documents, options, signal, None)
}

/// Like [`run_extraction_pipeline`], calling `observer` on every transition.
pub fn run_extraction_pipeline_observed(
    engine: &dyn Engine,
    documents: &[RawDocument],
    options: &ExtractionOptions,
    signal: &ShutdownSignal,
    observer: &dyn Fn(&Transition),
) -> Result<ExtractionOutcome> {
    run_extraction(engine, documents, options, signal, Some(observer))
}

fn run_extraction(
    engine: &dyn Engine,
    documents: &[RawDocument],
    options: &ExtractionOptions,
    signal: &ShutdownSignal,
    observer: Option<&dyn Fn(&Transition)>,
) -> Result<ExtractionOutcome> {
    if documents.is_empty() {
        return Err(PipelineError::NoDocuments);
    }
    if documents.iter().all(RawDocument::is_blank) {
        return Err(PipelineError::EmptyDocuments(documents.len()));
    }

    let span = info_span!("reqforge.extract", documents = documents.len());
    let _enter = span.enter();
    let started = Instant::now();
    let mut machine = StateMachine::new(observer);

    if let Err(e) = engine.probe() {
        machine.advance(PipelineState::Failed);
        return Err(PipelineError::GenerationUnavailable(unavailable_reason(e)));
    }

    machine.advance(PipelineState::Chunking);
    let corpus = MergedCorpus::build(documents);
    let label = corpus.label();
    let chunks = chunk(&corpus.text, options.max_chunk_size);
    let total = chunks.len();
    info!(
        corpus = %label,
        chars = corpus.text.chars().count(),
        chunks = total,
        "corpus chunked"
    );

    let extractor = ChunkExtractor::new(
        engine,
        ExtractorSettings {
            min_content_chars: options.min_content_chars,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            prompts_dir: options.prompts_dir.clone(),
        },
    )?;

    let mut stats = ExtractionStats {
        chunks_total: total,
        ..Default::default()
    };
    let mut partials = Vec::with_capacity(total);
    let mut called = false;

    for (i, piece) in chunks.iter().enumerate() {
        let position = i + 1;
        if signal.is_shutdown() {
            machine.advance(PipelineState::Failed);
            warn!(completed = i, total, "extraction aborted");
            return Err(PipelineError::Aborted { completed: i, total });
        }
        machine.advance(PipelineState::Extracting {
            index: position,
            total,
        });

        let makes_call = !extractor.is_minimal(piece);
        if makes_call && called && !pace(options.inter_call_delay, signal) {
            machine.advance(PipelineState::Failed);
            warn!(completed = i, total, "extraction aborted while pacing");
            return Err(PipelineError::Aborted { completed: i, total });
        }

        let partial = {
            let _chunk = debug_span!("reqforge.chunk", position, total, chars = piece.char_len()).entered();
            extractor.extract(piece, position, total, &label)
        };
        called |= makes_call;
        debug!(
            position,
            total,
            features = partial.features.len(),
            objectives = partial.objectives.len(),
            stories = partial.user_stories.len(),
            "chunk extracted"
        );
        stats.record(&partial);
        partials.push(partial);
    }

    machine.advance(PipelineState::Consolidating);
    let consolidator = Consolidator::new()
        .with_project_name(options.project_name.clone())
        .with_normalized_dedup(options.normalized_dedup);
    let (prd, consolidation) =
        consolidator.consolidate_with_stats(&partials, &label, Local::now().date_naive());
    stats.valid_partials = consolidation.valid_partials;
    stats.elapsed = started.elapsed();
    machine.advance(PipelineState::Done);

    info!(
        generated = stats.generated,
        fallback = stats.fallback,
        minimal = stats.minimal,
        valid = stats.valid_partials,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "extraction complete"
    );

    Ok(ExtractionOutcome {
        prd,
        corpus_label: label,
        partials,
        stats,
        consolidation,
        transitions: machine.transitions,
    })
}

/// Settings for [`run_estimation_pipeline`].
#[derive(Debug, Clone)]
pub struct EstimationOptions {
    /// Upper bound on submissions in flight at once.
    pub max_concurrent_submissions: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub prompts_dir: Option<PathBuf>,
    /// Specification summary passed to the engine.
    pub context: Option<String>,
}

impl Default for EstimationOptions {
    fn default() -> Self {
        Self {
            max_concurrent_submissions: 2,
            temperature: 0.3,
            max_tokens: 2000,
            prompts_dir: None,
            context: None,
        }
    }
}

/// A task the sink accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedItem {
    pub role: Role,
    pub title: String,
    pub estimated_hours: u32,
    pub assigned_to: String,
    pub sink_id: String,
}

/// A task the sink rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedSubmission {
    pub role: Role,
    pub title: String,
    pub assigned_to: String,
    pub error: String,
}

/// Totals for one estimation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EstimationCounts {
    pub roles: usize,
    /// Roles whose tasks were all submitted.
    pub roles_completed: usize,
    pub generated: usize,
    pub created: usize,
    pub failed: usize,
}

/// Result of an estimation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EstimationReport {
    pub created: Vec<CreatedItem>,
    pub failed: Vec<FailedSubmission>,
    pub counts: EstimationCounts,
    /// Shutdown stopped the run before every role was submitted.
    pub aborted: bool,
}

impl EstimationReport {
    fn finish(mut self, aborted: bool) -> Self {
        self.aborted = aborted;
        self.counts.created = self.created.len();
        self.counts.failed = self.failed.len();
        self
    }
}

fn submit_batch(sink: &dyn WorkItemSink, batch: &[RoleTask], report: &mut EstimationReport) {
    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = batch
            .iter()
            .map(|task| s.spawn(move || sink.submit(&WorkItem::from(task))))
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(SinkError::Rejected("submission panicked".into())))
            })
            .collect()
    });

    for (task, result) in batch.iter().zip(results) {
        match result {
            Ok(sink_id) => {
                debug!(role = %task.role, title = %task.title, id = %sink_id, "task submitted");
                report.created.push(CreatedItem {
                    role: task.role,
                    title: task.title.clone(),
                    estimated_hours: task.estimated_hours,
                    assigned_to: task.assigned_to.clone(),
                    sink_id,
                });
            }
            Err(e) => {
                warn!(role = %task.role, title = %task.title, error = %e, "task submission failed");
                report.failed.push(FailedSubmission {
                    role: task.role,
                    title: task.title.clone(),
                    assigned_to: task.assigned_to.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Generate tasks for every role on the roster and submit them to `sink`.
///
/// Roles are processed in fixed order. Each role's tasks are submitted in
/// batches of at most `max_concurrent_submissions`; a failed submission is
/// reported and never retried. A shutdown stops scheduling new batches and
/// returns the report so far with `aborted` set, since submitted items are
/// already stored by the sink.
pub fn run_estimation_pipeline(
    engine: &dyn Engine,
    sink: &dyn WorkItemSink,
    corpus_label: &str,
    personnel: &[PersonEntry],
    options: &EstimationOptions,
    signal: &ShutdownSignal,
) -> Result<EstimationReport> {
    let groups = group_by_role(personnel);
    if groups.is_empty() {
        return Err(PipelineError::EmptyRoster);
    }

    let span = info_span!("reqforge.estimate", roles = groups.len());
    let _enter = span.enter();

    let estimator = EstimationEngine::new(
        engine,
        EstimatorSettings {
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            prompts_dir: options.prompts_dir.clone(),
            context: options.context.clone(),
        },
    )?;
    let batch_size = options.max_concurrent_submissions.max(1);
    let total = groups.len();
    let mut report = EstimationReport::default();
    report.counts.roles = total;

    for (role, emails) in &groups {
        if signal.is_shutdown() {
            return Ok(abort_report(report));
        }

        let tasks = estimator.generate_role_tasks(*role, emails, corpus_label);
        info!(role = %role, people = emails.len(), tasks = tasks.len(), "role tasks generated");
        report.counts.generated += tasks.len();

        for batch in tasks.chunks(batch_size) {
            if signal.is_shutdown() {
                return Ok(abort_report(report));
            }
            submit_batch(sink, batch, &mut report);
        }
        report.counts.roles_completed += 1;
    }

    let report = report.finish(false);
    info!(
        created = report.counts.created,
        failed = report.counts.failed,
        "estimation complete"
    );
    Ok(report)
}

fn abort_report(report: EstimationReport) -> EstimationReport {
    let report = report.finish(true);
    warn!(
        completed = report.counts.roles_completed,
        total = report.counts.roles,
        created = report.counts.created,
        "estimation aborted"
    );
    report
}
