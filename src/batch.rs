//! Parallel batch orchestration.
//!
//! Files are dispatched one task each onto a bounded rayon pool; results come
//! back over a channel in completion order. Dispatch happens on the calling
//! thread and never runs ahead of free workers, so cancelling stops new work
//! immediately while in-flight files drain.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::classify::{classify, VulnerabilityFinding};
use crate::error::{RedactorError, RedactorResult};
use crate::redaction::{output, FileKind, RedactionContext};
use crate::report::{BatchReport, FileResult, FileStatus};

/// Upper bound on the default pool size.
pub const MAX_DEFAULT_WORKERS: usize = 8;

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_DEFAULT_WORKERS)
}

/// Stops a running batch from dispatching further files.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BatchRunner {
    ctx: Arc<RedactionContext>,
    workers: usize,
    cancel: CancelHandle,
}

impl BatchRunner {
    pub fn new(ctx: Arc<RedactionContext>) -> Self {
        Self {
            ctx,
            workers: default_workers(),
            cancel: CancelHandle::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Regular files directly inside `dir`, sorted by name.
    pub fn enumerate(dir: &Path) -> RedactorResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(RedactorError::InvalidInput {
                parameter: "input_dir".to_string(),
                reason: format!("'{}' is not a directory", dir.display()),
            });
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| RedactorError::io(dir, e))? {
            let entry = entry.map_err(|e| RedactorError::io(dir, e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Processes every file in `input_dir`.
    ///
    /// Only setup problems (missing directory, unwritable output, pool
    /// creation) are errors; per-file failures become error results.
    pub fn run(&self, input_dir: &Path) -> RedactorResult<BatchReport> {
        let files = Self::enumerate(input_dir)?;
        self.ctx.layout.prepare()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("redactor-worker-{}", i))
            .build()
            .map_err(|e| RedactorError::BackendError {
                backend: "rayon".to_string(),
                message: "Failed to build worker pool".to_string(),
                source: Some(Box::new(e)),
            })?;

        info!(
            files = files.len(),
            workers = self.workers,
            input = %input_dir.display(),
            "batch started"
        );

        let total = files.len();
        let (tx, rx) = crossbeam_channel::unbounded::<FileResult>();
        let mut pending = files.into_iter();
        let mut in_flight = 0usize;
        let mut report = BatchReport::default();

        loop {
            while in_flight < self.workers && !self.cancel.is_cancelled() {
                let Some(path) = pending.next() else {
                    break;
                };
                let ctx = Arc::clone(&self.ctx);
                let tx = tx.clone();
                pool.spawn(move || {
                    let result = process_file(&ctx, &path);
                    let _ = tx.send(result);
                });
                in_flight += 1;
            }

            if in_flight == 0 {
                break;
            }
            match rx.recv() {
                Ok(result) => {
                    in_flight -= 1;
                    debug!(
                        file = %result.original_file_name,
                        done = report.results.len() + 1,
                        total,
                        "file finished"
                    );
                    report.results.push(result);
                }
                Err(_) => break,
            }
        }

        report.skipped = pending.map(|p| file_name(&p)).collect();
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "batch cancelled; remaining files skipped");
        }
        info!(
            processed = report.results.len(),
            errors = report.errors(),
            "batch finished"
        );
        Ok(report)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Redacts one file and never fails: errors and panics become an error
/// result backed by a verbatim copy of the input.
pub fn process_file(ctx: &RedactionContext, path: &Path) -> FileResult {
    let name = file_name(path);
    let kind = FileKind::from_path(path);
    let output_path = ctx.layout.cleansed_path(kind, &name);
    debug!(file = %name, ?kind, "processing");

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        redact_file(ctx, path, &name, kind, &output_path)
    }));
    let failure = match attempt {
        Ok(Ok(result)) => return result,
        Ok(Err(e)) => e.to_string(),
        Err(payload) => format!("Unexpected failure: {}", panic_message(payload.as_ref())),
    };
    warn!(file = %name, error = %failure, "redaction failed; copying original");

    let cleansed = match output::copy_verbatim(path, &output_path) {
        Ok(()) => Some(output_path.display().to_string()),
        Err(e) => {
            warn!(file = %name, error = %e, "fallback copy failed");
            None
        }
    };

    FileResult {
        original_file_name: name,
        file_type: FileKind::label(path),
        status: FileStatus::Error,
        summary: kind.description().to_string(),
        pii_detected: Default::default(),
        vulnerabilities: vec![VulnerabilityFinding::high(format!(
            "Processing failed: {}",
            failure
        ))],
        cleansed_file_path: cleansed,
    }
}

fn redact_file(
    ctx: &RedactionContext,
    path: &Path,
    name: &str,
    kind: FileKind,
    output_path: &Path,
) -> RedactorResult<FileResult> {
    let strategy = kind.strategy();
    let mut outcome = strategy.redact(ctx, path, output_path)?;
    let label = FileKind::label(path);

    let mut summary = outcome
        .description
        .clone()
        .unwrap_or_else(|| kind.description().to_string());

    if let Some(summarizer) = ctx.collaborators.summarizer.as_ref() {
        if kind.is_supported() && !outcome.text.trim().is_empty() {
            let prefix: String = outcome
                .text
                .chars()
                .take(ctx.settings.summary_prefix_chars)
                .collect();
            match summarizer.assess(&prefix, &label) {
                Ok(assessment) => {
                    if !assessment.file_description.trim().is_empty() {
                        summary = assessment.file_description;
                    }
                    if !assessment.vulnerability_analysis.trim().is_empty() {
                        outcome
                            .findings
                            .push(VulnerabilityFinding::info(assessment.vulnerability_analysis));
                    }
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "risk assessment failed");
                    outcome
                        .collaborator_failures
                        .push(format!("Risk assessment could not be produced: {}", e));
                }
            }
        }
    }

    let vulnerabilities = classify(&outcome);
    info!(
        file = %name,
        strategy = strategy.name(),
        pii = outcome.counts.total(),
        findings = vulnerabilities.len(),
        "file redacted"
    );

    Ok(FileResult {
        original_file_name: name.to_string(),
        file_type: label,
        status: FileStatus::Completed,
        summary,
        pii_detected: outcome.counts,
        vulnerabilities,
        cleansed_file_path: Some(output_path.display().to_string()),
    })
}
