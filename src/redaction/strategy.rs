//! Redaction strategy trait and supporting types.
//!
//! Each container family implements [`RedactionStrategy`]; the ones built on
//! a fragment tree go through [`StructuredDocument`] and the shared
//! [`StructuredStrategy`] driver.

use std::marker::PhantomData;
use std::path::Path;

use tracing::debug;

use super::mapper::RedactionMap;
use super::output;
use super::RedactionContext;
use crate::classify::VulnerabilityFinding;
use crate::domain::PiiCounts;
use crate::error::RedactorResult;

/// Evidence and statistics produced by redacting one document.
#[derive(Debug, Clone, Default)]
pub struct RedactionOutcome {
    pub counts: PiiCounts,

    /// Recognizer failures, one entry per failed call
    pub detector_failures: Vec<String>,

    /// Caption, OCR and face detection failures
    pub collaborator_failures: Vec<String>,

    /// Image regions redacted: OCR words painted over and faces blurred
    pub ocr_redactions: usize,

    /// Structural locations (paragraphs, cells, glyph hits) rewritten
    pub fragments_rewritten: usize,

    /// Pages processed / modified (paginated formats only)
    pub pages_processed: usize,
    pub pages_modified: usize,

    /// Human-readable description of the document (e.g. image caption)
    pub description: Option<String>,

    /// Redacted text, used for summaries
    pub text: String,

    /// Format-specific findings added to the classifier's output
    pub findings: Vec<VulnerabilityFinding>,
}

impl RedactionOutcome {
    /// Creates an outcome indicating nothing was redacted.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Strategy for redacting one container family.
pub trait RedactionStrategy: Send + Sync {
    /// Redacts `input` into `output`.
    ///
    /// An `Err` means the document could not be opened, parsed or saved; the
    /// caller then falls back to a verbatim copy.
    fn redact(
        &self,
        ctx: &RedactionContext,
        input: &Path,
        output: &Path,
    ) -> RedactorResult<RedactionOutcome>;

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;
}

/// A document modelled as an ordered list of text fragments.
pub trait StructuredDocument: Sized {
    /// Format label used in errors and descriptions.
    const FORMAT: &'static str;

    fn open(path: &Path) -> RedactorResult<Self>;

    /// Fragment contents in document order.
    fn fragments(&self) -> Vec<String>;

    /// Overwrites every fragment whose mapped content differs.
    ///
    /// Returns the number of fragments rewritten.
    fn rebuild(&mut self, map: &RedactionMap) -> RedactorResult<usize>;

    fn save(&self, path: &Path) -> RedactorResult<()>;
}

/// Join, detect once, split, map, rebuild, save.
pub struct StructuredStrategy<D> {
    name: &'static str,
    _document: PhantomData<fn() -> D>,
}

impl<D: StructuredDocument> StructuredStrategy<D> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            _document: PhantomData,
        }
    }
}

impl<D: StructuredDocument> RedactionStrategy for StructuredStrategy<D> {
    fn redact(
        &self,
        ctx: &RedactionContext,
        input: &Path,
        output: &Path,
    ) -> RedactorResult<RedactionOutcome> {
        let mut document = D::open(input)?;
        let fragments = document.fragments();

        let result = ctx.engine.redact_fragments(&fragments);
        let rewritten = if result.map.changed() > 0 {
            document.rebuild(&result.map)?
        } else {
            0
        };

        if rewritten > 0 {
            output::write_atomically(output, |tmp| document.save(tmp))?;
        } else {
            output::copy_verbatim(input, output)?;
        }
        debug!(
            format = D::FORMAT,
            fragments = fragments.len(),
            rewritten,
            "structured document redacted"
        );

        Ok(RedactionOutcome {
            counts: result.counts,
            detector_failures: result.detector_failures,
            fragments_rewritten: rewritten,
            description: Some(format!(
                "{} document with {} text fragment(s)",
                D::FORMAT,
                fragments.len()
            )),
            text: result.redacted.join("\n"),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        self.name
    }
}
