//! PII detection and redaction for mixed document batches.
//!
//! Every file in an input directory is opened through its structural model
//! (paragraphs, slides, shared strings, CSV cells, PDF glyphs, OCR words),
//! its text is run once through an external entity recognizer plus a set of
//! pattern matchers, and the redactions are written back into the native
//! structure. The result is a sanitized copy of each file and one
//! [`FileResult`] per file with counts and severity-tagged findings.
//!
//! # Architecture
//!
//! - [`collaborators`]: entity recognizer, captioner, OCR and summarizer
//!   traits with HTTP and `tesseract` adapters
//! - [`domain`]: categories, spans, counts and pattern matchers
//! - [`detect`]: the detector adapter
//! - [`redaction`]: mapper, engine and one strategy per container family
//! - [`classify`]: findings from redaction evidence
//! - [`batch`]: the parallel file orchestrator
//! - [`error`]: error types
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use pii_redactor::collaborators::{HttpCaptioner, HttpEntityRecognizer, TesseractOcr};
//! use pii_redactor::{BatchRunner, Collaborators, OutputLayout, RedactionContext, RedactionSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let timeout = Duration::from_secs(60);
//! let collaborators = Collaborators::new(
//!     Arc::new(HttpEntityRecognizer::new("http://localhost:8001/ner", timeout)?),
//!     Arc::new(HttpCaptioner::new("http://localhost:8002/caption", timeout)?),
//!     Arc::new(TesseractOcr::new("tesseract")),
//! );
//! collaborators.verify()?;
//!
//! let ctx = RedactionContext::new(
//!     collaborators,
//!     RedactionSettings::default(),
//!     OutputLayout::new("out"),
//! );
//! let report = BatchRunner::new(Arc::new(ctx)).run(Path::new("inbox"))?;
//! println!("{}", serde_json::to_string_pretty(&report.results)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pattern Matching
//!
//! ```
//! use pii_redactor::domain::{PatternMatcher, PhoneNumberMatcher};
//!
//! let matcher = PhoneNumberMatcher::new();
//! let phones = matcher.extract_all("Call (555) 234-5678 or 555-987-6543");
//! assert_eq!(phones.len(), 2);
//! ```

pub mod batch;
pub mod classify;
pub mod collaborators;
pub mod config;
pub mod detect;
pub mod domain;
pub mod error;
pub mod logging;
pub mod redaction;
pub mod report;

pub use batch::{default_workers, process_file, BatchRunner, CancelHandle};
pub use classify::{classify, Severity, VulnerabilityFinding};
pub use collaborators::{
    Captioner, CollaboratorError, Collaborators, EntityMention, EntityRecognizer, FaceDetector,
    OcrEngine, Summarizer,
};
pub use config::RedactionSettings;
pub use detect::{Detection, Detector};
pub use domain::{Category, PatternMatcher, PatternSet, PiiCounts, Span};
pub use error::{RedactorError, RedactorResult};
pub use redaction::{
    FileKind, OutputLayout, RedactionContext, RedactionEngine, RedactionMap, RedactionOutcome,
    RedactionStrategy, PLACEHOLDER,
};
pub use report::{BatchReport, FileResult, FileStatus};
