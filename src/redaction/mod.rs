//! Redaction strategies and the shared context they run in.
//!
//! A [`RedactionContext`] is built once per batch and shared read-only by
//! every worker: it owns the redaction engine, the collaborator handles, the
//! settings and the output layout.

pub mod engine;
pub mod formats;
pub mod kind;
pub mod mapper;
pub mod output;
pub mod strategy;

pub use engine::{FragmentRedaction, RedactionEngine, TextRedaction};
pub use kind::FileKind;
pub use mapper::{RedactionMap, FRAGMENT_DELIMITER, PLACEHOLDER};
pub use output::OutputLayout;
pub use strategy::{RedactionOutcome, RedactionStrategy, StructuredDocument, StructuredStrategy};

use crate::collaborators::Collaborators;
use crate::config::RedactionSettings;
use crate::detect::Detector;

/// Everything a strategy needs to redact one file.
#[derive(Debug)]
pub struct RedactionContext {
    pub engine: RedactionEngine,
    pub collaborators: Collaborators,
    pub settings: RedactionSettings,
    pub layout: OutputLayout,
}

impl RedactionContext {
    pub fn new(
        collaborators: Collaborators,
        settings: RedactionSettings,
        layout: OutputLayout,
    ) -> Self {
        let detector = Detector::new(
            collaborators.recognizer.clone(),
            settings.entity_categories.clone(),
        );
        Self {
            engine: RedactionEngine::new(detector),
            collaborators,
            settings,
            layout,
        }
    }
}
