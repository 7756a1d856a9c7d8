//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - Fake collaborators (recognizer, captioner, OCR, summarizer)
//! - Fixture builders for every supported container
//! - Custom assertions

#![allow(dead_code)]

pub mod assertions;
pub mod fakes;
pub mod fixtures;

pub use assertions::*;
pub use fakes::*;
pub use fixtures::*;

use std::path::Path;
use std::sync::Arc;

use pii_redactor::{
    Collaborators, EntityRecognizer, OcrEngine, OutputLayout, RedactionContext, RedactionSettings,
};

/// Names the dictionary recognizer knows by default.
pub const KNOWN_PEOPLE: &[&str] = &["Jane Doe", "Alice Smith", "Bob"];

/// Context with a dictionary recognizer, a fixed caption and no OCR words.
pub fn test_context(out_dir: &Path) -> RedactionContext {
    context_with(
        out_dir,
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(ScriptedOcr::new(Vec::new())),
    )
}

/// Context with the given recognizer and OCR engine.
pub fn context_with(
    out_dir: &Path,
    recognizer: Arc<dyn EntityRecognizer>,
    ocr: Arc<dyn OcrEngine>,
) -> RedactionContext {
    let collaborators = Collaborators::new(
        recognizer,
        Arc::new(FixedCaptioner::new("a scanned form")),
        ocr,
    );
    let layout = OutputLayout::new(out_dir);
    layout.prepare().expect("output layout");
    RedactionContext::new(collaborators, RedactionSettings::default(), layout)
}

/// Context built from an explicit collaborator set.
pub fn context_from(out_dir: &Path, collaborators: Collaborators) -> RedactionContext {
    let layout = OutputLayout::new(out_dir);
    layout.prepare().expect("output layout");
    RedactionContext::new(collaborators, RedactionSettings::default(), layout)
}

/// Default collaborators with explicit settings.
pub fn context_with_settings(out_dir: &Path, settings: RedactionSettings) -> RedactionContext {
    let collaborators = Collaborators::new(
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(FixedCaptioner::new("a scanned form")),
        Arc::new(ScriptedOcr::new(Vec::new())),
    );
    let layout = OutputLayout::new(out_dir);
    layout.prepare().expect("output layout");
    RedactionContext::new(collaborators, settings, layout)
}
