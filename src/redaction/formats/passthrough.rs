//! Files no redactor understands are copied as they are.

use std::path::Path;

use crate::classify::VulnerabilityFinding;
use crate::error::RedactorResult;
use crate::redaction::output;
use crate::redaction::strategy::{RedactionOutcome, RedactionStrategy};
use crate::redaction::RedactionContext;

pub struct PassthroughStrategy;

impl PassthroughStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PassthroughStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionStrategy for PassthroughStrategy {
    fn redact(
        &self,
        _ctx: &RedactionContext,
        input: &Path,
        output: &Path,
    ) -> RedactorResult<RedactionOutcome> {
        output::copy_verbatim(input, output)?;
        Ok(RedactionOutcome {
            findings: vec![VulnerabilityFinding::low(
                "Unsupported file type; contents were not inspected",
            )],
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "Passthrough"
    }
}
