//! Flat text: one fragment per line.

use std::path::Path;

use crate::error::{RedactorError, RedactorResult};
use crate::redaction::mapper::RedactionMap;
use crate::redaction::output;
use crate::redaction::strategy::StructuredDocument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextDocument {
    lines: Vec<String>,
}

impl PlainTextDocument {
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl StructuredDocument for PlainTextDocument {
    const FORMAT: &'static str = "Text";

    fn open(path: &Path) -> RedactorResult<Self> {
        let bytes = output::read_input(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| RedactorError::open(Self::FORMAT, path, e))?;
        Ok(Self::from_text(&text))
    }

    fn fragments(&self) -> Vec<String> {
        if self.lines.iter().all(|l| l.is_empty()) {
            return Vec::new();
        }
        self.lines.clone()
    }

    fn rebuild(&mut self, map: &RedactionMap) -> RedactorResult<usize> {
        let mut rewritten = 0;
        for line in &mut self.lines {
            if let Some(replacement) = map.replacement(line) {
                *line = replacement.to_string();
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }

    fn save(&self, path: &Path) -> RedactorResult<()> {
        std::fs::write(path, self.to_text()).map_err(|e| RedactorError::io(path, e))
    }
}
