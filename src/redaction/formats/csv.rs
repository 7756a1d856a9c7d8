//! Tabular records.
//!
//! Two passes: all data cells joined row-major give the document counts,
//! then each column is redacted on its own and applied cell by cell.
//! Headers are never redacted; columns with a known PII header are replaced
//! wholesale. Files without a header row must be read with
//! `csv_has_headers` off, otherwise their first record is taken as headers
//! and passes through untouched.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::classify::VulnerabilityFinding;
use crate::error::{RedactorError, RedactorResult};
use crate::redaction::mapper::{RedactionMap, PLACEHOLDER};
use crate::redaction::output;
use crate::redaction::strategy::{RedactionOutcome, RedactionStrategy};
use crate::redaction::RedactionContext;

const FORMAT: &str = "CSV";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Reads `path`; with `has_headers` off every record is a data row.
    pub fn read(path: &Path, has_headers: bool) -> RedactorResult<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .has_headers(has_headers)
            .from_path(path)
            .map_err(|e| RedactorError::open(FORMAT, path, e))?;

        let headers = if has_headers {
            reader
                .headers()
                .map_err(|e| RedactorError::open(FORMAT, path, e))?
                .iter()
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| RedactorError::open(FORMAT, path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> RedactorResult<()> {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| RedactorError::save(FORMAT, path, e))?;

        if !self.headers.is_empty() {
            writer
                .write_record(&self.headers)
                .map_err(|e| RedactorError::save(FORMAT, path, e))?;
        }
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| RedactorError::save(FORMAT, path, e))?;
        }
        writer
            .flush()
            .map_err(|e| RedactorError::io(path, e))
    }

    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    /// Every data cell, row-major.
    pub fn cells(&self) -> Vec<String> {
        self.rows.iter().flatten().cloned().collect()
    }

    /// Cells of column `index`; short rows are skipped.
    pub fn column(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index).cloned())
            .collect()
    }
}

pub struct CsvStrategy;

impl CsvStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionStrategy for CsvStrategy {
    fn redact(
        &self,
        ctx: &RedactionContext,
        input: &Path,
        output: &Path,
    ) -> RedactorResult<RedactionOutcome> {
        let mut table = CsvTable::read(input, ctx.settings.csv_has_headers)?;
        let mut outcome = RedactionOutcome::none();

        let document = ctx.engine.redact_fragments(&table.cells());
        outcome.counts = document.counts;
        outcome.detector_failures = document.detector_failures;
        outcome.text = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| document.map.get(cell).unwrap_or(cell.as_str()))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n");

        for index in 0..table.column_count() {
            let header = table.headers.get(index).map(String::as_str).unwrap_or("");
            let blanket = !header.is_empty() && ctx.settings.is_pii_column(header);

            let column_map = if blanket {
                outcome.findings.push(VulnerabilityFinding::medium(format!(
                    "Column '{}' holds personal data and was redacted in full",
                    header
                )));
                RedactionMap::new()
            } else {
                let column = ctx.engine.redact_fragments(&table.column(index));
                outcome.detector_failures.extend(column.detector_failures);
                column.map
            };

            for row in &mut table.rows {
                let Some(cell) = row.get_mut(index) else {
                    continue;
                };
                let replacement = if blanket {
                    let blank = cell.trim().is_empty() || cell.as_str() == PLACEHOLDER;
                    (!blank).then(|| PLACEHOLDER.to_string())
                } else {
                    column_map
                        .replacement(cell)
                        .or_else(|| document.map.replacement(cell))
                        .map(str::to_string)
                };
                if let Some(replacement) = replacement {
                    *cell = replacement;
                    outcome.fragments_rewritten += 1;
                }
            }
        }

        if outcome.fragments_rewritten > 0 {
            output::write_atomically(output, |tmp| table.write(tmp))?;
        } else {
            output::copy_verbatim(input, output)?;
        }
        debug!(
            rows = table.rows.len(),
            columns = table.column_count(),
            rewritten = outcome.fragments_rewritten,
            "csv redacted"
        );

        outcome.description = Some(format!(
            "CSV table with {} row(s) and {} column(s)",
            table.rows.len(),
            table.column_count()
        ));
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "Csv"
    }
}
