//! Redaction mapper: applies detected spans to a text blob and builds the
//! fragment substitution table.

use std::collections::HashMap;
use std::ops::Range;

use regex::Captures;

use crate::domain::{PatternSet, PiiCounts, Span};

/// Token written in place of every redacted region.
///
/// It contains no digits, no `@` and no keyword, so no matcher can fire on
/// it and redacting already-redacted text is a no-op.
pub const PLACEHOLDER: &str = "[REDACTED]";

/// Separator used to join fragments into one detection blob.
///
/// U+001E (record separator) is not whitespace for the regex engine, so no
/// pattern can consume it, and redaction never writes it.
pub const FRAGMENT_DELIMITER: char = '\u{1e}';

/// Redacts `text`: entity spans right-to-left, then one global substitution
/// pass per pattern matcher.
pub fn apply(text: &str, spans: &[Span], patterns: &PatternSet) -> (String, PiiCounts) {
    let mut counts = PiiCounts::new();
    let mut redacted = text.to_string();

    // Descending start order keeps every not-yet-applied offset valid.
    for region in entity_regions(text, spans, &mut counts).into_iter().rev() {
        redacted.replace_range(region, PLACEHOLDER);
    }

    for matcher in patterns.iter() {
        let replaced = matcher
            .pattern()
            .replace_all(&redacted, |caps: &Captures| {
                let hit = &caps[0];
                if matcher.accepts(hit) {
                    counts.increment(&matcher.category(hit));
                    PLACEHOLDER.to_string()
                } else {
                    hit.to_string()
                }
            })
            .into_owned();
        redacted = replaced;
    }

    (redacted, counts)
}

/// Byte ranges of existing placeholders in `text`.
fn placeholder_ranges(text: &str) -> Vec<Range<usize>> {
    text.match_indices(PLACEHOLDER)
        .map(|(i, p)| i..i + p.len())
        .collect()
}

/// Normalizes entity spans into ascending, disjoint regions to replace.
///
/// Spans are clamped to the text, widened to swallow any placeholder they
/// cut into, dropped when they only cover placeholders, merged when they
/// overlap or touch, and finally split around fragment delimiters so a
/// replacement never removes one. Each kept span is counted once.
fn entity_regions(text: &str, spans: &[Span], counts: &mut PiiCounts) -> Vec<Range<usize>> {
    let placeholders = placeholder_ranges(text);

    let mut candidates: Vec<&Span> = spans
        .iter()
        .filter(|s| s.category.is_entity())
        .filter(|s| s.start < s.end && s.end <= text.len())
        .filter(|s| text.is_char_boundary(s.start) && text.is_char_boundary(s.end))
        .collect();
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
    candidates.dedup_by(|a, b| a.start == b.start && a.end == b.end && a.category == b.category);

    let mut merged: Vec<Range<usize>> = Vec::new();
    for span in candidates {
        let mut region = span.start..span.end;
        for p in &placeholders {
            if p.start < region.end && region.start < p.end {
                region.start = region.start.min(p.start);
                region.end = region.end.max(p.end);
            }
        }
        if only_placeholders(&text[region.clone()]) {
            continue;
        }

        counts.increment(&span.category);
        match merged.last_mut() {
            Some(last) if region.start <= last.end => last.end = last.end.max(region.end),
            _ => merged.push(region),
        }
    }

    merged
        .into_iter()
        .flat_map(|region| split_on_delimiter(text, region))
        .collect()
}

fn only_placeholders(s: &str) -> bool {
    s.replace(PLACEHOLDER, "").trim().is_empty() && s.contains(PLACEHOLDER)
}

/// Splits `region` into sub-ranges that exclude the fragment delimiter.
fn split_on_delimiter(text: &str, region: Range<usize>) -> Vec<Range<usize>> {
    let mut parts = Vec::new();
    let mut start = region.start;
    for (offset, _) in text[region.clone()].match_indices(FRAGMENT_DELIMITER) {
        let at = region.start + offset;
        if at > start {
            parts.push(start..at);
        }
        start = at + FRAGMENT_DELIMITER.len_utf8();
    }
    if region.end > start {
        parts.push(start..region.end);
    }
    parts
}

/// Substitution table from original fragment content to redacted content.
///
/// Keyed by whole-fragment equality; when the same original recurs the first
/// mapping is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionMap {
    entries: HashMap<String, String>,
}

impl RedactionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zips original and redacted fragments 1:1.
    ///
    /// Callers guarantee equal lengths; extra entries on either side are
    /// ignored by `zip`.
    pub fn from_fragments(originals: &[String], redacted: &[String]) -> Self {
        let mut map = Self::new();
        for (original, replacement) in originals.iter().zip(redacted) {
            map.insert(original, replacement);
        }
        map
    }

    /// Records a mapping unless `original` is already mapped.
    pub fn insert(&mut self, original: &str, redacted: &str) {
        self.entries
            .entry(original.to_string())
            .or_insert_with(|| redacted.to_string());
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    /// The replacement for `original`, only when it differs.
    pub fn replacement(&self, original: &str) -> Option<&str> {
        self.get(original).filter(|r| *r != original)
    }

    /// Number of distinct originals whose content changes.
    pub fn changed(&self) -> usize {
        self.entries.iter().filter(|(k, v)| k != v).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
