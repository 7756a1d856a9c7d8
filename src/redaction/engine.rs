//! Detect + apply over a text blob or an ordered list of fragments.

use tracing::{debug, warn};

use super::mapper::{self, RedactionMap, FRAGMENT_DELIMITER};
use crate::detect::{Detection, Detector};
use crate::domain::{PiiCounts, Span};

/// Outcome of redacting one text blob.
#[derive(Debug, Clone, Default)]
pub struct TextRedaction {
    pub redacted: String,
    pub counts: PiiCounts,
    pub spans: Vec<Span>,
    pub detector_failure: Option<String>,
}

/// Outcome of redacting a fragment list.
#[derive(Debug, Clone, Default)]
pub struct FragmentRedaction {
    /// Redacted fragments, same length and order as the input.
    pub redacted: Vec<String>,
    pub map: RedactionMap,
    pub counts: PiiCounts,
    pub spans: Vec<Span>,
    pub detector_failures: Vec<String>,
}

/// The detection/redaction primitive shared by every structural redactor.
#[derive(Debug)]
pub struct RedactionEngine {
    detector: Detector,
}

impl RedactionEngine {
    pub fn new(detector: Detector) -> Self {
        Self { detector }
    }

    /// Detects once over `text` and applies the result.
    ///
    /// A recognizer failure leaves the text unchanged.
    pub fn redact_text(&self, text: &str) -> TextRedaction {
        let Detection { spans, failure } = self.detector.detect(text);
        if let Some(reason) = failure {
            return TextRedaction {
                redacted: text.to_string(),
                detector_failure: Some(reason),
                ..Default::default()
            };
        }

        let (redacted, counts) = mapper::apply(text, &spans, self.detector.patterns());
        TextRedaction {
            redacted,
            counts,
            spans,
            detector_failure: None,
        }
    }

    /// Redacts fragments with a single detection pass over their join.
    ///
    /// Falls back to one pass per fragment if a fragment already contains
    /// the delimiter or the split does not give back one entry per input.
    pub fn redact_fragments(&self, fragments: &[String]) -> FragmentRedaction {
        if fragments.is_empty() {
            return FragmentRedaction::default();
        }
        if fragments.iter().any(|f| f.contains(FRAGMENT_DELIMITER)) {
            warn!("fragment contains the join delimiter; redacting fragments one by one");
            return self.redact_each(fragments);
        }

        let joined = fragments.join(&FRAGMENT_DELIMITER.to_string());
        let text = self.redact_text(&joined);
        let redacted: Vec<String> = text
            .redacted
            .split(FRAGMENT_DELIMITER)
            .map(str::to_string)
            .collect();

        if redacted.len() != fragments.len() {
            warn!(
                expected = fragments.len(),
                actual = redacted.len(),
                "fragment count drifted after redaction; redacting fragments one by one"
            );
            return self.redact_each(fragments);
        }

        let map = RedactionMap::from_fragments(fragments, &redacted);
        debug!(
            fragments = fragments.len(),
            changed = map.changed(),
            "fragments redacted"
        );
        FragmentRedaction {
            redacted,
            map,
            counts: text.counts,
            spans: text.spans,
            detector_failures: text.detector_failure.into_iter().collect(),
        }
    }

    fn redact_each(&self, fragments: &[String]) -> FragmentRedaction {
        let mut out = FragmentRedaction::default();
        for fragment in fragments {
            let text = self.redact_text(fragment);
            out.counts.merge(&text.counts);
            out.spans.extend(text.spans);
            out.detector_failures.extend(text.detector_failure);
            out.redacted.push(text.redacted);
        }
        out.map = RedactionMap::from_fragments(fragments, &out.redacted);
        out
    }
}
