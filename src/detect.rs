//! Detector adapter: one recognizer call per text plus the pattern matchers.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::collaborators::{EntityMention, EntityRecognizer};
use crate::domain::{Category, PatternSet, Span};
use crate::redaction::mapper::FRAGMENT_DELIMITER;

/// Spans found in one text, or the reason the recognizer could not run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// All spans, ordered by start offset.
    pub spans: Vec<Span>,
    /// Set when the recognizer failed; `spans` is then empty.
    pub failure: Option<String>,
}

impl Detection {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            spans: Vec::new(),
            failure: Some(reason.into()),
        }
    }

    pub fn entity_spans(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(|s| s.category.is_entity())
    }
}

/// Wraps the entity recognizer and the pattern matchers behind `detect`.
pub struct Detector {
    recognizer: Arc<dyn EntityRecognizer>,
    patterns: PatternSet,
    entity_categories: Vec<Category>,
}

impl Detector {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, entity_categories: Vec<Category>) -> Self {
        Self {
            recognizer,
            patterns: PatternSet::standard(),
            entity_categories,
        }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Detects entity and pattern spans over the whole `text`.
    pub fn detect(&self, text: &str) -> Detection {
        if text.trim_matches(|c: char| c.is_whitespace() || c == FRAGMENT_DELIMITER).is_empty() {
            return Detection::default();
        }

        // The delimiter and '\n' are both one byte and one char, so offsets
        // returned for the substituted text are valid for the original.
        let request = text.replace(FRAGMENT_DELIMITER, "\n");
        let mentions = match self.recognizer.recognize(&request) {
            Ok(mentions) => mentions,
            Err(e) => {
                warn!(recognizer = self.recognizer.name(), error = %e, "entity recognition failed");
                return Detection::failed(format!("Entity recognition failed: {}", e));
            }
        };

        let mut spans = self.entity_spans(text, &mentions);
        for matcher in self.patterns.iter() {
            spans.extend(matcher.find_spans(text));
        }
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        debug!(
            chars = text.len(),
            mentions = mentions.len(),
            spans = spans.len(),
            "detection complete"
        );
        Detection {
            spans,
            failure: None,
        }
    }

    /// Converts character-offset mentions into byte-offset spans, dropping
    /// labels outside the configured categories and out-of-range offsets.
    fn entity_spans(&self, text: &str, mentions: &[EntityMention]) -> Vec<Span> {
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        mentions
            .iter()
            .filter_map(|mention| {
                let category = Category::from_entity_label(&mention.label)?;
                if !self.entity_categories.contains(&category) {
                    return None;
                }
                if mention.start >= mention.end || mention.end >= boundaries.len() {
                    debug!(?mention, "ignoring mention with invalid offsets");
                    return None;
                }
                let (start, end) = (boundaries[mention.start], boundaries[mention.end]);
                Some(Span::new(start, end, category, &text[start..end]))
            })
            .collect()
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("recognizer", &self.recognizer.name())
            .field("patterns", &self.patterns)
            .field("entity_categories", &self.entity_categories)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CollaboratorError, CollaboratorResult};

    struct Fixed(Vec<EntityMention>);

    impl EntityRecognizer for Fixed {
        fn recognize(&self, _text: &str) -> CollaboratorResult<Vec<EntityMention>> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct Down;

    impl EntityRecognizer for Down {
        fn recognize(&self, _text: &str) -> CollaboratorResult<Vec<EntityMention>> {
            Err(CollaboratorError::Transport {
                collaborator: "entity-recognizer",
                message: "connection refused".to_string(),
            })
        }
        fn name(&self) -> &str {
            "down"
        }
    }

    fn mention(start: usize, end: usize, label: &str) -> EntityMention {
        EntityMention {
            start,
            end,
            label: label.to_string(),
            text: String::new(),
        }
    }

    #[test]
    fn test_char_offsets_become_byte_offsets() {
        let text = "Zoë Ångström wrote";
        let detector = Detector::new(
            Arc::new(Fixed(vec![mention(0, 12, "PERSON")])),
            vec![Category::Person],
        );
        let detection = detector.detect(text);
        let person: Vec<_> = detection.entity_spans().collect();
        assert_eq!(person.len(), 1);
        assert_eq!(person[0].source_text, "Zoë Ångström");
    }

    #[test]
    fn test_unconfigured_and_invalid_mentions_dropped() {
        let detector = Detector::new(
            Arc::new(Fixed(vec![
                mention(0, 4, "GPE"),
                mention(5, 99, "PERSON"),
                mention(3, 3, "PERSON"),
                mention(0, 4, "DATE"),
            ])),
            vec![Category::Person, Category::Organization],
        );
        assert!(detector.detect("Oslo is cold").entity_spans().next().is_none());
    }

    #[test]
    fn test_patterns_reported_with_entities() {
        let detector = Detector::new(Arc::new(Fixed(vec![])), vec![Category::Person]);
        let detection = detector.detect("mail a@b.io, password hunter2");
        let keys: Vec<_> = detection.spans.iter().map(|s| s.category.key()).collect();
        assert_eq!(keys, vec!["email", "keyword:password"]);
    }

    #[test]
    fn test_failure_returns_no_spans() {
        let detector = Detector::new(Arc::new(Down), vec![Category::Person]);
        let detection = detector.detect("Jane Doe jane@example.com");
        assert!(detection.spans.is_empty());
        assert!(detection.failure.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_blank_text_skips_recognizer() {
        let detector = Detector::new(Arc::new(Down), vec![Category::Person]);
        assert_eq!(detector.detect(" \n\u{1e} "), Detection::default());
    }
}
