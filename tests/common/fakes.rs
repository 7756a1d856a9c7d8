//! In-process stand-ins for the external collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use image::DynamicImage;
use pii_redactor::collaborators::{
    Assessment, Captioner, CollaboratorError, CollaboratorResult, EntityMention, EntityRecognizer,
    FaceBox, FaceDetector, OcrEngine, OcrPage, OcrWord, Summarizer,
};

/// Recognizes a fixed vocabulary, reporting character offsets like a real
/// NER service.
#[derive(Debug, Default)]
pub struct DictionaryRecognizer {
    entries: Vec<(String, &'static str)>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl DictionaryRecognizer {
    pub fn people(names: &[&str]) -> Self {
        Self {
            entries: names.iter().map(|n| (n.to_string(), "PERSON")).collect(),
            ..Default::default()
        }
    }

    pub fn with_entry(mut self, text: &str, label: &'static str) -> Self {
        self.entries.push((text.to_string(), label));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text the recognizer was asked about.
    pub fn requests(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl EntityRecognizer for DictionaryRecognizer {
    fn recognize(&self, text: &str) -> CollaboratorResult<Vec<EntityMention>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());

        let mut mentions = Vec::new();
        for (entry, label) in &self.entries {
            for (byte_start, _) in text.match_indices(entry.as_str()) {
                let start = text[..byte_start].chars().count();
                mentions.push(EntityMention {
                    start,
                    end: start + entry.chars().count(),
                    label: label.to_string(),
                    text: entry.clone(),
                });
            }
        }
        mentions.sort_by_key(|m| m.start);
        Ok(mentions)
    }

    fn name(&self) -> &str {
        "dictionary"
    }
}

/// Recognizer whose every call fails.
#[derive(Debug, Default)]
pub struct FailingRecognizer;

impl EntityRecognizer for FailingRecognizer {
    fn recognize(&self, _text: &str) -> CollaboratorResult<Vec<EntityMention>> {
        Err(CollaboratorError::Transport {
            collaborator: "ner",
            message: "model not loaded".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Recognizer that panics, to exercise the task boundary.
#[derive(Debug, Default)]
pub struct PanickingRecognizer;

impl EntityRecognizer for PanickingRecognizer {
    fn recognize(&self, text: &str) -> CollaboratorResult<Vec<EntityMention>> {
        panic!("recognizer crashed on {} chars", text.len());
    }

    fn warm_up(&self) -> CollaboratorResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

#[derive(Debug)]
pub struct FixedCaptioner {
    caption: String,
}

impl FixedCaptioner {
    pub fn new(caption: &str) -> Self {
        Self {
            caption: caption.to_string(),
        }
    }
}

impl Captioner for FixedCaptioner {
    fn caption(&self, _image: &DynamicImage) -> CollaboratorResult<String> {
        Ok(self.caption.clone())
    }

    fn name(&self) -> &str {
        "fixed-caption"
    }
}

#[derive(Debug, Default)]
pub struct FailingCaptioner;

impl Captioner for FailingCaptioner {
    fn caption(&self, _image: &DynamicImage) -> CollaboratorResult<String> {
        Err(CollaboratorError::Transport {
            collaborator: "captioner",
            message: "connection refused".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing-caption"
    }
}

/// OCR engine returning a prepared word list for every image.
#[derive(Debug)]
pub struct ScriptedOcr {
    words: Vec<OcrWord>,
}

impl ScriptedOcr {
    pub fn new(words: Vec<OcrWord>) -> Self {
        Self { words }
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&self, _image: &DynamicImage) -> CollaboratorResult<OcrPage> {
        Ok(OcrPage {
            words: self.words.clone(),
        })
    }

    fn name(&self) -> &str {
        "scripted-ocr"
    }
}

#[derive(Debug, Default)]
pub struct FailingOcr;

impl OcrEngine for FailingOcr {
    fn recognize(&self, _image: &DynamicImage) -> CollaboratorResult<OcrPage> {
        Err(CollaboratorError::Process {
            collaborator: "ocr",
            message: "tesseract exited with status 1".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing-ocr"
    }
}

/// Face detector returning prepared boxes for every image.
#[derive(Debug, Default)]
pub struct ScriptedFaces {
    faces: Vec<FaceBox>,
}

impl ScriptedFaces {
    pub fn new(faces: Vec<FaceBox>) -> Self {
        Self { faces }
    }
}

impl FaceDetector for ScriptedFaces {
    fn detect_faces(&self, _image: &DynamicImage) -> CollaboratorResult<Vec<FaceBox>> {
        Ok(self.faces.clone())
    }

    fn name(&self) -> &str {
        "scripted-faces"
    }
}

#[derive(Debug, Default)]
pub struct FailingFaceDetector;

impl FaceDetector for FailingFaceDetector {
    fn detect_faces(&self, _image: &DynamicImage) -> CollaboratorResult<Vec<FaceBox>> {
        Err(CollaboratorError::Transport {
            collaborator: "face-detector",
            message: "connection reset".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing-faces"
    }
}

/// Summarizer that records what it was sent.
#[derive(Debug, Default)]
pub struct RecordingSummarizer {
    pub fail: bool,
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingSummarizer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl Summarizer for RecordingSummarizer {
    fn assess(&self, text: &str, file_type: &str) -> CollaboratorResult<Assessment> {
        self.seen
            .lock()
            .unwrap()
            .push((text.to_string(), file_type.to_string()));
        if self.fail {
            return Err(CollaboratorError::Protocol {
                collaborator: "summarizer",
                message: "unexpected response".to_string(),
            });
        }
        Ok(Assessment {
            file_description: format!("A {} file", file_type),
            vulnerability_analysis: "Contains contact details".to_string(),
        })
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// OCR word at a given box.
pub fn ocr_word(text: &str, bounds: (u32, u32, u32, u32), confidence: f32) -> OcrWord {
    let (left, top, width, height) = bounds;
    OcrWord {
        text: text.to_string(),
        left,
        top,
        width,
        height,
        confidence,
    }
}
