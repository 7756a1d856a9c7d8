//! External collaborators consumed through narrow request/response contracts.
//!
//! The engine never owns a model. It receives an immutable [`Collaborators`]
//! handle set at construction time, which tests populate with fakes.

pub mod http;
pub mod queue;
pub mod tesseract;

pub use http::{HttpCaptioner, HttpEntityRecognizer, HttpFaceDetector, HttpSummarizer};
pub use queue::QueuedRecognizer;
pub use tesseract::TesseractOcr;

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{collaborator} request failed: {message}")]
    Transport {
        collaborator: &'static str,
        message: String,
    },

    #[error("{collaborator} returned an unusable response: {message}")]
    Protocol {
        collaborator: &'static str,
        message: String,
    },

    #[error("{collaborator} process failed: {message}")]
    Process {
        collaborator: &'static str,
        message: String,
    },

    #[error("{collaborator} is no longer available")]
    Unavailable { collaborator: &'static str },
}

impl CollaboratorError {
    pub fn collaborator(&self) -> &'static str {
        match self {
            Self::Transport { collaborator, .. }
            | Self::Protocol { collaborator, .. }
            | Self::Process { collaborator, .. }
            | Self::Unavailable { collaborator } => collaborator,
        }
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Entity mention returned by the recognizer.
///
/// `start`/`end` are character (not byte) offsets into the request text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub start: usize,
    pub end: usize,
    pub label: String,
    #[serde(default)]
    pub text: String,
}

/// Named-entity recognition over a full document text.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> CollaboratorResult<Vec<EntityMention>>;

    /// Verifies the recognizer is usable. Called once at start-up.
    fn warm_up(&self) -> CollaboratorResult<()> {
        self.recognize("warm up").map(|_| ())
    }

    fn name(&self) -> &str;
}

/// Produces a short natural-language description of an image.
pub trait Captioner: Send + Sync {
    fn caption(&self, image: &DynamicImage) -> CollaboratorResult<String>;

    fn warm_up(&self) -> CollaboratorResult<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// One word recognized by OCR, in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Confidence on a 0-100 scale; negative when the engine reports none.
    pub confidence: f32,
}

/// Output of one OCR run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrPage {
    pub words: Vec<OcrWord>,
}

/// Optical character recognition with word boxes.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &DynamicImage) -> CollaboratorResult<OcrPage>;

    fn name(&self) -> &str;
}

/// A detected face, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Locates faces to be blurred.
pub trait FaceDetector: Send + Sync {
    fn detect_faces(&self, image: &DynamicImage) -> CollaboratorResult<Vec<FaceBox>>;

    fn name(&self) -> &str;
}

/// Structured assessment produced by the summarization service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub file_description: String,
    pub vulnerability_analysis: String,
}

/// Hosted summarization / risk-assessment service.
pub trait Summarizer: Send + Sync {
    fn assess(&self, text: &str, file_type: &str) -> CollaboratorResult<Assessment>;

    fn name(&self) -> &str;
}

/// Immutable set of collaborator handles shared by every worker.
#[derive(Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn EntityRecognizer>,
    pub captioner: Arc<dyn Captioner>,
    pub ocr: Arc<dyn OcrEngine>,
    pub faces: Option<Arc<dyn FaceDetector>>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

impl Collaborators {
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        captioner: Arc<dyn Captioner>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            recognizer,
            captioner,
            ocr,
            faces: None,
            summarizer: None,
        }
    }

    pub fn with_face_detector(mut self, faces: Arc<dyn FaceDetector>) -> Self {
        self.faces = Some(faces);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Checks the collaborators every file depends on.
    ///
    /// Failure here is fatal: no file can be processed safely without
    /// detection.
    pub fn verify(&self) -> CollaboratorResult<()> {
        self.recognizer.warm_up()?;
        self.captioner.warm_up()?;
        Ok(())
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("recognizer", &self.recognizer.name())
            .field("captioner", &self.captioner.name())
            .field("ocr", &self.ocr.name())
            .field("faces", &self.faces.as_ref().map(|f| f.name().to_string()))
            .field("summarizer", &self.summarizer.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}
