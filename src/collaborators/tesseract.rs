//! OCR through the `tesseract` executable in TSV mode.

use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use super::{CollaboratorError, CollaboratorResult, OcrEngine, OcrPage, OcrWord};

/// TSV row level for single words.
const WORD_LEVEL: &str = "5";
/// Luma cut-off used when binarizing.
const BINARIZE_THRESHOLD: u8 = 128;

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
    binarize: bool,
}

impl TesseractOcr {
    const NAME: &'static str = "ocr";

    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            language: "eng".to_string(),
            binarize: false,
        }
    }

    /// Tesseract language pack(s), e.g. `eng` or `eng+deu`.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Thresholds the image to black and white before recognition.
    pub fn with_binarize(mut self, binarize: bool) -> Self {
        self.binarize = binarize;
        self
    }

    fn process_error(message: impl ToString) -> CollaboratorError {
        CollaboratorError::Process {
            collaborator: Self::NAME,
            message: message.to_string(),
        }
    }

    /// Parses `tesseract ... tsv` output into words.
    pub fn parse_tsv(tsv: &str) -> OcrPage {
        let mut words = Vec::new();
        for line in tsv.lines().skip(1) {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 11 || fields[0] != WORD_LEVEL {
                continue;
            }
            let number = |i: usize| fields[i].trim().parse::<u32>().unwrap_or(0);
            words.push(OcrWord {
                text: fields.get(11).copied().unwrap_or("").to_string(),
                left: number(6),
                top: number(7),
                width: number(8),
                height: number(9),
                confidence: fields[10].trim().parse::<f32>().unwrap_or(-1.0),
            });
        }
        OcrPage { words }
    }
}

/// Converts an image to pure black and white.
pub fn binarize(image: &DynamicImage) -> DynamicImage {
    let gray = image.to_luma8();
    let bw = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] >= BINARIZE_THRESHOLD {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    DynamicImage::ImageLuma8(bw)
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> CollaboratorResult<OcrPage> {
        let scratch = tempfile::Builder::new()
            .prefix("ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(Self::process_error)?;

        let prepared;
        let source = if self.binarize {
            prepared = binarize(image);
            &prepared
        } else {
            image
        };
        source
            .save_with_format(scratch.path(), ImageFormat::Png)
            .map_err(Self::process_error)?;

        let output = Command::new(&self.binary)
            .arg(scratch.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("tsv")
            .output()
            .map_err(|e| Self::process_error(format!("cannot run {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            return Err(Self::process_error(format!(
                "exit status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(Self::parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
