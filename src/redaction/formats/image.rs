//! Raster images: OCR words are redacted and painted over, faces are
//! blurred.
//!
//! Confident OCR words are joined with spaces into one text so patterns
//! that Tesseract splits across words (card numbers, spaced phone numbers)
//! are still found. Every word whose range overlaps a detected span is
//! painted. Captioning, OCR and face detection fail independently.

use std::ops::Range;
use std::path::Path;

use image::{
    imageops, DynamicImage, GenericImage, GenericImageView, ImageFormat, ImageResult, Rgba,
};
use tracing::{debug, warn};

use crate::classify::VulnerabilityFinding;
use crate::collaborators::{FaceBox, OcrWord};
use crate::error::{RedactorError, RedactorResult};
use crate::redaction::output;
use crate::redaction::strategy::{RedactionOutcome, RedactionStrategy};
use crate::redaction::RedactionContext;

const FORMAT: &str = "image";
const PAINT: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Words that pass the confidence gate.
pub fn confident_words(words: &[OcrWord], min_confidence: f32) -> Vec<&OcrWord> {
    words
        .iter()
        .filter(|w| w.confidence >= min_confidence && !w.text.trim().is_empty())
        .collect()
}

/// Joins words with single spaces and returns each word's byte range in
/// the joined text.
pub fn join_words(words: &[&OcrWord]) -> (String, Vec<Range<usize>>) {
    let mut text = String::new();
    let mut ranges = Vec::with_capacity(words.len());
    for word in words {
        if !text.is_empty() {
            text.push(' ');
        }
        let start = text.len();
        text.push_str(&word.text);
        ranges.push(start..text.len());
    }
    (text, ranges)
}

/// Clamps a box, grown by `padding`, to the image bounds.
fn clamp_box(
    image: &DynamicImage,
    (left, top, width, height): (u32, u32, u32, u32),
    padding: u32,
) -> (u32, u32, u32, u32) {
    let (image_width, image_height) = image.dimensions();
    let x0 = left.saturating_sub(padding).min(image_width);
    let y0 = top.saturating_sub(padding).min(image_height);
    let x1 = left
        .saturating_add(width)
        .saturating_add(padding)
        .min(image_width);
    let y1 = top
        .saturating_add(height)
        .saturating_add(padding)
        .min(image_height);
    (x0, y0, x1, y1)
}

/// Fills a word box, grown by `padding` and clamped to the image.
pub fn paint_box(image: &mut DynamicImage, word: &OcrWord, padding: u32) {
    let bounds = (word.left, word.top, word.width, word.height);
    let (x0, y0, x1, y1) = clamp_box(image, bounds, padding);
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, PAINT);
        }
    }
}

/// Gaussian-blurs a face region in place. Returns false for a box that
/// lies entirely outside the image.
pub fn blur_region(image: &mut DynamicImage, face: &FaceBox, sigma: f32) -> ImageResult<bool> {
    let bounds = (face.left, face.top, face.width, face.height);
    let (x0, y0, x1, y1) = clamp_box(image, bounds, 0);
    if x1 <= x0 || y1 <= y0 {
        return Ok(false);
    }
    let region = image.crop_imm(x0, y0, x1 - x0, y1 - y0);
    let blurred = imageops::blur(&region, sigma);
    image.copy_from(&blurred, x0, y0)?;
    Ok(true)
}

pub struct ImageStrategy;

impl ImageStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RedactionStrategy for ImageStrategy {
    fn redact(
        &self,
        ctx: &RedactionContext,
        input: &Path,
        output: &Path,
    ) -> RedactorResult<RedactionOutcome> {
        let format =
            ImageFormat::from_path(input).map_err(|e| RedactorError::open(FORMAT, input, e))?;
        let mut image = image::open(input).map_err(|e| RedactorError::open(FORMAT, input, e))?;
        let mut outcome = RedactionOutcome::none();

        match ctx.collaborators.captioner.caption(&image) {
            Ok(caption) => outcome.description = Some(caption),
            Err(e) => {
                warn!(path = %input.display(), error = %e, "captioning failed");
                outcome
                    .collaborator_failures
                    .push(format!("Image captioning failed: {}", e));
            }
        }

        let ocr_words = match ctx.collaborators.ocr.recognize(&image) {
            Ok(page) => page.words,
            Err(e) => {
                warn!(path = %input.display(), error = %e, "OCR failed; no text redacted");
                outcome
                    .collaborator_failures
                    .push(format!("OCR failed: {}", e));
                Vec::new()
            }
        };

        let faces = match ctx.collaborators.faces.as_ref() {
            Some(detector) => detector.detect_faces(&image).unwrap_or_else(|e| {
                warn!(path = %input.display(), error = %e, "face detection failed");
                outcome
                    .collaborator_failures
                    .push(format!("Face detection failed: {}", e));
                Vec::new()
            }),
            None => Vec::new(),
        };

        let words = confident_words(&ocr_words, ctx.settings.ocr_min_confidence);
        let (text, ranges) = join_words(&words);
        let redaction = ctx.engine.redact_text(&text);

        for (word, range) in words.iter().zip(&ranges) {
            let hit = redaction
                .spans
                .iter()
                .any(|span| span.start < range.end && range.start < span.end);
            if hit {
                paint_box(&mut image, word, ctx.settings.paint_padding);
                outcome.ocr_redactions += 1;
            }
        }

        let mut blurred = 0;
        for face in &faces {
            let changed = blur_region(&mut image, face, ctx.settings.face_blur_sigma)
                .map_err(|e| RedactorError::save(FORMAT, output, e))?;
            if changed {
                blurred += 1;
            }
        }
        outcome.ocr_redactions += blurred;

        outcome.text = redaction.redacted;
        if !outcome.text.trim().is_empty() {
            if let Some(name) = input.file_name().and_then(|n| n.to_str()) {
                let transcript = ctx.layout.ocr_transcript_path(name);
                if let Err(e) = output::write_bytes(&transcript, outcome.text.as_bytes()) {
                    warn!(path = %transcript.display(), error = %e, "transcript not written");
                    outcome.findings.push(VulnerabilityFinding::high(format!(
                        "OCR transcript could not be written: {}",
                        e
                    )));
                }
            }
        }

        if outcome.ocr_redactions > 0 {
            output::write_atomically(output, |tmp| {
                image
                    .save_with_format(tmp, format)
                    .map_err(|e| RedactorError::save(FORMAT, output, e))
            })?;
        } else {
            output::copy_verbatim(input, output)?;
        }
        debug!(
            words = ocr_words.len(),
            confident = words.len(),
            painted = outcome.ocr_redactions - blurred,
            faces = blurred,
            "image redacted"
        );

        outcome.counts = redaction.counts;
        outcome.detector_failures.extend(redaction.detector_failure);
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "ImageOcr"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn word(text: &str, confidence: f32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            left: 2,
            top: 2,
            width: 4,
            height: 3,
            confidence,
        }
    }

    #[test]
    fn test_confidence_gate() {
        let words = vec![
            word("Jane", 91.0),
            word("Doe", 12.0),
            word("  ", 99.0),
            word("ok", 60.0),
        ];
        let kept: Vec<&str> = confident_words(&words, 60.0)
            .into_iter()
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(kept, vec!["Jane", "ok"]);
    }

    #[test]
    fn test_join_words_ranges() {
        let words = vec![word("Card", 90.0), word("4111", 90.0), word("Zoë", 90.0)];
        let refs: Vec<&OcrWord> = words.iter().collect();
        let (text, ranges) = join_words(&refs);
        assert_eq!(text, "Card 4111 Zoë");
        assert_eq!(ranges, vec![0..4, 5..9, 10..14]);
        assert_eq!(&text[ranges[2].clone()], "Zoë");
    }

    #[test]
    fn test_blur_outside_image_is_noop() {
        let mut image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let face = FaceBox {
            left: 10,
            top: 10,
            width: 5,
            height: 5,
        };
        assert!(!blur_region(&mut image, &face, 2.0).unwrap());
    }

    #[test]
    fn test_paint_box_clamped() {
        let white = RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        let mut image = DynamicImage::ImageRgb8(white);
        let mut w = word("x", 90.0);
        w.left = 5;
        w.width = 10;
        paint_box(&mut image, &w, 1);

        assert_eq!(image.get_pixel(7, 5), Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(4, 1), Rgba([0, 0, 0, 255]));
        assert_eq!(image.get_pixel(3, 3), Rgba([255, 255, 255, 255]));
        assert_eq!(image.get_pixel(7, 0), Rgba([255, 255, 255, 255]));
    }
}
