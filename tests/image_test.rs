//! Image redaction: OCR confidence gate, painting, face blurring and
//! collaborator failures.

mod common;

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use common::*;
use image::{Rgb, RgbImage};
use pii_redactor::collaborators::FaceBox;
use pii_redactor::{classify, Collaborators, FileKind, Severity};
use tempfile::TempDir;

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

#[test]
fn test_only_confident_words_are_painted() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_white_png(&dir.path().join("scan.png"), 100, 40)?;
    let ocr = ScriptedOcr::new(vec![
        ocr_word("reach", (2, 2, 20, 10), 95.0),
        ocr_word("jane@example.com", (30, 2, 40, 10), 90.0),
        ocr_word("Bob", (75, 20, 15, 10), 30.0),
    ]);
    let ctx = context_with(
        &dir.path().join("out"),
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(ocr),
    );
    let output = ctx.layout.cleansed_path(FileKind::Image, "scan.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_eq!(outcome.ocr_redactions, 1);
    assert_eq!(outcome.counts.get("email"), 1);
    assert_eq!(outcome.counts.get("person"), 0);
    assert_eq!(outcome.description.as_deref(), Some("a scanned form"));

    let painted = image::open(&output)?.to_rgb8();
    assert_eq!(*painted.get_pixel(40, 6), BLACK, "email box painted");
    assert_eq!(*painted.get_pixel(28, 0), BLACK, "padding painted");
    assert_eq!(*painted.get_pixel(10, 6), WHITE, "clean word untouched");
    assert_eq!(*painted.get_pixel(80, 25), WHITE, "low-confidence word untouched");

    let transcript = fs::read_to_string(ctx.layout.ocr_transcript_path("scan.png"))?;
    assert_eq!(transcript, "reach [REDACTED]");

    let findings = classify(&outcome);
    assert!(findings.iter().any(|f| f.severity == Severity::Medium
        && f.description.contains("image")));
    Ok(())
}

#[test]
fn test_image_without_pii_is_copied() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_white_png(&dir.path().join("chart.png"), 20, 20)?;
    let ctx = context_with(
        &dir.path().join("out"),
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(ScriptedOcr::new(vec![ocr_word("Revenue", (1, 1, 10, 5), 99.0)])),
    );
    let output = ctx.layout.cleansed_path(FileKind::Image, "chart.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_eq!(outcome.ocr_redactions, 0);
    assert_identical_files(&input, &output);
    Ok(())
}

#[test]
fn test_caption_failure_does_not_stop_redaction() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_white_png(&dir.path().join("badge.png"), 60, 20)?;
    let collaborators = Collaborators::new(
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(FailingCaptioner),
        Arc::new(ScriptedOcr::new(vec![ocr_word("Bob", (5, 5, 20, 10), 88.0)])),
    );
    let ctx = context_from(&dir.path().join("out"), collaborators);
    let output = ctx.layout.cleansed_path(FileKind::Image, "badge.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_eq!(outcome.ocr_redactions, 1);
    assert_eq!(outcome.collaborator_failures.len(), 1);
    assert!(outcome.description.is_none());
    assert_eq!(
        classify(&outcome)
            .iter()
            .filter(|f| f.severity == Severity::High)
            .count(),
        2,
        "person + caption failure"
    );
    Ok(())
}

#[test]
fn test_ocr_failure_copies_image() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_white_png(&dir.path().join("photo.png"), 10, 10)?;
    let ctx = context_with(
        &dir.path().join("out"),
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(FailingOcr),
    );
    let output = ctx.layout.cleansed_path(FileKind::Image, "photo.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_identical_files(&input, &output);
    assert!(outcome.counts.is_empty());
    assert_eq!(outcome.collaborator_failures.len(), 1);
    assert!(outcome.collaborator_failures[0].starts_with("OCR failed"));
    assert!(!ctx.layout.ocr_transcript_path("photo.png").exists());
    Ok(())
}

#[test]
fn test_numbers_split_across_words_are_painted() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_white_png(&dir.path().join("receipt.png"), 200, 20)?;
    let tokens = ["Card", "4111", "1111", "1111", "1111", "call", "555", "123", "4567"];
    let words = tokens
        .iter()
        .enumerate()
        .map(|(i, t)| ocr_word(t, (i as u32 * 20 + 5, 5, 12, 8), 95.0))
        .collect();
    let ctx = context_with(
        &dir.path().join("out"),
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(ScriptedOcr::new(words)),
    );
    let output = ctx.layout.cleansed_path(FileKind::Image, "receipt.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_eq!(outcome.ocr_redactions, 7);
    assert_eq!(outcome.counts.get("credit_card"), 1);
    assert_eq!(outcome.counts.get("phone"), 1);

    let painted = image::open(&output)?.to_rgb8();
    assert_eq!(*painted.get_pixel(10, 9), WHITE, "'Card' untouched");
    assert_eq!(*painted.get_pixel(110, 9), WHITE, "'call' untouched");
    for i in [1u32, 2, 3, 4, 6, 7, 8] {
        assert_eq!(*painted.get_pixel(i * 20 + 10, 9), BLACK, "word {} painted", i);
    }

    let transcript = fs::read_to_string(ctx.layout.ocr_transcript_path("receipt.png"))?;
    assert_eq!(transcript, "Card [REDACTED] call [REDACTED]");
    Ok(())
}

#[test]
fn test_faces_are_blurred() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("portrait.png");
    RgbImage::from_fn(40, 40, |x, _| if x < 20 { BLACK } else { WHITE }).save(&input)?;

    let face = FaceBox {
        left: 10,
        top: 10,
        width: 20,
        height: 20,
    };
    let collaborators = Collaborators::new(
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(FixedCaptioner::new("a portrait")),
        Arc::new(ScriptedOcr::new(Vec::new())),
    )
    .with_face_detector(Arc::new(ScriptedFaces::new(vec![face])));
    let ctx = context_from(&dir.path().join("out"), collaborators);
    let output = ctx.layout.cleansed_path(FileKind::Image, "portrait.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_eq!(outcome.ocr_redactions, 1);
    assert!(outcome.collaborator_failures.is_empty());

    let blurred = image::open(&output)?.to_rgb8();
    assert!(blurred.get_pixel(19, 20)[0] > 0, "dark edge softened");
    assert!(blurred.get_pixel(20, 20)[0] < 255, "light edge softened");
    assert_eq!(*blurred.get_pixel(5, 5), BLACK, "outside the face untouched");
    assert_eq!(*blurred.get_pixel(35, 35), WHITE, "outside the face untouched");

    assert!(classify(&outcome)
        .iter()
        .any(|f| f.severity == Severity::Medium && f.description.contains("image")));
    Ok(())
}

#[test]
fn test_face_detection_failure_still_paints_words() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_white_png(&dir.path().join("badge.png"), 60, 20)?;
    let collaborators = Collaborators::new(
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(FixedCaptioner::new("a badge")),
        Arc::new(ScriptedOcr::new(vec![ocr_word("Bob", (5, 5, 20, 10), 88.0)])),
    )
    .with_face_detector(Arc::new(FailingFaceDetector));
    let ctx = context_from(&dir.path().join("out"), collaborators);
    let output = ctx.layout.cleansed_path(FileKind::Image, "badge.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_eq!(outcome.ocr_redactions, 1);
    assert_eq!(outcome.collaborator_failures.len(), 1);
    assert!(outcome.collaborator_failures[0].starts_with("Face detection failed"));
    assert_eq!(*image::open(&output)?.to_rgb8().get_pixel(10, 10), BLACK);
    Ok(())
}

#[test]
fn test_transcript_failure_keeps_redacted_image() -> Result<()> {
    let dir = TempDir::new()?;
    let input = write_white_png(&dir.path().join("scan.png"), 100, 40)?;
    let ctx = context_with(
        &dir.path().join("out"),
        Arc::new(DictionaryRecognizer::people(KNOWN_PEOPLE)),
        Arc::new(ScriptedOcr::new(vec![ocr_word(
            "jane@example.com",
            (30, 2, 40, 10),
            90.0,
        )])),
    );
    // A directory in the transcript's place makes the rename fail.
    fs::create_dir_all(ctx.layout.ocr_transcript_path("scan.png"))?;
    let output = ctx.layout.cleansed_path(FileKind::Image, "scan.png");

    let outcome = FileKind::Image.strategy().redact(&ctx, &input, &output)?;
    assert_eq!(outcome.ocr_redactions, 1);
    assert!(outcome.findings.iter().any(|f| f.severity == Severity::High
        && f.description.starts_with("OCR transcript could not be written")));
    assert_eq!(*image::open(&output)?.to_rgb8().get_pixel(40, 6), BLACK);
    Ok(())
}
