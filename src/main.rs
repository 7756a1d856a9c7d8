//! Batch PII redaction CLI.
//!
//! Redacts every file in a directory and prints a JSON array of per-file
//! results on stdout. Logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;

use pii_redactor::collaborators::{
    HttpCaptioner, HttpEntityRecognizer, HttpFaceDetector, HttpSummarizer, QueuedRecognizer,
    TesseractOcr,
};
use pii_redactor::config::DEFAULT_OCR_MIN_CONFIDENCE;
use pii_redactor::logging::init_logging;
use pii_redactor::{
    default_workers, BatchRunner, Collaborators, EntityRecognizer, OutputLayout,
    RedactionContext, RedactionSettings,
};

/// PII redaction for document batches
///
/// Produces sanitized copies of Word, PowerPoint, Excel, CSV, text, PDF and
/// image files and a JSON report of what was found.
#[derive(Parser, Debug)]
#[command(name = "pii-redactor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the files to redact
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory receiving cleansed_files/ and redacted_images/
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Worker threads (default: min(8, available cores))
    #[arg(short = 'j', long, value_name = "N")]
    workers: Option<usize>,

    /// Entity recognition endpoint
    #[arg(long, env = "PII_REDACTOR_NER_URL", value_name = "URL")]
    ner_url: String,

    /// Image captioning endpoint
    #[arg(long, env = "PII_REDACTOR_CAPTION_URL", value_name = "URL")]
    caption_url: String,

    /// Optional face detection endpoint; detected faces are blurred
    #[arg(long, env = "PII_REDACTOR_FACE_URL", value_name = "URL")]
    face_url: Option<String>,

    /// Optional risk-assessment endpoint
    #[arg(long, env = "PII_REDACTOR_SUMMARIZER_URL", value_name = "URL")]
    summarizer_url: Option<String>,

    /// Path to the tesseract executable
    #[arg(long, env = "PII_REDACTOR_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language pack(s), e.g. eng+deu
    #[arg(long, env = "PII_REDACTOR_OCR_LANG", value_name = "LANG", default_value = "eng")]
    ocr_lang: String,

    /// Minimum OCR word confidence (0-100)
    #[arg(long, value_name = "SCORE", default_value_t = DEFAULT_OCR_MIN_CONFIDENCE)]
    ocr_confidence: f32,

    /// Threshold images to black and white before OCR
    #[arg(long)]
    ocr_binarize: bool,

    /// Treat the first CSV row as data rather than a header row
    #[arg(long)]
    csv_no_headers: bool,

    /// Also redact locations reported by the recognizer
    #[arg(long)]
    redact_locations: bool,

    /// Send recognizer calls through a single queue
    #[arg(long)]
    serialize_ner: bool,

    /// Timeout for each HTTP collaborator call
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn build_collaborators(cli: &Cli) -> Result<Collaborators> {
    let timeout = Duration::from_secs(cli.timeout_secs);

    let recognizer = HttpEntityRecognizer::new(&cli.ner_url, timeout)
        .context("Failed to configure entity recognizer")?;
    let recognizer: Arc<dyn EntityRecognizer> = if cli.serialize_ner {
        Arc::new(QueuedRecognizer::wrap(recognizer))
    } else {
        Arc::new(recognizer)
    };

    let captioner =
        HttpCaptioner::new(&cli.caption_url, timeout).context("Failed to configure captioner")?;
    let ocr = TesseractOcr::new(&cli.tesseract)
        .with_language(&cli.ocr_lang)
        .with_binarize(cli.ocr_binarize);

    let mut collaborators = Collaborators::new(recognizer, Arc::new(captioner), Arc::new(ocr));
    if let Some(url) = &cli.face_url {
        let faces =
            HttpFaceDetector::new(url, timeout).context("Failed to configure face detector")?;
        collaborators = collaborators.with_face_detector(Arc::new(faces));
    }
    if let Some(url) = &cli.summarizer_url {
        let summarizer =
            HttpSummarizer::new(url, timeout).context("Failed to configure summarizer")?;
        collaborators = collaborators.with_summarizer(Arc::new(summarizer));
    }
    Ok(collaborators)
}

fn settings(cli: &Cli) -> RedactionSettings {
    let mut settings = RedactionSettings::default().with_ocr_min_confidence(cli.ocr_confidence);
    if cli.redact_locations {
        settings = settings.with_locations();
    }
    if cli.csv_no_headers {
        settings = settings.without_csv_headers();
    }
    settings
}

fn run(cli: Cli) -> Result<()> {
    if !cli.input_dir.is_dir() {
        anyhow::bail!("Input directory does not exist: {}", cli.input_dir.display());
    }

    let collaborators = build_collaborators(&cli)?;
    collaborators
        .verify()
        .context("Collaborator start-up check failed")?;
    info!(?collaborators, "collaborators ready");

    let ctx = RedactionContext::new(
        collaborators,
        settings(&cli),
        OutputLayout::new(&cli.output_dir),
    );
    let runner = BatchRunner::new(Arc::new(ctx))
        .with_workers(cli.workers.unwrap_or_else(default_workers));

    let report = runner
        .run(Path::new(&cli.input_dir))
        .with_context(|| format!("Batch failed for {}", cli.input_dir.display()))?;

    let json =
        serde_json::to_string_pretty(&report.results).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                return ExitCode::from(1);
            }
        },
    };

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
