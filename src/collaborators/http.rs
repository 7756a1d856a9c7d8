//! HTTP adapters for model services.
//!
//! Each adapter speaks a small JSON protocol against a single endpoint and
//! relies on the client timeout to bound every call.

use std::io::Cursor;
use std::time::Duration;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use super::{
    Assessment, Captioner, CollaboratorError, CollaboratorResult, EntityMention, EntityRecognizer,
    FaceBox, FaceDetector, Summarizer,
};

fn build_client(collaborator: &'static str, timeout: Duration) -> CollaboratorResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CollaboratorError::Transport {
            collaborator,
            message: e.to_string(),
        })
}

fn post_json<B: Serialize>(
    client: &Client,
    collaborator: &'static str,
    endpoint: &str,
    body: &B,
) -> CollaboratorResult<Response> {
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .map_err(|e| CollaboratorError::Transport {
            collaborator,
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CollaboratorError::Protocol {
            collaborator,
            message: format!("HTTP {} from {}", status, endpoint),
        });
    }
    Ok(response)
}

/// PNG bytes of `image`, base64 encoded for a JSON body.
fn encode_png(collaborator: &'static str, image: &DynamicImage) -> CollaboratorResult<String> {
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| CollaboratorError::Protocol {
            collaborator,
            message: format!("cannot encode image: {}", e),
        })?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png.into_inner()))
}

fn decode<T: for<'de> Deserialize<'de>>(
    response: Response,
    collaborator: &'static str,
) -> CollaboratorResult<T> {
    response.json().map_err(|e| CollaboratorError::Protocol {
        collaborator,
        message: e.to_string(),
    })
}

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    text: &'a str,
}

/// Accepts both a bare array and `{"entities": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecognizeResponse {
    Bare(Vec<EntityMention>),
    Wrapped { entities: Vec<EntityMention> },
}

/// Entity recognizer served over HTTP (e.g. a spaCy pipeline behind a small
/// web service).
#[derive(Debug, Clone)]
pub struct HttpEntityRecognizer {
    client: Client,
    endpoint: String,
}

impl HttpEntityRecognizer {
    const NAME: &'static str = "entity-recognizer";

    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(Self::NAME, timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

impl EntityRecognizer for HttpEntityRecognizer {
    fn recognize(&self, text: &str) -> CollaboratorResult<Vec<EntityMention>> {
        let response = post_json(
            &self.client,
            Self::NAME,
            &self.endpoint,
            &RecognizeRequest { text },
        )?;
        let mentions = match decode::<RecognizeResponse>(response, Self::NAME)? {
            RecognizeResponse::Bare(mentions) => mentions,
            RecognizeResponse::Wrapped { entities } => entities,
        };
        Ok(mentions)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[derive(Serialize)]
struct ImageRequest {
    image: String,
}

#[derive(Deserialize)]
struct CaptionResponse {
    caption: String,
}

/// Image captioning model served over HTTP. Images are sent as base64 PNG.
#[derive(Debug, Clone)]
pub struct HttpCaptioner {
    client: Client,
    endpoint: String,
}

impl HttpCaptioner {
    const NAME: &'static str = "captioner";

    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(Self::NAME, timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

impl Captioner for HttpCaptioner {
    fn caption(&self, image: &DynamicImage) -> CollaboratorResult<String> {
        let request = ImageRequest {
            image: encode_png(Self::NAME, image)?,
        };
        let response = post_json(&self.client, Self::NAME, &self.endpoint, &request)?;
        let body: CaptionResponse = decode(response, Self::NAME)?;
        Ok(body.caption.trim().to_string())
    }

    /// Any HTTP answer proves the service is reachable.
    fn warm_up(&self) -> CollaboratorResult<()> {
        self.client
            .get(&self.endpoint)
            .send()
            .map(|_| ())
            .map_err(|e| CollaboratorError::Transport {
                collaborator: Self::NAME,
                message: e.to_string(),
            })
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[derive(Deserialize)]
struct FacesResponse {
    #[serde(default)]
    faces: Vec<FaceBox>,
}

/// Face detection model served over HTTP. Images are sent as base64 PNG and
/// boxes come back as `{"faces": [{"left", "top", "width", "height"}]}`.
#[derive(Debug, Clone)]
pub struct HttpFaceDetector {
    client: Client,
    endpoint: String,
}

impl HttpFaceDetector {
    const NAME: &'static str = "face-detector";

    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(Self::NAME, timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

impl FaceDetector for HttpFaceDetector {
    fn detect_faces(&self, image: &DynamicImage) -> CollaboratorResult<Vec<FaceBox>> {
        let request = ImageRequest {
            image: encode_png(Self::NAME, image)?,
        };
        let response = post_json(&self.client, Self::NAME, &self.endpoint, &request)?;
        let body: FacesResponse = decode(response, Self::NAME)?;
        Ok(body.faces)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[derive(Serialize)]
struct AssessRequest<'a> {
    text: &'a str,
    file_type: &'a str,
}

/// Hosted summarization / risk-assessment service.
#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    client: Client,
    endpoint: String,
}

impl HttpSummarizer {
    const NAME: &'static str = "summarizer";

    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CollaboratorResult<Self> {
        Ok(Self {
            client: build_client(Self::NAME, timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

impl Summarizer for HttpSummarizer {
    fn assess(&self, text: &str, file_type: &str) -> CollaboratorResult<Assessment> {
        let response = post_json(
            &self.client,
            Self::NAME,
            &self.endpoint,
            &AssessRequest { text, file_type },
        )?;
        decode(response, Self::NAME)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
