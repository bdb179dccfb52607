//! Image generation client and batch fan-out.

use futures_util::StreamExt;
use futures_util::stream;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{info, warn};

mod modelscope;
mod retry;

pub use modelscope::{DEFAULT_BASE_URL, DEFAULT_MODEL, ModelScope};

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("image API request failed (status {status}): {message}")]
    Http { status: u16, message: String },
    #[error("unable to reach the image API: {0}")]
    Network(String),
    #[error("image API returned a malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
        }
    }
}

/// Result of one prompt within a batch. Failures carry an empty URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOutcome {
    pub prompt: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && !self.image_url.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorStatus {
    pub model: String,
    pub base_url: String,
}

pub type ImageFuture = Pin<Box<dyn Future<Output = Result<String, ImageError>> + Send>>;

pub trait ImageGenerator: Send + Sync {
    /// Generate one image and return its URL.
    fn generate(&self, request: ImageRequest) -> ImageFuture;
    fn status(&self) -> GeneratorStatus;
}

/// Generate one image per prompt with at most `batch_size` requests in flight.
///
/// Output order matches `prompts`; a failed request never affects its siblings.
pub async fn generate_batch<G>(
    generator: &G,
    prompts: &[String],
    batch_size: usize,
) -> Vec<ImageOutcome>
where
    G: ImageGenerator + ?Sized,
{
    info!(
        "image batch: {} prompts, batch size {}",
        prompts.len(),
        batch_size.max(1)
    );
    let outcomes: Vec<ImageOutcome> = stream::iter(prompts.iter().cloned().enumerate())
        .map(|(index, prompt)| async move {
            match generator.generate(ImageRequest::new(prompt.clone())).await {
                Ok(image_url) => ImageOutcome {
                    prompt,
                    image_url,
                    error: None,
                },
                Err(err) => {
                    warn!("image batch: item {} failed: {}", index + 1, err);
                    ImageOutcome {
                        prompt,
                        image_url: String::new(),
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .buffered(batch_size.max(1))
        .collect()
        .await;
    outcomes
}
