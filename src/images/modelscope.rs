use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{info, warn};

use super::retry::{BASE_DELAY, Backoff, is_throttled, retry_after};
use super::{GeneratorStatus, ImageError, ImageFuture, ImageGenerator, ImageRequest};

pub const DEFAULT_BASE_URL: &str = "https://api-inference.modelscope.cn/v1/images/generations";
pub const DEFAULT_MODEL: &str = "MusePublic/489_ckpt_FLUX_1";

/// Client for a ModelScope-compatible `images/generations` endpoint.
#[derive(Debug, Clone)]
pub struct ModelScope {
    key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
    retry_delay: Duration,
}

impl ModelScope {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
            retry_delay: BASE_DELAY,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        if !base_url.trim().is_empty() {
            self.base_url = base_url;
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => self.client = client,
            Err(err) => warn!("image client: ignoring timeout setting: {}", err),
        }
        self
    }

    async fn request_image(&self, request: ImageRequest) -> Result<String, ImageError> {
        let body = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "prompt": request.prompt,
        });
        info!("image: generating for prompt \"{}\"", request.prompt);

        let mut backoff = Backoff::new(self.retry_delay);
        loop {
            let response = self
                .client
                .post(&self.base_url)
                .bearer_auth(&self.key)
                .json(&body)
                .send()
                .await
                .map_err(|err| ImageError::Network(err.to_string()))?;

            let status = response.status();
            let retry_after = retry_after(response.headers());
            let text = response
                .text()
                .await
                .map_err(|err| ImageError::Network(err.to_string()))?;
            if status.is_success() {
                let url = extract_image_url(&text)?;
                info!("image: generated {}", url);
                return Ok(url);
            }
            if is_throttled(status) && backoff.wait(retry_after).await {
                continue;
            }
            let message = extract_error_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            return Err(ImageError::Http {
                status: status.as_u16(),
                message,
            });
        }
    }
}

impl ImageGenerator for ModelScope {
    fn generate(&self, request: ImageRequest) -> ImageFuture {
        let client = self.clone();
        Box::pin(async move { client.request_image(request).await })
    }

    fn status(&self) -> GeneratorStatus {
        GeneratorStatus {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    images: Vec<GeneratedEntry>,
}

#[derive(Debug, Deserialize)]
struct GeneratedEntry {
    url: String,
}

fn extract_image_url(text: &str) -> Result<String, ImageError> {
    let response: GenerationResponse = serde_json::from_str(text)
        .map_err(|err| ImageError::MalformedResponse(format!("invalid JSON: {}", err)))?;
    response
        .images
        .into_iter()
        .next()
        .map(|entry| entry.url)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ImageError::MalformedResponse("response contains no images".to_string()))
}

fn extract_error_message(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    let message = value
        .get("message")
        .or_else(|| value.get("error").and_then(|error| error.get("message")))
        .or_else(|| value.get("errors").and_then(|error| error.get("message")))
        .or_else(|| value.get("error"))?;
    message
        .as_str()
        .map(str::to_string)
        .filter(|message| !message.trim().is_empty())
}
