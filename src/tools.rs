//! Named operations shared by the MCP and HTTP transports.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::analysis::{analyze_markup, analyze_text, char_len, truncate_chars};
use crate::images::{self, ImageGenerator, ImageOutcome, ImageRequest};
use crate::prompts;
use crate::settings::Settings;
use crate::splice::fill_images_into_html;
use crate::types::{
    AnalysisResult, ImagePlaceholder, ProcessConfig, PromptConfig, PromptOverrides,
    WebpageFillResult,
};

pub const SERVER_NAME: &str = "aipic-rust";
const VALIDATION_PROMPT: &str = "A simple test image";
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("image generation is not configured; call configure-api with an API key first")]
    NotConfigured,
    #[error("{0}")]
    Failed(String),
}

pub struct ToolService {
    settings: Settings,
    generator: RwLock<Option<Arc<dyn ImageGenerator>>>,
}

impl ToolService {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            generator: RwLock::new(None),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.generator = RwLock::new(Some(generator));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn configure(&self, generator: Arc<dyn ImageGenerator>) {
        *self.generator.write().await = Some(generator);
    }

    async fn current_generator(&self) -> Option<Arc<dyn ImageGenerator>> {
        self.generator.read().await.clone()
    }

    pub async fn call(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        debug!("tool call: {}", name);
        match name {
            "configure-api" => self.configure_api(parse_args(arguments)?).await,
            "analyze-webpage" => {
                let args: AnalyzeWebpageArgs = parse_args(arguments)?;
                let html = required(args.html_content, "htmlContent")?;
                Ok(analysis_payload(&analyze_markup(&html), "the webpage"))
            }
            "analyze-article" => {
                let args: AnalyzeArticleArgs = parse_args(arguments)?;
                let text = required(args.text_content, "textContent")?;
                Ok(analysis_payload(&analyze_text(&text), "the article"))
            }
            "generate-prompts" => self.generate_prompts(parse_args(arguments)?),
            "optimize-prompt" => {
                let args: OptimizeArgs = parse_args(arguments)?;
                let prompt = required(args.prompt, "prompt")?;
                Ok(json!({ "prompt": prompts::optimize(&prompt) }))
            }
            "adjust-prompt" => {
                let args: AdjustArgs = parse_args(arguments)?;
                let prompt = required(args.prompt, "prompt")?;
                let image_type = required(args.image_type, "imageType")?;
                Ok(json!({ "prompt": prompts::adjust_for_image_type(&prompt, &image_type) }))
            }
            "generate-images" => self.generate_images(parse_args(arguments)?).await,
            "process-webpage-complete" => {
                self.process_webpage_complete(parse_args(arguments)?).await
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn configure_api(&self, args: ConfigureArgs) -> Result<Value, ToolError> {
        let key = required(args.api_key, "apiKey")?;
        if key.trim().is_empty() {
            return Err(ToolError::InvalidArguments("apiKey is empty".to_string()));
        }
        let mut client = self.settings.image_client(key);
        if let Some(model) = args.model_id {
            client = client.with_model(model);
        }
        if let Some(base_url) = args.base_url {
            client = client.with_base_url(base_url);
        }
        let status = client.status();
        let generator: Arc<dyn ImageGenerator> = Arc::new(client);
        self.configure(generator.clone()).await;
        info!("image client configured (model={})", status.model);

        if args.validate.unwrap_or(true) {
            generator
                .generate(ImageRequest::new(VALIDATION_PROMPT))
                .await
                .map_err(|err| ToolError::Failed(format!("API key validation failed: {}", err)))?;
        }
        Ok(json!({
            "message": "API configured; image generation is ready.",
            "model": status.model,
            "baseUrl": status.base_url,
        }))
    }

    fn generate_prompts(&self, args: GeneratePromptsArgs) -> Result<Value, ToolError> {
        let placeholders = required(args.placeholders, "placeholders")?;
        let config = args.config.unwrap_or_default().apply(self.settings.prompt);
        let results = prompts::generate_batch(&placeholders, &config);
        let entries: Vec<Value> = results
            .iter()
            .map(|result| {
                json!({
                    "placeholderId": result.placeholder.id,
                    "context": preview(&result.placeholder.context),
                    "prompt": result.prompt,
                })
            })
            .collect();
        Ok(json!({
            "count": entries.len(),
            "prompts": entries,
        }))
    }

    async fn generate_images(&self, args: GenerateImagesArgs) -> Result<Value, ToolError> {
        let prompts = required(args.prompts, "prompts")?;
        let generator = self.current_generator().await.ok_or(ToolError::NotConfigured)?;
        let batch_size = args
            .batch_size
            .filter(|size| *size > 0)
            .unwrap_or(self.settings.batch_size);
        let results = images::generate_batch(generator.as_ref(), &prompts, batch_size).await;
        Ok(images_payload(&results))
    }

    async fn process_webpage_complete(&self, args: ProcessArgs) -> Result<Value, ToolError> {
        let html = required(args.html_content, "htmlContent")?;
        let generator = match args.api_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => Arc::new(self.settings.image_client(key)) as Arc<dyn ImageGenerator>,
            None => self
                .current_generator()
                .await
                .ok_or(ToolError::NotConfigured)?,
        };
        let config = args.config.unwrap_or_default();
        let max_images = config
            .max_images
            .filter(|max| *max > 0)
            .unwrap_or(self.settings.max_images);
        let prompt_config = config.prompt.apply(self.settings.prompt);

        let mut placeholders = analyze_markup(&html).placeholders;
        placeholders.truncate(max_images);
        let result = fill_placeholders(
            generator.as_ref(),
            &html,
            &placeholders,
            &prompt_config,
            self.settings.batch_size,
        )
        .await;
        let mut payload = serde_json::to_value(&result)
            .map_err(|err| ToolError::Failed(err.to_string()))?;
        if placeholders.is_empty() {
            payload["message"] = json!("No locations needing images were found in the webpage");
        }
        Ok(payload)
    }

    pub async fn status(&self) -> Value {
        let image_api = self
            .current_generator()
            .await
            .map(|generator| generator.status());
        let image_service = if image_api.is_some() {
            "configured"
        } else {
            "needs an API key (configure-api)"
        };
        json!({
            "server": format!("{} v{}", SERVER_NAME, env!("CARGO_PKG_VERSION")),
            "apiConfigured": image_api.is_some(),
            "imageApi": image_api,
            "services": {
                "contentAnalysis": "available",
                "promptGeneration": "available",
                "imageGeneration": image_service,
            },
            "supportedFeatures": [
                "webpage analysis",
                "article analysis",
                "English prompt generation",
                "AI image generation",
                "one-step webpage processing"
            ]
        })
    }
}

/// Analyze, prompt, generate and splice in one pass.
///
/// At most `max_images` placeholders are processed. Image failures are left
/// out of the splice instead of failing the whole run.
pub async fn process_webpage<G>(
    generator: &G,
    html: &str,
    config: &PromptConfig,
    max_images: usize,
    batch_size: usize,
) -> WebpageFillResult
where
    G: ImageGenerator + ?Sized,
{
    let mut placeholders = analyze_markup(html).placeholders;
    placeholders.truncate(max_images);
    fill_placeholders(generator, html, &placeholders, config, batch_size).await
}

/// Prompt, generate and splice for placeholders already found in `html`.
/// An empty list returns the page untouched without calling the generator.
pub async fn fill_placeholders<G>(
    generator: &G,
    html: &str,
    placeholders: &[ImagePlaceholder],
    config: &PromptConfig,
    batch_size: usize,
) -> WebpageFillResult
where
    G: ImageGenerator + ?Sized,
{
    if placeholders.is_empty() {
        return fill_images_into_html(html, &[], &[]);
    }
    let prompts: Vec<String> = prompts::generate_batch(placeholders, config)
        .into_iter()
        .map(|result| result.prompt)
        .collect();
    let outcomes = images::generate_batch(generator, &prompts, batch_size).await;
    fill_images_into_html(html, placeholders, &outcomes)
}

pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "configure-api",
            "description": "Configure the image generation API key (ModelScope compatible).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "apiKey": { "type": "string", "description": "Image API key." },
                    "modelId": { "type": "string", "description": "Optional model id (default FLUX)." },
                    "baseUrl": { "type": "string", "description": "Optional endpoint URL." },
                    "validate": { "type": "boolean", "description": "Generate a test image to check the key (default true)." }
                },
                "required": ["apiKey"]
            }
        }),
        json!({
            "name": "analyze-webpage",
            "description": "Analyze HTML and find locations that need images.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "htmlContent": { "type": "string", "description": "HTML source of the page." }
                },
                "required": ["htmlContent"]
            }
        }),
        json!({
            "name": "analyze-article",
            "description": "Analyze article or document text and find locations that need images.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "textContent": { "type": "string", "description": "Plain text or markdown." }
                },
                "required": ["textContent"]
            }
        }),
        json!({
            "name": "generate-prompts",
            "description": "Generate English image prompts for placeholders.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "placeholders": {
                        "type": "array",
                        "items": placeholder_schema(),
                        "description": "Placeholders returned by an analyze tool."
                    },
                    "config": prompt_config_schema()
                },
                "required": ["placeholders"]
            }
        }),
        json!({
            "name": "optimize-prompt",
            "description": "Deduplicate a prompt and ensure quality and composition terms.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" }
                },
                "required": ["prompt"]
            }
        }),
        json!({
            "name": "adjust-prompt",
            "description": "Append image-type specific wording to a prompt.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "prompt": { "type": "string" },
                    "imageType": { "type": "string", "enum": ["hero", "icon", "illustration", "photo"] }
                },
                "required": ["prompt", "imageType"]
            }
        }),
        json!({
            "name": "generate-images",
            "description": "Generate images for English prompts.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "prompts": { "type": "array", "items": { "type": "string" } },
                    "batchSize": { "type": "integer", "minimum": 1, "description": "Concurrent requests (default 5)." }
                },
                "required": ["prompts"]
            }
        }),
        json!({
            "name": "process-webpage-complete",
            "description": "Analyze a page, generate prompts and images, and return the modified HTML.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "htmlContent": { "type": "string" },
                    "apiKey": { "type": "string" },
                    "config": {
                        "type": "object",
                        "properties": {
                            "style": { "type": "string", "enum": ["realistic", "illustration", "cartoon", "artistic"] },
                            "quality": { "type": "string", "enum": ["standard", "high", "ultra"] },
                            "includeStyle": { "type": "boolean" },
                            "maxImages": { "type": "integer", "minimum": 1, "description": "Default 10." }
                        }
                    }
                },
                "required": ["htmlContent", "apiKey"]
            }
        }),
    ]
}

fn placeholder_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string" },
            "context": { "type": "string" },
            "suggestedPrompt": { "type": "string" },
            "position": {
                "type": "object",
                "properties": {
                    "selector": { "type": "string" },
                    "line": { "type": "integer" },
                    "section": { "type": "string" }
                }
            },
            "size": {
                "type": "object",
                "properties": {
                    "width": { "type": "number" },
                    "height": { "type": "number" },
                    "aspectRatio": { "type": "string" }
                }
            },
            "alt": { "type": "string" }
        },
        "required": ["id", "context", "suggestedPrompt", "position"]
    })
}

fn prompt_config_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "style": { "type": "string", "enum": ["realistic", "illustration", "cartoon", "artistic"] },
            "quality": { "type": "string", "enum": ["standard", "high", "ultra"] },
            "includeStyle": { "type": "boolean" },
            "language": { "type": "string", "enum": ["auto", "chinese", "english"] }
        }
    })
}

fn analysis_payload(result: &AnalysisResult, target: &str) -> Value {
    json!({
        "summary": format!(
            "Found {} locations in {} that could use an image",
            result.placeholders.len(),
            target
        ),
        "kind": result.kind,
        "placeholders": result.placeholders,
        "suggestions": result.suggestions,
    })
}

fn images_payload(results: &[ImageOutcome]) -> Value {
    let success = results.iter().filter(|result| result.is_success()).count();
    let failure = results.len() - success;
    json!({
        "summary": format!("Generated {} images, {} failed", success, failure),
        "successCount": success,
        "failureCount": failure,
        "results": results,
    })
}

fn preview(text: &str) -> String {
    if char_len(text) > PREVIEW_CHARS {
        format!("{}...", truncate_chars(text, PREVIEW_CHARS))
    } else {
        text.to_string()
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, ToolError> {
    value.ok_or_else(|| ToolError::InvalidArguments(format!("{} is required", name)))
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ConfigureArgs {
    api_key: Option<String>,
    model_id: Option<String>,
    base_url: Option<String>,
    validate: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct AnalyzeWebpageArgs {
    html_content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct AnalyzeArticleArgs {
    text_content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct GeneratePromptsArgs {
    placeholders: Option<Vec<ImagePlaceholder>>,
    config: Option<PromptOverrides>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct OptimizeArgs {
    prompt: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct AdjustArgs {
    prompt: Option<String>,
    image_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct GenerateImagesArgs {
    prompts: Option<Vec<String>>,
    batch_size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ProcessArgs {
    html_content: Option<String>,
    api_key: Option<String>,
    config: Option<ProcessConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{GeneratorStatus, ImageError, ImageFuture};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    impl ImageGenerator for CountingGenerator {
        fn generate(&self, request: ImageRequest) -> ImageFuture {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if request.prompt.contains("fail") {
                    return Err(ImageError::Network("connection reset".to_string()));
                }
                Ok(format!("https://images.test/{}.png", call))
            })
        }

        fn status(&self) -> GeneratorStatus {
            GeneratorStatus {
                model: "counting".to_string(),
                base_url: "memory://".to_string(),
            }
        }
    }

    struct FailingGenerator;

    impl ImageGenerator for FailingGenerator {
        fn generate(&self, _request: ImageRequest) -> ImageFuture {
            Box::pin(async {
                Err(ImageError::Http {
                    status: 500,
                    message: "model crashed".to_string(),
                })
            })
        }

        fn status(&self) -> GeneratorStatus {
            GeneratorStatus {
                model: "failing".to_string(),
                base_url: "memory://".to_string(),
            }
        }
    }

    fn service() -> ToolService {
        ToolService::new(Settings::default())
    }

    #[tokio::test]
    async fn generate_images_requires_configuration() {
        let err = service()
            .call("generate-images", json!({ "prompts": ["a"] }))
            .await
            .expect_err("not configured");
        assert!(matches!(err, ToolError::NotConfigured));
    }

    #[tokio::test]
    async fn generate_images_reports_counts() {
        let service = service().with_generator(Arc::new(CountingGenerator::default()));
        let value = service
            .call(
                "generate-images",
                json!({ "prompts": ["a", "fail b", "c"], "batchSize": 2 }),
            )
            .await
            .expect("images");
        assert_eq!(value["successCount"], 2);
        assert_eq!(value["failureCount"], 1);
        assert_eq!(value["results"][1]["imageUrl"], "");
        assert!(value["results"][1]["error"].as_str().is_some());
        assert!(value["results"][0].get("error").is_none());
    }

    #[tokio::test]
    async fn analyze_and_prompt_round_trip_through_json() {
        let service = service();
        let analysis = service
            .call(
                "analyze-webpage",
                json!({ "htmlContent": r#"<div class="hero"><h1>Product</h1><img src="https://example.com/placeholder.png"></div>"# }),
            )
            .await
            .expect("analysis");
        assert_eq!(analysis["kind"], "webpage");
        let placeholders = analysis["placeholders"].clone();
        let prompts = service
            .call(
                "generate-prompts",
                json!({ "placeholders": placeholders, "config": { "style": "icon-like" } }),
            )
            .await
            .expect("prompts");
        assert_eq!(prompts["count"], 1);
        assert_eq!(prompts["prompts"][0]["placeholderId"], "img-0");
        let prompt = prompts["prompts"][0]["prompt"].as_str().expect("prompt");
        assert!(prompt.contains("digital illustration, vector art, clean design"));
    }

    #[tokio::test]
    async fn missing_arguments_are_reported() {
        let err = service()
            .call("analyze-article", json!({}))
            .await
            .expect_err("missing");
        assert_eq!(err.to_string(), "invalid arguments: textContent is required");
        let err = service()
            .call("draw", json!({}))
            .await
            .expect_err("unknown");
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn process_webpage_splices_successful_images() {
        let html = r#"<section><img alt="city skyline"></section><p>plain</p>"#;
        let generator = CountingGenerator::default();
        let result = process_webpage(&generator, html, &PromptConfig::default(), 10, 5).await;
        assert_eq!(result.generated_images.len(), 1);
        assert!(result.modified_content.contains(r#"src="https://images.test/0.png""#));
        assert!(result.modified_content.contains(r#"alt="city skyline""#));
        assert_eq!(result.original_content, html);
    }

    #[tokio::test]
    async fn process_webpage_without_placeholders_skips_generation() {
        let generator = CountingGenerator::default();
        let result =
            process_webpage(&generator, "<p>hello</p>", &PromptConfig::default(), 10, 5).await;
        assert_eq!(result.modified_content, "<p>hello</p>");
        assert!(result.generated_images.is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn images_hidden_from_the_parser_are_never_overwritten() {
        for hidden in [
            r#"<noscript><img src="https://cdn.real/logo.jpg"></noscript>"#,
            r#"<!-- <img src="https://cdn.real/old.png"> -->"#,
        ] {
            let html = format!(
                r#"<body>{}<div><img src="https://via.placeholder.com/1"></div></body>"#,
                hidden
            );
            let generator = CountingGenerator::default();
            let result =
                process_webpage(&generator, &html, &PromptConfig::default(), 10, 5).await;
            assert_eq!(result.generated_images.len(), 1);
            assert_eq!(result.generated_images[0].placeholder.id, "img-0");
            assert!(result.modified_content.contains(hidden), "{hidden}");
            assert!(!result.modified_content.contains("via.placeholder.com"));
            assert!(result
                .modified_content
                .contains(r#"<div><img src="https://images.test/0.png""#));
        }
    }

    #[tokio::test]
    async fn no_placeholder_message_only_when_analysis_finds_nothing() {
        let service = service().with_generator(Arc::new(FailingGenerator));
        let failed = service
            .call(
                "process-webpage-complete",
                json!({ "htmlContent": "<div><img></div>" }),
            )
            .await
            .expect("result");
        assert_eq!(failed["generatedImages"], json!([]));
        assert_eq!(failed["modifiedContent"], "<div><img></div>");
        assert!(failed.get("message").is_none());

        let empty = service
            .call(
                "process-webpage-complete",
                json!({ "htmlContent": "<p>hello</p>" }),
            )
            .await
            .expect("result");
        assert_eq!(empty["modifiedContent"], "<p>hello</p>");
        assert!(empty["message"].is_string());
    }

    #[tokio::test]
    async fn max_images_caps_requests() {
        let html = "<img><img><img>";
        let generator = CountingGenerator::default();
        let result = process_webpage(&generator, html, &PromptConfig::default(), 2, 5).await;
        assert_eq!(result.generated_images.len(), 2);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn status_reflects_configuration() {
        let service = service();
        assert_eq!(service.status().await["apiConfigured"], false);
        service.configure(Arc::new(CountingGenerator::default())).await;
        let status = service.status().await;
        assert_eq!(status["apiConfigured"], true);
        assert_eq!(status["imageApi"]["model"], "counting");
    }

    #[tokio::test]
    async fn configure_api_installs_client_without_validation() {
        let service = service();
        let value = service
            .call(
                "configure-api",
                json!({ "apiKey": "k", "modelId": "custom/model", "validate": false }),
            )
            .await
            .expect("configured");
        assert_eq!(value["model"], "custom/model");
        let status = service.status().await;
        assert_eq!(status["apiConfigured"], true);
        assert_eq!(status["imageApi"]["model"], "custom/model");

        let err = service
            .call("configure-api", json!({ "apiKey": "  " }))
            .await
            .expect_err("blank key");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn every_tool_has_a_schema() {
        for tool in tool_definitions() {
            assert!(tool["name"].is_string());
            assert_eq!(tool["inputSchema"]["type"], "object");
        }
    }
}
