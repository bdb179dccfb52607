use anyhow::{Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod analysis;
pub mod images;
pub mod logging;
pub mod mcp;
pub mod prompts;
pub mod server;
pub mod settings;
pub mod splice;
pub mod tables;
pub mod tools;
pub mod types;

#[cfg(test)]
mod test_util;

pub use analysis::{analyze_markup, analyze_text};
pub use images::{ImageError, ImageGenerator, ImageOutcome, ImageRequest, ModelScope};
pub use settings::Settings;
pub use splice::fill_images_into_html;
pub use tools::{ToolError, ToolService};
pub use types::{AnalysisResult, ImagePlaceholder, PromptConfig};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub settings_path: Option<String>,
}

/// Load settings and pre-configure the image client when a key is available.
pub fn build_service(config: Config) -> Result<ToolService> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(model) = config.model.filter(|model| !model.trim().is_empty()) {
        settings.image_model = model;
    }
    if let Some(base_url) = config.base_url.filter(|url| !url.trim().is_empty()) {
        settings.image_base_url = base_url;
    }

    let key = settings::resolve_key(config.key.as_deref());
    let client = key.map(|key| settings.image_client(key));
    let service = ToolService::new(settings);
    Ok(match client {
        Some(client) => {
            info!("image client configured from key (model={})", client.status().model);
            service.with_generator(Arc::new(client))
        }
        None => service,
    })
}

/// One-shot analysis used by `--analyze`.
pub fn analyze_to_json(mode: &str, input: &str) -> Result<String> {
    let result = match mode {
        "webpage" => analyze_markup(input),
        "article" => analyze_text(input),
        other => return Err(anyhow!("unknown analyze mode: {}", other)),
    };
    Ok(serde_json::to_string_pretty(&result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn analyze_to_json_rejects_unknown_mode() {
        assert!(analyze_to_json("pdf", "x").is_err());
        let output = analyze_to_json("article", "").expect("json");
        let value: serde_json::Value = serde_json::from_str(&output).expect("parse");
        assert_eq!(value["kind"], "article");
    }

    #[tokio::test]
    async fn explicit_key_preconfigures_the_client() {
        let service = with_temp_home(|_| {
            build_service(Config {
                key: Some("k".to_string()),
                model: Some("custom/model".to_string()),
                ..Config::default()
            })
        })
        .expect("service");
        assert_eq!(service.settings().image_model, "custom/model");
        let status = service.status().await;
        assert_eq!(status["apiConfigured"], true);
        assert_eq!(status["imageApi"]["model"], "custom/model");
    }
}
