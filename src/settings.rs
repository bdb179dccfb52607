use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::images::{DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_MODEL, ModelScope};
use crate::types::{PromptConfig, Quality, Style};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
pub const DEFAULT_MAX_IMAGES: usize = 10;
const API_KEY_ENV: &[&str] = &["AIPIC_API_KEY", "MODELSCOPE_API_KEY"];

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub image_model: String,
    pub image_base_url: String,
    pub batch_size: usize,
    pub timeout: Option<Duration>,
    pub prompt: PromptConfig,
    pub max_images: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_model: DEFAULT_MODEL.to_string(),
            image_base_url: DEFAULT_BASE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: None,
            prompt: PromptConfig::default(),
            max_images: DEFAULT_MAX_IMAGES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    image: Option<ImageSettings>,
    prompt: Option<PromptSettings>,
    process: Option<ProcessSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageSettings {
    model: Option<String>,
    base_url: Option<String>,
    batch_size: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PromptSettings {
    style: Option<String>,
    quality: Option<String>,
    include_style: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ProcessSettings {
    max_images: Option<usize>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings
                .merge_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    /// Build an image client from these settings and the given key.
    pub fn image_client(&self, key: impl Into<String>) -> ModelScope {
        let client = ModelScope::new(key)
            .with_model(self.image_model.clone())
            .with_base_url(self.image_base_url.clone());
        match self.timeout {
            Some(timeout) => client.with_timeout(timeout),
            None => client,
        }
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(image) = incoming.image {
            if let Some(model) = image.model
                && !model.trim().is_empty()
            {
                self.image_model = model;
            }
            if let Some(base_url) = image.base_url
                && !base_url.trim().is_empty()
            {
                self.image_base_url = base_url;
            }
            if let Some(size) = image.batch_size
                && size > 0
            {
                self.batch_size = size;
            }
            if let Some(secs) = image.timeout_secs
                && secs > 0
            {
                self.timeout = Some(Duration::from_secs(secs));
            }
        }
        if let Some(prompt) = incoming.prompt {
            if let Some(style) = prompt.style.as_deref().and_then(Style::parse) {
                self.prompt.style = style;
            }
            if let Some(quality) = prompt.quality.as_deref().and_then(Quality::parse) {
                self.prompt.quality = quality;
            }
            if let Some(include_style) = prompt.include_style {
                self.prompt.include_style = include_style;
            }
        }
        if let Some(process) = incoming.process
            && let Some(max_images) = process.max_images
            && max_images > 0
        {
            self.max_images = max_images;
        }
    }
}

/// CLI override first, then the environment.
pub fn resolve_key(override_key: Option<&str>) -> Option<String> {
    if let Some(key) = override_key.filter(|key| !key.trim().is_empty()) {
        return Some(key.to_string());
    }
    API_KEY_ENV.iter().find_map(|name| get_env(name))
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".aipic-rust"))
        }
    })
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
