use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Webpage,
    Article,
    Document,
}

/// Where a placeholder lives in its source document.
///
/// Markup analysis fills `selector` (plus `section` for content units);
/// text analysis fills `line` and, when a heading is active, `section`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderPosition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlaceholder {
    pub id: String,
    pub context: String,
    #[serde(default)]
    pub suggested_prompt: String,
    #[serde(default)]
    pub position: PlaceholderPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub kind: ContentKind,
    pub placeholders: Vec<ImagePlaceholder>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Style {
    Realistic,
    #[default]
    Illustration,
    Cartoon,
    Artistic,
}

impl Style {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "realistic" => Some(Style::Realistic),
            "illustration" => Some(Style::Illustration),
            "cartoon" => Some(Style::Cartoon),
            "artistic" => Some(Style::Artistic),
            _ => None,
        }
    }
}

// Unknown names degrade to the default instead of failing the whole call.
impl From<String> for Style {
    fn from(value: String) -> Self {
        Style::parse(&value).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Quality {
    Standard,
    #[default]
    High,
    Ultra,
}

impl Quality {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Quality::Standard),
            "high" => Some(Quality::High),
            "ultra" => Some(Quality::Ultra),
            _ => None,
        }
    }
}

impl From<String> for Quality {
    fn from(value: String) -> Self {
        Quality::parse(&value).unwrap_or_default()
    }
}

/// Accepted for compatibility; prompts are always emitted in English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Language {
    #[default]
    Auto,
    Chinese,
    English,
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "chinese" => Language::Chinese,
            "english" => Language::English,
            _ => Language::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptConfig {
    pub style: Style,
    pub quality: Quality,
    pub include_style: bool,
    pub language: Language,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            style: Style::default(),
            quality: Quality::default(),
            include_style: true,
            language: Language::default(),
        }
    }
}

/// Per-call prompt options; unset fields fall back to configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptOverrides {
    pub style: Option<Style>,
    pub quality: Option<Quality>,
    pub include_style: Option<bool>,
    pub language: Option<Language>,
}

impl PromptOverrides {
    pub fn apply(&self, base: PromptConfig) -> PromptConfig {
        PromptConfig {
            style: self.style.unwrap_or(base.style),
            quality: self.quality.unwrap_or(base.quality),
            include_style: self.include_style.unwrap_or(base.include_style),
            language: self.language.unwrap_or(base.language),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessConfig {
    #[serde(flatten)]
    pub prompt: PromptOverrides,
    pub max_images: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Hero,
    Icon,
    Illustration,
    Photo,
}

impl ImageType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hero" => Some(ImageType::Hero),
            "icon" => Some(ImageType::Icon),
            "illustration" => Some(ImageType::Illustration),
            "photo" => Some(ImageType::Photo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub placeholder: ImagePlaceholder,
    pub image_url: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebpageFillResult {
    pub original_content: String,
    pub modified_content: String,
    pub generated_images: Vec<GeneratedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_style_falls_back_to_illustration() {
        let overrides: PromptOverrides =
            serde_json::from_value(json!({ "style": "icon-like", "quality": "ultra" }))
                .expect("overrides");
        let config = overrides.apply(PromptConfig::default());
        assert_eq!(config.style, Style::Illustration);
        assert_eq!(config.quality, Quality::Ultra);
        assert!(config.include_style);
    }

    #[test]
    fn placeholder_uses_camel_case_fields() {
        let placeholder = ImagePlaceholder {
            id: "img-0".to_string(),
            context: "hero".to_string(),
            suggested_prompt: "banner".to_string(),
            position: PlaceholderPosition {
                selector: Some("#hero".to_string()),
                line: None,
                section: None,
            },
            size: None,
            alt: None,
        };
        let value = serde_json::to_value(&placeholder).expect("serialize");
        assert_eq!(value["suggestedPrompt"], "banner");
        assert_eq!(value["position"]["selector"], "#hero");
        assert!(value["position"].get("line").is_none());
        assert!(value.get("alt").is_none());
    }

    #[test]
    fn process_config_reads_flattened_prompt_fields() {
        let config: ProcessConfig =
            serde_json::from_value(json!({ "style": "cartoon", "maxImages": 3 }))
                .expect("config");
        assert_eq!(config.prompt.style, Some(Style::Cartoon));
        assert_eq!(config.max_images, Some(3));
    }
}
