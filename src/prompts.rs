//! Rule-based translation of placeholder context into English image prompts.

use crate::analysis::{char_len, truncate_chars};
use crate::tables::{
    CLOSING_PHRASE, GENERIC_INTERFACE_PHRASE, KEYWORD_MAP, OPTIMIZE_COMPOSITION_PHRASE,
    OPTIMIZE_QUALITY_PHRASE, SAMPLE_PROMPTS, TOPIC_RULES, image_type_suffix, quality_phrase,
    style_phrase,
};
use crate::types::{ImagePlaceholder, ImageType, PromptConfig};

pub const MAX_PROMPT_CHARS: usize = 300;
const MAX_MAPPED_TERMS: usize = 3;
const ENGLISH_RATIO: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    pub placeholder: ImagePlaceholder,
    pub prompt: String,
}

/// Build the final prompt for one placeholder: core content, optional style,
/// quality and a closing phrase, clipped to [`MAX_PROMPT_CHARS`].
pub fn generate(placeholder: &ImagePlaceholder, config: &PromptConfig) -> String {
    let mut prompt = core_content(&placeholder.context, &placeholder.suggested_prompt);
    if config.include_style {
        prompt.push_str(", ");
        prompt.push_str(style_phrase(config.style));
    }
    prompt.push_str(", ");
    prompt.push_str(quality_phrase(config.quality));
    prompt.push_str(", ");
    prompt.push_str(CLOSING_PHRASE);

    if char_len(&prompt) > MAX_PROMPT_CHARS {
        prompt = format!("{}...", truncate_chars(&prompt, MAX_PROMPT_CHARS - 3));
    }
    prompt.trim().to_string()
}

/// One prompt per placeholder, in input order.
pub fn generate_batch(
    placeholders: &[ImagePlaceholder],
    config: &PromptConfig,
) -> Vec<PromptResult> {
    placeholders
        .iter()
        .map(|placeholder| PromptResult {
            placeholder: placeholder.clone(),
            prompt: generate(placeholder, config),
        })
        .collect()
}

/// Lowercase, drop repeated comma-separated terms, then make sure the prompt
/// asks for quality and composition.
pub fn optimize(prompt: &str) -> String {
    let mut terms: Vec<String> = Vec::new();
    for term in prompt.split(',') {
        let term = term.trim().to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }

    let joined = terms.join(", ");
    let needs_quality = !joined.contains("quality") && !joined.contains("detailed");
    let needs_composition = !joined.contains("composition") && !joined.contains("layout");
    for (needed, phrase) in [
        (needs_quality, OPTIMIZE_QUALITY_PHRASE),
        (needs_composition, OPTIMIZE_COMPOSITION_PHRASE),
    ] {
        if needed && !terms.iter().any(|term| term == phrase) {
            terms.push(phrase.to_string());
        }
    }
    terms.join(", ")
}

pub fn adjust_for_image_type(prompt: &str, image_type: &str) -> String {
    match ImageType::parse(image_type) {
        Some(image_type) => format!("{}, {}", prompt, image_type_suffix(image_type)),
        None => prompt.to_string(),
    }
}

pub fn sample_prompts() -> Vec<String> {
    SAMPLE_PROMPTS.iter().map(|prompt| prompt.to_string()).collect()
}

/// ASCII letters and whitespace make up more than 70% of the characters.
pub fn is_english(text: &str) -> bool {
    let total = char_len(text);
    if total == 0 {
        return false;
    }
    let english = text
        .chars()
        .filter(|ch| ch.is_ascii_alphabetic() || ch.is_whitespace())
        .count();
    english as f64 / total as f64 > ENGLISH_RATIO
}

fn core_content(context: &str, suggested_prompt: &str) -> String {
    if is_english(suggested_prompt) {
        return suggested_prompt.to_string();
    }
    let terms: Vec<&str> = KEYWORD_MAP
        .iter()
        .filter(|(source, _)| context.contains(source))
        .map(|(_, english)| *english)
        .take(MAX_MAPPED_TERMS)
        .collect();
    if terms.is_empty() {
        topic_phrase(context).to_string()
    } else {
        terms.join(", ")
    }
}

fn topic_phrase(context: &str) -> &'static str {
    TOPIC_RULES
        .iter()
        .find(|rule| rule.patterns.iter().any(|pattern| context.contains(pattern)))
        .map(|rule| rule.phrase)
        .unwrap_or(GENERIC_INTERFACE_PHRASE)
}
