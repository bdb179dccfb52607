use regex::Regex;
use std::sync::LazyLock;

use super::{ARTICLE_THRESHOLD, char_len, score};
use crate::types::{AnalysisResult, ContentKind, ImagePlaceholder, PlaceholderPosition};

const MIN_LINE_CHARS: usize = 50;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#+\s|第.+章|第.+节|.+：$|Chapter|Section|[0-9]+\.)")
        .expect("heading pattern")
});
static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s*").expect("heading marker pattern"));

/// Scan plain text or markdown line by line, tracking the active heading.
pub fn analyze_text(text: &str) -> AnalysisResult {
    let mut placeholders = Vec::new();
    let mut section = String::new();

    for (index, line) in text.split('\n').enumerate() {
        let trimmed = line.trim();
        if HEADING.is_match(trimmed) {
            section = HEADING_MARKER.replace(trimmed, "").into_owned();
        }
        if char_len(trimmed) <= MIN_LINE_CHARS {
            continue;
        }
        let need = score(trimmed);
        if need.score <= ARTICLE_THRESHOLD {
            continue;
        }
        let context = if section.is_empty() {
            trimmed.to_string()
        } else {
            format!("{}: {}", section, trimmed)
        };
        placeholders.push(ImagePlaceholder {
            id: format!("line-{}", index),
            context,
            suggested_prompt: need.phrase.to_string(),
            position: PlaceholderPosition {
                selector: None,
                line: Some(index + 1),
                section: (!section.is_empty()).then(|| section.clone()),
            },
            size: None,
            alt: None,
        });
    }

    let suggestions = vec![
        format!(
            "Images are suggested at {} locations in the article",
            placeholders.len()
        ),
        "Diagrams for key concepts and steps make the article easier to follow".to_string(),
        "Consider a header image at the start of each major section".to_string(),
    ];

    AnalysisResult {
        kind: ContentKind::Article,
        placeholders,
        suggestions,
    }
}
