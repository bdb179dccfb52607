//! Content analysis: finds the spots in a document that would benefit from an
//! illustrative image.
//!
//! Both entry points are pure functions of their input. Any string is valid
//! input; unparseable or empty content simply yields fewer placeholders.

mod article;
mod markup;

pub use article::analyze_text;
pub use markup::analyze_markup;

use crate::tables::{GENERIC_SCORE_PHRASE, IMAGE_CATEGORIES};

/// Score threshold for markup content units and image fallbacks.
pub const MARKUP_THRESHOLD: f64 = 0.6;
/// Score threshold for article lines.
pub const ARTICLE_THRESHOLD: f64 = 0.7;
pub(crate) const CONTEXT_LIMIT: usize = 200;

/// Outcome of the keyword heuristic for one piece of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageNeed {
    pub score: f64,
    pub phrase: &'static str,
}

impl ImageNeed {
    pub fn is_generic(&self) -> bool {
        self.phrase == GENERIC_SCORE_PHRASE
    }
}

/// Bag-of-keywords score in `[0, 1]` plus the phrase of the winning category.
///
/// Each category contributes `weight * matched / total`. The best score wins;
/// on a tie the later category in table order takes the phrase.
pub fn score(text: &str) -> ImageNeed {
    let mut best = 0.0;
    let mut phrase = None;
    for category in IMAGE_CATEGORIES {
        let matched = category
            .keywords
            .iter()
            .filter(|keyword| text.contains(*keyword))
            .count();
        if matched == 0 {
            continue;
        }
        let candidate = category.weight * (matched as f64 / category.keywords.len() as f64);
        if candidate >= best {
            best = candidate;
            phrase = Some(category.phrase);
        }
    }
    ImageNeed {
        score: best,
        phrase: phrase.unwrap_or(GENERIC_SCORE_PHRASE),
    }
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
