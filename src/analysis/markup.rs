use kuchiki::traits::*;
use kuchiki::{ElementData, NodeDataRef, NodeRef};

use super::{CONTEXT_LIMIT, MARKUP_THRESHOLD, char_len, score, truncate_chars};
use crate::tables::{ALT_PROMPT_SUFFIX, PLACEHOLDER_SRC_MARKERS};
use crate::types::{AnalysisResult, ContentKind, ImagePlaceholder, PlaceholderPosition};

const CONTENT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, div.content, article, section, \
                                .hero, .banner, .feature, .card";
const MIN_CONTENT_CHARS: usize = 20;
const EMPTY_CONTEXT: &str = "image placeholder";

/// Scan HTML for stand-in images and for content blocks that deserve one.
///
/// Stand-in images come first, then content units; each group is in document
/// order and numbered within its own pass.
pub fn analyze_markup(markup: &str) -> AnalysisResult {
    let document = kuchiki::parse_html().one(markup);
    let mut placeholders = image_placeholders(&document);
    placeholders.extend(content_placeholders(&document));

    let suggestions = vec![
        format!(
            "Analyzed the webpage and found {} locations that may need images",
            placeholders.len()
        ),
        "Add illustrations to the main content areas to improve the user experience"
            .to_string(),
        "Product introductions and feature highlights benefit from related images".to_string(),
    ];

    AnalysisResult {
        kind: ContentKind::Webpage,
        placeholders,
        suggestions,
    }
}

fn image_placeholders(document: &NodeRef) -> Vec<ImagePlaceholder> {
    let Ok(images) = document.select("img") else {
        return Vec::new();
    };
    let mut placeholders = Vec::new();
    for (index, image) in images.enumerate() {
        let (src, alt) = {
            let attrs = image.attributes.borrow();
            (
                attrs.get("src").map(str::to_string),
                attrs.get("alt").unwrap_or("").to_string(),
            )
        };
        if !needs_generation(src.as_deref()) {
            continue;
        }
        let context = image_context(image.as_node(), &alt);
        let suggested_prompt = if alt.is_empty() {
            score(&context).phrase.to_string()
        } else {
            format!("{}, {}", alt, ALT_PROMPT_SUFFIX)
        };
        placeholders.push(ImagePlaceholder {
            id: format!("img-{}", index),
            context,
            suggested_prompt,
            position: PlaceholderPosition {
                selector: Some(css_selector(&image)),
                line: None,
                section: None,
            },
            size: None,
            alt: (!alt.is_empty()).then_some(alt),
        });
    }
    placeholders
}

fn content_placeholders(document: &NodeRef) -> Vec<ImagePlaceholder> {
    let Ok(elements) = document.select(CONTENT_SELECTOR) else {
        return Vec::new();
    };
    let mut placeholders = Vec::new();
    for (index, element) in elements.enumerate() {
        let text = element.as_node().text_contents();
        let text = text.trim();
        let length = char_len(text);
        if length <= MIN_CONTENT_CHARS {
            continue;
        }
        let need = score(text);
        if need.score <= MARKUP_THRESHOLD {
            continue;
        }
        let mut context = truncate_chars(text, CONTEXT_LIMIT).to_string();
        if length > CONTEXT_LIMIT {
            context.push_str("...");
        }
        placeholders.push(ImagePlaceholder {
            id: format!("section-{}", index),
            context,
            suggested_prompt: need.phrase.to_string(),
            position: PlaceholderPosition {
                selector: Some(css_selector(&element)),
                line: None,
                section: Some(element.name.local.to_string()),
            },
            size: None,
            alt: None,
        });
    }
    placeholders
}

fn needs_generation(src: Option<&str>) -> bool {
    match src {
        None => true,
        Some(src) => {
            src.is_empty()
                || PLACEHOLDER_SRC_MARKERS
                    .iter()
                    .any(|marker| src.contains(marker))
        }
    }
}

/// Parent text, sibling text and alt text, joined and clipped.
fn image_context(node: &NodeRef, alt: &str) -> String {
    let parent = node.parent();
    let parent_text = parent
        .as_ref()
        .map(|parent| parent.text_contents())
        .unwrap_or_default();
    let sibling_text = parent
        .as_ref()
        .map(|parent| {
            parent
                .children()
                .filter(|child| child != node && child.as_element().is_some())
                .map(|child| child.text_contents())
                .collect::<String>()
        })
        .unwrap_or_default();

    let joined = [parent_text.trim(), sibling_text.trim(), alt]
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let context = truncate_chars(&joined, CONTEXT_LIMIT).trim().to_string();
    if context.is_empty() {
        EMPTY_CONTEXT.to_string()
    } else {
        context
    }
}

/// `#id`, else `tag.class`, else `parent tag:nth-child(n)` counted among
/// same-tag siblings.
fn css_selector(element: &NodeDataRef<ElementData>) -> String {
    let tag = element.name.local.to_string();
    {
        let attrs = element.attributes.borrow();
        if let Some(id) = attrs.get("id")
            && !id.is_empty()
        {
            return format!("#{}", id);
        }
        if let Some(class) = attrs.get("class").and_then(|value| value.split_whitespace().next())
        {
            return format!("{}.{}", tag, class);
        }
    }

    let node = element.as_node();
    let Some(parent) = node.parent() else {
        return tag;
    };
    let position = parent
        .children()
        .elements()
        .filter(|sibling| sibling.name.local == element.name.local)
        .position(|sibling| sibling.as_node() == node)
        .unwrap_or(0);
    match parent.as_element() {
        Some(parent_element) => format!(
            "{} {}:nth-child({})",
            parent_element.name.local,
            tag,
            position + 1
        ),
        None => format!("{}:nth-child({})", tag, position + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::GENERIC_SCORE_PHRASE;

    #[test]
    fn placeholder_image_inside_hero() {
        let html = r#"<div class="hero"><h1>Product</h1><img src="https://example.com/placeholder.png"></div>"#;
        let result = analyze_markup(html);
        assert_eq!(result.kind, ContentKind::Webpage);
        let image = result
            .placeholders
            .iter()
            .find(|placeholder| placeholder.id == "img-0")
            .expect("image placeholder");
        assert_eq!(image.context, "Product Product");
        assert_eq!(image.suggested_prompt, GENERIC_SCORE_PHRASE);
        assert_eq!(
            image.position.selector.as_deref(),
            Some("div img:nth-child(1)")
        );
        assert!(image.alt.is_none());
    }

    #[test]
    fn real_images_are_left_alone() {
        let html = r#"<p>Logo</p><img src="https://cdn.acme.io/logo.png" alt="logo">"#;
        let result = analyze_markup(html);
        assert!(result.placeholders.is_empty());
        assert_eq!(result.suggestions.len(), 3);
        assert!(result.suggestions[0].contains('0'));
    }

    #[test]
    fn alt_text_drives_suggested_prompt() {
        let html = r#"<section><img id="team" alt="team photo"></section>"#;
        let result = analyze_markup(html);
        assert_eq!(result.placeholders.len(), 1);
        let image = &result.placeholders[0];
        assert_eq!(image.id, "img-0");
        assert_eq!(
            image.suggested_prompt,
            "team photo, professional illustration, high quality"
        );
        assert_eq!(image.position.selector.as_deref(), Some("#team"));
        assert_eq!(image.context, "team photo");
        assert_eq!(image.alt.as_deref(), Some("team photo"));
    }

    #[test]
    fn image_ids_count_every_img() {
        let html = r#"<div><img src="https://cdn.acme.io/a.png"><img class="shot wide" src="https://via.placeholder.com/300"></div>"#;
        let result = analyze_markup(html);
        assert_eq!(result.placeholders.len(), 1);
        assert_eq!(result.placeholders[0].id, "img-1");
        assert_eq!(
            result.placeholders[0].position.selector.as_deref(),
            Some("img.shot")
        );
    }

    #[test]
    fn bare_image_gets_fallback_context() {
        let result = analyze_markup("<img>");
        assert_eq!(result.placeholders.len(), 1);
        assert_eq!(result.placeholders[0].context, EMPTY_CONTEXT);
        assert!(!result.placeholders[0].suggested_prompt.is_empty());
    }

    #[test]
    fn content_units_above_threshold_are_emitted() {
        let html = "<html><body>\
            <h2>short</h2>\
            <p class=\"intro\">全新界面设计，页面布局清晰，UI 组件统一，适合各种设备浏览</p>\
            </body></html>";
        let result = analyze_markup(html);
        assert_eq!(result.placeholders.len(), 1);
        let unit = &result.placeholders[0];
        assert_eq!(unit.id, "section-1");
        assert_eq!(unit.position.selector.as_deref(), Some("p.intro"));
        assert_eq!(unit.position.section.as_deref(), Some("p"));
        assert_eq!(
            unit.suggested_prompt,
            "clean user interface design, modern web layout"
        );
    }

    #[test]
    fn long_context_is_clipped_with_ellipsis() {
        let body = "界面设计页面布局UI".repeat(30);
        let html = format!("<article>{}</article>", body);
        let result = analyze_markup(&html);
        let unit = &result.placeholders[0];
        assert!(unit.context.ends_with("..."));
        assert_eq!(char_len(&unit.context), CONTEXT_LIMIT + 3);
        assert_eq!(
            unit.position.selector.as_deref(),
            Some("body article:nth-child(1)")
        );
    }

    #[test]
    fn analysis_is_deterministic() {
        let html = r#"<div class="card"><p>团队合作与沟通协作是我们成功的关键因素之一</p><img></div>"#;
        assert_eq!(analyze_markup(html), analyze_markup(html));
    }

    #[test]
    fn empty_markup_has_no_placeholders() {
        let result = analyze_markup("");
        assert!(result.placeholders.is_empty());
        assert_eq!(result.suggestions.len(), 3);
    }
}
