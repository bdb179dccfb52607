use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::images::ImageOutcome;
use crate::types::{GeneratedImage, ImagePlaceholder, WebpageFillResult};

const DEFAULT_ALT: &str = "AI generated image";

// Comments and raw-text containers hide `<img>` text from the HTML parser, so
// they are matched as opaque spans and never counted.
static IMG_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<(?:script|style|template|noscript)\b.*?</(?:script|style|template|noscript)\s*>|(?P<img><img[^>]*>)",
    )
    .expect("img scan pattern")
});

/// Splice generated images back into the original markup.
///
/// `outcomes[i]` belongs to `placeholders[i]`. Stand-in images (`img-N`) swap
/// out the N-th `<img>` element of the source, counted the way the parser
/// sees them (nothing inside comments, `<noscript>`, `<template>`, `<script>`
/// or `<style>`); content units get a new tag right
/// before the first closing tag of their section element. Text-mode
/// placeholders are reported but never spliced.
pub fn fill_images_into_html(
    html: &str,
    placeholders: &[ImagePlaceholder],
    outcomes: &[ImageOutcome],
) -> WebpageFillResult {
    let mut replacements: HashMap<usize, String> = HashMap::new();
    let mut insertions: Vec<(String, String)> = Vec::new();
    let mut generated_images = Vec::new();

    for (placeholder, outcome) in placeholders.iter().zip(outcomes) {
        if !outcome.is_success() {
            continue;
        }
        if placeholder.position.selector.is_some() {
            let tag = image_tag(&outcome.image_url, placeholder.alt.as_deref());
            if let Some(index) = existing_image_index(&placeholder.id) {
                replacements.insert(index, tag);
            } else if let Some(section) = &placeholder.position.section {
                insertions.push((section.to_ascii_lowercase(), tag));
            }
        }
        generated_images.push(GeneratedImage {
            placeholder: placeholder.clone(),
            image_url: outcome.image_url.clone(),
            prompt: outcome.prompt.clone(),
        });
    }

    let mut seen = 0usize;
    let mut modified_content = IMG_SCAN
        .replace_all(html, |caps: &Captures| {
            if caps.name("img").is_none() {
                return caps[0].to_string();
            }
            let index = seen;
            seen += 1;
            replacements
                .get(&index)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();

    for (section, tag) in insertions {
        let closing = format!("</{}>", section);
        if let Some(position) = modified_content.to_ascii_lowercase().find(&closing) {
            modified_content.insert_str(position, &tag);
        }
    }

    WebpageFillResult {
        original_content: html.to_string(),
        modified_content,
        generated_images,
    }
}

fn existing_image_index(id: &str) -> Option<usize> {
    id.strip_prefix("img-")?.parse().ok()
}

fn image_tag(url: &str, alt: Option<&str>) -> String {
    let alt = alt.filter(|alt| !alt.is_empty()).unwrap_or(DEFAULT_ALT);
    format!(
        r#"<img src="{}" alt="{}" style="max-width: 100%; height: auto;" />"#,
        escape_attr(url),
        escape_attr(alt)
    )
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlaceholderPosition;

    fn placeholder(id: &str, selector: Option<&str>, section: Option<&str>) -> ImagePlaceholder {
        ImagePlaceholder {
            id: id.to_string(),
            context: "ctx".to_string(),
            suggested_prompt: "prompt".to_string(),
            position: PlaceholderPosition {
                selector: selector.map(str::to_string),
                line: None,
                section: section.map(str::to_string),
            },
            size: None,
            alt: None,
        }
    }

    fn ok(url: &str) -> ImageOutcome {
        ImageOutcome {
            prompt: "prompt".to_string(),
            image_url: url.to_string(),
            error: None,
        }
    }

    #[test]
    fn replaces_the_matching_img_tag() {
        let html = r#"<img src="real.png"><IMG src="https://via.placeholder.com/1">"#;
        let result = fill_images_into_html(
            html,
            &[placeholder("img-1", Some("body img:nth-child(2)"), None)],
            &[ok("https://cdn.test/a.png")],
        );
        assert_eq!(
            result.modified_content,
            r#"<img src="real.png"><img src="https://cdn.test/a.png" alt="AI generated image" style="max-width: 100%; height: auto;" />"#
        );
        assert_eq!(result.original_content, html);
        assert_eq!(result.generated_images.len(), 1);
    }

    #[test]
    fn hidden_img_text_does_not_shift_the_index() {
        let html = concat!(
            r#"<noscript><img src="https://cdn.real/logo.jpg"></noscript>"#,
            r#"<!-- <img src="old.png"> -->"#,
            r#"<template><img src="t.png"></template>"#,
            r#"<div><img src="https://via.placeholder.com/1"></div>"#,
        );
        let result = fill_images_into_html(
            html,
            &[placeholder("img-0", Some("div img:nth-child(1)"), None)],
            &[ok("https://gen.test/x.png")],
        );
        assert!(result
            .modified_content
            .starts_with(r#"<noscript><img src="https://cdn.real/logo.jpg"></noscript><!-- <img src="old.png"> --><template><img src="t.png"></template>"#));
        assert!(result
            .modified_content
            .ends_with(r#"<div><img src="https://gen.test/x.png" alt="AI generated image" style="max-width: 100%; height: auto;" /></div>"#));
        assert!(!result.modified_content.contains("via.placeholder.com"));
    }

    #[test]
    fn inserts_before_section_close() {
        let html = "<article><p>text</p></article>";
        let result = fill_images_into_html(
            html,
            &[placeholder("section-0", Some("body article:nth-child(1)"), Some("article"))],
            &[ok("u.png")],
        );
        assert!(result.modified_content.starts_with("<article><p>text</p><img src=\"u.png\""));
        assert!(result.modified_content.ends_with("</article>"));
    }

    #[test]
    fn failures_and_text_placeholders_are_not_spliced() {
        let html = "<p>x</p>";
        let failed = ImageOutcome {
            prompt: "p".to_string(),
            image_url: String::new(),
            error: Some("boom".to_string()),
        };
        let result = fill_images_into_html(
            html,
            &[placeholder("section-0", Some("p"), Some("p")), placeholder("line-3", None, None)],
            &[failed, ok("u.png")],
        );
        assert_eq!(result.modified_content, html);
        assert_eq!(result.generated_images.len(), 1);
        assert_eq!(result.generated_images[0].placeholder.id, "line-3");
    }

    #[test]
    fn attribute_values_are_escaped() {
        assert_eq!(
            image_tag("a.png?x=1&y=\"2\"", Some("<b>")),
            r#"<img src="a.png?x=1&amp;y=&quot;2&quot;" alt="&lt;b&gt;" style="max-width: 100%; height: auto;" />"#
        );
    }
}
