//! Regex-based HTML field helpers.
//!
//! Real pages are tag soup; strict parsing buys nothing for the handful of
//! fields the strategies read. Meta-tag helpers tolerate either attribute
//! order, and every helper returns `None` rather than an empty string when a
//! field is absent.

use regex::Regex;

/// Content of the tag `<{element} ... {key_attr}="{key_value}" ... content="…">`,
/// tolerating swapped attribute order.
fn tag_content(html: &str, element: &str, key_attr: &str, key_value: &str) -> Option<String> {
    let forward = Regex::new(&format!(
        r#"(?is)<{element}[^>]+{key_attr}\s*=\s*["']{key_value}["'][^>]+content\s*=\s*["'](.*?)["'][^>]*>"#
    ))
    .expect("valid tag-content regex");

    if let Some(cap) = forward.captures(html) {
        return non_empty(clean_text(cap.get(1).map_or("", |m| m.as_str())));
    }

    let swapped = Regex::new(&format!(
        r#"(?is)<{element}[^>]+content\s*=\s*["'](.*?)["'][^>]+{key_attr}\s*=\s*["']{key_value}["'][^>]*>"#
    ))
    .expect("valid tag-content fallback regex");

    swapped
        .captures(html)
        .and_then(|cap| non_empty(clean_text(cap.get(1).map_or("", |m| m.as_str()))))
}

pub(crate) fn og_title(html: &str) -> Option<String> {
    tag_content(html, "meta", "property", "og:title")
}

pub(crate) fn og_description(html: &str) -> Option<String> {
    tag_content(html, "meta", "property", "og:description")
}

pub(crate) fn meta_description(html: &str) -> Option<String> {
    tag_content(html, "meta", "name", "description")
}

pub(crate) fn meta_author(html: &str) -> Option<String> {
    tag_content(html, "meta", "name", "author")
}

/// `<link itemprop="name" content="…">` — the channel name on video pages.
pub(crate) fn itemprop_link_name(html: &str) -> Option<String> {
    tag_content(html, "link", "itemprop", "name")
}

pub(crate) fn document_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex");
    let cap = re.captures(html)?;
    non_empty(clean_text(cap.get(1).map_or("", |m| m.as_str())))
}

pub(crate) fn first_h1(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid h1 regex");
    let cap = re.captures(html)?;
    non_empty(clean_text(cap.get(1).map_or("", |m| m.as_str())))
}

/// First paragraph with enough text to be worth quoting; boilerplate
/// one-word paragraphs are skipped.
pub(crate) fn first_paragraph(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<p[^>]*>(.*?)</p>").expect("valid paragraph regex");
    for cap in re.captures_iter(html) {
        let candidate = clean_text(cap.get(1).map_or("", |m| m.as_str()));
        if candidate.len() >= 20 {
            return Some(candidate);
        }
    }
    None
}

/// Text of the first element whose `class` contains `author`.
pub(crate) fn author_element(html: &str) -> Option<String> {
    let re = Regex::new(
        r#"(?is)<(?:a|span|div|p)[^>]+class\s*=\s*["'][^"']*author[^"']*["'][^>]*>(.*?)</"#,
    )
    .expect("valid author-class regex");
    let cap = re.captures(html)?;
    non_empty(clean_text(cap.get(1).map_or("", |m| m.as_str())))
}

/// Value of the first `data-author` attribute.
pub(crate) fn data_author(html: &str) -> Option<String> {
    let re = Regex::new(r#"(?is)data-author\s*=\s*["'](.*?)["']"#).expect("valid data-author regex");
    let cap = re.captures(html)?;
    non_empty(clean_text(cap.get(1).map_or("", |m| m.as_str())))
}

/// `@username` parsed out of an og:title of the form `Name (@user) • …`.
pub(crate) fn parenthesised_handle(text: &str) -> Option<String> {
    let re = Regex::new(r"\(@([A-Za-z0-9_.]+)\)").expect("valid handle regex");
    re.captures(text)
        .and_then(|cap| cap.get(1).map(|m| m.as_str().to_string()))
}

pub(crate) fn clean_text(input: &str) -> String {
    let tags = Regex::new(r"(?is)<[^>]+>").expect("valid tags regex");
    let no_tags = tags.replace_all(input, " ");
    no_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_title_reads_forward_attribute_order() {
        let html = r#"<meta property="og:title" content="A Story">"#;
        assert_eq!(og_title(html).as_deref(), Some("A Story"));
    }

    #[test]
    fn og_title_reads_swapped_attribute_order() {
        let html = r#"<meta content="A Story" property="og:title">"#;
        assert_eq!(og_title(html).as_deref(), Some("A Story"));
    }

    #[test]
    fn missing_meta_yields_none_not_empty() {
        assert_eq!(og_title("<html><head></head></html>"), None);
        let html = r#"<meta property="og:title" content="">"#;
        assert_eq!(og_title(html), None);
    }

    #[test]
    fn document_title_strips_whitespace_and_markup() {
        let html = "<title>\n  An <b>odd</b>   title \n</title>";
        assert_eq!(document_title(html).as_deref(), Some("An odd title"));
    }

    #[test]
    fn first_paragraph_skips_short_boilerplate() {
        let html = "<p>Menu</p><p>This paragraph has enough substance to quote.</p>";
        assert_eq!(
            first_paragraph(html).as_deref(),
            Some("This paragraph has enough substance to quote.")
        );
    }

    #[test]
    fn author_element_matches_class_variants() {
        let html = r#"<span class="post-author meta">Jo Writer</span>"#;
        assert_eq!(author_element(html).as_deref(), Some("Jo Writer"));
    }

    #[test]
    fn data_author_attribute_is_read() {
        let html = r#"<article data-author="Sam Penner">…</article>"#;
        assert_eq!(data_author(html).as_deref(), Some("Sam Penner"));
    }

    #[test]
    fn parenthesised_handle_parses_instagram_og_title() {
        assert_eq!(
            parenthesised_handle("Jane Doe (@jane.doe) • Instagram photos and videos").as_deref(),
            Some("jane.doe")
        );
        assert_eq!(parenthesised_handle("No handle here"), None);
    }
}
