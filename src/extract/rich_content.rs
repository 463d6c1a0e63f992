//! Rich content sanitizer
//!
//! Serializes the long-form product article as an HTML fragment that keeps
//! its structure but carries no scripts, overlays or arbitrary attributes.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Elements dropped together with their content
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "button", "iframe", "form", "input", "template", "svg",
];

/// Class fragments marking interactive overlays
const OVERLAY_CLASSES: &[&str] = &["overlay", "modal", "popup"];

/// Attributes kept on every remaining element
const ALLOWED_ATTRIBUTES: &[&str] = &["class", "id", "href", "src", "alt", "width", "height"];

/// Phrasing elements whose separating whitespace is significant
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "code", "em", "i", "img", "mark", "small", "span", "strong", "sub", "sup",
    "u",
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Sanitized HTML of the first element matching `selector`, or an empty string
pub fn sanitize_block(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(|block| {
            let mut out = String::new();
            write_element(&block, &mut out);
            out
        })
        .unwrap_or_default()
}

fn is_dropped(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if DROPPED_ELEMENTS.contains(&value.name()) {
        return true;
    }
    value.classes().any(|class| {
        let class = class.to_lowercase();
        OVERLAY_CLASSES.iter().any(|marker| class.contains(marker))
    })
}

fn is_inline(element: Option<ElementRef<'_>>) -> bool {
    element.map_or(false, |e| !is_dropped(&e) && INLINE_ELEMENTS.contains(&e.value().name()))
}

fn write_element(element: &ElementRef<'_>, out: &mut String) {
    if is_dropped(element) {
        return;
    }

    let value = element.value();
    let name = value.name();

    out.push('<');
    out.push_str(name);
    // Allow-list order keeps the output stable
    for attr in ALLOWED_ATTRIBUTES {
        if let Some(attr_value) = value.attr(attr) {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&escape(attr_value, true));
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if text.trim().is_empty() {
                    // "<b>a</b> <i>b</i>" keeps its word break
                    if is_inline(child.prev_sibling().and_then(ElementRef::wrap))
                        && is_inline(child.next_sibling().and_then(ElementRef::wrap))
                    {
                        out.push(' ');
                    }
                    continue;
                }
                out.push_str(&escape(&collapse_whitespace(text), false));
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(&child, out);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Collapses whitespace runs to one space, keeping single edge spaces
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitize(html: &str) -> String {
        let document = Html::parse_document(html);
        let selector = Selector::parse("div.content-detail").unwrap();
        sanitize_block(&document, &selector)
    }

    #[test]
    fn test_strips_scripts_and_overlays() {
        let out = sanitize(
            r#"<div class="content-detail">
                <h2>Công dụng</h2>
                <script>track()</script>
                <style>.x{}</style>
                <div class="content-overlay"><button>Xem thêm</button></div>
                <p>Bổ sung <b>vitamin C</b></p>
            </div>"#,
        );
        assert_eq!(
            out,
            r#"<div class="content-detail"><h2>Công dụng</h2><p>Bổ sung <b>vitamin C</b></p></div>"#
        );
    }

    #[test]
    fn test_attribute_allow_list() {
        let out = sanitize(
            r#"<div class="content-detail" style="color:red" data-x="1"><img src="/a.jpg" alt="A" onerror="x()" width="10"><a href="/b" target="_blank" onclick="y()">b</a></div>"#,
        );
        assert!(out.starts_with(r#"<div class="content-detail">"#));
        assert!(out.contains(r#"<img src="/a.jpg" alt="A" width="10">"#));
        assert!(out.contains(r#"<a href="/b">b</a>"#));
        assert!(!out.contains("onerror"));
        assert!(!out.contains("style"));
        assert!(!out.contains("</img>"));
    }

    #[test]
    fn test_escapes_text() {
        let out = sanitize(r#"<div class="content-detail"><p>a &lt; b &amp; c</p></div>"#);
        assert_eq!(out, r#"<div class="content-detail"><p>a &lt; b &amp; c</p></div>"#);
    }

    #[test]
    fn test_keeps_space_between_inline_elements() {
        let out = sanitize(
            "<div class=\"content-detail\"><p><b>a</b> <i>b</i></p>\n  <p><strong>c</strong>\n\t<em>d</em></p></div>",
        );
        assert_eq!(
            out,
            r#"<div class="content-detail"><p><b>a</b> <i>b</i></p><p><strong>c</strong> <em>d</em></p></div>"#
        );
    }

    #[test]
    fn test_missing_block_is_empty() {
        assert_eq!(sanitize("<html><body><p>x</p></body></html>"), "");
    }
}
