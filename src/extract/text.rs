//! Text helpers shared by the extraction strategies

use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Elements whose text never counts as visible page text
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template"];

/// Collapses every whitespace run into one space and trims the ends
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleaned text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Returns true if the element is a script-like container
pub fn is_invisible(element: &ElementRef<'_>) -> bool {
    INVISIBLE.contains(&element.value().name())
}

/// Text of the whole document outside script-like containers
pub fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.root_element().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node
                .parent()
                .and_then(ElementRef::wrap)
                .map(|parent| is_invisible(&parent))
                .unwrap_or(false);
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    clean_text(&out)
}

/// Removes a leading `label:` prefix (case-insensitive) from a value
pub fn strip_label<'a>(value: &'a str, labels: &[&str]) -> &'a str {
    for label in labels {
        let Some(head) = value.get(..label.len()) else {
            continue;
        };
        if head.to_lowercase() == label.to_lowercase() {
            return value[label.len()..].trim_start_matches([':', ' ']).trim();
        }
    }
    value
}
