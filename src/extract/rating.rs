//! Star rating and engagement counts
//!
//! The rating has no stable attribute on the page. It is located through the
//! first visible text node that contains the review marker word; the text of
//! that node's parent is then tried against an ordered list of patterns.

use crate::extract::text::{clean_text, is_invisible};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Highest value a rating may take
pub const MAX_RATING: f64 = 5.0;

/// Finds the star rating next to a marker word
#[derive(Debug, Clone)]
pub struct RatingLocator {
    marker: String,
    patterns: Vec<Regex>,
}

impl RatingLocator {
    /// Builds a locator for `marker`
    ///
    /// Patterns are tried in order: a value directly before an opening
    /// parenthesis ("4.8 (25 đánh giá)"), a value before the star unit word
    /// ("4.5 sao"), a value over a slash-delimited scale ("4/5").
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let patterns = [
            r"(\d+(?:[.,]\d+)?)\s*\(",
            r"(?i)(\d+(?:[.,]\d+)?)\s*sao\b",
            r"(\d+(?:[.,]\d+)?)\s*/\s*5\b",
        ]
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            marker: marker.to_lowercase(),
            patterns,
        })
    }

    /// Rating of the document, 0.0 if none is found in range
    pub fn locate(&self, document: &Html) -> f64 {
        self.marker_context(document)
            .and_then(|text| self.parse(&text))
            .unwrap_or(0.0)
    }

    /// Parent text of the first visible text node carrying the marker
    fn marker_context(&self, document: &Html) -> Option<String> {
        document.root_element().descendants().find_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            if !text.to_lowercase().contains(&self.marker) {
                return None;
            }
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if is_invisible(&parent) {
                return None;
            }
            Some(clean_text(&parent.text().collect::<String>()))
        })
    }

    /// First pattern capture that lies in [0, 5]
    pub fn parse(&self, text: &str) -> Option<f64> {
        self.patterns.iter().find_map(|pattern| {
            pattern.captures_iter(text).find_map(|caps| {
                let value: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
                (0.0..=MAX_RATING).contains(&value).then_some(value)
            })
        })
    }
}

/// Number preceding a marker phrase (e.g. "25 bình luận")
#[derive(Debug, Clone)]
pub struct CountLocator {
    pattern: Regex,
}

impl CountLocator {
    pub fn new(marker: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"(?i)(\d+)\s*{}", regex::escape(marker)))?;
        Ok(Self { pattern })
    }

    pub fn find(&self, text: &str) -> Option<u64> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> RatingLocator {
        RatingLocator::new("đánh giá").unwrap()
    }

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn test_parenthesis_pattern() {
        let html = doc("<div class=\"rating\">4.8 (25 đánh giá)</div>");
        assert_eq!(locator().locate(&html), 4.8);
    }

    #[test]
    fn test_unit_word_pattern() {
        assert_eq!(locator().parse("Đánh giá: 4,5 sao"), Some(4.5));
    }

    #[test]
    fn test_slash_pattern() {
        assert_eq!(locator().parse("Điểm 4/5 theo đánh giá"), Some(4.0));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(locator().parse("120 (đánh giá)"), None);
        assert_eq!(locator().parse("120 (x) 3 (y)"), Some(3.0));
    }

    #[test]
    fn test_pattern_order() {
        assert_eq!(locator().parse("4 sao, 5 (đánh giá)"), Some(5.0));
    }

    #[test]
    fn test_missing_rating_is_zero() {
        let html = doc("<h1>Viên sủi</h1><p>Chưa có nhận xét</p>");
        assert_eq!(locator().locate(&html), 0.0);
    }

    #[test]
    fn test_marker_in_script_ignored() {
        let html = doc("<script>var t = '4.9 (10 đánh giá)';</script><p>x</p>");
        assert_eq!(locator().locate(&html), 0.0);
    }

    #[test]
    fn test_count_locator() {
        let counts = CountLocator::new("bình luận").unwrap();
        assert_eq!(counts.find("4.8 · 25 đánh giá · 12 Bình luận"), Some(12));
        assert_eq!(counts.find("Chưa có bình luận"), None);
    }
}
