//! Field extraction strategies
//!
//! Each field is read by a [`FieldChain`]: an ordered list of [`Strategy`]
//! objects tried until one yields a non-empty value. Strategies are grouped
//! in tiers, from the high-confidence template markers down to permissive
//! class-pattern fallbacks.

use crate::extract::embedded::{breadcrumb_names, find_by_key, find_typed, follow_path};
use crate::extract::text::{clean_text, element_text, strip_label};
use crate::extract::PageContext;
use scraper::Selector;

/// Confidence tier of a strategy; chains evaluate lower tiers first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Dedicated attribute of the canonical template
    Marker,
    /// Embedded JSON payloads
    Embedded,
    /// Labeled specification rows
    Table,
    /// Generic class-pattern selectors
    Pattern,
}

/// One way of reading a field from a page
pub trait Strategy {
    fn tier(&self) -> Tier;

    /// Short description used in trace logs
    fn describe(&self) -> String;

    /// Attempts extraction, returning None when this strategy finds nothing
    fn attempt(&self, ctx: &PageContext<'_>) -> Option<String>;
}

fn parse_selectors(selectors: &[&str]) -> Vec<(String, Selector)> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some((s.to_string(), selector)),
            Err(e) => {
                tracing::warn!("Ignoring invalid selector '{}': {:?}", s, e);
                None
            }
        })
        .collect()
}

/// Text (or an attribute) of the first matching element that is non-empty
pub struct Css {
    tier: Tier,
    selectors: Vec<(String, Selector)>,
    attribute: Option<&'static str>,
}

impl Css {
    pub fn marker(selectors: &[&str]) -> Self {
        Self::with_tier(Tier::Marker, selectors)
    }

    pub fn pattern(selectors: &[&str]) -> Self {
        Self::with_tier(Tier::Pattern, selectors)
    }

    fn with_tier(tier: Tier, selectors: &[&str]) -> Self {
        Self {
            tier,
            selectors: parse_selectors(selectors),
            attribute: None,
        }
    }

    /// Reads `attribute` instead of the element text
    pub fn attr(mut self, attribute: &'static str) -> Self {
        self.attribute = Some(attribute);
        self
    }
}

impl Strategy for Css {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.selectors.iter().map(|(s, _)| s.as_str()).collect();
        format!("css({})", names.join(" | "))
    }

    fn attempt(&self, ctx: &PageContext<'_>) -> Option<String> {
        self.selectors.iter().find_map(|(_, selector)| {
            ctx.document.select(selector).find_map(|element| {
                let value = match self.attribute {
                    Some(attr) => clean_text(element.value().attr(attr)?),
                    None => element_text(&element),
                };
                Some(value).filter(|v| !v.is_empty())
            })
        })
    }
}

/// Texts of all matching elements joined by a separator (breadcrumbs)
pub struct CssJoined {
    tier: Tier,
    selectors: Vec<(String, Selector)>,
    separator: &'static str,
}

impl CssJoined {
    pub fn new(tier: Tier, selectors: &[&str], separator: &'static str) -> Self {
        Self {
            tier,
            selectors: parse_selectors(selectors),
            separator,
        }
    }
}

impl Strategy for CssJoined {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn describe(&self) -> String {
        let names: Vec<&str> = self.selectors.iter().map(|(s, _)| s.as_str()).collect();
        format!("css-joined({})", names.join(" | "))
    }

    fn attempt(&self, ctx: &PageContext<'_>) -> Option<String> {
        self.selectors.iter().find_map(|(_, selector)| {
            let parts: Vec<String> = ctx
                .document
                .select(selector)
                .map(|e| element_text(&e))
                .filter(|t| !t.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(self.separator))
        })
    }
}

/// Recursive key-name search over the embedded JSON blocks
pub struct JsonKey {
    needles: Vec<String>,
}

impl JsonKey {
    pub fn new(needles: &[&str]) -> Self {
        Self {
            needles: needles.iter().map(|n| n.to_lowercase()).collect(),
        }
    }
}

impl Strategy for JsonKey {
    fn tier(&self) -> Tier {
        Tier::Embedded
    }

    fn describe(&self) -> String {
        format!("json-key({})", self.needles.join(" | "))
    }

    fn attempt(&self, ctx: &PageContext<'_>) -> Option<String> {
        let needles: Vec<&str> = self.needles.iter().map(String::as_str).collect();
        let accept = |v: &str| !v.is_empty();
        ctx.json
            .iter()
            .find_map(|block| find_by_key(block, &needles, &accept))
            .map(|v| clean_text(&v))
    }
}

/// A member of the schema.org `Product` node
pub struct ProductNode {
    path: &'static [&'static str],
}

impl ProductNode {
    pub fn new(path: &'static [&'static str]) -> Self {
        Self { path }
    }
}

impl Strategy for ProductNode {
    fn tier(&self) -> Tier {
        Tier::Embedded
    }

    fn describe(&self) -> String {
        format!("json-ld-product({})", self.path.join("."))
    }

    fn attempt(&self, ctx: &PageContext<'_>) -> Option<String> {
        ctx.json
            .iter()
            .filter_map(|block| find_typed(block, "Product"))
            .find_map(|product| follow_path(product, self.path))
            .map(|v| clean_text(&v))
            .filter(|v| !v.is_empty())
    }
}

/// Names of the schema.org `BreadcrumbList`, joined
pub struct BreadcrumbJson {
    separator: &'static str,
}

impl BreadcrumbJson {
    pub fn new(separator: &'static str) -> Self {
        Self { separator }
    }
}

impl Strategy for BreadcrumbJson {
    fn tier(&self) -> Tier {
        Tier::Embedded
    }

    fn describe(&self) -> String {
        "json-ld-breadcrumb".to_string()
    }

    fn attempt(&self, ctx: &PageContext<'_>) -> Option<String> {
        ctx.json
            .iter()
            .filter_map(|block| find_typed(block, "BreadcrumbList"))
            .map(breadcrumb_names)
            .find(|names| !names.is_empty())
            .map(|names| names.join(self.separator))
    }
}

/// Value of a labeled specification row, matched by exact label
pub struct LabeledRow {
    label: &'static str,
}

impl LabeledRow {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Strategy for LabeledRow {
    fn tier(&self) -> Tier {
        Tier::Table
    }

    fn describe(&self) -> String {
        format!("row({})", self.label)
    }

    fn attempt(&self, ctx: &PageContext<'_>) -> Option<String> {
        ctx.rows.get(self.label).map(str::to_string)
    }
}

/// Ordered strategies for one field
pub struct FieldChain {
    name: &'static str,
    strategies: Vec<Box<dyn Strategy>>,
    accept: Option<fn(&str) -> bool>,
    labels: &'static [&'static str],
}

impl FieldChain {
    /// Builds a chain; strategies are ordered by tier, keeping the given
    /// order within a tier
    pub fn new(name: &'static str, mut strategies: Vec<Box<dyn Strategy>>) -> Self {
        strategies.sort_by_key(|s| s.tier());
        Self {
            name,
            strategies,
            accept: None,
            labels: &[],
        }
    }

    /// Only values passing `accept` end the chain
    pub fn accept(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = Some(accept);
        self
    }

    /// Leading labels stripped from every value (e.g. "Thương hiệu:")
    pub fn strip_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.strategies.iter().map(|s| s.tier()).collect()
    }

    /// First accepted value of the chain, or an empty string
    pub fn run(&self, ctx: &PageContext<'_>) -> String {
        for strategy in &self.strategies {
            let Some(raw) = strategy.attempt(ctx) else {
                continue;
            };
            let value = strip_label(&raw, self.labels).to_string();
            if value.is_empty() {
                continue;
            }
            if let Some(accept) = self.accept {
                if !accept(&value) {
                    continue;
                }
            }
            tracing::trace!("Field '{}' filled by {}", self.name, strategy.describe());
            return value;
        }

        tracing::trace!("Field '{}' not found", self.name);
        String::new()
    }
}
