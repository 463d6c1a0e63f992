//! Static category taxonomy
//!
//! Maps top-level category slugs to their subcategory slugs and names the
//! predefined groups that the CLI can crawl in one go.

use crate::catalog::{CategoryTarget, CrawlMode};
use crate::config::{CategoryEntry, Config, GroupEntry};
use crate::TargetError;

/// Taxonomy resolved from configuration
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    categories: Vec<CategoryEntry>,
    groups: Vec<GroupEntry>,
}

impl Taxonomy {
    pub fn new(categories: Vec<CategoryEntry>, groups: Vec<GroupEntry>) -> Self {
        Self { categories, groups }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.categories.clone(), config.groups.clone())
    }

    /// Top-level category slugs in declaration order
    pub fn mains(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.main.as_str())
    }

    /// Subcategory slugs of a top-level category
    pub fn subcategories_of(&self, main: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|c| c.main == main)
            .map(|c| c.subcategories.as_slice())
    }

    /// Looks up a predefined group by name
    pub fn group(&self, name: &str) -> Result<&GroupEntry, TargetError> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| TargetError::UnknownGroup(name.to_string()))
    }

    pub fn groups(&self) -> &[GroupEntry] {
        &self.groups
    }

    /// Builds `main/sub` targets for each subcategory slug
    pub fn subcategory_targets(
        main: &str,
        subcategories: &[String],
    ) -> Result<Vec<CategoryTarget>, TargetError> {
        subcategories
            .iter()
            .map(|sub| CategoryTarget::child(main, sub))
            .collect()
    }

    /// Targets of one top-level category: its subcategories, or itself if it has none
    pub fn targets_for_main(&self, main: &str) -> Result<Vec<CategoryTarget>, TargetError> {
        let subs = self
            .subcategories_of(main)
            .ok_or_else(|| TargetError::UnknownCategory(main.to_string()))?;

        if subs.is_empty() {
            Ok(vec![CategoryTarget::parse(main)?])
        } else {
            Self::subcategory_targets(main, subs)
        }
    }

    /// Flattens a traversal mode into the ordered list of targets it visits
    pub fn resolve(&self, mode: &CrawlMode) -> Result<Vec<CategoryTarget>, TargetError> {
        match mode {
            CrawlMode::Single { target, .. } => Ok(vec![target.clone()]),
            CrawlMode::Subcategories {
                main,
                subcategories,
                ..
            } => Self::subcategory_targets(main, subcategories),
            CrawlMode::Group { name, .. } => {
                let group = self.group(name)?;
                Self::subcategory_targets(&group.main, &group.subcategories)
            }
            CrawlMode::All { .. } => {
                let mut targets = Vec::new();
                for main in self.mains() {
                    targets.extend(self.targets_for_main(main)?);
                }
                Ok(targets)
            }
        }
    }
}
