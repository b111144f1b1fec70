//! Flattening of tag pages into deduplicated select options.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::fetcher::TagPage;

/// A selectable `key:"value"` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    fn canonical(s: String) -> Self {
        Self {
            label: s.clone(),
            value: s,
        }
    }
}

/// Canonical option string for a tag. Quotes inside `value` are not escaped.
pub fn canonical_tag(key: &str, value: &str) -> String {
    format!("{key}:\"{value}\"")
}

/// Options for `metric_name` from a single fetch result
pub fn aggregate_options(pages: &[TagPage], metric_name: &str) -> Vec<SelectOption> {
    aggregate_loaded(std::iter::once(pages), metric_name)
}

/// Options for `metric_name` across several fetch results, in the order given.
///
/// Within each batch only the first page named `metric_name` is used. Options
/// keep the position of their first appearance.
pub fn aggregate_loaded<'a, I>(batches: I, metric_name: &str) -> Vec<SelectOption>
where
    I: IntoIterator<Item = &'a [TagPage]>,
{
    let mut seen = HashSet::new();
    let mut options = Vec::new();
    for batch in batches {
        let Some(page) = batch.iter().find(|p| p.name == metric_name) else {
            continue;
        };
        for record in &page.tags {
            for (key, value) in record.iter() {
                let tag = canonical_tag(key, value);
                if seen.insert(tag.clone()) {
                    options.push(SelectOption::canonical(tag));
                }
            }
        }
    }
    options
}
