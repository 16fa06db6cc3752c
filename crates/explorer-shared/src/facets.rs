//! Filter facets and headline statistics derived from the full collection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::Country;

/// Distinct, sorted values that populate the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub regions: Vec<String>,
    pub subregions: Vec<String>,
    pub languages: Vec<String>,
    /// Currency codes (e.g. `EUR`), not display names.
    pub currencies: Vec<String>,
}

impl Facets {
    pub fn derive(all: &[Country]) -> Self {
        Self {
            regions: distinct(all.iter().map(|c| c.region.as_str())),
            subregions: distinct(all.iter().map(|c| c.subregion.as_str())),
            languages: distinct(
                all.iter()
                    .flat_map(|c| c.languages.values().map(String::as_str)),
            ),
            currencies: distinct(
                all.iter()
                    .flat_map(|c| c.currencies.keys().map(String::as_str)),
            ),
        }
    }
}

/// Headline numbers shown above the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub countries: usize,
    pub regions: usize,
    pub subregions: usize,
    pub languages: usize,
    pub population: u64,
    pub currencies: usize,
}

impl Stats {
    pub fn derive(all: &[Country]) -> Self {
        Self::from_facets(all, &Facets::derive(all))
    }

    pub fn from_facets(all: &[Country], facets: &Facets) -> Self {
        Self {
            countries: all.len(),
            regions: facets.regions.len(),
            subregions: facets.subregions.len(),
            languages: facets.languages.len(),
            population: all.iter().map(|c| c.population).sum(),
            currencies: facets.currencies.len(),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
