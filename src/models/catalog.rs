use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{CatalogError, CatalogResult};

/// Synthetic catch-all category appended after the loaded ones; no crop belongs to it
pub const OTHER_CATEGORY: &str = "Other";

/// Queries shorter than this return the browse list instead of matches
pub const MIN_SEARCH_QUERY_LENGTH: usize = 2;
pub const DEFAULT_BROWSE_LIMIT: usize = 10;
pub const SEARCH_RESULT_LIMIT: usize = 20;

const FALLBACK_CATEGORIES: [&str; 7] = [
    "Vegetables",
    "Fruits",
    "Cereals & Grains",
    "Pulses & Legumes",
    "Nuts & Oilseeds",
    "Spices & Condiments",
    "Commercial & Plantation Crops",
];

const FALLBACK_CROPS: [(&str, &str); 5] = [
    ("Tomatoes", "Vegetables"),
    ("Potatoes", "Vegetables"),
    ("Onions", "Vegetables"),
    ("Wheat", "Cereals & Grains"),
    ("Rice", "Cereals & Grains"),
];

/// A crop name and the category it is listed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub name: String,
    pub category: String,
    pub search_terms: Vec<String>,
}

impl Crop {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        let name = name.into();
        let search_terms = name
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        Self {
            name,
            category: category.into(),
            search_terms,
        }
    }

    /// Case-insensitive substring match; `lowered_query` must already be lowercase
    pub fn matches(&self, lowered_query: &str) -> bool {
        self.name.to_lowercase().contains(lowered_query)
            || self
                .search_terms
                .iter()
                .any(|term| term.contains(lowered_query))
    }
}

/// A unit-of-measure option offered to sellers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitOfMeasure {
    pub value: &'static str,
    pub label: &'static str,
}

pub const UNITS: [UnitOfMeasure; 10] = [
    UnitOfMeasure { value: "kg", label: "Kilograms (kg)" },
    UnitOfMeasure { value: "gram", label: "Grams (g)" },
    UnitOfMeasure { value: "quintal", label: "Quintals (q)" },
    UnitOfMeasure { value: "ton", label: "Tons (t)" },
    UnitOfMeasure { value: "piece", label: "Pieces" },
    UnitOfMeasure { value: "dozen", label: "Dozens" },
    UnitOfMeasure { value: "liter", label: "Liters (L)" },
    UnitOfMeasure { value: "bag", label: "Bags" },
    UnitOfMeasure { value: "box", label: "Boxes" },
    UnitOfMeasure { value: "crate", label: "Crates" },
];

/// Whether the catalog came from the tabular source or the built-in fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Loaded,
    Fallback,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Loaded => write!(f, "loaded"),
            CatalogSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Immutable set of categories and crops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<String>,
    crops: Vec<Crop>,
}

impl Catalog {
    /// Parse `commodity,category` rows. The first line is a header and is
    /// discarded; rows with an empty field are skipped.
    pub fn parse(text: &str) -> CatalogResult<Self> {
        if text.trim().is_empty() {
            return Err(CatalogError::Malformed {
                reason: "source has no header line".to_string(),
            });
        }

        let mut categories = BTreeSet::new();
        let mut crops = Vec::new();

        for line in text.split('\n').skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            let Some((raw_commodity, rest)) = line.split_once(',') else {
                continue;
            };
            let category = rest.split(',').next().unwrap_or_default().trim();
            let name = decode_commodity(raw_commodity);

            if name.is_empty() || category.is_empty() {
                continue;
            }

            categories.insert(category.to_string());
            crops.push(Crop::new(name, category));
        }

        Ok(Self {
            categories: categories.into_iter().collect(),
            crops,
        })
    }

    /// Small hardcoded catalog used when the source cannot be loaded
    pub fn fallback() -> Self {
        Self {
            categories: FALLBACK_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            crops: FALLBACK_CROPS
                .iter()
                .map(|(name, category)| Crop::new(*name, *category))
                .collect(),
        }
    }

    /// Loaded categories, without the trailing catch-all
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn crops(&self) -> &[Crop] {
        &self.crops
    }
}

/// Reverse the placeholder substitutions used in the commodity column.
/// Only the literal lowercase `%2f` and `%2c` sequences are restored.
pub fn decode_commodity(raw: &str) -> String {
    raw.replace('+', " ")
        .replace("%2f", "/")
        .replace("%2c", ",")
        .trim()
        .to_string()
}
