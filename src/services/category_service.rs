use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::models::{
    Catalog, CatalogError, CatalogResult, CatalogSource, Crop, UnitOfMeasure,
    DEFAULT_BROWSE_LIMIT, MIN_SEARCH_QUERY_LENGTH, OTHER_CATEGORY, SEARCH_RESULT_LIMIT, UNITS,
};
use crate::observability::Metrics;
use crate::{info_with_trace, warn_with_trace};

/// Read and parse the tabular crop source
pub async fn load_catalog(path: impl AsRef<Path>) -> CatalogResult<Catalog> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CatalogError::SourceUnreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    let text = String::from_utf8(bytes).map_err(|e| CatalogError::SourceUnreadable {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Catalog::parse(&text)
}

/// Read-only queries over a catalog built once at startup
pub struct CategoryService {
    catalog: Catalog,
    source: CatalogSource,
    categories: Vec<String>,
    metrics: Option<Arc<Metrics>>,
}

impl CategoryService {
    pub fn new(catalog: Catalog, source: CatalogSource) -> Self {
        // "Other" is the synthetic catch-all, even if the source names it
        let categories = catalog
            .categories()
            .iter()
            .filter(|category| category.as_str() != OTHER_CATEGORY)
            .cloned()
            .chain(std::iter::once(OTHER_CATEGORY.to_string()))
            .collect();

        Self {
            catalog,
            source,
            categories,
            metrics: None,
        }
    }

    /// Use the parsed catalog, or the built-in fallback when loading failed
    pub fn from_load_result(result: CatalogResult<Catalog>) -> Self {
        match result {
            Ok(catalog) => {
                info_with_trace!(
                    categories = catalog.categories().len(),
                    crops = catalog.crops().len(),
                    "Crop catalog loaded"
                );
                Self::new(catalog, CatalogSource::Loaded)
            }
            Err(e) => {
                warn_with_trace!(error = %e, "Crop catalog unavailable, serving fallback catalog");
                Self::new(Catalog::fallback(), CatalogSource::Fallback)
            }
        }
    }

    /// Load the catalog from `path`. Never fails; see [`CategoryService::source`].
    pub async fn load_from_path(path: impl AsRef<Path>) -> Self {
        Self::from_load_result(load_catalog(path).await)
    }

    /// Record lookups and the degraded state in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.set_catalog_degraded(self.source == CatalogSource::Fallback);
        self.metrics = Some(metrics);
        self
    }

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    /// Sorted categories followed by `Other`
    pub fn get_categories(&self) -> &[String] {
        &self.categories
    }

    /// Crops listed under `category`, in load order. `Other` is always empty.
    #[instrument(skip(self))]
    pub fn get_crops_by_category(&self, category: &str) -> Vec<Crop> {
        if category == OTHER_CATEGORY {
            self.record_lookup("crops_by_category", false);
            return Vec::new();
        }

        let crops: Vec<Crop> = self
            .catalog
            .crops()
            .iter()
            .filter(|crop| crop.category == category)
            .cloned()
            .collect();

        debug!(count = crops.len(), "Crops by category");
        self.record_lookup("crops_by_category", !crops.is_empty());
        crops
    }

    /// Case-insensitive substring search over crop names and name tokens.
    ///
    /// A missing or too-short query returns the first crops in load order
    /// instead of matches.
    #[instrument(skip(self))]
    pub fn search_crops(&self, query: Option<&str>) -> Vec<Crop> {
        let crops = self.catalog.crops();

        let results: Vec<Crop> = match query {
            Some(query) if query.chars().count() >= MIN_SEARCH_QUERY_LENGTH => {
                let lowered = query.to_lowercase();
                crops
                    .iter()
                    .filter(|crop| crop.matches(&lowered))
                    .take(SEARCH_RESULT_LIMIT)
                    .cloned()
                    .collect()
            }
            _ => crops.iter().take(DEFAULT_BROWSE_LIMIT).cloned().collect(),
        };

        debug!(count = results.len(), "Crop search");
        self.record_lookup("search_crops", !results.is_empty());
        results
    }

    pub fn get_all_crops(&self) -> &[Crop] {
        self.catalog.crops()
    }

    pub fn get_units(&self) -> &'static [UnitOfMeasure] {
        &UNITS
    }

    fn record_lookup(&self, operation: &str, found: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_catalog_lookup(operation, found);
        }
    }
}
