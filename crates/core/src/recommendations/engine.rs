//! Recommendation engine implementation

use std::sync::Arc;

use tracing::debug;

use super::types::{RecommendationSource, Recommendations};
use super::RecommendationResult;
use crate::catalog::CatalogSnapshot;
use crate::classifier::{AcademicCategory, AcademicClassifier};
use crate::domain::product::{Product, ProductId};
use crate::errors::{Component, EngineError};
use crate::snapshot::SnapshotCell;
use crate::text::contains_any_term;

/// Serves recommendations from whichever catalog snapshot is current.
///
/// The engine never mutates a snapshot. A reload swaps the whole snapshot and
/// calls already in flight finish on the one they started with.
#[derive(Clone, Debug)]
pub struct RecommendationEngine {
    catalog: Arc<SnapshotCell<CatalogSnapshot>>,
    classifier: AcademicClassifier,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(Arc::new(SnapshotCell::empty()))
    }
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<SnapshotCell<CatalogSnapshot>>) -> Self {
        Self { catalog, classifier: AcademicClassifier::new() }
    }

    pub fn with_catalog(snapshot: CatalogSnapshot) -> Self {
        Self::new(Arc::new(SnapshotCell::loaded(snapshot)))
    }

    pub fn catalog(&self) -> &Arc<SnapshotCell<CatalogSnapshot>> {
        &self.catalog
    }

    pub fn is_ready(&self) -> bool {
        self.catalog.is_loaded()
    }

    /// Swaps in a new catalog, returning the size of the previous one.
    pub fn replace_catalog(&self, snapshot: CatalogSnapshot) -> Option<usize> {
        let incoming = snapshot.len();
        let previous = self.catalog.store(snapshot).map(|previous| previous.len());
        debug!(
            event_name = "recommendations.catalog.swapped",
            products = incoming,
            previous_products = previous,
            "catalog snapshot replaced"
        );
        previous
    }

    /// Other products in the same category as `product_id`, most popular first.
    pub fn recommend_by_category(
        &self,
        product_id: &ProductId,
        limit: i64,
    ) -> RecommendationResult<Recommendations> {
        let limit = validate_limit(limit)?;
        if product_id.as_str().trim().is_empty() {
            return Err(EngineError::invalid_argument("product id must not be empty"));
        }
        let snapshot = self.snapshot()?;

        let reference = snapshot
            .find(product_id)
            .ok_or_else(|| EngineError::NotFound { product_id: product_id.clone() })?;
        let products = related_products(&snapshot, reference, limit);

        Ok(Recommendations {
            source: RecommendationSource::Related {
                product_id: reference.id.clone(),
                category: reference.category.clone(),
            },
            products,
        })
    }

    pub fn recommend_popular(&self, limit: i64) -> RecommendationResult<Recommendations> {
        let limit = validate_limit(limit)?;
        let snapshot = self.snapshot()?;

        Ok(Recommendations {
            source: RecommendationSource::Popular,
            products: popular_products(&snapshot, limit),
        })
    }

    /// Products matching the academic category a free-text query classifies to.
    pub fn recommend_for_topic(
        &self,
        query: &str,
        limit: i64,
    ) -> RecommendationResult<Recommendations> {
        let limit = validate_limit(limit)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::invalid_argument("query must not be empty"));
        }
        let snapshot = self.snapshot()?;

        let category = self.classifier.classify(query).category;
        let products = category
            .map(|category| topic_products(&snapshot, &self.classifier, category, limit))
            .unwrap_or_default();

        Ok(Recommendations {
            source: RecommendationSource::Topic { query: query.to_owned(), category },
            products,
        })
    }

    fn snapshot(&self) -> RecommendationResult<Arc<CatalogSnapshot>> {
        self.catalog.load().ok_or(EngineError::NotReady(Component::Catalog))
    }
}

fn validate_limit(limit: i64) -> RecommendationResult<usize> {
    if limit <= 0 {
        return Err(EngineError::invalid_argument(format!(
            "limit must be a positive integer, got {limit}"
        )));
    }
    Ok(usize::try_from(limit).unwrap_or(usize::MAX))
}

/// Same-category products excluding `reference`, in ranking order.
pub fn related_products(
    snapshot: &CatalogSnapshot,
    reference: &Product,
    limit: usize,
) -> Vec<Product> {
    snapshot
        .ranked()
        .iter()
        .filter(|product| product.category == reference.category && product.id != reference.id)
        .take(limit)
        .cloned()
        .collect()
}

pub fn popular_products(snapshot: &CatalogSnapshot, limit: usize) -> Vec<Product> {
    snapshot.ranked().iter().take(limit).cloned().collect()
}

pub fn topic_products(
    snapshot: &CatalogSnapshot,
    classifier: &AcademicClassifier,
    category: AcademicCategory,
    limit: usize,
) -> Vec<Product> {
    let keywords = classifier.catalog_keywords(category);
    snapshot
        .ranked()
        .iter()
        .filter(|product| contains_any_term(&product.searchable_text(), keywords))
        .take(limit)
        .cloned()
        .collect()
}
