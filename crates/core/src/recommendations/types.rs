//! Types for the recommendation engine

use serde::Serialize;

use crate::classifier::AcademicCategory;
use crate::domain::product::{Product, ProductId};

/// What a recommendation list was derived from
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Products sharing the reference product's category
    Related { product_id: ProductId, category: String },
    /// The whole catalog in ranking order
    Popular,
    /// Products matching an academic topic query
    Topic { query: String, category: Option<AcademicCategory> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub source: RecommendationSource,
    pub products: Vec<Product>,
}

impl Recommendations {
    pub fn ids(&self) -> Vec<&str> {
        self.products.iter().map(|product| product.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
