//! Validated, immutable product catalog snapshot.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::product::{Product, ProductId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("product id must not be empty")]
    EmptyProductId,
    #[error("duplicate product id `{0}`")]
    DuplicateProduct(ProductId),
    #[error("product `{0}` has an empty category")]
    EmptyCategory(ProductId),
    #[error("product `{id}` has negative popularity {popularity}")]
    NegativePopularity { id: ProductId, popularity: Decimal },
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Canonical ranking: popularity descending, then id ascending.
pub fn popularity_order(a: &Product, b: &Product) -> Ordering {
    b.popularity.cmp(&a.popularity).then_with(|| a.id.cmp(&b.id))
}

#[derive(Clone, Debug, Default)]
pub struct CatalogSnapshot {
    ranked: Vec<Product>,
    positions: HashMap<ProductId, usize>,
}

impl CatalogSnapshot {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            if product.id.0.trim().is_empty() {
                return Err(CatalogError::EmptyProductId);
            }
            if product.category.trim().is_empty() {
                return Err(CatalogError::EmptyCategory(product.id.clone()));
            }
            if product.popularity < Decimal::ZERO {
                return Err(CatalogError::NegativePopularity {
                    id: product.id.clone(),
                    popularity: product.popularity,
                });
            }
            if !seen.insert(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
        }

        let mut ranked = products;
        ranked.sort_by(popularity_order);
        let positions =
            ranked.iter().enumerate().map(|(index, product)| (product.id.clone(), index)).collect();

        Ok(Self { ranked, positions })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file = toml::from_str::<CatalogFile>(raw)?;
        Self::new(file.products)
    }

    pub fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.positions.get(product_id).map(|index| &self.ranked[*index])
    }

    /// All products in canonical ranking order.
    pub fn ranked(&self) -> &[Product] {
        &self.ranked
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.ranked.iter().map(|product| product.category.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Clone, Copy)]
struct ProductSeed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    popularity: i64,
    description: &'static str,
}

const PRODUCT_SEEDS: &[ProductSeed] = &[
    ProductSeed {
        id: "book-clean-code",
        name: "Clean Code",
        category: "books",
        popularity: 87,
        description: "Robert C. Martin on software craftsmanship, programming and design patterns",
    },
    ProductSeed {
        id: "book-intro-algorithms",
        name: "Introduction to Algorithms",
        category: "books",
        popularity: 92,
        description: "Cormen et al. reference text on algorithms and data structures",
    },
    ProductSeed {
        id: "book-guyton-physiology",
        name: "Guyton and Hall Textbook of Medical Physiology",
        category: "books",
        popularity: 78,
        description: "Medical physiology for medicine and nursing students",
    },
    ProductSeed {
        id: "book-harrison-internal",
        name: "Harrison's Principles of Internal Medicine",
        category: "books",
        popularity: 64,
        description: "Internal medicine and clinical diagnosis reference",
    },
    ProductSeed {
        id: "book-kelsen-pure-theory",
        name: "Pure Theory of Law",
        category: "books",
        popularity: 41,
        description: "Hans Kelsen on legal theory and constitutional law",
    },
    ProductSeed {
        id: "book-linear-algebra",
        name: "Linear Algebra and Its Applications",
        category: "books",
        popularity: 55,
        description: "Linear algebra and calculus foundations for engineering",
    },
    ProductSeed {
        id: "med-stethoscope",
        name: "Dual-Head Stethoscope",
        category: "medical_equipment",
        popularity: 95,
        description: "Stethoscope for clinical practice, nursing and medicine labs",
    },
    ProductSeed {
        id: "med-sphygmomanometer",
        name: "Aneroid Sphygmomanometer",
        category: "medical_equipment",
        popularity: 70,
        description: "Blood pressure monitor for nursing practice",
    },
    ProductSeed {
        id: "med-otoscope",
        name: "Diagnostic Otoscope",
        category: "medical_equipment",
        popularity: 48,
        description: "Otoscope for clinical diagnosis in medicine",
    },
    ProductSeed {
        id: "dent-micromotor",
        name: "Dental Micromotor Kit",
        category: "dental_equipment",
        popularity: 39,
        description: "Micromotor and handpiece for dentistry lab practice",
    },
    ProductSeed {
        id: "dent-sterilizer",
        name: "Autoclave Sterilizer",
        category: "dental_equipment",
        popularity: 44,
        description: "Instrument sterilizer for dentistry and oral surgery",
    },
    ProductSeed {
        id: "tech-laptop-dev",
        name: "Developer Laptop 16GB",
        category: "electronics",
        popularity: 88,
        description: "Laptop for software development and programming courses",
    },
    ProductSeed {
        id: "tech-raspberry-pi",
        name: "Raspberry Pi 5 Starter Kit",
        category: "electronics",
        popularity: 66,
        description: "Single-board computer for IoT and programming labs",
    },
    ProductSeed {
        id: "tech-graphing-calculator",
        name: "Graphing Calculator",
        category: "electronics",
        popularity: 66,
        description: "Calculator for calculus, algebra and statistics",
    },
    ProductSeed {
        id: "law-civil-code",
        name: "Annotated Civil Code",
        category: "legal",
        popularity: 52,
        description: "Civil law code with jurisprudence notes",
    },
    ProductSeed {
        id: "law-penal-code",
        name: "Annotated Penal Code",
        category: "legal",
        popularity: 37,
        description: "Penal law code for criminal law courses",
    },
];

/// Built-in catalog used when no external catalog source is configured.
pub fn seed_products() -> Vec<Product> {
    PRODUCT_SEEDS
        .iter()
        .map(|seed| {
            Product::new(seed.id, seed.name, seed.category, Decimal::from(seed.popularity))
                .with_description(seed.description)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{seed_products, CatalogError, CatalogSnapshot};
    use crate::domain::product::{Product, ProductId};

    fn product(id: &str, category: &str, popularity: i64) -> Product {
        Product::new(id, id.to_uppercase(), category, Decimal::from(popularity))
    }

    #[test]
    fn ranking_is_popularity_desc_then_id_asc() {
        let snapshot = CatalogSnapshot::new(vec![
            product("c", "bags", 20),
            product("b", "shoes", 30),
            product("a", "shoes", 20),
        ])
        .expect("valid catalog");

        let ids = snapshot.ranked().iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn find_resolves_by_id_after_sorting() {
        let snapshot =
            CatalogSnapshot::new(vec![product("x", "pens", 1), product("y", "pens", 9)])
                .expect("valid catalog");

        assert_eq!(snapshot.find(&ProductId::from("x")).map(|p| p.popularity), Some(Decimal::ONE));
        assert!(snapshot.find(&ProductId::from("z")).is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let error = CatalogSnapshot::new(vec![product("a", "x", 1), product("a", "y", 2)])
            .expect_err("duplicate ids must fail");
        assert!(matches!(error, CatalogError::DuplicateProduct(ref id) if id.as_str() == "a"));
    }

    #[test]
    fn rejects_negative_popularity_and_blank_fields() {
        assert!(matches!(
            CatalogSnapshot::new(vec![product("a", "x", -1)]),
            Err(CatalogError::NegativePopularity { .. })
        ));
        assert!(matches!(
            CatalogSnapshot::new(vec![product(" ", "x", 1)]),
            Err(CatalogError::EmptyProductId)
        ));
        assert!(matches!(
            CatalogSnapshot::new(vec![product("a", "", 1)]),
            Err(CatalogError::EmptyCategory(_))
        ));
    }

    #[test]
    fn parses_toml_catalog_with_mixed_numeric_popularity() {
        let snapshot = CatalogSnapshot::from_toml_str(
            r#"
[[products]]
id = "A"
name = "Trail Shoe"
category = "shoes"
popularity = 10

[[products]]
id = "B"
name = "Road Shoe"
category = "shoes"
popularity = 30.5
description = "lightweight"
"#,
        )
        .expect("catalog should parse");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.ranked()[0].id.as_str(), "B");
        assert_eq!(snapshot.ranked()[0].description.as_deref(), Some("lightweight"));
    }

    #[test]
    fn load_file_reports_missing_path() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            CatalogSnapshot::load_file(&missing),
            Err(CatalogError::ReadFile { .. })
        ));

        let present = dir.path().join("catalog.toml");
        fs::write(&present, "products = []\n").expect("write catalog");
        let snapshot = CatalogSnapshot::load_file(&present).expect("empty catalog loads");
        assert!(snapshot.is_empty());
    }

    #[test]
    fn seed_catalog_is_valid() {
        let snapshot = CatalogSnapshot::new(seed_products()).expect("seed catalog is valid");
        assert_eq!(snapshot.len(), seed_products().len());
        assert!(snapshot.categories().contains("medical_equipment"));
    }
}
