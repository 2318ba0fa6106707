//! Product catalog, loaded once from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// One product the trainee sells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub common_objections: Vec<String>,
}

/// In-memory product catalog. A missing or unreadable file yields an
/// empty catalog rather than a startup failure.
pub struct ProductStore {
    products: Vec<Product>,
}

impl ProductStore {
    pub fn load(path: &Path) -> Self {
        let products = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<Product>>(&raw) {
                Ok(products) => {
                    info!(count = products.len(), path = %path.display(), "loaded product catalog");
                    products
                }
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "invalid product catalog, starting empty");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, path = %path.display(), "product catalog not found, starting empty");
                Vec::new()
            }
        };
        Self { products }
    }

    pub fn all(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_empty_catalog() {
        let store = ProductStore::load(Path::new("/nonexistent/products.json"));
        assert!(store.all().is_empty());
        assert!(store.find("anything").is_none());
    }

    #[test]
    fn products_parse_with_optional_fields_missing() {
        let raw = r#"[{"id":"p1","name":"Cleanser","description":"Gentle","price":19.5}]"#;
        let products: Vec<Product> = serde_json::from_str(raw).unwrap();
        assert_eq!(products[0].id, "p1");
        assert!(products[0].features.is_empty());
        assert!(products[0].common_objections.is_empty());
    }
}
