//! Product catalog
//!
//! The catalog is an external collaborator to the cart and checkout flow;
//! this module defines the lookup trait those components consume plus the
//! in-memory implementation seeded with the storefront's stock list.

use rust_decimal::Decimal;

use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;

/// Shelf categories offered by the storefront filter.
pub const CATEGORIES: &[&str] = &["Pain Relief", "Antibiotics", "Vitamins", "Skin Care", "Digestive Health"];

pub trait ProductCatalog: Send + Sync {
    fn product(&self, id: &str) -> Option<Product>;
    fn products(&self) -> Vec<Product>;

    /// Case-insensitive name substring plus optional category filter, the
    /// same narrowing the product grid applies.
    fn search(&self, term: Option<&str>, category: Option<&str>) -> Vec<Product> {
        let term = term.map(str::to_lowercase);
        self.products()
            .into_iter()
            .filter(|p| term.as_deref().map_or(true, |t| p.name().to_lowercase().contains(t)))
            .filter(|p| category.map_or(true, |c| c.eq_ignore_ascii_case("All") || p.category() == c))
            .collect()
    }
}

pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self { Self { products } }

    /// The pharmacy stock list the storefront ships with.
    pub fn pharmacy() -> Self {
        let inr = |minor: i64| Money::inr(Decimal::new(minor, 2));
        let items = [
            Product::new("MED-001", "Paracetamol 500mg", inr(599), "Pain Relief")
                .map(|p| p.with_stock(50).with_description("Fast-acting relief for fever and mild pain")),
            Product::new("MED-002", "Ibuprofen 200mg", inr(749), "Pain Relief")
                .map(|p| p.with_stock(40).with_description("Anti-inflammatory for aches and swelling")),
            Product::new("MED-003", "Aspirin 75mg", inr(499), "Pain Relief").map(|p| p.with_stock(60)),
            Product::new("MED-004", "Vitamin C 1000mg", inr(1299), "Vitamins")
                .map(|p| p.with_stock(35).with_description("Daily immune support tablets")),
            Product::new("MED-005", "Multivitamin Tablets", inr(1899), "Vitamins").map(|p| p.with_stock(25)),
            Product::new("MED-006", "Amoxicillin 500mg", inr(1299), "Antibiotics")
                .map(|p| p.with_stock(20).with_prescription().with_description("Broad-spectrum antibiotic capsules")),
            Product::new("MED-007", "Cetirizine 10mg", inr(849), "Skin Care")
                .map(|p| p.with_stock(30).with_description("Relief from allergic itching and hives")),
            Product::new("MED-008", "Omeprazole 20mg", inr(999), "Digestive Health")
                .map(|p| p.with_stock(15).with_prescription().with_description("Acid reducer for reflux and heartburn")),
        ];
        Self::new(items.into_iter().flatten().collect())
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn product(&self, id: &str) -> Option<Product> {
        self.products.iter().find(|p| p.id() == id).cloned()
    }

    fn products(&self) -> Vec<Product> {
        self.products.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_id() {
        let catalog = InMemoryCatalog::pharmacy();
        assert_eq!(catalog.product("MED-001").unwrap().name(), "Paracetamol 500mg");
        assert!(catalog.product("MED-999").is_none());
    }

    #[test]
    fn test_search_matches_name_substring() {
        let catalog = InMemoryCatalog::pharmacy();
        let hits = catalog.search(Some("vitamin"), None);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|p| p.name().to_lowercase().contains("vitamin")));
    }

    #[test]
    fn test_search_filters_by_category() {
        let catalog = InMemoryCatalog::pharmacy();
        let hits = catalog.search(None, Some("Pain Relief"));
        assert_eq!(hits.len(), 3);
        let all = catalog.search(None, Some("All"));
        assert_eq!(all.len(), catalog.products().len());
    }

    #[test]
    fn test_prescription_items_are_flagged() {
        let catalog = InMemoryCatalog::pharmacy();
        assert!(catalog.product("MED-006").unwrap().prescription_required());
        assert!(!catalog.product("MED-001").unwrap().prescription_required());
    }
}
