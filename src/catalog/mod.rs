//! Catalog
//!
//! The read-only set of products, services and add-ons, loaded once and
//! queried by the storefront. Lookups that miss return `None` or an empty
//! list rather than an error.

use std::{fs, path::Path};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::debug;

use crate::products::{AddOn, Category, Product, ProductKind, ServiceItem};

pub mod fixtures;
pub mod query;
pub mod selection;

pub use query::{
    ListingQuery, PriceRange, ProductFilter, SortKey, filter_products, sort_products,
    suggest_related,
};
pub use selection::AddOnSelection;

use fixtures::CatalogFixture;

/// Builtin storefront catalog
const BUILTIN_CATALOG: &str = include_str!("../../fixtures/catalog.yml");

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Currency mismatch between entries
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No entry carries a price, so the catalog currency is unknown
    #[error("No priced entries; currency unknown")]
    NoCurrency,

    /// Two entries of the same kind share an id (kind, id)
    #[error("Duplicate {0} id: {1}")]
    DuplicateId(&'static str, String),

    /// Review rating outside 1 to 5 (review id, rating)
    #[error("Review {0} has rating {1}; expected 1 to 5")]
    InvalidRating(String, u8),

    /// Review date is not an ISO date (review id, date)
    #[error("Review {0} has invalid date: {1}")]
    InvalidDate(String, String),
}

/// Entry on the storefront's category filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryOption {
    /// `None` for the catch-all entry
    pub category: Option<Category>,

    /// Token used in URLs
    pub id: &'static str,

    /// Display label
    pub label: &'static str,
}

/// Catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    currency: &'static Currency,
    products: Vec<Product>,
    services: Vec<ServiceItem>,
    add_ons: Vec<AddOn>,
    product_index: FxHashMap<String, usize>,
    service_index: FxHashMap<String, usize>,
    add_on_index: FxHashMap<String, usize>,
}

impl Catalog {
    /// Loads the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled YAML is invalid.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path.as_ref())?;

        Self::from_yaml(&contents)
    }

    /// Parses and validates a catalog document.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Yaml`]: the text is not a catalog document.
    /// - [`CatalogError::InvalidPrice`] / [`CatalogError::UnknownCurrency`]: a bad price.
    /// - [`CatalogError::CurrencyMismatch`]: prices use more than one currency.
    /// - [`CatalogError::NoCurrency`]: nothing is priced.
    /// - [`CatalogError::DuplicateId`]: two products, services or add-ons share an id.
    /// - [`CatalogError::InvalidRating`] / [`CatalogError::InvalidDate`]: a bad review.
    pub fn from_yaml(contents: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        let add_ons = fixture
            .add_ons
            .into_iter()
            .map(AddOn::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let products = fixture
            .products
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let services = fixture
            .services
            .into_iter()
            .map(ServiceItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let prices = add_ons
            .iter()
            .map(|add_on| &add_on.price)
            .chain(products.iter().filter_map(|product| product.price.as_ref()))
            .chain(
                products
                    .iter()
                    .filter_map(|product| product.original_price.as_ref()),
            )
            .chain(services.iter().filter_map(|service| service.price.as_ref()));

        let mut currency: Option<&'static Currency> = None;

        for price in prices {
            match currency {
                Some(existing) if existing != price.currency() => {
                    return Err(CatalogError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        price.currency().iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(price.currency()),
            }
        }

        let currency = currency.ok_or(CatalogError::NoCurrency)?;

        let catalog = Self {
            currency,
            product_index: index_ids("product", products.iter().map(|p| p.id.as_str()))?,
            service_index: index_ids("service", services.iter().map(|s| s.id.as_str()))?,
            add_on_index: index_ids("add-on", add_ons.iter().map(|a| a.id.as_str()))?,
            products,
            services,
            add_ons,
        };

        debug!(
            currency = currency.iso_alpha_code,
            products = catalog.products.len(),
            services = catalog.services.len(),
            add_ons = catalog.add_ons.len(),
            "loaded catalog"
        );

        Ok(catalog)
    }

    /// The currency every catalog price is in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Looks up a product or package by id.
    pub fn get_by_id(&self, id: &str) -> Option<&Product> {
        self.product_index
            .get(id)
            .and_then(|&index| self.products.get(index))
    }

    /// Resolves a product's add-on ids, in the product's order.
    ///
    /// Ids that no longer name an add-on are skipped.
    pub fn add_ons_for(&self, product: &Product) -> Vec<&AddOn> {
        product
            .add_ons
            .iter()
            .filter_map(|id| self.add_on_by_id(id))
            .collect()
    }

    /// Every product and package, in featured order.
    pub fn all_products(&self) -> &[Product] {
        &self.products
    }

    /// Entries of type product only, in featured order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products
            .iter()
            .filter(|product| product.kind == ProductKind::Product)
    }

    /// Services page entries.
    pub fn services(&self) -> &[ServiceItem] {
        &self.services
    }

    /// Looks up a services page entry by id.
    pub fn service_by_id(&self, id: &str) -> Option<&ServiceItem> {
        self.service_index
            .get(id)
            .and_then(|&index| self.services.get(index))
    }

    /// Every add-on.
    pub fn add_ons(&self) -> &[AddOn] {
        &self.add_ons
    }

    /// Looks up an add-on by id.
    pub fn add_on_by_id(&self, id: &str) -> Option<&AddOn> {
        self.add_on_index
            .get(id)
            .and_then(|&index| self.add_ons.get(index))
    }

    /// Case-insensitive substring search over name, description and category.
    ///
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();

        if needle.is_empty() {
            return Vec::new();
        }

        self.products
            .iter()
            .filter(|product| {
                product.name.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
                    || product.category.as_str().contains(&needle)
            })
            .collect()
    }

    /// Up to `limit` popular entries, in featured order.
    pub fn popular(&self, limit: usize) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| product.is_popular())
            .take(limit)
            .collect()
    }

    /// The listing page's category filter: "All" followed by each category
    /// that products are listed under.
    pub fn categories() -> Vec<CategoryOption> {
        let all = CategoryOption {
            category: None,
            id: "all",
            label: "All",
        };

        std::iter::once(all)
            .chain(
                Category::ALL
                    .into_iter()
                    .filter(|category| *category != Category::Services)
                    .map(|category| CategoryOption {
                        category: Some(category),
                        id: category.as_str(),
                        label: category.label(),
                    }),
            )
            .collect()
    }

    /// Products matching `filter`, in featured order.
    pub fn filter(&self, filter: &ProductFilter) -> Vec<&Product> {
        filter_products(&self.products, filter)
    }

    /// Products matching a listing query, sorted.
    pub fn listing(&self, query: &ListingQuery) -> Vec<&Product> {
        query.apply(&self.products)
    }

    /// Up to `limit` products to suggest on `product`'s detail page.
    pub fn suggest_related(&self, product: &Product, limit: usize) -> Vec<&Product> {
        suggest_related(product, &self.products, limit)
    }
}

fn index_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<FxHashMap<String, usize>, CatalogError> {
    let mut index = FxHashMap::default();

    for (position, id) in ids.enumerate() {
        if index.insert(id.to_string(), position).is_some() {
            return Err(CatalogError::DuplicateId(kind, id.to_string()));
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use super::*;

    const SMALL: &str = r#"
add_ons:
  - { id: ao1, name: Lights, price: 15.00 USD }
products:
  - { id: "1", name: Arch, price: 150.00 USD, category: arches, type: product, add_ons: [ao1, gone] }
  - { id: s1, name: Package, price: 350.00 USD, category: packages, type: service }
"#;

    #[test]
    fn loads_small_catalog() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        assert_eq!(catalog.currency(), USD);
        assert_eq!(catalog.all_products().len(), 2);
        assert_eq!(catalog.products().count(), 1);

        Ok(())
    }

    #[test]
    fn stale_add_on_ids_are_dropped() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;
        let arch = catalog.get_by_id("1").ok_or("missing arch")?;

        let add_ons = catalog.add_ons_for(arch);

        assert_eq!(add_ons.len(), 1);
        assert_eq!(add_ons.first().map(|a| a.price), Some(Money::from_minor(1500, USD)));

        Ok(())
    }

    #[test]
    fn lookup_misses_are_none() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        assert!(catalog.get_by_id("nope").is_none());
        assert!(catalog.service_by_id("nope").is_none());
        assert!(catalog.add_on_by_id("nope").is_none());

        Ok(())
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = r#"
products:
  - { id: "1", name: A, price: 1.00 USD, category: arches, type: product }
  - { id: "1", name: B, price: 2.00 USD, category: arches, type: product }
"#;

        assert!(matches!(
            Catalog::from_yaml(yaml),
            Err(CatalogError::DuplicateId("product", id)) if id == "1"
        ));
    }

    #[test]
    fn rejects_mixed_currencies() {
        let yaml = r#"
add_ons:
  - { id: ao1, name: Lights, price: 15.00 EUR }
products:
  - { id: "1", name: A, price: 1.00 USD, category: arches, type: product }
"#;

        assert!(matches!(
            Catalog::from_yaml(yaml),
            Err(CatalogError::CurrencyMismatch(..))
        ));
    }

    #[test]
    fn rejects_unpriced_catalog() {
        let yaml = "products: []\n";

        assert!(matches!(Catalog::from_yaml(yaml), Err(CatalogError::NoCurrency)));
    }

    #[test]
    fn search_is_case_insensitive_and_blank_matches_nothing() -> TestResult {
        let catalog = Catalog::from_yaml(SMALL)?;

        assert_eq!(catalog.search("ARCH").len(), 1);
        assert_eq!(catalog.search("packages").len(), 1);
        assert!(catalog.search("   ").is_empty());

        Ok(())
    }

    #[test]
    fn categories_start_with_all() {
        let labels: Vec<&str> = Catalog::categories().iter().map(|c| c.label).collect();

        assert_eq!(
            labels,
            ["All", "Arches", "Garlands", "Columns", "Bouquets", "Custom", "Packages"]
        );
    }
}
