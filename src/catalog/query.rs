//! Catalog queries
//!
//! Stateless filtering, sorting and suggestion over product lists. Every
//! function returns a new list and leaves its input untouched.

use std::{cmp::Ordering, fmt, str::FromStr};

use rusty_money::{Money, iso::Currency};

use crate::products::{Category, Product, ProductKind};

/// Inclusive price bounds. The upper bound is optional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: Money<'static, Currency>,
    max: Option<Money<'static, Currency>>,
}

impl PriceRange {
    /// Range with both bounds included.
    pub fn between(min: Money<'static, Currency>, max: Money<'static, Currency>) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// Range with only a lower bound.
    pub fn at_least(min: Money<'static, Currency>) -> Self {
        Self { min, max: None }
    }

    /// Parses a storefront range token (`0-50`, `50-150`, `150-300`, `300+`).
    ///
    /// Any `MIN-MAX` or `MIN+` in whole units is accepted. `all`, blank and
    /// unrecognized tokens mean no constraint and return `None`.
    pub fn from_token(token: &str, currency: &'static Currency) -> Option<Self> {
        let token = token.trim();
        let scale = 10_i64.checked_pow(currency.exponent)?;
        let minor = |units: &str| -> Option<Money<'static, Currency>> {
            let units = units.trim().parse::<i64>().ok()?;

            if units < 0 {
                return None;
            }

            Some(Money::from_minor(units.checked_mul(scale)?, currency))
        };

        if let Some(min) = token.strip_suffix('+') {
            return Some(Self::at_least(minor(min)?));
        }

        let (min, max) = token.split_once('-')?;
        let (min, max) = (minor(min)?, minor(max)?);

        (min.to_minor_units() <= max.to_minor_units()).then(|| Self::between(min, max))
    }

    /// Lower bound.
    pub fn min(&self) -> &Money<'static, Currency> {
        &self.min
    }

    /// Upper bound, if any.
    pub fn max(&self) -> Option<&Money<'static, Currency>> {
        self.max.as_ref()
    }

    /// Whether `price` lies within the range. Prices in another currency never match.
    pub fn contains(&self, price: &Money<'static, Currency>) -> bool {
        if price.currency() != self.min.currency() {
            return false;
        }

        let amount = price.to_minor_units();

        amount >= self.min.to_minor_units()
            && self
                .max
                .is_none_or(|max| amount <= max.to_minor_units())
    }
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Catalog authoring order.
    #[default]
    Featured,
    /// Cheapest first.
    PriceAscending,
    /// Most expensive first.
    PriceDescending,
    /// A to Z.
    NameAscending,
    /// Z to A.
    NameDescending,
}

impl SortKey {
    /// Short token used by the storefront.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Featured => "featured",
            SortKey::PriceAscending => "price-asc",
            SortKey::PriceDescending => "price-desc",
            SortKey::NameAscending => "name-asc",
            SortKey::NameDescending => "name-desc",
        }
    }

    /// Parses a sort token, falling back to [`SortKey::Featured`] when unknown.
    pub fn parse_lenient(token: &str) -> Self {
        token.parse().unwrap_or_default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "featured" => Ok(SortKey::Featured),
            "price-asc" | "price-ascending" => Ok(SortKey::PriceAscending),
            "price-desc" | "price-descending" => Ok(SortKey::PriceDescending),
            "name-asc" | "name-ascending" => Ok(SortKey::NameAscending),
            "name-desc" | "name-descending" => Ok(SortKey::NameDescending),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Conjunction of optional listing constraints.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProductFilter {
    /// Listing category
    pub category: Option<Category>,

    /// Product or service
    pub kind: Option<ProductKind>,

    /// Inclusive price bounds
    pub price: Option<PriceRange>,
}

impl ProductFilter {
    /// Filter with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a category.
    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts to products or services.
    #[must_use]
    pub fn kind(mut self, kind: ProductKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts to a price range.
    #[must_use]
    pub fn price(mut self, range: PriceRange) -> Self {
        self.price = Some(range);
        self
    }

    /// Whether `product` satisfies every set constraint.
    ///
    /// Unpriced products never satisfy a price constraint.
    pub fn matches(&self, product: &Product) -> bool {
        self.category.is_none_or(|category| product.category == category)
            && self.kind.is_none_or(|kind| product.kind == kind)
            && self.price.as_ref().is_none_or(|range| {
                product
                    .price
                    .as_ref()
                    .is_some_and(|price| range.contains(price))
            })
    }
}

/// Filter plus sort, as chosen on the listing page.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListingQuery {
    /// Constraints
    pub filter: ProductFilter,

    /// Order
    pub sort: SortKey,
}

impl ListingQuery {
    /// Builds a query from the storefront's string tokens.
    ///
    /// Unknown or `all` tokens leave the matching constraint unset; an unknown
    /// sort token means featured order.
    pub fn from_tokens(
        category: &str,
        kind: &str,
        price: &str,
        sort: &str,
        currency: &'static Currency,
    ) -> Self {
        Self {
            filter: ProductFilter {
                category: category.parse().ok(),
                kind: kind.parse().ok(),
                price: PriceRange::from_token(price, currency),
            },
            sort: SortKey::parse_lenient(sort),
        }
    }

    /// Filters then sorts `products`.
    pub fn apply<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Vec<&'a Product> {
        sort_products(&filter_products(products, &self.filter), self.sort)
    }
}

/// Returns the products matching `filter`, in input order.
pub fn filter_products<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    filter: &ProductFilter,
) -> Vec<&'a Product> {
    products
        .into_iter()
        .filter(|product| filter.matches(product))
        .collect()
}

/// Returns `products` ordered by `key`.
///
/// The sort is stable, so ties keep their input order. Unpriced products sort
/// after priced ones in both price orders.
pub fn sort_products<'a>(products: &[&'a Product], key: SortKey) -> Vec<&'a Product> {
    let mut sorted = products.to_vec();

    match key {
        SortKey::Featured => {}
        SortKey::PriceAscending => sorted.sort_by(|a, b| compare_price(a, b, false)),
        SortKey::PriceDescending => sorted.sort_by(|a, b| compare_price(a, b, true)),
        SortKey::NameAscending => sorted.sort_by(|a, b| compare_name(a, b)),
        SortKey::NameDescending => sorted.sort_by(|a, b| compare_name(b, a)),
    }

    sorted
}

fn compare_price(a: &Product, b: &Product, descending: bool) -> Ordering {
    match (a.price, b.price) {
        (Some(a), Some(b)) => {
            let ordering = a.to_minor_units().cmp(&b.to_minor_units());

            if descending { ordering.reverse() } else { ordering }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_name(a: &Product, b: &Product) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(&b.name))
}

/// Picks up to `limit` other products to show alongside `product`.
///
/// Products in the same category come first, then the rest; both groups keep
/// input order. `product` itself is never suggested.
pub fn suggest_related<'a>(
    product: &Product,
    products: impl IntoIterator<Item = &'a Product>,
    limit: usize,
) -> Vec<&'a Product> {
    let (mut related, others): (Vec<&Product>, Vec<&Product>) = products
        .into_iter()
        .filter(|candidate| candidate.id != product.id)
        .partition(|candidate| candidate.category == product.category);

    related.extend(others);
    related.truncate(limit);

    related
}
