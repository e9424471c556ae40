//! Products
//!
//! Read-only catalog records: products, services, add-ons and reviews.

use std::{fmt, str::FromStr};

use decimal_percentage::Percentage;
use jiff::civil::Date;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

/// Badge text that marks a product as trending.
pub const POPULAR_BADGE: &str = "Popular";

/// Returned when a token does not name a known category or kind.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {0}: {1}")]
pub struct UnknownVariant(&'static str, String);

/// Listing category. Closed set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Balloon arches.
    Arches,
    /// Balloon garlands.
    Garlands,
    /// Balloon columns.
    Columns,
    /// Balloon bouquets.
    Bouquets,
    /// Custom printed balloons.
    Custom,
    /// Multi-piece event packages.
    Packages,
    /// Decoration services.
    Services,
}

impl Category {
    /// Every category, in storefront order.
    pub const ALL: [Category; 7] = [
        Category::Arches,
        Category::Garlands,
        Category::Columns,
        Category::Bouquets,
        Category::Custom,
        Category::Packages,
        Category::Services,
    ];

    /// Identifier used in URLs and fixtures.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Arches => "arches",
            Category::Garlands => "garlands",
            Category::Columns => "columns",
            Category::Bouquets => "bouquets",
            Category::Custom => "custom",
            Category::Packages => "packages",
            Category::Services => "services",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Arches => "Arches",
            Category::Garlands => "Garlands",
            Category::Columns => "Columns",
            Category::Bouquets => "Bouquets",
            Category::Custom => "Custom",
            Category::Packages => "Packages",
            Category::Services => "Services",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant("category", s.to_string()))
    }
}

/// Whether a catalog entry is a product or a service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Delivered goods.
    Product,
    /// Booked service.
    Service,
}

impl ProductKind {
    /// Identifier used in URLs and fixtures.
    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Product => "product",
            ProductKind::Service => "service",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" => Ok(ProductKind::Product),
            "service" => Ok(ProductKind::Service),
            _ => Err(UnknownVariant("product kind", s.to_string())),
        }
    }
}

/// Occasion a review or booking is for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub enum EventType {
    /// Birthday party.
    #[serde(rename = "Birthday Party")]
    BirthdayParty,
    /// Wedding.
    Wedding,
    /// Corporate event.
    #[serde(rename = "Corporate Event")]
    CorporateEvent,
    /// Baby shower.
    #[serde(rename = "Baby Shower")]
    BabyShower,
    /// Graduation.
    Graduation,
    /// Anything else.
    Other,
}

impl EventType {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            EventType::BirthdayParty => "Birthday Party",
            EventType::Wedding => "Wedding",
            EventType::CorporateEvent => "Corporate Event",
            EventType::BabyShower => "Baby Shower",
            EventType::Graduation => "Graduation",
            EventType::Other => "Other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EventType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            EventType::BirthdayParty,
            EventType::Wedding,
            EventType::CorporateEvent,
            EventType::BabyShower,
            EventType::Graduation,
            EventType::Other,
        ]
        .into_iter()
        .find(|event| event.label().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| UnknownVariant("event type", s.to_string()))
    }
}

/// Customer review
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    /// Review id
    pub id: String,

    /// Author display name
    pub author: String,

    /// Rating, 1 to 5
    pub rating: u8,

    /// Date the review was left
    pub date: Date,

    /// Review body
    pub text: String,

    /// Occasion, if given
    pub event: Option<EventType>,
}

/// Optional extra attachable to a product.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOn {
    /// Add-on id
    pub id: String,

    /// Add-on name
    pub name: String,

    /// Add-on description
    pub description: String,

    /// Add-on price
    pub price: Money<'static, Currency>,
}

/// Product
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Short description used on listing cards
    pub description: String,

    /// Long description used on the detail page
    pub long_description: String,

    /// Product price. `None` for entries sold by quote.
    pub price: Option<Money<'static, Currency>>,

    /// Label shown instead of, or alongside, the price (e.g. "Contact for Quote")
    pub price_label: Option<String>,

    /// Pre-sale price, when discounted
    pub original_price: Option<Money<'static, Currency>>,

    /// Main image
    pub image: String,

    /// Gallery images
    pub images: Vec<String>,

    /// Badge text (e.g. "Popular", "Sale")
    pub badge: Option<String>,

    /// Whether the product can currently be booked
    pub in_stock: bool,

    /// Listing category
    pub category: Category,

    /// Product or service
    pub kind: ProductKind,

    /// Feature bullet points
    pub features: Vec<String>,

    /// Customer reviews
    pub reviews: Vec<Review>,

    /// Ids of add-ons offered with this product. May reference add-ons that
    /// no longer exist.
    pub add_ons: SmallVec<[String; 5]>,
}

impl Product {
    /// Discount from the original price as a fraction (0.375 for $8 → $5).
    ///
    /// `None` unless both prices are set and the original is higher.
    pub fn discount_percent(&self) -> Option<Percentage> {
        let price = self.price?.to_minor_units();
        let original = self.original_price?.to_minor_units();

        if original <= price || original <= 0 {
            return None;
        }

        Some(Percentage::from(
            Decimal::from(original - price) / Decimal::from(original),
        ))
    }

    /// Mean review rating, or `None` without reviews.
    pub fn average_rating(&self) -> Option<Decimal> {
        average_rating(&self.reviews)
    }

    /// Whether the product carries the trending badge.
    pub fn is_popular(&self) -> bool {
        self.badge.as_deref() == Some(POPULAR_BADGE)
    }
}

/// Service listed on the services page.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceItem {
    /// Service id
    pub id: String,

    /// Service name
    pub name: String,

    /// Short description
    pub description: String,

    /// Long description
    pub long_description: String,

    /// Starting price, if quoted up front
    pub price: Option<Money<'static, Currency>>,

    /// Price text shown to customers (e.g. "Starting at $350")
    pub price_label: String,

    /// Main image
    pub image: String,

    /// Feature bullet points
    pub features: Vec<String>,

    /// Customer reviews
    pub reviews: Vec<Review>,
}

impl ServiceItem {
    /// Mean review rating, or `None` without reviews.
    pub fn average_rating(&self) -> Option<Decimal> {
        average_rating(&self.reviews)
    }
}

fn average_rating(reviews: &[Review]) -> Option<Decimal> {
    if reviews.is_empty() {
        return None;
    }

    let sum: u32 = reviews.iter().map(|review| u32::from(review.rating)).sum();
    let count = u32::try_from(reviews.len()).ok()?;

    Some(Decimal::from(sum) / Decimal::from(count))
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusty_money::{Money, iso::USD};
    use smallvec::SmallVec;

    use super::{Category, Product, ProductKind};

    /// Minimal product for query tests.
    pub(crate) fn product(id: &str, category: Category, price: Option<i64>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Item {id}"),
            description: String::new(),
            long_description: String::new(),
            price: price.map(|major| Money::from_minor(major * 100, USD)),
            price_label: None,
            original_price: None,
            image: format!("/images/{id}.webp"),
            images: Vec::new(),
            badge: None,
            in_stock: true,
            category,
            kind: if category == Category::Packages || category == Category::Services {
                ProductKind::Service
            } else {
                ProductKind::Product
            },
            features: Vec::new(),
            reviews: Vec::new(),
            add_ons: SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::{test_support::product, *};

    fn review(rating: u8) -> Review {
        Review {
            id: format!("r{rating}"),
            author: "Sam".to_string(),
            rating,
            date: date(2025, 11, 15),
            text: String::new(),
            event: Some(EventType::Wedding),
        }
    }

    #[test]
    fn discount_percent_for_sale_item() {
        let mut printed = product("6", Category::Custom, Some(5));
        printed.original_price = Some(Money::from_minor(800, USD));

        assert_eq!(
            printed.discount_percent(),
            Some(Percentage::from(Decimal::new(375, 3)))
        );
    }

    #[test]
    fn discount_percent_none_without_markdown() {
        let mut arch = product("1", Category::Arches, Some(150));

        assert_eq!(arch.discount_percent(), None);

        arch.original_price = Some(Money::from_minor(10000, USD));
        assert_eq!(arch.discount_percent(), None);
    }

    #[test]
    fn average_rating_over_reviews() {
        let mut arch = product("1", Category::Arches, Some(150));

        assert_eq!(arch.average_rating(), None);

        arch.reviews = vec![review(5), review(5), review(4)];

        assert_eq!(
            arch.average_rating().map(|avg| avg.round_dp(2)),
            Some(Decimal::new(467, 2))
        );
    }

    #[test]
    fn parses_tokens_case_insensitively() -> TestResult {
        assert_eq!("Arches".parse::<Category>()?, Category::Arches);
        assert_eq!("service".parse::<ProductKind>()?, ProductKind::Service);
        assert_eq!("baby shower".parse::<EventType>()?, EventType::BabyShower);
        assert!("balloons".parse::<Category>().is_err());

        Ok(())
    }

    #[test]
    fn popular_badge_detection() {
        let mut arch = product("1", Category::Arches, Some(150));
        assert!(!arch.is_popular());

        arch.badge = Some(POPULAR_BADGE.to_string());
        assert!(arch.is_popular());
    }
}
