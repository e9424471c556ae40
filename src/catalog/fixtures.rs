//! Catalog Fixtures

use std::str::FromStr;

use jiff::civil::Date;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use smallvec::SmallVec;

use crate::{
    catalog::CatalogError,
    pricing::minor_units_from_decimal,
    products::{AddOn, Category, EventType, Product, ProductKind, Review, ServiceItem},
};

/// Whole catalog document
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Add-ons offered alongside products
    #[serde(default)]
    pub add_ons: Vec<AddOnFixture>,

    /// Products and packages, in featured order
    #[serde(default)]
    pub products: Vec<ProductFixture>,

    /// Services page entries
    #[serde(default)]
    pub services: Vec<ServiceFixture>,
}

/// Add-On Fixture
#[derive(Debug, Deserialize)]
pub struct AddOnFixture {
    /// Add-on id
    pub id: String,

    /// Add-on name
    pub name: String,

    /// Add-on description
    #[serde(default)]
    pub description: String,

    /// Price (e.g., "12.00 USD")
    pub price: String,
}

/// Review Fixture
#[derive(Debug, Deserialize)]
pub struct ReviewFixture {
    /// Review id
    pub id: String,

    /// Author display name
    pub author: String,

    /// Rating, 1 to 5
    pub rating: u8,

    /// ISO date (e.g., "2025-11-15")
    pub date: String,

    /// Review body
    pub text: String,

    /// Occasion
    #[serde(default)]
    pub event: Option<EventType>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id
    pub id: String,

    /// Product name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Long description
    #[serde(default)]
    pub long_description: String,

    /// Price (e.g., "150.00 USD"); omitted for quote-only entries
    #[serde(default)]
    pub price: Option<String>,

    /// Price label
    #[serde(default)]
    pub price_label: Option<String>,

    /// Pre-sale price
    #[serde(default)]
    pub original_price: Option<String>,

    /// Main image
    #[serde(default)]
    pub image: String,

    /// Gallery images
    #[serde(default)]
    pub images: Vec<String>,

    /// Badge text
    #[serde(default)]
    pub badge: Option<String>,

    /// Bookable
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,

    /// Listing category
    pub category: Category,

    /// Product or service
    #[serde(rename = "type")]
    pub kind: ProductKind,

    /// Feature bullet points
    #[serde(default)]
    pub features: Vec<String>,

    /// Reviews
    #[serde(default)]
    pub reviews: Vec<ReviewFixture>,

    /// Add-on ids
    #[serde(default)]
    pub add_ons: Vec<String>,
}

/// Service Fixture
#[derive(Debug, Deserialize)]
pub struct ServiceFixture {
    /// Service id
    pub id: String,

    /// Service name
    pub name: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Long description
    #[serde(default)]
    pub long_description: String,

    /// Starting price
    #[serde(default)]
    pub price: Option<String>,

    /// Price label
    pub price_label: String,

    /// Main image
    #[serde(default)]
    pub image: String,

    /// Feature bullet points
    #[serde(default)]
    pub features: Vec<String>,

    /// Reviews
    #[serde(default)]
    pub reviews: Vec<ReviewFixture>,
}

fn in_stock_default() -> bool {
    true
}

impl TryFrom<AddOnFixture> for AddOn {
    type Error = CatalogError;

    fn try_from(fixture: AddOnFixture) -> Result<Self, Self::Error> {
        Ok(AddOn {
            price: parse_money(&fixture.price)?,
            id: fixture.id,
            name: fixture.name,
            description: fixture.description,
        })
    }
}

impl TryFrom<ReviewFixture> for Review {
    type Error = CatalogError;

    fn try_from(fixture: ReviewFixture) -> Result<Self, Self::Error> {
        if !(1..=5).contains(&fixture.rating) {
            return Err(CatalogError::InvalidRating(fixture.id, fixture.rating));
        }

        let date = Date::from_str(fixture.date.trim())
            .map_err(|_err| CatalogError::InvalidDate(fixture.id.clone(), fixture.date.clone()))?;

        Ok(Review {
            id: fixture.id,
            author: fixture.author,
            rating: fixture.rating,
            date,
            text: fixture.text,
            event: fixture.event,
        })
    }
}

impl TryFrom<ProductFixture> for Product {
    type Error = CatalogError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        Ok(Product {
            price: fixture.price.as_deref().map(parse_money).transpose()?,
            original_price: fixture
                .original_price
                .as_deref()
                .map(parse_money)
                .transpose()?,
            reviews: convert_reviews(fixture.reviews)?,
            id: fixture.id,
            name: fixture.name,
            description: fixture.description,
            long_description: fixture.long_description,
            price_label: fixture.price_label,
            image: fixture.image,
            images: fixture.images,
            badge: fixture.badge,
            in_stock: fixture.in_stock,
            category: fixture.category,
            kind: fixture.kind,
            features: fixture.features,
            add_ons: SmallVec::from_vec(fixture.add_ons),
        })
    }
}

impl TryFrom<ServiceFixture> for ServiceItem {
    type Error = CatalogError;

    fn try_from(fixture: ServiceFixture) -> Result<Self, Self::Error> {
        Ok(ServiceItem {
            price: fixture.price.as_deref().map(parse_money).transpose()?,
            reviews: convert_reviews(fixture.reviews)?,
            id: fixture.id,
            name: fixture.name,
            description: fixture.description,
            long_description: fixture.long_description,
            price_label: fixture.price_label,
            image: fixture.image,
            features: fixture.features,
        })
    }
}

fn convert_reviews(reviews: Vec<ReviewFixture>) -> Result<Vec<Review>, CatalogError> {
    reviews.into_iter().map(Review::try_from).collect()
}

fn parse_money(s: &str) -> Result<Money<'static, Currency>, CatalogError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "150.00 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if
/// the amount is negative or more precise than the currency allows, or if the
/// currency code is not an ISO code.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CatalogError::InvalidPrice(s.to_string()));
    }

    let currency = iso::find(currency_code)
        .ok_or_else(|| CatalogError::UnknownCurrency((*currency_code).to_string()))?;

    let minor_units = minor_units_from_decimal(amount, currency)
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}
