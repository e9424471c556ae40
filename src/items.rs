//! Items
//!
//! Cart line items and the descriptors used to add them.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::products::{AddOn, Product, ProductKind};

/// Provenance of a cart line item. Does not affect pricing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A physical product from the catalog.
    Product,

    /// A bookable service.
    Service,

    /// An add-on attached to a product.
    AddOn,
}

impl ItemKind {
    /// The persisted name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Product => "product",
            ItemKind::Service => "service",
            ItemKind::AddOn => "addon",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProductKind> for ItemKind {
    fn from(kind: ProductKind) -> Self {
        match kind {
            ProductKind::Product => ItemKind::Product,
            ProductKind::Service => ItemKind::Service,
        }
    }
}

/// Identity of a line item within a cart.
///
/// Ids are namespaced by kind, so a product and an add-on that share an id
/// string are still distinct lines.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineItemKey {
    kind: ItemKind,
    id: String,
}

impl LineItemKey {
    /// Creates a key from a kind and an id.
    pub fn new(kind: ItemKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Key for a product line.
    pub fn product(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Product, id)
    }

    /// Key for a service line.
    pub fn service(id: impl Into<String>) -> Self {
        Self::new(ItemKind::Service, id)
    }

    /// Key for an add-on line.
    pub fn add_on(id: impl Into<String>) -> Self {
        Self::new(ItemKind::AddOn, id)
    }

    /// Returns the kind part of the key.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Returns the id part of the key.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for LineItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Descriptor for an item being added to a cart. Carries no quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLineItem {
    /// Identity of the line.
    pub key: LineItemKey,

    /// Display name.
    pub name: String,

    /// Display description.
    pub description: String,

    /// Image path or URL.
    pub image: String,

    /// Unit price at the time of adding.
    pub price: Money<'static, Currency>,
}

impl NewLineItem {
    /// Creates a descriptor with an empty description and image.
    pub fn new(key: LineItemKey, name: impl Into<String>, price: Money<'static, Currency>) -> Self {
        Self {
            key,
            name: name.into(),
            description: String::new(),
            image: String::new(),
            price,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Builds a descriptor for a catalog product.
    ///
    /// Returns `None` for products sold by quote, which carry no price.
    pub fn from_product(product: &Product) -> Option<Self> {
        let price = product.price?;

        Some(
            Self::new(
                LineItemKey::new(product.kind.into(), product.id.clone()),
                product.name.clone(),
                price,
            )
            .with_description(product.description.clone())
            .with_image(product.image.clone()),
        )
    }

    /// Builds a descriptor for an add-on, shown with the parent product's image.
    pub fn from_add_on(add_on: &AddOn, image: impl Into<String>) -> Self {
        Self::new(
            LineItemKey::add_on(add_on.id.clone()),
            add_on.name.clone(),
            add_on.price,
        )
        .with_description(add_on.description.clone())
        .with_image(image)
    }
}

/// A row in the cart: one catalog entry and its requested quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    key: LineItemKey,
    name: String,
    description: String,
    image: String,
    price: Money<'static, Currency>,
    quantity: u32,
}

impl LineItem {
    /// Creates a line item from a descriptor.
    ///
    /// Callers must not pass a zero quantity; the cart rejects it before
    /// reaching here and the storage decoder refuses such records.
    pub(crate) fn from_new(item: NewLineItem, quantity: u32) -> Self {
        debug_assert!(quantity > 0, "line items must have a positive quantity");

        Self {
            key: item.key,
            name: item.name,
            description: item.description,
            image: item.image,
            price: item.price,
            quantity,
        }
    }

    /// Returns the identity of the line.
    pub fn key(&self) -> &LineItemKey {
        &self.key
    }

    /// Returns the id part of the identity.
    pub fn id(&self) -> &str {
        self.key.id()
    }

    /// Returns the kind of the line.
    pub fn kind(&self) -> ItemKind {
        self.key.kind()
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the display description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the image path.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Returns the unit price.
    pub fn price(&self) -> &Money<'static, Currency> {
        &self.price
    }

    /// Returns the quantity, always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns `price × quantity`.
    pub fn line_total(&self) -> Money<'static, Currency> {
        Money::from_minor(
            self.price
                .to_minor_units()
                .saturating_mul(i64::from(self.quantity)),
            self.price.currency(),
        )
    }

    pub(crate) fn increment(&mut self, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        debug_assert!(quantity > 0, "line items must have a positive quantity");

        self.quantity = quantity;
    }
}
