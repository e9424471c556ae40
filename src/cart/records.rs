//! Persisted cart records.
//!
//! The durable layout is a single JSON document per key:
//!
//! ```json
//! { "version": 1, "currency": "USD", "items": [
//!     { "id": "1", "name": "...", "description": "...", "price": "150.00",
//!       "image": "...", "quantity": 2, "type": "product" }
//! ] }
//! ```
//!
//! Carts written before versioning are a bare array with numeric prices and
//! are still accepted on read.

use std::str::FromStr;

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    cart::storage::PersistenceError,
    items::{ItemKind, LineItem, LineItemKey, NewLineItem},
    pricing::{decimal_from_minor_units, minor_units_from_decimal},
};

/// Current schema version of the persisted layout.
pub const CART_SCHEMA_VERSION: u32 = 1;

/// Prefix the unversioned layout put in front of add-on ids.
const LEGACY_ADD_ON_PREFIX: &str = "addon-";

/// Versioned cart document.
#[derive(Debug, Serialize, Deserialize)]
pub struct CartRecord {
    /// Schema version
    pub version: u32,

    /// ISO code of the currency every price is in
    pub currency: String,

    /// Line items in display order
    pub items: Vec<LineItemRecord>,
}

/// Persisted line item.
#[derive(Debug, Serialize, Deserialize)]
pub struct LineItemRecord {
    /// Item id
    pub id: String,

    /// Display name
    pub name: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Unit price as a decimal string in major units (e.g. `"150.00"`)
    pub price: String,

    /// Image path
    #[serde(default)]
    pub image: String,

    /// Quantity; must be positive
    pub quantity: i64,

    /// Provenance
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

/// Line item from the unversioned layout, where prices were plain numbers.
#[derive(Debug, Deserialize)]
struct LegacyLineItemRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    price: serde_json::Number,
    #[serde(default)]
    image: String,
    quantity: i64,
    #[serde(rename = "type")]
    kind: ItemKind,
}

impl From<LegacyLineItemRecord> for LineItemRecord {
    fn from(legacy: LegacyLineItemRecord) -> Self {
        let stripped = legacy
            .id
            .strip_prefix(LEGACY_ADD_ON_PREFIX)
            .filter(|id| legacy.kind == ItemKind::AddOn && !id.is_empty())
            .map(str::to_string);
        let id = stripped.unwrap_or(legacy.id);

        Self {
            id,
            name: legacy.name,
            description: legacy.description,
            price: legacy.price.to_string(),
            image: legacy.image,
            quantity: legacy.quantity,
            kind: legacy.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned(CartRecord),
    Legacy(Vec<LegacyLineItemRecord>),
}

impl CartRecord {
    /// Builds the persisted form of the given items.
    pub fn from_items(items: &[LineItem], currency: &'static Currency) -> Self {
        Self {
            version: CART_SCHEMA_VERSION,
            currency: currency.iso_alpha_code.to_string(),
            items: items.iter().map(LineItemRecord::from).collect(),
        }
    }

    /// Parses a stored document in either the versioned or the legacy layout.
    ///
    /// Legacy documents are assumed to be in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Malformed`] if the text matches neither layout.
    pub fn parse(raw: &str, currency: &'static Currency) -> Result<Self, PersistenceError> {
        match serde_json::from_str::<StoredCart>(raw)? {
            StoredCart::Versioned(record) => Ok(record),
            StoredCart::Legacy(items) => Ok(Self {
                version: 0,
                currency: currency.iso_alpha_code.to_string(),
                items: items.into_iter().map(LineItemRecord::from).collect(),
            }),
        }
    }

    /// Validates the record and converts it into line items.
    ///
    /// The whole document is rejected if any record is invalid, so a partially
    /// corrupt cart never hydrates.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::UnsupportedVersion`]: written by a newer schema.
    /// - [`PersistenceError::CurrencyMismatch`]: stored in another currency.
    /// - [`PersistenceError::InvalidRecord`]: bad price or quantity.
    /// - [`PersistenceError::DuplicateItem`]: two records share an identity.
    pub fn into_line_items(
        self,
        currency: &'static Currency,
    ) -> Result<Vec<LineItem>, PersistenceError> {
        if self.version > CART_SCHEMA_VERSION {
            return Err(PersistenceError::UnsupportedVersion(self.version));
        }

        if !self.currency.eq_ignore_ascii_case(currency.iso_alpha_code) {
            return Err(PersistenceError::CurrencyMismatch(
                self.currency,
                currency.iso_alpha_code,
            ));
        }

        let mut seen = FxHashSet::default();

        self.items
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let item = record.into_line_item(index, currency)?;

                if seen.insert(item.key().clone()) {
                    Ok(item)
                } else {
                    Err(PersistenceError::DuplicateItem(item.key().to_string()))
                }
            })
            .collect()
    }
}

impl LineItemRecord {
    fn into_line_item(
        self,
        index: usize,
        currency: &'static Currency,
    ) -> Result<LineItem, PersistenceError> {
        if self.id.is_empty() {
            return Err(PersistenceError::InvalidRecord(index, "empty id"));
        }

        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or(PersistenceError::InvalidRecord(index, "quantity out of range"))?;

        let amount = Decimal::from_str(self.price.trim())
            .map_err(|_err| PersistenceError::InvalidRecord(index, "unparseable price"))?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PersistenceError::InvalidRecord(index, "negative price"));
        }

        let minor = minor_units_from_decimal(amount, currency)
            .ok_or(PersistenceError::InvalidRecord(index, "price precision"))?;

        let item = NewLineItem::new(
            LineItemKey::new(self.kind, self.id),
            self.name,
            Money::from_minor(minor, currency),
        )
        .with_description(self.description)
        .with_image(self.image);

        Ok(LineItem::from_new(item, quantity))
    }
}

impl From<&LineItem> for LineItemRecord {
    fn from(item: &LineItem) -> Self {
        let price = item.price();

        Self {
            id: item.id().to_string(),
            name: item.name().to_string(),
            description: item.description().to_string(),
            price: decimal_from_minor_units(price.to_minor_units(), price.currency()).to_string(),
            image: item.image().to_string(),
            quantity: i64::from(item.quantity()),
            kind: item.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{EUR, USD};
    use testresult::TestResult;

    use super::*;

    fn arch(quantity: u32) -> LineItem {
        LineItem::from_new(
            NewLineItem::new(
                LineItemKey::product("1"),
                "Single Balloon Arch",
                Money::from_minor(15000, USD),
            ),
            quantity,
        )
    }

    #[test]
    fn writes_versioned_layout() -> TestResult {
        let record = CartRecord::from_items(&[arch(2)], USD);
        let json: serde_json::Value = serde_json::to_value(&record)?;

        assert_eq!(json["version"], 1);
        assert_eq!(json["currency"], "USD");
        assert_eq!(json["items"][0]["price"], "150.00");
        assert_eq!(json["items"][0]["type"], "product");
        assert_eq!(json["items"][0]["quantity"], 2);

        Ok(())
    }

    #[test]
    fn reads_legacy_bare_array() -> TestResult {
        let raw = r#"[{"id":"addon-ao1","name":"Extra Latex Balloons","description":"",
            "price":12,"image":"/images/a.webp","quantity":2,"type":"addon"}]"#;

        let items = CartRecord::parse(raw, USD)?.into_line_items(USD)?;

        let item = items.first().ok_or("expected one item")?;
        assert_eq!(item.key(), &LineItemKey::add_on("ao1"));
        assert_eq!(item.price(), &Money::from_minor(1200, USD));
        assert_eq!(item.quantity(), 2);

        Ok(())
    }

    #[test]
    fn legacy_prefix_only_stripped_from_add_ons() -> TestResult {
        let raw = r#"[
            {"id":"addon-1","name":"Odd Product","price":5,"quantity":1,"type":"product"},
            {"id":"addon-","name":"Blank Add-on","price":5,"quantity":1,"type":"addon"}]"#;

        let items = CartRecord::parse(raw, USD)?.into_line_items(USD)?;

        let keys: Vec<&LineItemKey> = items.iter().map(LineItem::key).collect();
        assert_eq!(
            keys,
            [&LineItemKey::product("addon-1"), &LineItemKey::add_on("addon-")]
        );

        Ok(())
    }

    #[test]
    fn versioned_add_on_ids_are_kept() -> TestResult {
        let raw = r#"{"version":1,"currency":"USD","items":[
            {"id":"addon-ao1","name":"Lights","price":"15.00","quantity":1,"type":"addon"}]}"#;

        let items = CartRecord::parse(raw, USD)?.into_line_items(USD)?;

        let item = items.first().ok_or("expected one item")?;
        assert_eq!(item.key(), &LineItemKey::add_on("addon-ao1"));

        Ok(())
    }

    #[test]
    fn rejects_zero_quantity() -> TestResult {
        let raw = r#"{"version":1,"currency":"USD","items":[
            {"id":"1","name":"Arch","price":"150.00","quantity":0,"type":"product"}]}"#;

        let result = CartRecord::parse(raw, USD)?.into_line_items(USD);

        assert!(matches!(result, Err(PersistenceError::InvalidRecord(0, _))));

        Ok(())
    }

    #[test]
    fn rejects_negative_price() -> TestResult {
        let raw = r#"{"version":1,"currency":"USD","items":[
            {"id":"1","name":"Arch","price":"-1.00","quantity":1,"type":"product"}]}"#;

        let result = CartRecord::parse(raw, USD)?.into_line_items(USD);

        assert!(matches!(result, Err(PersistenceError::InvalidRecord(0, _))));

        Ok(())
    }

    #[test]
    fn rejects_duplicate_identities() -> TestResult {
        let raw = r#"{"version":1,"currency":"USD","items":[
            {"id":"1","name":"Arch","price":"150.00","quantity":1,"type":"product"},
            {"id":"1","name":"Arch","price":"150.00","quantity":2,"type":"product"}]}"#;

        let result = CartRecord::parse(raw, USD)?.into_line_items(USD);

        assert!(matches!(result, Err(PersistenceError::DuplicateItem(key)) if key == "product:1"));

        Ok(())
    }

    #[test]
    fn allows_same_id_across_kinds() -> TestResult {
        let raw = r#"{"version":1,"currency":"USD","items":[
            {"id":"1","name":"Arch","price":"150.00","quantity":1,"type":"product"},
            {"id":"1","name":"Lights","price":"15.00","quantity":1,"type":"addon"}]}"#;

        let items = CartRecord::parse(raw, USD)?.into_line_items(USD)?;

        assert_eq!(items.len(), 2);

        Ok(())
    }

    #[test]
    fn rejects_newer_schema() -> TestResult {
        let raw = r#"{"version":9,"currency":"USD","items":[]}"#;

        let result = CartRecord::parse(raw, USD)?.into_line_items(USD);

        assert!(matches!(result, Err(PersistenceError::UnsupportedVersion(9))));

        Ok(())
    }

    #[test]
    fn rejects_other_currency() -> TestResult {
        let raw = serde_json::to_string(&CartRecord::from_items(&[], EUR))?;

        let result = CartRecord::parse(&raw, USD)?.into_line_items(USD);

        assert!(matches!(result, Err(PersistenceError::CurrencyMismatch(code, "USD")) if code == "EUR"));

        Ok(())
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            CartRecord::parse("{not json", USD),
            Err(PersistenceError::Malformed(_))
        ));
        assert!(matches!(
            CartRecord::parse(r#"{"items":"nope"}"#, USD),
            Err(PersistenceError::Malformed(_))
        ));
    }
}
