//! Cart
//!
//! The authoritative, persisted set of items a visitor intends to order.
//!
//! A [`Cart`] owns an ordered list of [`LineItem`]s and a [`CartStorage`]
//! adapter. It hydrates once on [`Cart::open`] and writes through after every
//! mutation. Storage failures never fail a cart operation: they are logged,
//! kept in [`Cart::persistence_error`], and the in-memory state stays
//! authoritative for the rest of the session.
//!
//! Nothing coordinates two carts backed by the same key. Whichever saves last
//! wins, and the other's changes are lost on the next reload.

use std::fmt;

use rusty_money::{Money, iso::Currency};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    items::{LineItem, LineItemKey, NewLineItem},
    pricing::{total_price, total_quantity},
};

pub mod records;
pub mod storage;

pub use storage::{
    CartStorage, DEFAULT_CART_KEY, FileStore, JsonCartStorage, KeyValueStore, MemoryStore,
    PersistenceError,
};

new_key_type! {
    /// Handle returned by [`Cart::subscribe`].
    pub struct SubscriptionKey;
}

/// Errors rejecting a cart addition.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// An item was added with a quantity of zero.
    #[error("cannot add {0} with a quantity of zero")]
    ZeroQuantity(LineItemKey),

    /// An item's currency differs from the cart currency (item, item currency, cart currency).
    #[error("item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(LineItemKey, &'static str, &'static str),
}

/// Point-in-time view of a cart handed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    /// Line items in display order
    pub items: Vec<LineItem>,

    /// `Σ(price × quantity)`
    pub total: Money<'static, Currency>,

    /// `Σ quantity`
    pub count: u64,
}

type Listener = Box<dyn FnMut(&CartSnapshot)>;

/// Shopping cart with merge-on-add semantics and write-through persistence.
pub struct Cart {
    items: Vec<LineItem>,
    currency: &'static Currency,
    storage: Box<dyn CartStorage>,
    listeners: SlotMap<SubscriptionKey, Listener>,
    loaded: bool,
    persistence_error: Option<PersistenceError>,
}

impl fmt::Debug for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("items", &self.items)
            .field("currency", &self.currency.iso_alpha_code)
            .field("storage", &self.storage)
            .field("listeners", &self.listeners.len())
            .field("loaded", &self.loaded)
            .field("persistence_error", &self.persistence_error)
            .finish()
    }
}

impl Cart {
    /// Opens a cart, hydrating it from `storage`.
    ///
    /// Missing, unreadable or invalid stored data yields an empty cart.
    /// Hydration never writes back.
    pub fn open(storage: impl CartStorage + 'static, currency: &'static Currency) -> Self {
        let (items, loaded) = match storage.load(currency) {
            Ok(Some(items)) => {
                debug!(items = items.len(), "hydrated cart from storage");
                (items, true)
            }
            Ok(None) => (Vec::new(), false),
            Err(error) => {
                warn!(%error, "discarding unreadable stored cart");
                (Vec::new(), false)
            }
        };

        Self {
            items,
            currency,
            storage: Box::new(storage),
            listeners: SlotMap::with_key(),
            loaded,
            persistence_error: None,
        }
    }

    /// Adds one of `item`. See [`Cart::add_item`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the item is priced in another currency.
    pub fn add_one(&mut self, item: NewLineItem) -> Result<(), CartError> {
        self.add_item(item, 1)
    }

    /// Adds `quantity` of `item`.
    ///
    /// If a line with the same key exists its quantity is incremented and its
    /// other fields are left as they were; otherwise a new line is appended.
    ///
    /// # Errors
    ///
    /// - [`CartError::ZeroQuantity`]: `quantity` is zero. The cart is unchanged.
    /// - [`CartError::CurrencyMismatch`]: the item is priced in another currency.
    pub fn add_item(&mut self, item: NewLineItem, quantity: u32) -> Result<(), CartError> {
        self.check_addition(&item, quantity)?;
        self.merge(item, quantity);
        self.commit();

        Ok(())
    }

    /// Adds several items with a single write and notification.
    ///
    /// Every addition is validated before any is applied, so on error the cart
    /// is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first [`CartError`] any addition would raise.
    pub fn add_items(
        &mut self,
        additions: impl IntoIterator<Item = (NewLineItem, u32)>,
    ) -> Result<(), CartError> {
        let additions: Vec<(NewLineItem, u32)> = additions.into_iter().collect();

        for (item, quantity) in &additions {
            self.check_addition(item, *quantity)?;
        }

        if additions.is_empty() {
            return Ok(());
        }

        for (item, quantity) in additions {
            self.merge(item, quantity);
        }

        self.commit();

        Ok(())
    }

    /// Replaces the quantity of the line with `key`.
    ///
    /// A quantity of zero or less removes the line. Unknown keys are a no-op
    /// apart from the write-through.
    pub fn update_quantity(&mut self, key: &LineItemKey, quantity: i64) {
        if quantity <= 0 {
            self.items.retain(|item| item.key() != key);
        } else if let Some(item) = self.items.iter_mut().find(|item| item.key() == key) {
            item.set_quantity(u32::try_from(quantity).unwrap_or(u32::MAX));
        }

        debug!(%key, quantity, "updated cart quantity");
        self.commit();
    }

    /// Removes the line with `key`, if present.
    pub fn remove_item(&mut self, key: &LineItemKey) {
        self.items.retain(|item| item.key() != key);

        debug!(%key, "removed cart item");
        self.commit();
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        self.items.clear();

        debug!("cleared cart");
        self.commit();
    }

    /// Line items in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Looks up a line by key.
    pub fn get(&self, key: &LineItemKey) -> Option<&LineItem> {
        self.items.iter().find(|item| item.key() == key)
    }

    /// `Σ(price × quantity)`, recomputed on every call.
    pub fn total(&self) -> Money<'static, Currency> {
        total_price(&self.items, self.currency)
    }

    /// `Σ quantity`, recomputed on every call.
    pub fn count(&self) -> u64 {
        total_quantity(&self.items)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The cart currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Whether hydration found a stored cart, even an empty one.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The most recent save failure, cleared by the next successful save.
    pub fn persistence_error(&self) -> Option<&PersistenceError> {
        self.persistence_error.as_ref()
    }

    /// Current items, total and count.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            total: self.total(),
            count: self.count(),
        }
    }

    /// Registers a listener called with a fresh snapshot after every mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&CartSnapshot) + 'static) -> SubscriptionKey {
        self.listeners.insert(Box::new(listener))
    }

    /// Removes a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, key: SubscriptionKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    fn check_addition(&self, item: &NewLineItem, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity(item.key.clone()));
        }

        let item_currency = item.price.currency();

        if item_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                item.key.clone(),
                item_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        Ok(())
    }

    fn merge(&mut self, item: NewLineItem, quantity: u32) {
        if let Some(existing) = self.items.iter_mut().find(|line| line.key() == &item.key) {
            existing.increment(quantity);
            debug!(key = %item.key, quantity = existing.quantity(), "merged into existing cart line");
        } else {
            debug!(key = %item.key, quantity, "appended cart line");
            self.items.push(LineItem::from_new(item, quantity));
        }
    }

    fn commit(&mut self) {
        match self.storage.save(&self.items, self.currency) {
            Ok(()) => self.persistence_error = None,
            Err(error) => {
                warn!(%error, "cart not persisted; changes will be lost on reload");
                self.persistence_error = Some(error);
            }
        }

        if self.listeners.is_empty() {
            return;
        }

        let snapshot = self.snapshot();

        for listener in self.listeners.values_mut() {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use rusty_money::iso::{EUR, USD};
    use testresult::TestResult;

    use super::*;

    fn item(id: &str, minor: i64) -> NewLineItem {
        NewLineItem::new(LineItemKey::product(id), format!("Item {id}"), Money::from_minor(minor, USD))
    }

    fn empty_cart() -> (Cart, MemoryStore) {
        let store = MemoryStore::new();
        let cart = Cart::open(JsonCartStorage::new(store.clone()), USD);

        (cart, store)
    }

    fn keys(cart: &Cart) -> Vec<&str> {
        cart.items().iter().map(LineItem::id).collect()
    }

    #[test]
    fn add_merges_same_key() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_item(item("1", 15000), 2)?;
        cart.add_item(item("1", 15000), 3)?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 5);

        Ok(())
    }

    #[test]
    fn merge_keeps_existing_fields() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_item(item("1", 15000), 1)?;
        cart.add_item(
            NewLineItem::new(LineItemKey::product("1"), "Renamed", Money::from_minor(99, USD)),
            1,
        )?;

        let line = cart.get(&LineItemKey::product("1")).ok_or("missing line")?;
        assert_eq!(line.name(), "Item 1");
        assert_eq!(line.price(), &Money::from_minor(15000, USD));
        assert_eq!(line.quantity(), 2);

        Ok(())
    }

    #[test]
    fn merge_preserves_first_position() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_one(item("a", 100))?;
        cart.add_one(item("b", 200))?;
        cart.add_one(item("a", 100))?;

        assert_eq!(keys(&cart), ["a", "b"]);

        Ok(())
    }

    #[test]
    fn same_id_different_kind_are_separate_lines() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_one(item("1", 15000))?;
        cart.add_one(NewLineItem::new(
            LineItemKey::add_on("1"),
            "LED Balloon Lights",
            Money::from_minor(1500, USD),
        ))?;

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total(), Money::from_minor(16500, USD));

        Ok(())
    }

    #[test]
    fn zero_quantity_add_is_rejected() -> TestResult {
        let (mut cart, store) = empty_cart();

        let result = cart.add_item(item("1", 100), 0);

        assert_eq!(result, Err(CartError::ZeroQuantity(LineItemKey::product("1"))));
        assert!(cart.is_empty());
        assert_eq!(store.raw(DEFAULT_CART_KEY), None);

        Ok(())
    }

    #[test]
    fn foreign_currency_add_is_rejected() {
        let (mut cart, _) = empty_cart();

        let result = cart.add_one(NewLineItem::new(
            LineItemKey::product("1"),
            "Arch",
            Money::from_minor(100, EUR),
        ));

        assert_eq!(
            result,
            Err(CartError::CurrencyMismatch(LineItemKey::product("1"), "EUR", "USD"))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_replaces() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_item(item("1", 100), 4)?;
        cart.update_quantity(&LineItemKey::product("1"), 2);

        assert_eq!(cart.count(), 2);

        Ok(())
    }

    #[test]
    fn update_quantity_zero_or_negative_removes() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_one(item("1", 100))?;
        cart.add_one(item("2", 100))?;
        cart.update_quantity(&LineItemKey::product("1"), 0);
        cart.update_quantity(&LineItemKey::product("2"), -3);

        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn update_quantity_unknown_key_is_noop() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_one(item("1", 100))?;
        cart.update_quantity(&LineItemKey::product("9"), 7);
        cart.update_quantity(&LineItemKey::product("9"), 0);

        assert_eq!(keys(&cart), ["1"]);
        assert_eq!(cart.count(), 1);

        Ok(())
    }

    #[test]
    fn remove_and_clear() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_one(item("1", 100))?;
        cart.add_one(item("2", 100))?;
        cart.remove_item(&LineItemKey::product("1"));
        cart.remove_item(&LineItemKey::product("1"));

        assert_eq!(keys(&cart), ["2"]);

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Money::from_minor(0, USD));
        assert_eq!(cart.count(), 0);

        Ok(())
    }

    #[test]
    fn total_tracks_every_mutation() -> TestResult {
        let (mut cart, _) = empty_cart();

        cart.add_item(item("1", 15000), 2)?;
        cart.add_item(item("2", 1250), 3)?;
        assert_eq!(cart.total(), Money::from_minor(33750, USD));

        cart.update_quantity(&LineItemKey::product("1"), 1);
        assert_eq!(cart.total(), Money::from_minor(18750, USD));

        cart.remove_item(&LineItemKey::product("2"));
        assert_eq!(cart.total(), Money::from_minor(15000, USD));

        Ok(())
    }

    #[test]
    fn add_items_applies_all_or_nothing() -> TestResult {
        let (mut cart, _) = empty_cart();

        let result = cart.add_items([(item("1", 100), 1), (item("2", 100), 0)]);

        assert!(result.is_err());
        assert!(cart.is_empty());

        cart.add_items([(item("1", 100), 1), (item("2", 100), 2), (item("1", 100), 1)])?;

        assert_eq!(keys(&cart), ["1", "2"]);
        assert_eq!(cart.count(), 4);

        Ok(())
    }

    #[test]
    fn mutations_write_through() -> TestResult {
        let (mut cart, store) = empty_cart();

        cart.add_one(item("1", 100))?;

        let saved = JsonCartStorage::new(store.clone()).load(USD)?;
        assert_eq!(saved.as_deref(), Some(cart.items()));

        cart.clear();

        let saved = JsonCartStorage::new(store).load(USD)?;
        assert_eq!(saved, Some(Vec::new()));

        Ok(())
    }

    #[test]
    fn hydration_does_not_write() {
        let store = MemoryStore::new();
        let _cart = Cart::open(JsonCartStorage::new(store.clone()), USD);

        assert_eq!(store.raw(DEFAULT_CART_KEY), None);
    }

    #[test]
    fn malformed_storage_hydrates_empty() {
        let store = MemoryStore::new();
        store.insert_raw(DEFAULT_CART_KEY, "definitely not json");

        let cart = Cart::open(JsonCartStorage::new(store.clone()), USD);

        assert!(cart.is_empty());
        assert!(!cart.is_loaded());
        assert_eq!(store.raw(DEFAULT_CART_KEY).as_deref(), Some("definitely not json"));
    }

    #[test]
    fn unreadable_storage_hydrates_empty() {
        let store = MemoryStore::new();
        store.set_fail_reads(true);

        let cart = Cart::open(JsonCartStorage::new(store), USD);

        assert!(cart.is_empty());
    }

    #[test]
    fn write_failure_keeps_memory_state() -> TestResult {
        let (mut cart, store) = empty_cart();
        store.set_fail_writes(true);

        cart.add_item(item("1", 100), 2)?;

        assert_eq!(cart.count(), 2);
        assert!(matches!(
            cart.persistence_error(),
            Some(PersistenceError::Unavailable(_))
        ));
        assert_eq!(store.raw(DEFAULT_CART_KEY), None);

        store.set_fail_writes(false);
        cart.add_one(item("1", 100))?;

        assert!(cart.persistence_error().is_none());
        assert!(store.raw(DEFAULT_CART_KEY).is_some());

        Ok(())
    }

    #[test]
    fn subscribers_see_each_mutation() -> TestResult {
        let (mut cart, _) = empty_cart();
        let seen: Rc<RefCell<Vec<(u64, i64)>>> = Rc::default();
        let sink = Rc::clone(&seen);

        let key = cart.subscribe(move |snapshot| {
            sink.borrow_mut()
                .push((snapshot.count, snapshot.total.to_minor_units()));
        });

        cart.add_item(item("1", 500), 3)?;
        cart.update_quantity(&LineItemKey::product("1"), 1);

        assert!(cart.unsubscribe(key));
        assert!(!cart.unsubscribe(key));

        cart.clear();

        assert_eq!(*seen.borrow(), [(3, 1500), (1, 500)]);

        Ok(())
    }

    #[test]
    fn rejected_addition_does_not_notify() {
        let (mut cart, _) = empty_cart();
        let calls = Rc::new(RefCell::new(0_u32));
        let sink = Rc::clone(&calls);

        cart.subscribe(move |_| *sink.borrow_mut() += 1);

        assert!(cart.add_item(item("1", 100), 0).is_err());
        assert_eq!(*calls.borrow(), 0);
    }
}
