//! Add-on selection
//!
//! The detail page's configuration of a product: how many of it, and which of
//! its add-ons in what quantities.

use rusty_money::{Money, iso::Currency};

use crate::{
    catalog::Catalog,
    items::NewLineItem,
    products::{AddOn, Product},
};

/// A product plus the add-ons chosen for it.
#[derive(Debug, Clone)]
pub struct AddOnSelection<'a> {
    product: &'a Product,
    offered: Vec<&'a AddOn>,
    quantity: u32,
    selected: Vec<(&'a AddOn, u32)>,
}

impl<'a> AddOnSelection<'a> {
    /// Starts a selection of one `product` with no add-ons.
    pub fn new(catalog: &'a Catalog, product: &'a Product) -> Self {
        Self {
            product,
            offered: catalog.add_ons_for(product),
            quantity: 1,
            selected: Vec::new(),
        }
    }

    /// The product being configured.
    pub fn product(&self) -> &'a Product {
        self.product
    }

    /// Add-ons the product offers.
    pub fn offered(&self) -> &[&'a AddOn] {
        &self.offered
    }

    /// Chosen add-ons and their quantities, in the order they were chosen.
    pub fn selected(&self) -> &[(&'a AddOn, u32)] {
        &self.selected
    }

    /// Product quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Sets the product quantity. Zero is raised to one.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }

    /// Selects an offered add-on with a quantity of one, or deselects it if
    /// already selected. Returns whether it is now selected.
    pub fn toggle(&mut self, add_on_id: &str) -> bool {
        if let Some(position) = self.position(add_on_id) {
            self.selected.remove(position);
            return false;
        }

        self.set_add_on_quantity(add_on_id, 1)
    }

    /// Sets an offered add-on's quantity; zero deselects it.
    ///
    /// Returns `false` if the product does not offer the add-on.
    pub fn set_add_on_quantity(&mut self, add_on_id: &str, quantity: u32) -> bool {
        let Some(add_on) = self
            .offered
            .iter()
            .copied()
            .find(|add_on| add_on.id == add_on_id)
        else {
            return false;
        };

        match (self.position(add_on_id), quantity) {
            (Some(position), 0) => {
                self.selected.remove(position);
            }
            (Some(position), quantity) => {
                if let Some(entry) = self.selected.get_mut(position) {
                    entry.1 = quantity;
                }
            }
            (None, 0) => {}
            (None, quantity) => self.selected.push((add_on, quantity)),
        }

        true
    }

    /// `product price × quantity + Σ add-on price × quantity`.
    ///
    /// `None` when the product has no price.
    pub fn total(&self) -> Option<Money<'static, Currency>> {
        let price = self.product.price?;

        let minor = self.selected.iter().fold(
            price
                .to_minor_units()
                .saturating_mul(i64::from(self.quantity)),
            |acc, (add_on, quantity)| {
                acc.saturating_add(
                    add_on
                        .price
                        .to_minor_units()
                        .saturating_mul(i64::from(*quantity)),
                )
            },
        );

        Some(Money::from_minor(minor, price.currency()))
    }

    /// The cart additions for this selection: the product first, then each
    /// chosen add-on shown with the product's image.
    ///
    /// `None` when the product has no price and cannot be added to a cart.
    pub fn cart_additions(&self) -> Option<Vec<(NewLineItem, u32)>> {
        let product = NewLineItem::from_product(self.product)?;

        Some(
            std::iter::once((product, self.quantity))
                .chain(self.selected.iter().map(|(add_on, quantity)| {
                    (
                        NewLineItem::from_add_on(add_on, self.product.image.clone()),
                        *quantity,
                    )
                }))
                .collect(),
        )
    }

    fn position(&self, add_on_id: &str) -> Option<usize> {
        self.selected
            .iter()
            .position(|(add_on, _)| add_on.id == add_on_id)
    }
}
