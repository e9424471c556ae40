//! Checkout
//!
//! Orders are fulfilled by hand: checkout collects the customer's event
//! details and freezes the cart into a summary. Nothing is charged or sent
//! from here.

use std::io;

use jiff::{
    ToSpan,
    civil::{Date, Time},
};
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::Cart,
    items::{ItemKind, LineItemKey},
    products::EventType,
    utils::{PriceFormat, format_price},
};

/// Days of notice needed before an event.
pub const MIN_LEAD_DAYS: i64 = 3;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required field is blank
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Email address is not plausible
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Event is sooner than the minimum notice allows
    #[error("event date {date} is too soon; earliest bookable date is {earliest}")]
    EventTooSoon {
        /// Requested event date
        date: Date,
        /// Earliest allowed event date
        earliest: Date,
    },

    /// Nothing to order
    #[error("cannot check out an empty cart")]
    EmptyCart,

    /// Failed writing the summary
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// First date an event can be booked for, given today's date.
pub fn earliest_event_date(today: Date) -> Date {
    today.saturating_add(MIN_LEAD_DAYS.days())
}

/// Customer and event details collected at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutDetails {
    /// Customer's full name
    pub full_name: String,

    /// Contact phone number
    pub phone: String,

    /// Contact email
    pub email: String,

    /// Event date
    pub event_date: Date,

    /// Event start time
    pub event_time: Option<Time>,

    /// Occasion
    pub event_type: EventType,

    /// Where to set up
    pub venue: Option<String>,

    /// Anything else the team should know
    pub notes: Option<String>,
}

impl CheckoutDetails {
    /// Checks the details against the booking rules.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::MissingField`]: name, phone or email is blank.
    /// - [`CheckoutError::InvalidEmail`]: the email has no `@` or nothing either side of it.
    /// - [`CheckoutError::EventTooSoon`]: the event is less than [`MIN_LEAD_DAYS`] away.
    pub fn validate(&self, today: Date) -> Result<(), CheckoutError> {
        for (field, value) in [
            ("full name", &self.full_name),
            ("phone", &self.phone),
            ("email", &self.email),
        ] {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(field));
            }
        }

        let plausible = self
            .email
            .trim()
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());

        if !plausible {
            return Err(CheckoutError::InvalidEmail(self.email.clone()));
        }

        let earliest = earliest_event_date(today);

        if self.event_date < earliest {
            return Err(CheckoutError::EventTooSoon {
                date: self.event_date,
                earliest,
            });
        }

        Ok(())
    }
}

/// One row of an order summary.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    /// Cart identity
    pub key: LineItemKey,

    /// Display name
    pub name: String,

    /// Unit price
    pub unit_price: Money<'static, Currency>,

    /// Quantity ordered
    pub quantity: u32,

    /// `unit_price × quantity`
    pub line_total: Money<'static, Currency>,
}

/// Frozen copy of a cart at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    lines: Vec<OrderLine>,
    subtotal: Money<'static, Currency>,
    count: u64,
}

impl OrderSummary {
    /// Snapshots the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no items.
    pub fn from_cart(cart: &Cart) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let lines = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                key: item.key().clone(),
                name: item.name().to_string(),
                unit_price: *item.price(),
                quantity: item.quantity(),
                line_total: item.line_total(),
            })
            .collect();

        Ok(Self {
            lines,
            subtotal: cart.total(),
            count: cart.count(),
        })
    }

    /// Rows in cart order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> &Money<'static, Currency> {
        &self.subtotal
    }

    /// Total quantity.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Renders the summary as a table followed by the subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), CheckoutError> {
        let cents = PriceFormat::default();
        let mut builder = Builder::default();

        builder.push_record(["Item", "Type", "Qty", "Unit Price", "Total"]);

        for line in &self.lines {
            builder.push_record([
                line.name.clone(),
                kind_label(line.key.kind()).to_string(),
                line.quantity.to_string(),
                format_price(&line.unit_price, cents),
                format_price(&line.line_total, cents),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(2..5), Alignment::right());

        writeln!(out, "{table}")?;
        writeln!(
            out,
            " Subtotal ({} items): {}",
            self.count,
            format_price(&self.subtotal, cents)
        )?;

        Ok(())
    }
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Product => "Product",
        ItemKind::Service => "Service",
        ItemKind::AddOn => "Add-on",
    }
}

/// A validated order ready to hand to whoever confirms bookings.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    summary: OrderSummary,
    details: CheckoutDetails,
}

impl OrderRequest {
    /// Pairs a summary with details, validating the details first.
    ///
    /// # Errors
    ///
    /// Returns any error from [`CheckoutDetails::validate`].
    pub fn new(
        summary: OrderSummary,
        details: CheckoutDetails,
        today: Date,
    ) -> Result<Self, CheckoutError> {
        details.validate(today)?;

        Ok(Self { summary, details })
    }

    /// The frozen cart.
    pub fn summary(&self) -> &OrderSummary {
        &self.summary
    }

    /// The customer's details.
    pub fn details(&self) -> &CheckoutDetails {
        &self.details
    }
}
