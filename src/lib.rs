//! Festoon
//!
//! Festoon is the commerce state layer for a balloon-decoration storefront: a
//! persisted shopping cart, a read-only catalog with listing queries, and the
//! formatting and checkout helpers the storefront renders from.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod items;
pub mod logging;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod utils;
