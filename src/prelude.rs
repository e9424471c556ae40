//! Festoon prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        Cart, CartError, CartSnapshot, CartStorage, FileStore, JsonCartStorage, KeyValueStore,
        MemoryStore, PersistenceError, SubscriptionKey,
    },
    catalog::{
        AddOnSelection, Catalog, CatalogError, CategoryOption, ListingQuery, PriceRange,
        ProductFilter, SortKey,
    },
    checkout::{CheckoutDetails, CheckoutError, OrderRequest, OrderSummary, earliest_event_date},
    config::{LogFormat, LoggingConfig, StorefrontConfig},
    items::{ItemKind, LineItem, LineItemKey, NewLineItem},
    logging::{LoggingError, init_subscriber},
    products::{AddOn, Category, EventType, Product, ProductKind, Review, ServiceItem},
    utils::{PriceFormat, format_price, truncate_text},
};
