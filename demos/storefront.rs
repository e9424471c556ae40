//! Storefront Example
//!
//! Browse the bundled catalog and manage a cart persisted to disk.
//!
//! Use `list` with `--category`, `--kind`, `--price` and `--sort` to filter the listing
//! Use `cart add <id>` to add a product, `--add-on <id>` to attach add-ons
//! Use `checkout` to print the order summary

use std::io;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use festoon::{
    cart::Cart,
    catalog::{AddOnSelection, Catalog, ListingQuery},
    checkout::OrderSummary,
    config::StorefrontConfig,
    items::LineItemKey,
    logging::init_subscriber,
    utils::{PriceFormat, format_price, truncate_text},
};
use tabled::{builder::Builder, settings::Style};

/// Storefront Example
#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Balloon storefront demo")]
struct Cli {
    #[command(flatten)]
    config: StorefrontConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalog entries
    List {
        /// Category token (arches, garlands, ..., all)
        #[arg(long, default_value = "all")]
        category: String,

        /// Entry type (product, service, all)
        #[arg(long, default_value = "all")]
        kind: String,

        /// Price range token (0-50, 50-150, 150-300, 300+, all)
        #[arg(long, default_value = "all")]
        price: String,

        /// Sort token (featured, price-asc, price-desc, name-asc, name-desc)
        #[arg(long, default_value = "featured")]
        sort: String,
    },

    /// Show one product with its add-ons and related products
    Show {
        /// Product id
        id: String,
    },

    /// Manage the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Print the order summary
    Checkout,
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    /// Show the cart
    Show,

    /// Add a product, optionally with add-ons
    Add {
        /// Product id
        id: String,

        /// Quantity
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Add-on ids to include, one of each
        #[arg(long = "add-on")]
        add_ons: Vec<String>,
    },

    /// Set the quantity of a line; zero or less removes it
    Set {
        /// Line key, e.g. `product:1` or `addon:ao3`
        key: String,

        /// New quantity
        #[arg(allow_hyphen_values = true)]
        quantity: i64,
    },

    /// Remove a line
    Remove {
        /// Line key, e.g. `product:1` or `addon:ao3`
        key: String,
    },

    /// Empty the cart
    Clear,
}

/// Storefront Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_subscriber(&cli.config.logging)?;

    std::fs::create_dir_all(&cli.config.storage_dir)?;

    let catalog = cli.config.load_catalog()?;
    let mut cart = Cart::open(cli.config.cart_storage(), catalog.currency());

    match cli.command {
        Command::List {
            category,
            kind,
            price,
            sort,
        } => {
            let query =
                ListingQuery::from_tokens(&category, &kind, &price, &sort, catalog.currency());

            let mut builder = Builder::default();
            builder.push_record(["Id", "Name", "Category", "Price", "Badge"]);

            for product in catalog.listing(&query) {
                builder.push_record([
                    product.id.clone(),
                    product.name.clone(),
                    product.category.label().to_string(),
                    price_text(product.price.as_ref(), product.price_label.as_deref()),
                    product.badge.clone().unwrap_or_default(),
                ]);
            }

            println!("{}", builder.build().with(Style::modern_rounded()));
        }
        Command::Show { id } => {
            let product = catalog
                .get_by_id(&id)
                .with_context(|| format!("no product with id {id}"))?;

            println!("{}", product.name);
            println!("{}", truncate_text(&product.long_description, 160));
            println!(
                "{}",
                price_text(product.price.as_ref(), product.price_label.as_deref())
            );

            if let Some(rating) = product.average_rating() {
                println!("Rated {:.1} from {} reviews", rating, product.reviews.len());
            }

            for add_on in catalog.add_ons_for(product) {
                println!(
                    "  + {} ({}) {}",
                    add_on.name,
                    add_on.id,
                    format_price(&add_on.price, PriceFormat::default())
                );
            }

            let related: Vec<&str> = catalog
                .suggest_related(product, 4)
                .iter()
                .map(|related| related.name.as_str())
                .collect();

            println!("You might also like: {}", related.join(", "));
        }
        Command::Cart(command) => {
            run_cart_command(&catalog, &mut cart, command)?;
            print_cart(&cart);
        }
        Command::Checkout => {
            let summary = OrderSummary::from_cart(&cart)?;

            summary.write_to(io::stdout().lock())?;
        }
    }

    if let Some(error) = cart.persistence_error() {
        println!("warning: cart could not be saved: {error}");
    }

    Ok(())
}

fn run_cart_command(catalog: &Catalog, cart: &mut Cart, command: CartCommand) -> Result<()> {
    match command {
        CartCommand::Show => {}
        CartCommand::Add {
            id,
            quantity,
            add_ons,
        } => {
            let product = catalog
                .get_by_id(&id)
                .with_context(|| format!("no product with id {id}"))?;

            let mut selection = AddOnSelection::new(catalog, product);
            selection.set_quantity(quantity);

            for add_on in &add_ons {
                if !selection.set_add_on_quantity(add_on, 1) {
                    bail!("{} does not offer add-on {add_on}", product.name);
                }
            }

            let additions = selection
                .cart_additions()
                .with_context(|| format!("{} is priced on request", product.name))?;

            cart.add_items(additions)?;
        }
        CartCommand::Set { key, quantity } => cart.update_quantity(&parse_key(&key)?, quantity),
        CartCommand::Remove { key } => cart.remove_item(&parse_key(&key)?),
        CartCommand::Clear => cart.clear(),
    }

    Ok(())
}

fn parse_key(key: &str) -> Result<LineItemKey> {
    let (kind, id) = key
        .split_once(':')
        .with_context(|| format!("expected KIND:ID, got {key}"))?;

    let key = match kind {
        "product" => LineItemKey::product(id),
        "service" => LineItemKey::service(id),
        "addon" => LineItemKey::add_on(id),
        other => bail!("unknown line kind: {other}"),
    };

    Ok(key)
}

fn price_text(
    price: Option<&rusty_money::Money<'static, rusty_money::iso::Currency>>,
    label: Option<&str>,
) -> String {
    match (price, label) {
        (Some(price), _) => format_price(price, PriceFormat { show_cents: false }),
        (None, Some(label)) => label.to_string(),
        (None, None) => String::new(),
    }
}

#[expect(clippy::print_stdout, reason = "Example code")]
fn print_cart(cart: &Cart) {
    let cents = PriceFormat::default();
    let mut builder = Builder::default();

    builder.push_record(["Key", "Name", "Qty", "Unit Price", "Total"]);

    for item in cart.items() {
        builder.push_record([
            item.key().to_string(),
            item.name().to_string(),
            item.quantity().to_string(),
            format_price(item.price(), cents),
            format_price(&item.line_total(), cents),
        ]);
    }

    println!("{}", builder.build().with(Style::modern_rounded()));
    println!(
        "{} items, total {}",
        cart.count(),
        format_price(&cart.total(), cents)
    );
}
