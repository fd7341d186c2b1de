//! Shelf CLI - browse the catalog and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered
//! shelf products --category 2 --search widget
//!
//! # Show one product with related products
//! shelf product show 1
//!
//! # Create, update or delete a product
//! shelf product create --name Lamp --price 12.50 --stock 3 --category 1
//! shelf product update 4 --stock 0
//! shelf product delete 4
//!
//! # Cart
//! shelf cart
//! shelf cart add 1 --quantity 2
//! shelf cart inc a1 --by 3
//! shelf cart dec a1
//! shelf cart remove a1
//! ```
//!
//! The store location comes from `SHELF_API_URL` (or `--api-url`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shelf_client::{Coordinator, RestClient};
use shelf_core::{CartItemId, ProductId, Quantity};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod render;

use commands::products::ProductFields;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about = "Shelf catalog and cart client")]
struct Cli {
    /// Resource store base URL (overrides `SHELF_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// User id for new cart lines (overrides `SHELF_USER_ID`)
    #[arg(long, global = true)]
    user_id: Option<String>,

    /// Reject product image URLs that do not parse
    #[arg(long, global = true)]
    check_image_url: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only this category (0 means all)
        #[arg(short, long)]
        category: Option<i64>,

        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List categories
    Categories,
    /// Show or change one product
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Show a product and related products
    Show { id: i64 },
    /// Create a product
    Create {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Update the given fields of a product
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        product_id: i64,
        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Increase a line's quantity
    Inc {
        item_id: String,
        #[arg(long, default_value_t = 1)]
        by: u32,
    },
    /// Decrease a line's quantity (stops at 1)
    Dec {
        item_id: String,
        #[arg(long, default_value_t = 1)]
        by: u32,
    },
    /// Remove a line
    Remove { item_id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::from_env()
        .and_then(|c| c.with_overrides(cli.api_url.as_deref(), cli.user_id.as_deref()))
    {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shelf_client=info,shelf_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = RestClient::new(&config.api);
    let mut shelf = Coordinator::new(client, config.api.user_id.clone())
        .with_image_url_check(cli.check_image_url);

    let output = match cli.command {
        Commands::Products { category, search } => {
            commands::products::list(&mut shelf, category, search.as_deref()).await?
        }
        Commands::Categories => commands::products::categories(&mut shelf).await?,
        Commands::Product { action } => match action {
            ProductAction::Show { id } => {
                commands::products::show(&mut shelf, ProductId::new(id)).await?
            }
            ProductAction::Create { fields } => {
                commands::products::create(&mut shelf, fields).await?
            }
            ProductAction::Update { id, fields } => {
                commands::products::update(&mut shelf, ProductId::new(id), fields).await?
            }
            ProductAction::Delete { id } => {
                commands::products::delete(&mut shelf, ProductId::new(id)).await?
            }
        },
        Commands::Cart { action } => match action {
            None => commands::cart::show(&mut shelf).await?,
            Some(CartAction::Add {
                product_id,
                quantity,
            }) => {
                let quantity = Quantity::new(quantity)?;
                commands::cart::add(&mut shelf, ProductId::new(product_id), quantity).await?
            }
            Some(CartAction::Inc { item_id, by }) => {
                commands::cart::increment(&mut shelf, &CartItemId::new(item_id), by).await?
            }
            Some(CartAction::Dec { item_id, by }) => {
                commands::cart::decrement(&mut shelf, &CartItemId::new(item_id), by).await?
            }
            Some(CartAction::Remove { item_id }) => {
                commands::cart::remove(&mut shelf, &CartItemId::new(item_id)).await?
            }
        },
    };

    emit(&output);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn emit(output: &str) {
    print!("{output}");
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_cart_default_action() {
        let cli = Cli::try_parse_from(["shelf", "cart"]).unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(cli.command, Commands::Cart { action: None }));
    }

    #[test]
    fn test_parses_product_update_fields() {
        let cli = Cli::try_parse_from(["shelf", "product", "update", "4", "--stock", "0"])
            .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Product {
            action: ProductAction::Update { id, fields },
        } = cli.command
        else {
            panic!("expected product update");
        };
        assert_eq!(id, 4);
        assert_eq!(fields.stock, Some(0));
        assert!(fields.name.is_none());
    }
}
