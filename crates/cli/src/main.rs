//! Brightique CLI - drive the cart and wishlist store from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog (no session needed)
//! bq-cli products list --search pendant --sort price-asc
//! bq-cli products show 42
//!
//! # Cart operations (session from BRIGHTIQUE_ACCESS_TOKEN etc.)
//! bq-cli cart show
//! bq-cli cart add 42
//! bq-cli cart increase 1187
//!
//! # Wishlist operations
//! bq-cli wishlist toggle 42
//! bq-cli wishlist move-to-cart 42
//! ```
//!
//! # Commands
//!
//! - `products` - List or inspect catalog products
//! - `cart` - Show or change the signed-in user's cart
//! - `wishlist` - Show or change the signed-in user's wishlist

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brightique_core::{LineId, ProductId, ProductOrdering};
use brightique_storefront::config::StorefrontConfig;

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "bq-cli")]
#[command(author, version, about = "Brightique storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show or change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,

        /// Category name
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
    },
    /// Show one product
    Show {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Add one unit to a line
    Increase {
        /// Cart line ID
        line_id: LineId,
    },
    /// Take one unit off a line
    Decrease {
        /// Cart line ID
        line_id: LineId,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        line_id: LineId,
    },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Add or remove a product
    Toggle {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Move a product from the wishlist into the cart
    MoveToCart {
        /// Product ID
        product_id: ProductId,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortOrder {
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
}

impl From<SortOrder> for ProductOrdering {
    fn from(sort: SortOrder) -> Self {
        match sort {
            SortOrder::PriceAsc => Self::PriceLowToHigh,
            SortOrder::PriceDesc => Self::PriceHighToLow,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "brightique_storefront=info,bq_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        let code = e.exit_code();
        // process::exit skips destructors; flush pending Sentry events first
        drop(sentry_guard);
        std::process::exit(code);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                sort,
            } => {
                commands::products::list(config, search, category, sort.map(Into::into)).await?;
            }
            ProductsAction::Show { id } => commands::products::show(config, id).await?,
        },
        Commands::Cart { action } => {
            let store = commands::signed_in_store(config).await?;
            match action {
                CartAction::Show => commands::cart::show(&store)?,
                CartAction::Add { product_id } => commands::cart::add(&store, product_id).await?,
                CartAction::Increase { line_id } => {
                    commands::cart::increase(&store, line_id).await?;
                }
                CartAction::Decrease { line_id } => {
                    commands::cart::decrease(&store, line_id).await?;
                }
                CartAction::Remove { line_id } => commands::cart::remove(&store, line_id).await?,
            }
        }
        Commands::Wishlist { action } => {
            let store = commands::signed_in_store(config).await?;
            match action {
                WishlistAction::Show => commands::wishlist::show(&store)?,
                WishlistAction::Toggle { product_id } => {
                    commands::wishlist::toggle(&store, product_id).await?;
                }
                WishlistAction::Remove { product_id } => {
                    commands::wishlist::remove(&store, product_id).await?;
                }
                WishlistAction::MoveToCart { product_id } => {
                    commands::wishlist::move_to_cart(&store, product_id).await?;
                }
            }
        }
    }
    Ok(())
}
