//! Emporium CLI - browse the catalog, manage the cart, and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! emporium products --category tools
//! emporium product 3
//!
//! # Cart (kept in EMPORIUM_STATE_PATH between runs)
//! emporium cart add 3 --quantity 2
//! emporium cart show
//!
//! # Account and checkout
//! emporium login -e ada@example.com -p hunter22
//! emporium checkout --verify-stock
//! emporium orders
//!
//! # Catalog management
//! emporium admin create -n "Desk Lamp" -d "Warm light" -p 24.99 -c home
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use emporium_core::{Price, ProductId};
use emporium_storefront::Storefront;
use emporium_storefront::config::StorefrontConfig;
use emporium_storefront::error::StorefrontError;
use emporium_storefront::navigation::Route;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "emporium")]
#[command(author, version, about = "Emporium storefront CLI")]
struct Cli {
    #[command(flatten)]
    #[cfg_attr(not(feature = "dev-auth-fallback"), allow(dead_code))]
    dev: DevOptions,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "dev-auth-fallback")]
#[derive(clap::Args)]
struct DevOptions {
    /// Sign in by email lookup when the login endpoint is missing
    #[arg(long, global = true)]
    dev_auth_fallback: bool,
}

#[cfg(not(feature = "dev-auth-fallback"))]
#[derive(clap::Args)]
struct DevOptions {}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Only show products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Product {
        /// Product ID
        id: String,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "EMPORIUM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(short, long, env = "EMPORIUM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Place an order for the cart
    Checkout {
        /// Check stock for every line before ordering
        #[arg(long)]
        verify_stock: bool,
    },
    /// List your orders
    Orders,
    /// Manage the catalog
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 or less removes it)
    Update {
        product_id: ProductId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { product_id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a product
    Create {
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        price: Price,
        #[arg(short, long)]
        category: String,
    },
    /// Update fields of a product
    Update {
        id: ProductId,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        price: Option<Price>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a product
    Delete { id: ProductId },
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
            #[allow(clippy::print_stderr)]
            {
                eprintln!("error: {e}");
            }
            std::process::exit(2);
        }
    };
    #[cfg(feature = "dev-auth-fallback")]
    let config = config.with_dev_auth_fallback(cli.dev.dev_auth_fallback);

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "emporium_storefront=info,emporium_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let failed = match run(cli.command, config).await {
        Ok(()) => false,
        Err(e) => {
            e.report();
            #[allow(clippy::print_stderr)]
            {
                eprintln!("error: {}", e.user_message());
            }
            true
        }
    };

    // Flush Sentry before exiting
    drop(sentry_guard);
    if failed {
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: StorefrontConfig) -> Result<(), StorefrontError> {
    let storefront = Storefront::new(config)?;
    let hook = storefront.install_navigator(Arc::new(|route: Route| {
        if route == Route::Login {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("session expired, please log in");
            }
        }
    }));

    let result = dispatch(command, &storefront).await;

    // Let the hook drain pending events; it stops once the gateway is gone.
    drop(storefront);
    let _ = hook.await;

    result
}

async fn dispatch(command: Commands, storefront: &Storefront) -> Result<(), StorefrontError> {
    match command {
        Commands::Products { category } => {
            commands::catalog::list(storefront, category.as_deref()).await
        }
        Commands::Product { id } => commands::catalog::show(storefront, &id).await,
        Commands::Cart { action } => match action {
            CartAction::Show => {
                commands::cart::show(storefront);
                Ok(())
            }
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(storefront, product_id, quantity).await,
            CartAction::Update {
                product_id,
                quantity,
            } => {
                commands::cart::update(storefront, product_id, quantity);
                Ok(())
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(storefront, product_id);
                Ok(())
            }
            CartAction::Clear => {
                commands::cart::clear(storefront);
                Ok(())
            }
        },
        Commands::Login { email, password } => {
            commands::account::login(storefront, &email, &password).await
        }
        Commands::Register {
            email,
            name,
            phone,
            password,
        } => commands::account::register(storefront, email, name, phone, password).await,
        Commands::Logout => {
            commands::account::logout(storefront);
            Ok(())
        }
        Commands::Whoami => {
            commands::account::whoami(storefront);
            Ok(())
        }
        Commands::Checkout { verify_stock } => {
            commands::orders::checkout(storefront, verify_stock).await
        }
        Commands::Orders => commands::orders::list(storefront).await,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                name,
                description,
                price,
                category,
            } => commands::catalog::create(storefront, name, description, price, category).await,
            AdminAction::Update {
                id,
                name,
                description,
                price,
                category,
            } => {
                commands::catalog::update(storefront, id, name, description, price, category).await
            }
            AdminAction::Delete { id } => commands::catalog::delete(storefront, id).await,
        },
    }
}
