//! Skybox CLI - cart, checkout, endpoint calls, and database migrations.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! skybox migrate
//!
//! # Browse the menu and build a cart
//! skybox products
//! skybox cart add michelada --quantity 2
//! skybox cart checkout
//!
//! # Call the endpoints
//! skybox loyalty 0b6f... checkin
//! skybox broadcast vip "2x1 en cervezas hoy"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `products` - List the Shopify catalogue
//! - `cart` - Manage the persisted cart and create a checkout
//! - `confirm`, `check-registration`, `loyalty`, `broadcast`, `feedback`,
//!   `newsletter` - Call the matching endpoint

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use skybox_storefront::ClientConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::endpoints::ConfirmArgs;

#[derive(Parser)]
#[command(name = "skybox")]
#[command(author, version, about = "Skybox command-line tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// List products from the Shopify catalogue
    Products {
        /// Number of products to fetch
        #[arg(short, long, default_value_t = commands::products::PAGE_SIZE)]
        limit: i64,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Send a WhatsApp registration confirmation
    Confirm {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        event_name: String,
        #[arg(long)]
        event_date: String,
        #[arg(long)]
        event_time: Option<String>,
        #[arg(long)]
        event_location: Option<String>,
        /// Record the confirmation against this event
        #[arg(long)]
        event_id: Option<String>,
        #[arg(long)]
        booking_id: Option<String>,
    },
    /// Check whether a phone is registered for an event
    CheckRegistration { event_id: String, phone: String },
    /// Award loyalty points (`checkin`, `order`, `vip-bonus`)
    Loyalty {
        customer_id: String,
        reason: String,
        /// Override the reason's default amount
        #[arg(short, long, allow_negative_numbers = true)]
        amount: Option<i64>,
    },
    /// Broadcast a message to a segment (`vip`, `recent`, `all`)
    Broadcast { segment: String, message: String },
    /// Ask an event's attendees for feedback
    Feedback {
        event_id: String,
        #[arg(long)]
        link: Option<String>,
    },
    /// Welcome a newsletter signup
    Newsletter { name: String, phone: String },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product by handle
    Add {
        handle: String,
        /// Variant ID (defaults to the first variant)
        #[arg(long)]
        variant: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 or less removes it)
    Update {
        variant: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { variant: String },
    /// Empty the cart
    Clear,
    /// Show the cart
    Show,
    /// Create a Shopify checkout
    Checkout,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "skybox_cli=info,skybox_storefront=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    if matches!(cli.command, Commands::Migrate) {
        return commands::migrate::run().await;
    }

    let config = ClientConfig::from_env()?;

    match cli.command {
        Commands::Migrate => {}
        Commands::Products { limit } => commands::products::list(&config, limit).await?,
        Commands::Cart { action } => match action {
            CartAction::Add {
                handle,
                variant,
                quantity,
            } => commands::cart::add(&config, &handle, variant, quantity).await?,
            CartAction::Update { variant, quantity } => {
                commands::cart::update(&config, &variant, quantity)?;
            }
            CartAction::Remove { variant } => commands::cart::remove(&config, &variant)?,
            CartAction::Clear => commands::cart::clear(&config)?,
            CartAction::Show => commands::cart::show(&config)?,
            CartAction::Checkout => commands::cart::checkout(&config).await?,
        },
        Commands::Confirm {
            name,
            phone,
            event_name,
            event_date,
            event_time,
            event_location,
            event_id,
            booking_id,
        } => {
            let args = ConfirmArgs {
                name,
                phone,
                event_name,
                event_date,
                event_time,
                event_location,
                event_id,
                booking_id,
            };
            commands::endpoints::confirm(&config, args).await?;
        }
        Commands::CheckRegistration { event_id, phone } => {
            commands::endpoints::check_registration(&config, event_id, phone).await?;
        }
        Commands::Loyalty {
            customer_id,
            reason,
            amount,
        } => commands::endpoints::loyalty(&config, customer_id, reason, amount).await?,
        Commands::Broadcast { segment, message } => {
            commands::endpoints::broadcast(&config, segment, message).await?;
        }
        Commands::Feedback { event_id, link } => {
            commands::endpoints::feedback(&config, event_id, link).await?;
        }
        Commands::Newsletter { name, phone } => {
            commands::endpoints::newsletter(&config, name, phone).await?;
        }
    }
    Ok(())
}
