//! MapFood CLI - the MapFood dashboards from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Administrator: accounts and shops
//! mapfood accounts list --status PENDING --search lan
//! mapfood accounts toggle 68e4a1...
//! mapfood accounts edit 68e4a1... --name "Nguyen Van Lan"
//! mapfood shops list --status ACTIVE --page 2
//! mapfood shops toggle 68e4b7... --yes
//!
//! # Store director: menu, profile, revenue
//! mapfood foods list --search pho
//! mapfood foods availability 68e4c2...
//! mapfood profile show
//! mapfood revenue --month 3 --year 2025
//!
//! # Customer: order history
//! mapfood orders list --tab unfinished
//! mapfood orders cancel 68e4d9... --reason "ordered twice"
//! ```
//!
//! Destructive commands ask for confirmation on stdin unless `--yes` is
//! given. Every notification raised by a command is printed once it
//! finishes.
//!
//! # Environment Variables
//!
//! - `MAPFOOD_API_BASE_URL` - Backend API root
//! - `MAPFOOD_API_TIMEOUT_SECS` - Per-request timeout
//! - `MAPFOOD_SESSION_FILE` - Persisted session record of the signed-in user
//! - `MAPFOOD_LOG_JSON` - Emit JSON logs instead of text
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE` - Error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]
// Terminal front end: results go to stdout.
#![allow(clippy::print_stdout)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mapfood_core::{AccountStatus, RoleName, ShopStatus};
use mapfood_dashboard::controllers::OrderTab;
use mapfood_dashboard::{DashboardConfig, MemoryNotifier};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "mapfood")]
#[command(author, version, about = "MapFood dashboards from the terminal")]
struct Cli {
    /// Backend API root (overrides `MAPFOOD_API_BASE_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session record of the signed-in user (overrides `MAPFOOD_SESSION_FILE`)
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    /// Confirm destructive actions without asking
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts (administrator)
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },
    /// Moderate shops (administrator)
    Shops {
        #[command(subcommand)]
        action: ShopsAction,
    },
    /// Manage the menu of your shop (store director)
    Foods {
        #[command(subcommand)]
        action: FoodsAction,
    },
    /// Your order history (customer)
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Your shop profile (store director)
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Monthly revenue of your shop (store director)
    Revenue {
        /// Month, 1-12 (defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
    },
}

#[derive(Subcommand)]
enum AccountsAction {
    /// List accounts
    List {
        /// Search by name or email
        #[arg(short, long)]
        search: Option<String>,

        /// Only this role (`ADMIN`, `CUSTOMER`, `SELLER_STAFF`)
        #[arg(short, long)]
        role: Option<RoleName>,

        /// Only this status (`ACTIVE`, `PENDING`)
        #[arg(long)]
        status: Option<AccountStatus>,

        /// Page to show
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Activate or deactivate an account
    Toggle {
        /// Account id
        id: String,
    },
    /// Edit an account; only changed fields are sent
    Edit {
        /// Account id
        id: String,

        /// New full name
        #[arg(short, long)]
        name: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<AccountStatus>,
    },
}

#[derive(Subcommand)]
enum ShopsAction {
    /// List shops
    List {
        /// Search by shop name
        #[arg(short, long)]
        search: Option<String>,

        /// Only this status (`ACTIVE`, `INACTIVE`)
        #[arg(long)]
        status: Option<ShopStatus>,

        /// Page to show
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Activate or deactivate a shop
    Toggle {
        /// Shop id
        id: String,
    },
}

#[derive(Subcommand)]
enum FoodsAction {
    /// List your menu
    List {
        /// Search by name or description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Mark an item available or sold out
    Availability {
        /// Food id
        id: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List {
        /// `all`, `unfinished` or `completed`
        #[arg(short, long, default_value = "all")]
        tab: OrderTab,
    },
    /// Cancel an order awaiting payment
    Cancel {
        /// Order id
        id: String,

        /// Why the order is cancelled
        #[arg(short, long)]
        reason: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show your shop profile
    Show,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &DashboardConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
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

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mapfood_dashboard=info,mapfood_cli=info".into());

    // JSON when shipping logs somewhere, text on a terminal
    let json = std::env::var("MAPFOOD_LOG_JSON").is_ok();
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration is needed for Sentry, which must start before tracing
    let config = DashboardConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.session.clone() {
        config.session_file = path;
    }

    let notifier = Arc::new(MemoryNotifier::new());
    let result = match Context::new(config, cli.api_url.as_deref(), cli.yes, notifier.clone()) {
        Ok(ctx) => run(&ctx, cli.command).await,
        Err(e) => Err(e),
    };

    for toast in notifier.drain() {
        println!("{toast}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(ctx: &Context, command: Commands) -> Result<(), commands::CommandError> {
    match command {
        Commands::Accounts { action } => match action {
            AccountsAction::List {
                search,
                role,
                status,
                page,
            } => commands::accounts::list(ctx, search.as_deref(), role, status, page).await,
            AccountsAction::Toggle { id } => commands::accounts::toggle(ctx, &id).await,
            AccountsAction::Edit { id, name, status } => {
                commands::accounts::edit(ctx, &id, name, status).await
            }
        },
        Commands::Shops { action } => match action {
            ShopsAction::List {
                search,
                status,
                page,
            } => commands::shops::list(ctx, search.as_deref(), status, page).await,
            ShopsAction::Toggle { id } => commands::shops::toggle(ctx, &id).await,
        },
        Commands::Foods { action } => match action {
            FoodsAction::List { search } => commands::foods::list(ctx, search.as_deref()).await,
            FoodsAction::Availability { id } => commands::foods::availability(ctx, &id).await,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List { tab } => commands::orders::list(ctx, tab).await,
            OrdersAction::Cancel { id, reason } => {
                commands::orders::cancel(ctx, &id, reason.as_deref()).await
            }
        },
        Commands::Profile {
            action: ProfileAction::Show,
        } => commands::profile::show(ctx).await,
        Commands::Revenue { month, year } => commands::revenue::show(ctx, month, year).await,
    }
}
