//! Bundlewise CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bw-cli migrate
//!
//! # List a shop's widgets
//! bw-cli widgets list --shop my-shop.myshopify.com
//!
//! # Show one widget
//! bw-cli widgets show 12
//!
//! # Export bundle order statistics
//! bw-cli orders export --shop my-shop.myshopify.com --since 2025-06-01
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `widgets` - Inspect widgets
//! - `orders export` - Bulk order export grouped by widget

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use bundlewise_core::WidgetId;

mod commands;

#[derive(Parser)]
#[command(name = "bw-cli")]
#[command(author, version, about = "Bundlewise CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect widgets
    Widgets {
        #[command(subcommand)]
        action: WidgetsAction,
    },
    /// Shopify order exports
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum WidgetsAction {
    /// List the widgets of a shop
    List {
        /// Shop domain (`my-shop.myshopify.com`)
        #[arg(short, long)]
        shop: String,
    },
    /// Show one widget with products and settings
    Show {
        /// Widget ID
        id: WidgetId,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Export orders and aggregate them per widget
    Export {
        /// Shop domain
        #[arg(short, long)]
        shop: String,

        /// Only orders created on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so JSON output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bw_cli=info,bundlewise_admin=info".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Widgets { action } => match action {
            WidgetsAction::List { shop } => commands::widgets::list(&shop).await?,
            WidgetsAction::Show { id } => commands::widgets::show(id).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Export { shop, since } => commands::orders::export(&shop, since).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_orders_export() {
        let cli = Cli::try_parse_from([
            "bw-cli",
            "orders",
            "export",
            "--shop",
            "demo.myshopify.com",
            "--since",
            "2025-06-01",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Orders {
            action: OrdersAction::Export { shop, since },
        } = cli.command
        else {
            panic!("expected orders export");
        };
        assert_eq!(shop, "demo.myshopify.com");
        assert_eq!(since, NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[test]
    fn test_parse_widget_show() {
        let cli = Cli::try_parse_from(["bw-cli", "widgets", "show", "12"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Widgets {
                action: WidgetsAction::Show { id }
            } if id == WidgetId::new(12)
        ));
        assert!(Cli::try_parse_from(["bw-cli", "widgets", "show", "twelve"]).is_err());
    }
}
