//! Corner Shop CLI - Database migrations and shop administration.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (including the session table)
//! cs-cli migrate
//!
//! # Create a shopper record
//! cs-cli users create --email shopper@example.com
//!
//! # Add a catalog item
//! cs-cli items create --slug linen-shirt --title "Linen Shirt" \
//!     --price 30.00 --category shirt --label primary
//!
//! # Create a coupon
//! cs-cli coupons create --code SPRING --amount 5.00
//!
//! # Grant refunds for placed orders
//! cs-cli refunds grant k3j2h4g5f6d7s8a9q0w1 z9x8c7v6b5n4m3l2k1j0
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use corner_shop_core::{Category, Email, Label, Money, Slug};

mod commands;

#[derive(Parser)]
#[command(name = "cs-cli")]
#[command(author, version, about = "Corner Shop CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Manage shopper records
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage catalog items
    Items {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Manage coupons
    Coupons {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Handle refund requests
    Refunds {
        #[command(subcommand)]
        action: RefundAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a shopper record
    Create {
        #[arg(short, long)]
        email: Email,
    },
}

#[derive(Subcommand)]
enum ItemAction {
    /// Add an item to the catalog
    Create {
        #[arg(long)]
        slug: Slug,

        #[arg(long)]
        title: String,

        /// Unit price in major units, e.g. 19.99
        #[arg(long)]
        price: Money,

        /// `shirt`, `sport_wear` or `outwear`
        #[arg(long)]
        category: Category,

        /// `primary`, `secondary` or `danger`
        #[arg(long, default_value = "primary")]
        label: Label,

        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Create a coupon code
    Create {
        #[arg(long)]
        code: String,

        /// Discount in major units
        #[arg(long)]
        amount: Money,
    },
}

#[derive(Subcommand)]
enum RefundAction {
    /// Grant refunds for the given order reference codes
    Grant {
        #[arg(required = true)]
        ref_codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Users { action } => match action {
            UserAction::Create { email } => commands::users::create(&email).await?,
        },
        Commands::Items { action } => match action {
            ItemAction::Create {
                slug,
                title,
                price,
                category,
                label,
                description,
            } => {
                commands::items::create(corner_shop_storefront::models::NewItem {
                    slug,
                    title,
                    price,
                    category,
                    label,
                    description,
                })
                .await?;
            }
        },
        Commands::Coupons { action } => match action {
            CouponAction::Create { code, amount } => {
                commands::coupons::create(&code, amount).await?;
            }
        },
        Commands::Refunds { action } => match action {
            RefundAction::Grant { ref_codes } => commands::refunds::grant(&ref_codes).await?,
        },
    }
    Ok(())
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
    fn test_items_create_parses_typed_arguments() {
        let cli = Cli::try_parse_from([
            "cs-cli",
            "items",
            "create",
            "--slug",
            "linen-shirt",
            "--title",
            "Linen Shirt",
            "--price",
            "30.00",
            "--category",
            "shirt",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_items_create_rejects_bad_slug() {
        let cli = Cli::try_parse_from([
            "cs-cli", "items", "create", "--slug", "Linen Shirt", "--title", "x", "--price",
            "1.00", "--category", "shirt",
        ]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_refunds_grant_requires_codes() {
        assert!(Cli::try_parse_from(["cs-cli", "refunds", "grant"]).is_err());
        assert!(Cli::try_parse_from(["cs-cli", "refunds", "grant", "abc", "def"]).is_ok());
    }
}
