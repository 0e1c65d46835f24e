//! Checkout Demo CLI
//!
//! Command-line interface for running checkouts against a Payment API list.

use anyhow::Result;
use checkout_lib::{CheckoutConfig, ConnectionConfig};
use clap::{Args, Parser, Subcommand};

mod commands;
mod terminal;
mod ui;

#[derive(Parser)]
#[command(name = "checkout-demo")]
#[command(about = "Checkout Demo CLI - Run payment sessions from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct ListArgs {
    /// Self link of the list to load
    #[arg(env = "CHECKOUT_LIST_URL")]
    list_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl ListArgs {
    fn config(&self) -> CheckoutConfig {
        CheckoutConfig::new(self.list_url.clone())
            .with_connection(ConnectionConfig::new().with_timeout(self.timeout))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive checkout
    Checkout {
        #[command(flatten)]
        list: ListArgs,

        /// Prefix the redirect return URL must start with
        #[arg(long, env = "CHECKOUT_RETURN_PREFIX", default_value = "")]
        return_prefix: String,
    },

    /// Show the networks and accounts a list offers
    ShowList {
        #[command(flatten)]
        list: ListArgs,

        /// Print the raw list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode the result carried by a redirect return URL
    ParseReturn {
        /// URL the browser returned to
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("checkout_demo_cli=debug,checkout_lib=debug,checkout_interactive=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("checkout_demo_cli=info,checkout_lib=warn,checkout_interactive=warn")
            .init();
    }

    match cli.command {
        Commands::Checkout {
            list,
            return_prefix,
        } => {
            let config = list.config().with_redirect_return_prefix(return_prefix);
            commands::checkout::run(config).await?;
        }
        Commands::ShowList { list, json } => {
            commands::show_list::run(&list.config(), json).await?;
        }
        Commands::ParseReturn { url } => {
            commands::parse_return::run(&url)?;
        }
    }

    Ok(())
}
