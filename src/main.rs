use anyhow::Result;
use clap::{Parser, Subcommand};

use busdash::cli;

#[derive(Debug, Parser)]
#[command(name = "busdash")]
#[command(about = "Headless bus-transport operations dashboard")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a scripted dashboard session in virtual time
    Demo {
        /// Demo account to sign in as
        #[arg(long, default_value = "admin")]
        user: String,
        /// Minutes of live updates to simulate after the section tour
        #[arg(long, default_value = "2")]
        minutes: u32,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List the demo login accounts
    Credentials,
    /// List routes with their operating figures
    Routes {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show weekly demand and prediction accuracy for one route
    Route {
        /// Route id, e.g. tp_cb
        id: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List upcoming events and their demand impact
    Events {
        /// Reference date (YYYY-MM-DD); only events on or after it are shown
        #[arg(long)]
        today: Option<String>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the transport news feed
    News {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Summarize recorded dashboard activity
    History {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Inspect or edit configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective merged configuration
    Show,
    /// Write a default ~/.busdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `timing.refresh_interval_secs 10`
    Set { key: String, value: String },
    /// Restore the default configuration file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Demo {
            user,
            minutes,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_demo(&user, minutes, fmt)
        }
        Commands::Credentials => cli::run_credentials(),
        Commands::Routes { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_routes(fmt)
        }
        Commands::Route { id, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_route(&id, fmt)
        }
        Commands::Events { today, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_events(today.as_deref(), fmt)
        }
        Commands::News { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_news(fmt)
        }
        Commands::History { days, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(days, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
