//! `voe-console` -- command-line operator console.
//!
//! Syncs and searches the backend's entity lists, checks and lays out
//! skill graph files, and runs the creation wizards from JSON answer
//! files.
//!
//! # Environment variables
//!
//! | Variable                   | Default                 | Description                 |
//! |----------------------------|-------------------------|-----------------------------|
//! | `VOE_API_URL`              | `http://localhost:8000` | Backend base URL            |
//! | `VOE_REQUEST_TIMEOUT_SECS` | `30`                    | Per-request timeout         |
//! | `VOE_ACCOUNT_FILE`         | `.voe_account`          | Signed-in account id file   |

mod cli;
mod entities;
mod skill;
mod wizard;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voe_client::{ClientConfig, VoeApi};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voe_console=info,voe_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }

    match cli.command {
        Command::Sync => {
            let api = VoeApi::from_config(&config)?;
            entities::sync(&api, &config).await
        }
        Command::Search { kind, query } => {
            let api = VoeApi::from_config(&config)?;
            entities::search(&api, kind.into(), &query).await
        }
        Command::Login { account_id } => entities::login(&config, &account_id),
        Command::Logout => entities::logout(&config),
        Command::Skill { action } => skill::run(action),
        Command::Wizard {
            kind,
            answers,
            submit,
        } => {
            let api = VoeApi::from_config(&config)?;
            wizard::run(&api, kind.into(), &answers, submit).await
        }
    }
}
