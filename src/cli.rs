use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::credentials::CredentialStore;
use crate::gateway::GatewayClient;
use crate::session::{Phase, SessionController};
use crate::view::{self, Tab};

/// Hosted PipelineIQ deployment.
const DEFAULT_API_URL: &str = "https://pipelineiq-production-3496.up.railway.app";

#[derive(Parser)]
#[command(name = "piqdash")]
#[command(author, version, about = "PipelineIQ dashboard client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// PipelineIQ API base URL
    #[arg(long, global = true, env = "PIPELINEIQ_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Save an API key and load the dashboard
    Login {
        /// PipelineIQ API key (piq_live_...)
        #[arg(env = "PIPELINEIQ_API_KEY")]
        key: String,

        /// Dashboard tab to render
        #[arg(short, long, value_enum, default_value_t = Tab::Overview)]
        tab: Tab,
    },

    /// Fetch the latest data and render a dashboard tab
    Show {
        /// Dashboard tab to render
        #[arg(short, long, value_enum, default_value_t = Tab::Overview)]
        tab: Tab,
    },

    /// Print the saved API key (masked) and session phase
    Status,

    /// Forget the saved API key
    Logout,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let store = CredentialStore::open_default()?;
        let gateway = GatewayClient::new(&self.api_url)?;
        let mut session = SessionController::new(store, gateway);

        match &self.command {
            Commands::Login { key, tab } => {
                session.select_tab(*tab);
                session.submit_credential(key).await?;
                if !session.logged_in() {
                    anyhow::bail!("API key must not be empty");
                }
                self.render(&session)
            }
            Commands::Show { tab } => {
                if !session.logged_in() {
                    anyhow::bail!("no API key saved; run `piqdash login <key>` first");
                }
                session.select_tab(*tab);
                session.refresh().await;
                self.render(&session)
            }
            Commands::Status => {
                match session.state().credential.as_ref() {
                    Some(key) => println!("logged in as {}", key.preview()),
                    None => println!("logged out"),
                }
                if session.phase() == Phase::LoggedOut {
                    info!("no credential on file");
                }
                Ok(())
            }
            Commands::Logout => {
                session.logout();
                println!("logged out");
                Ok(())
            }
        }
    }

    fn render(&self, session: &SessionController) -> Result<()> {
        let snapshot = view::snapshot(session.state(), Utc::now());

        let json_output = if self.pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("dashboard written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}
