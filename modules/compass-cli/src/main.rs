use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use compass_client::CompassClient;
use compass_core::{CompassConfig, HierarchyLevel, HierarchyScraper, PeopleScraper, ProfileTab, RolesOptions};

#[derive(Parser)]
#[command(name = "compass", about = "Read member and hierarchy data from the Compass portal")]
struct Cli {
    /// Session cookie header from a logged-in browser
    #[arg(long, env = "COMPASS_SESSION_COOKIE", hide_env_values = true)]
    cookie: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Personal details
    Personal { member: u64 },
    /// Roles and membership duration
    Roles {
        member: u64,
        /// Keep occasional helper, network and similar roles
        #[arg(long)]
        keep_non_volunteer: bool,
        /// Only roles with these statuses
        #[arg(long = "status")]
        statuses: Vec<String>,
    },
    Permits { member: u64 },
    /// Training roles, learning plans and mandatory learning
    Training {
        member: u64,
        #[arg(long)]
        ongoing_only: bool,
    },
    /// Mandatory ongoing learning only
    Ogl { member: u64 },
    Awards { member: u64 },
    Disclosures { member: u64 },
    /// Role detail popup, optionally from a saved page
    Role {
        role: u64,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Raw HTML of a profile tab
    Tab { member: u64, tab: ProfileTab },
    /// Child units of a unit
    Units { parent: u64, level: HierarchyLevel },
    /// Members with roles in a unit
    Members { unit: u64 },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let logs = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        logs.json().init();
    } else {
        logs.init();
    }

    let config = CompassConfig::from_env()?;
    let client = Arc::new(
        CompassClient::new(&config, cli.cookie.as_deref()).context("Failed to build portal client")?,
    );
    let people = PeopleScraper::new(client.clone(), config.clone());

    match cli.command {
        Command::Personal { member } => print_json(&people.get_personal_tab(member).await?)?,
        Command::Roles {
            member,
            keep_non_volunteer,
            statuses,
        } => {
            let mut options = RolesOptions::default();
            if keep_non_volunteer {
                options = options.keep_non_volunteer_roles();
            }
            if !statuses.is_empty() {
                options = options.with_statuses(statuses);
            }
            print_json(&people.get_roles_tab(member, &options).await?)?
        }
        Command::Permits { member } => print_json(&people.get_permits_tab(member).await?)?,
        Command::Training { member, ongoing_only } => {
            print_json(&people.get_training_tab(member, ongoing_only).await?)?
        }
        Command::Ogl { member } => print_json(&people.get_mandatory_training(member).await?)?,
        Command::Awards { member } => print_json(&people.get_awards_tab(member).await?)?,
        Command::Disclosures { member } => print_json(&people.get_disclosures_tab(member).await?)?,
        Command::Role { role, file } => {
            let saved = match &file {
                Some(path) => Some(
                    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };
            print_json(&people.get_roles_detail(role, saved.as_deref()).await?)?
        }
        Command::Tab { member, tab } => {
            let body = people.get_member_profile_tab(member, tab).await?;
            std::io::stdout().lock().write_all(&body)?;
        }
        Command::Units { parent, level } => {
            let hierarchy = HierarchyScraper::new(client.clone(), config.clone());
            print_json(&hierarchy.get_units_from_hierarchy(parent, level).await?)?
        }
        Command::Members { unit } => {
            let hierarchy = HierarchyScraper::new(client.clone(), config.clone());
            print_json(&hierarchy.get_members_with_roles_in_unit(unit).await?)?
        }
    }

    tracing::info!(requests = client.request_count(), "Done");
    Ok(())
}
