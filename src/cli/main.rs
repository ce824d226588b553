use anyhow::Context;
use clap::{Parser, Subcommand};
use incident_tracker::client::IncidentClient;
use incident_tracker::models::{IncidentSource, IncidentStatus};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "incident-cli")]
#[command(about = "Incident Tracker CLI", version, long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        env = "INCIDENT_TRACKER_ENDPOINT",
        default_value = "http://localhost:8000"
    )]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report a new incident
    Create {
        #[arg(short, long)]
        description: String,

        /// operator, monitoring or partner
        #[arg(short, long, default_value = "operator")]
        source: IncidentSource,
    },

    /// List incidents, newest first
    List {
        /// Only incidents in this status
        #[arg(short, long)]
        status: Option<IncidentStatus>,
    },

    /// Get incident details
    Get {
        #[arg(value_name = "INCIDENT_ID")]
        id: Uuid,
    },

    /// Move an incident to a new status
    Status {
        #[arg(value_name = "INCIDENT_ID")]
        id: Uuid,

        /// open, in_progress, waiting, resolved or cancelled
        #[arg(value_name = "STATUS")]
        status: IncidentStatus,
    },

    /// Rewrite the description of an incident
    Describe {
        #[arg(value_name = "INCIDENT_ID")]
        id: Uuid,

        #[arg(value_name = "TEXT")]
        text: String,
    },

    /// Delete a resolved or cancelled incident
    Delete {
        #[arg(value_name = "INCIDENT_ID")]
        id: Uuid,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = IncidentClient::new(&cli.endpoint)
        .with_context(|| format!("Failed to create client for {}", cli.endpoint))?;

    match cli.command {
        Commands::Create {
            description,
            source,
        } => print(&client.create(description, source).await?)?,

        Commands::List { status } => print(&client.list(status).await?)?,

        Commands::Get { id } => print(&client.get(id).await?)?,

        Commands::Status { id, status } => print(&client.update_status(id, status).await?)?,

        Commands::Describe { id, text } => {
            print(&client.update_description(id, text).await?)?
        }

        Commands::Delete { id } => print(&client.delete(id).await?)?,

        Commands::Health => print(&client.health().await?)?,
    }

    Ok(())
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
