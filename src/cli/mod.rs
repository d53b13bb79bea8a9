pub mod commands;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "docsight")]
#[command(about = "docsight CLI - operator client for the dashboard API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "DOCSIGHT_SERVER",
        default_value = "http://localhost:3000",
        help = "Base URL of the API server"
    )]
    pub server: String,

    #[arg(
        long,
        global = true,
        env = "DOCSIGHT_TOKEN",
        help = "JWT token for protected endpoints"
    )]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check server health")]
    Health,

    #[command(about = "Show server information from the API root endpoint")]
    Info,

    #[command(about = "Authenticate and print a JWT token")]
    Login {
        #[arg(help = "Account email")]
        email: String,
        #[arg(long, env = "DOCSIGHT_PASSWORD", help = "Account password")]
        password: String,
    },

    #[command(about = "List the subscription plan catalog")]
    Plans,

    #[command(about = "Show this month's usage for the authenticated account")]
    Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = commands::ApiClient::new(cli.server.clone(), cli.token.clone());

    match cli.command {
        Commands::Health => commands::health(&client, output_format).await,
        Commands::Info => commands::info(&client, output_format).await,
        Commands::Login { email, password } => {
            commands::login(&client, &email, &password, output_format).await
        }
        Commands::Plans => commands::plans(&client, output_format).await,
        Commands::Usage => commands::usage(&client, output_format).await,
    }
}
