use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_portal::cli::{self, Cli, Commands};
use clinic_portal::resources::ResourceKind;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_portal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let api_url = cli.api_url;

    match cli.command {
        Commands::Init => cli::commands::init(api_url).await,
        Commands::Login {
            email,
            password,
            super_admin,
        } => cli::commands::login(api_url, &email, password, super_admin).await,
        Commands::Register {
            username,
            email,
            password,
        } => cli::commands::register(api_url, &username, &email, password).await,
        Commands::Logout => cli::commands::logout(api_url).await,
        Commands::Whoami { format } => cli::commands::whoami(api_url, format).await,
        Commands::Open { route } => cli::commands::open(api_url, &route).await,
        Commands::UseClinic { clinic_id } => cli::commands::use_clinic(api_url, clinic_id).await,
        Commands::Patients { action } => {
            cli::commands::resource(api_url, ResourceKind::Patients, action).await
        }
        Commands::Visits { action } => {
            cli::commands::resource(api_url, ResourceKind::Visits, action).await
        }
        Commands::Examinations { action } => {
            cli::commands::resource(api_url, ResourceKind::Examinations, action).await
        }
        Commands::Sales { action } => {
            cli::commands::resource(api_url, ResourceKind::Sales, action).await
        }
        Commands::Products { action } => {
            cli::commands::resource(api_url, ResourceKind::Products, action).await
        }
        Commands::Users { action } => {
            cli::commands::resource(api_url, ResourceKind::Users, action).await
        }
        Commands::Clinics { action } => {
            cli::commands::resource(api_url, ResourceKind::Clinics, action).await
        }
    }
}
