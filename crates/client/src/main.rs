use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dinodex_client::{AuthManager, CollectionManager, ImageTransfer, SharedViewLoader};
use dinodex_core::colors::{CategoryView, FilterMode};
use dinodex_core::master_list::search_master_list;
use dinodex_events::EventBus;
use dinodex_remote::{AuthBackend, BackendConfig, SupabaseClient};

#[derive(Parser, Debug)]
#[command(name = "dinodex")]
#[command(about = "Track collected creature color variants")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List selectable creatures, optionally filtered by name.
    MasterList {
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Print a shared collection by user id or alias.
    Share { identifier: Option<String> },
    /// Sign in with DINODEX_EMAIL / DINODEX_PASSWORD and print your collection.
    Collection,
    /// Sign in and set your share alias.
    SetDomain { domain: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dinodex_client=debug,dinodex_remote=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Command::MasterList { search } = &cli.command {
        for entry in search_master_list(search.as_deref().unwrap_or_default()) {
            println!("{:>4}  {}", entry.id, entry.name);
        }
        return Ok(());
    }

    // --- Configuration ---
    let config = BackendConfig::from_env().context("Failed to load backend configuration")?;
    tracing::info!(url = %config.url, bucket = %config.bucket, "Loaded backend configuration");

    // --- Backend and managers ---
    let events = Arc::new(EventBus::default());
    let backend = Arc::new(SupabaseClient::new(config, Arc::clone(&events))?);

    let collection = Arc::new(CollectionManager::new(
        backend.clone(),
        backend.clone(),
        ImageTransfer::new(backend.clone()),
    ));
    let auth = Arc::new(AuthManager::new(
        backend.clone(),
        backend.clone(),
        Arc::clone(&collection),
    ));
    let shared = SharedViewLoader::new(backend.clone(), backend.clone());

    // --- Session listener ---
    tokio::spawn(Arc::clone(&auth).run(backend.subscribe()));
    auth.initialize().await;

    match cli.command {
        Command::MasterList { .. } => {}
        Command::Share { identifier } => match shared.load(identifier.as_deref()).await {
            Ok(view) => {
                println!("{} ({} colors)", view.identifier(), view.total_colors());
                for dino in view.dinos() {
                    println!("{}", dino.name);
                    for category in &dino.categories {
                        let summary = CategoryView::new(category, FilterMode::Contains).summary();
                        println!("  {summary}");
                    }
                }
            }
            Err(e) => {
                println!("{e}");
            }
        },
        Command::Collection => {
            sign_in_from_env(&auth).await?;
            let dinos = collection.collection().await;
            println!("{} dinos, {} colors", dinos.len(), collection.total_colors().await);
            for dino in &dinos {
                println!("{:>4}  {} ({} categories)", dino.id, dino.name, dino.categories.len());
            }
        }
        Command::SetDomain { domain } => {
            sign_in_from_env(&auth).await?;
            match auth.set_custom_domain(&domain).await {
                Ok(stored) => println!("Share alias set to '{stored}'"),
                Err(e) => println!("{}", e.user_message()),
            }
        }
    }

    Ok(())
}

async fn sign_in_from_env(auth: &AuthManager) -> anyhow::Result<()> {
    if auth.user().await.is_some() {
        return Ok(());
    }
    let email = std::env::var("DINODEX_EMAIL").context("DINODEX_EMAIL must be set")?;
    let password = std::env::var("DINODEX_PASSWORD").context("DINODEX_PASSWORD must be set")?;
    auth.sign_in(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    Ok(())
}
