// ============================================================================
// vip-grant - Batch VIP access provisioning and store maintenance
// ============================================================================
// Usage:
//   vip-grant [run] [--products FILE]        Grant every product to every user
//   vip-grant validate --username U --password P
//   vip-grant add-user --name N [--email E]  Seed a user
//   vip-grant block-user --user-id ID        Add a blocklist entry
//   vip-grant list COLLECTION                Dump a collection as JSON
//   vip-grant stats                          Document counts per collection
//
// Global: --store appwrite|local, --db-path FILE (local store only)
// ============================================================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vip_core::store::create_record;
use vip_core::{
    read_products, AppConfig, AppwriteStore, BatchDriver, BlockedEntity, Collection,
    CredentialValidator, DocumentStore, FraudScreener, LocalStore, Provisioner, StoreBackend,
};

/// Fraud-screened VIP access provisioning
#[derive(Parser)]
#[command(name = "vip-grant", version, about = "Grant VIP access for purchased products")]
struct Cli {
    /// Document store backend: appwrite or local (default: VIP_STORE or appwrite)
    #[arg(long, global = true)]
    store: Option<String>,

    /// Path to the local store file (default: VIP_DB_PATH or ~/.vip-access/store.redb)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant every catalog product to every user (the default command)
    Run {
        /// Product CSV file (default: VIP_PRODUCTS_CSV or products.csv)
        #[arg(long)]
        products: Option<PathBuf>,
    },

    /// Check a VIP username/password pair
    Validate {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Add a user to the users collection
    AddUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Block a user id from receiving access
    BlockUser {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Print every document of a collection as JSON
    List {
        /// Collection name, e.g. vip_credentials, fraud_logs, users
        collection: String,
    },

    /// Show document counts per collection
    Stats,
}

fn load_env() {
    // config.env first so it wins over a generic .env
    let loaded: Vec<_> = ["config.env", ".env"]
        .into_iter()
        .filter(|file| dotenvy::from_filename(file).is_ok())
        .collect();

    if loaded.is_empty() {
        eprintln!("Warning: Could not load config.env or .env, using process environment only");
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vip_core=info,vip_grant=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Appwrite => Ok(Arc::new(AppwriteStore::new(config.appwrite.clone()))),
        StoreBackend::Local => {
            let path = match &config.db_path {
                Some(path) => path.clone(),
                None => LocalStore::default_path()?,
            };
            let store = LocalStore::open(&path)
                .with_context(|| format!("Failed to open local store {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_logging();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(backend) = cli.store.as_deref() {
        config.store_backend = backend.parse()?;
    }
    if let Some(path) = cli.db_path {
        config.db_path = Some(path);
    }

    info!("Using {} document store", config.store_backend);
    let store = open_store(&config)?;

    let result = match cli.command.unwrap_or(Commands::Run { products: None }) {
        Commands::Run { products } => cmd_run(store, &config, products).await,
        Commands::Validate { username, password } => cmd_validate(store, &username, &password).await,
        Commands::AddUser { name, email } => cmd_add_user(store.as_ref(), &name, email).await,
        Commands::BlockUser { user_id, reason } => {
            cmd_block_user(store.as_ref(), user_id, reason).await
        }
        Commands::List { collection } => cmd_list(store.as_ref(), &collection).await,
        Commands::Stats => cmd_stats(store.as_ref()).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn cmd_run(
    store: Arc<dyn DocumentStore>,
    config: &AppConfig,
    products: Option<PathBuf>,
) -> Result<()> {
    let path = products.unwrap_or_else(|| config.products_csv.clone());
    let products = read_products(&path)
        .with_context(|| format!("Failed to read product catalog {}", path.display()))?;

    let screener =
        FraudScreener::with_blocked_domains(store.clone(), config.blocked_email_domains.clone());
    let provisioner = Provisioner::with_screener(store.clone(), screener);
    let driver = BatchDriver::with_provisioner(store, provisioner);

    let report = driver
        .run(&products, |user, product, outcome| {
            let rendered = serde_json::to_string(outcome)
                .unwrap_or_else(|_| outcome.status().to_string());
            println!("User {} access to {}: {}", user.name, product.name, rendered);
        })
        .await?;

    println!("VIP access process completed successfully!");
    println!(
        "Granted: {}  Fraud: {}  Failed: {}  (total {})",
        report.granted,
        report.fraud,
        report.failed,
        report.total()
    );
    Ok(())
}

async fn cmd_validate(store: Arc<dyn DocumentStore>, username: &str, password: &str) -> Result<()> {
    let validator = CredentialValidator::new(store);
    if validator.validate(username, password).await? {
        println!("valid");
        Ok(())
    } else {
        println!("invalid");
        std::process::exit(1);
    }
}

async fn cmd_add_user(store: &dyn DocumentStore, name: &str, email: Option<String>) -> Result<()> {
    let mut data = serde_json::json!({ "name": name });
    if let Some(email) = email {
        data["email"] = serde_json::Value::String(email);
    }

    let document = store.create_document(Collection::Users, data).await?;
    println!("Added user {} ({})", name, document.id);
    Ok(())
}

async fn cmd_block_user(
    store: &dyn DocumentStore,
    user_id: String,
    reason: Option<String>,
) -> Result<()> {
    let entry = BlockedEntity { user_id, reason };
    let document = create_record(store, Collection::BlockedEntities, &entry).await?;
    println!("Blocked user {} (entry {})", entry.user_id, document.id);
    Ok(())
}

async fn cmd_list(store: &dyn DocumentStore, collection: &str) -> Result<()> {
    let collection: Collection = collection.parse().map_err(anyhow::Error::msg)?;
    let list = store.list_documents(collection, &[]).await?;

    println!("{}", serde_json::to_string_pretty(&list)?);
    Ok(())
}

async fn cmd_stats(store: &dyn DocumentStore) -> Result<()> {
    println!("=== VIP Access Store Stats ===");
    for collection in Collection::ALL {
        let list = store
            .list_documents(collection, &[])
            .await
            .with_context(|| format!("Failed to list {}", collection))?;
        println!("  {:18} {}", collection.as_str(), list.total);
    }
    Ok(())
}
