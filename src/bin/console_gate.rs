use clap::{Parser, Subcommand};
use console_gate::logging;
use console_gate::session::{retry_unavailable, RetryPolicy};
use console_gate::{
    GateConfig, GateError, HttpAuthBackend, PermissionStore, SessionVerifier,
};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a session token with the backend
    Verify {
        #[arg(long)]
        token: String,
        /// Retry this many times on transient failures
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },
    /// List the permissions granted to a token
    Permissions {
        #[arg(long)]
        token: String,
    },
    /// Show the navigation entries (or settings tabs) visible to a token
    Nav {
        #[arg(long)]
        token: String,
        /// Show settings tabs instead of navigation entries
        #[arg(long)]
        tabs: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e.downcast_ref::<GateError>() {
                Some(GateError::Unauthenticated(_)) => 2,
                Some(GateError::Unavailable(_)) => 3,
                _ => 1,
            }
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GateConfig::load_or_default(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    logging::init(&config.logging)?;

    let backend = Arc::new(HttpAuthBackend::from_config(&config.backend)?);
    let verifier = SessionVerifier::new(backend.clone());
    info!("Using backend {}", config.backend.base_url);

    match cli.command {
        Commands::Verify { token, retries } => {
            let policy = RetryPolicy {
                max_retries: retries,
                ..RetryPolicy::default()
            };
            let verifier = &verifier;
            let token = token.as_str();
            let verified = retry_unavailable(&policy, move || verifier.verify(token)).await?;
            println!("Token verified (session {})", verified.session().id());
        }
        Commands::Permissions { token } => {
            let verified = verifier.verify(&token).await?;
            let store = PermissionStore::new(backend);
            let permissions = store.load_permissions(&verified).await?;
            for name in permissions.sorted() {
                println!("{}", name);
            }
        }
        Commands::Nav { token, tabs } => {
            let verified = verifier.verify(&token).await?;
            let store = PermissionStore::new(backend);
            store.load_permissions(&verified).await?;

            if tabs {
                for tab in store.visible(&config.navigation.tabs)? {
                    println!("{:<20} {}", tab.id, tab.path);
                }
            } else {
                for entry in store.visible(&config.navigation.entries)? {
                    println!("{:<20} {}", entry.name, entry.href);
                }
            }
        }
    }

    Ok(())
}
