use clap::{Parser, Subcommand};
use hotelier::analytics::AnalyticsState;
use hotelier::auth::bearer::Role;
use hotelier::auth::tokens;
use hotelier::config::AppConfig;
use hotelier::{routes, storage};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser)]
#[command(name = "hotelier", about = "Hotel administration analytics service")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Issue a new API token and print it once
    IssueToken {
        #[arg(long)]
        name: String,
        /// admin or staff
        #[arg(long, default_value = "staff")]
        role: String,
        #[arg(long)]
        expires_in_days: Option<u64>,
    },
    /// Revoke an API token by id
    RevokeToken { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotelier=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    if let Err(msg) = config.validate() {
        eprintln!("Configuration error: {msg}");
        return Err(msg.into());
    }

    let pool = storage::sqlite::create_pool(&config.database)?;
    storage::sqlite::init_pool(&pool).await?;
    tracing::info!(db = %config.database.path.display(), "database initialized");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::Migrate => {
            println!("migrations applied");
            Ok(())
        }
        Command::IssueToken {
            name,
            role,
            expires_in_days,
        } => {
            let role: Role = role.parse()?;
            let issued = tokens::create_token(&pool, &name, role, expires_in_days).await?;
            println!("id:    {}", issued.id);
            println!("role:  {}", issued.role);
            if let Some(exp) = issued.expires_at {
                println!("expires_at: {exp}");
            }
            println!("token: {}", issued.token);
            println!("Store this token now; it cannot be shown again.");
            Ok(())
        }
        Command::RevokeToken { id } => {
            if tokens::revoke_token(&pool, &id).await? {
                println!("revoked {id}");
                Ok(())
            } else {
                Err(format!("no active token with id {id}").into())
            }
        }
    }
}

async fn serve(
    config: AppConfig,
    pool: deadpool_sqlite::Pool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        total_rooms = config.analytics.total_rooms,
        cache_ttl_secs = config.analytics.cache_ttl_secs,
        "starting hotelier"
    );

    let analytics_state = Arc::new(AnalyticsState::new(pool.clone(), &config.analytics));
    let app = routes::build_router(pool, analytics_state, &config.cors.allowed_origin)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    tracing::info!("shutting down...");
}
