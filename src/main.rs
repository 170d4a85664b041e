use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crm_persons_api::auth::{generate_jwt, Claims};
use crm_persons_api::authorization::{AuthorizationResolver, PgAuthorizationResolver, StaticAuthorizationResolver};
use crm_persons_api::cli::{Cli, Commands, ServeArgs, StoreKind};
use crm_persons_api::config::{self, AppConfig};
use crm_persons_api::database::{DatabaseManager, MemoryPersonStore, PersonStore, PgPersonStore};
use crm_persons_api::observer::{AuditLogObserver, EventDispatcher};
use crm_persons_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = config::config().clone();

    match cli.command {
        None => serve(config, ServeArgs::default()).await,
        Some(Commands::Serve(args)) => serve(config, args).await,
        Some(Commands::Token { user_id, view_permission }) => {
            let claims = Claims::new(user_id, view_permission.into(), config.security.jwt_expiry_hours);
            let token = generate_jwt(&claims, &config.security.jwt_secret)?;
            println!("{}", token);
            Ok(())
        }
        Some(Commands::Migrate) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::bootstrap_schema(&pool).await?;
            Ok(())
        }
    }
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }

    tracing::info!("Starting CRM Persons API in {:?} mode", config.environment);

    let (store, resolver): (Arc<dyn PersonStore>, Arc<dyn AuthorizationResolver>) = match args.store {
        StoreKind::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to the database")?;
            if config.database.bootstrap_schema {
                DatabaseManager::bootstrap_schema(&pool).await?;
            }
            let store = PgPersonStore::new(pool.clone()).with_query_logging(config.database.enable_query_logging);
            (Arc::new(store), Arc::new(PgAuthorizationResolver::new(pool)))
        }
        StoreKind::Memory => {
            if crm_persons_api::is_production!() {
                anyhow::bail!("the in-memory store is not available in production");
            }
            tracing::warn!("Using in-memory person store; data is lost on shutdown");
            (Arc::new(MemoryPersonStore::new()), Arc::new(StaticAuthorizationResolver::new()))
        }
    };

    let mut dispatcher = EventDispatcher::new();
    if config.security.enable_audit_logging {
        dispatcher.register(Arc::new(AuditLogObserver));
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(store, resolver, dispatcher, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("CRM Persons API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
