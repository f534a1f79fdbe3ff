use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewline::config::Config;
use crewline::crm::HttpCrmClient;
use crewline::db::{create_pool, init_db, AppState};
use crewline::handlers;
use crewline::identity::AuthClient;
use crewline::payments::StripeClient;
use crewline::workflow::HttpWorkflowClient;

#[derive(Parser, Debug)]
#[command(name = "crewline")]
#[command(about = "Signup, payment, and number-provisioning backend for Crewline")]
struct Cli {
    /// Load and validate configuration, then exit without serving
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing credentials abort here rather than degrading into provider
    // errors on the first request.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if cli.check_config {
        tracing::info!("Configuration OK");
        return;
    }

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        site_url: config.site_url.clone(),
        payments: Arc::new(StripeClient::new(&config.stripe_secret_key)),
        identity: Arc::new(AuthClient::new(
            &config.auth_url,
            &config.auth_anon_key,
            &config.auth_service_role_key,
        )),
        crm: Arc::new(HttpCrmClient::new(
            &config.crm_api_key,
            &config.crm_location_id,
        )),
        workflow: Arc::new(HttpWorkflowClient::new(&config.workflow_webhook_url)),
        super_admin_secret: config.super_admin_secret.clone(),
    };

    // Every endpoint is CORS-open; the browser-facing flows are called from
    // the marketing site's origin and the workflow engine sends no origin.
    let app = handlers::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Crewline server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
