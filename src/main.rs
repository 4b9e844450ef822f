use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clickgate::config::Config;
use clickgate::db::{create_pool, init_db, queries, AppState};
use clickgate::handlers;
use clickgate::models::CreatePayment;
use clickgate::sync;

#[derive(Parser, Debug)]
#[command(name = "clickgate")]
#[command(about = "Merchant-side callback server for the Click payment gateway")]
struct Cli {
    /// Seed the database with a demo PENDING payment (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Insert a demo payment so the callback endpoints have something to hit.
fn seed_dev_payment(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");
    let payment = queries::create_payment(
        &conn,
        &CreatePayment {
            user_id: "dev-user".to_string(),
            amount: 500,
        },
    )
    .expect("Failed to create demo payment");

    tracing::info!("============================================");
    tracing::info!("DEMO PAYMENT SEEDED");
    tracing::info!("payment_id:        {}", payment.id);
    tracing::info!("merchant_trans_id: {}", payment.merchant_trans_id);
    tracing::info!("amount:            {}", payment.amount);
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clickgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.click.service_id.is_empty() || config.click.secret_key.is_empty() {
        tracing::warn!(
            "CLICK_SERVICE_ID / CLICK_SECRET_KEY not set; every callback will fail validation"
        );
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        click: config.click.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set CLICKGATE_ENV=dev)");
        } else {
            seed_dev_payment(&state);
        }
    }

    // Reconciliation sweep for payments whose callbacks never arrived
    sync::spawn_sync_task(
        state.clone(),
        config.sync_interval_secs,
        config.sync_stale_after_secs,
    );

    let app = Router::new()
        .merge(handlers::callbacks::router())
        .merge(handlers::payments::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Clickgate server listening on {}", addr);

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
