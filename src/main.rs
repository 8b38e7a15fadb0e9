use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xmenu::config::Config;
use xmenu::db::{create_pool, init_db, queries, AppState};
use xmenu::gateway::PixClient;
use xmenu::handlers;
use xmenu::models::{CreateProduct, CreateProfile};
use xmenu::notify::Notifier;
use xmenu::util::amount_to_cents;

#[derive(Parser, Debug)]
#[command(name = "xmenu")]
#[command(about = "Storefront backend with PIX checkout and plan subscriptions")]
struct Cli {
    /// Seed the database with dev data (store profile, products, plans)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with dev data for local testing.
/// Creates: a store profile, a few products, and the standard plans.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    if queries::get_plan_by_name(&conn, "Gratuito")
        .expect("Failed to check for existing plans")
        .is_some()
    {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let profile = queries::create_profile(
        &conn,
        &CreateProfile {
            name: "Loja Dev".to_string(),
            email: "dev@xmenu.local".to_string(),
            whatsapp: Some("11987654321".to_string()),
            store_name: Some("Cantina da Dev".to_string()),
        },
    )
    .expect("Failed to create dev profile");

    tracing::info!("Store profile: {} (id: {})", profile.name, profile.id);

    let products = [
        ("Marmita executiva", 24.90, 50),
        ("Refrigerante lata", 6.00, 120),
        ("Pudim de leite", 9.50, 18),
    ];
    for (name, price, quantity) in products {
        let product = queries::create_product(
            &conn,
            &profile.id,
            &CreateProduct {
                name: name.to_string(),
                price,
                quantity,
                description: None,
                category: Some("cardápio".to_string()),
                tags: vec![],
                image_url: None,
            },
        )
        .expect("Failed to create dev product");
        tracing::info!("Product: {} (id: {})", product.name, product.id);
    }

    let free = queries::create_plan(&conn, "Gratuito", 0, 0, Some("Plano de entrada"))
        .expect("Failed to create free plan");
    let monthly = amount_to_cents(49.90).expect("valid seed price");
    let annual = amount_to_cents(499.00).expect("valid seed price");
    let pro = queries::create_plan(
        &conn,
        "Profissional",
        monthly,
        annual,
        Some("Cardápio ilimitado e relatórios"),
    )
    .expect("Failed to create pro plan");

    tracing::info!("Plan: {} (id: {})", free.name, free.id);
    tracing::info!("Plan: {} (id: {})", pro.name, pro.id);

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED SUCCESSFULLY");
    tracing::info!("============================================");

    // Copy-paste friendly output for the dev storefront env file
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  store_id: {}", profile.id);
    println!("  free_plan_id: {}", free.id);
    println!("  pro_plan_id: {}", pro.id);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xmenu=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.platform_token.is_none() {
        tracing::warn!("PLATFORM_TOKEN not set, API auth is disabled");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        gateway: Arc::new(PixClient::new(&config.gateway_base_url)),
        notifier: Arc::new(Notifier::new(
            config.whatsapp_api_url.clone(),
            config.whatsapp_api_token.clone(),
        )),
        platform_token: config.platform_token.clone(),
        pollers: Arc::new(Mutex::new(HashMap::new())),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set XMENU_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("XMenu server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
