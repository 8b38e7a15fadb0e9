mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::gateway::PaymentGateway;
use crate::notify::Notifier;
use crate::poller::PollerHandle;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// PIX payment gateway (HTTP client in production, programmable mock in
    /// tests).
    pub gateway: Arc<dyn PaymentGateway>,
    /// Best-effort WhatsApp dispatcher.
    pub notifier: Arc<Notifier>,
    /// Platform-level bearer token; None disables the check (dev mode).
    pub platform_token: Option<String>,
    /// Background pollers, keyed by payment id. At most one per payment.
    pub pollers: Arc<Mutex<HashMap<String, PollerHandle>>>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
