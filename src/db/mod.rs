mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::ClickConfig;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and merchant configuration
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Merchant credentials, injected rather than read from globals.
    pub click: ClickConfig,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // busy_timeout lets concurrent callback workers queue on SQLite's write
    // lock instead of failing with SQLITE_BUSY.
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));
    Pool::builder().max_size(10).build(manager)
}
