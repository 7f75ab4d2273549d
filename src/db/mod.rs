mod schema;
mod store;

pub use schema::init_db;
pub use store::SqliteEventStore;

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::coordinator::Coordinator;
use crate::processor::EventProcessor;
use crate::signature::SignatureVerifier;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator<SqliteEventStore>,
    pub verifier: SignatureVerifier,
    pub processor: Arc<dyn EventProcessor>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // WAL keeps readers unblocked during the insert race; the busy
    // timeout absorbs writer contention between pooled connections.
    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")
    });
    Pool::builder().max_size(10).build(manager)
}
