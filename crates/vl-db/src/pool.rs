//! SQLite pools for the video and link store.
//!
//! One pool is opened at process start and shared through the server's
//! application context. Every pool runs migrations before it is returned,
//! so callers never see an unmigrated schema.

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use vl_core::{Error, Result};

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Connections for the on-disk store. Writers serialize in SQLite anyway;
/// the extra connections serve concurrent link lookups.
const FILE_POOL_SIZE: u32 = 8;
const MEMORY_POOL_SIZE: u32 = 4;

/// How long a handler waits for a free connection before failing.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Applied to every on-disk connection. `busy_timeout` lets a writer wait
/// out another connection's transaction instead of failing with SQLITE_BUSY.
const FILE_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
                            PRAGMA journal_mode = WAL;
                            PRAGMA busy_timeout = 5000;";

const MEMORY_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// Open (creating if needed) the store at `db_path` and migrate it.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager =
        SqliteConnectionManager::file(db_path).with_init(|conn| conn.execute_batch(FILE_PRAGMAS));
    build_migrated(manager, FILE_POOL_SIZE)
}

/// A private in-memory store, used by tests.
///
/// The shared-cache URI is unique per call, so connections inside one pool
/// see the same data while separate pools stay isolated.
pub fn init_memory_pool() -> Result<DbPool> {
    use std::sync::atomic::{AtomicU64, Ordering};
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:vl_memdb_{}_{}?mode=memory&cache=shared",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    );

    let manager =
        SqliteConnectionManager::file(uri).with_init(|conn| conn.execute_batch(MEMORY_PRAGMAS));
    build_migrated(manager, MEMORY_POOL_SIZE)
}

fn build_migrated(manager: SqliteConnectionManager, size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(size)
        .connection_timeout(CHECKOUT_TIMEOUT)
        .build(manager)
        .map_err(|e| Error::database(format!("cannot open database: {e}")))?;

    // Holding this connection keeps a shared-cache memory database alive
    // until migrations are done.
    let conn = get_conn(&pool)?;
    migrations::run_migrations(&conn)?;
    drop(conn);

    Ok(pool)
}

/// Check out a connection, mapping pool exhaustion to a database error.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("no database connection available: {e}")))
}
