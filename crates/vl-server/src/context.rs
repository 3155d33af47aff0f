//! Application context shared by all route handlers via Axum state.

use std::sync::Arc;

use vl_av::Transcoder;
use vl_core::config::Config;
use vl_db::pool::DbPool;

use crate::lifecycle::VideoLifecycle;
use crate::links::LinkManager;
use crate::storage::Storage;

/// Cheaply cloneable: every field is a pool handle, an `Arc`, or a path.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool, created once at startup.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    pub lifecycle: VideoLifecycle,
    pub links: LinkManager,
}

impl AppContext {
    /// Wire the components over one pool and one storage root.
    pub fn new(config: Config, db: DbPool, transcoder: Arc<dyn Transcoder>) -> Self {
        let storage = Storage::new(config.storage.root_dir.clone());
        let lifecycle = VideoLifecycle::new(
            db.clone(),
            storage.clone(),
            transcoder,
            config.limits,
        );
        let links = LinkManager::new(db.clone(), storage);
        Self {
            db,
            config: Arc::new(config),
            lifecycle,
            links,
        }
    }

    pub fn storage(&self) -> &Storage {
        self.lifecycle.storage()
    }
}
