//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary
//! storage root and a full [`AppContext`] over a scripted transcoder. The
//! `with_server*` constructors start Axum on a random port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use vl_av::Transcoder;
use vl_core::config::Config;
use vl_core::{Error, Result};
use vl_db::models::{NewVideo, Video};
use vl_db::pool::{init_memory_pool, DbPool};
use vl_server::context::AppContext;
use vl_server::router::build_router;

/// Reports a fixed duration; trim writes one byte per second, merge
/// concatenates its inputs.
pub struct ScriptedTranscoder {
    pub duration: f64,
}

#[async_trait]
impl Transcoder for ScriptedTranscoder {
    async fn probe_duration(&self, _path: &Path) -> Result<f64> {
        Ok(self.duration)
    }

    async fn trim(&self, _input: &Path, start: i64, end: i64, output: &Path) -> Result<()> {
        std::fs::write(output, vec![7u8; (end - start) as usize])?;
        Ok(())
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            return Err(Error::transcode("ffmpeg", "no inputs"));
        }
        let mut bytes = Vec::new();
        for input in inputs {
            bytes.extend(std::fs::read(input)?);
        }
        std::fs::write(output, bytes)?;
        Ok(())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    _root: TempDir,
}

impl TestHarness {
    /// Default configuration; uploads probe as 11 seconds.
    pub fn new() -> Self {
        Self::build(Config::default(), 11.0)
    }

    pub fn build(mut config: Config, probed_duration: f64) -> Self {
        let root = tempfile::tempdir().expect("failed to create storage root");
        config.storage.root_dir = root.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(
            config,
            db.clone(),
            Arc::new(ScriptedTranscoder {
                duration: probed_duration,
            }),
        );
        ctx.storage()
            .ensure_layout()
            .expect("failed to create storage layout");

        Self {
            ctx,
            db,
            _root: root,
        }
    }

    async fn serve(self) -> (Self, SocketAddr) {
        let app = build_router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    /// Start an Axum server on a random port.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start an Axum server whose transcoder probes every upload as `d`.
    pub async fn with_server_duration(d: f64) -> (Self, SocketAddr) {
        Self::build(Config::default(), d).serve().await
    }

    /// Start an Axum server with custom config.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::build(config, 11.0).serve().await
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> vl_db::pool::PooledConnection {
        vl_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Insert a video row backed by `size` bytes on disk.
    pub fn insert_video(&self, name: &str, duration: i64, size: usize) -> Video {
        let storage = self.ctx.storage();
        let locator = storage.new_video_locator();
        let data: Vec<u8> = (0..=255u8).cycle().take(size).collect();
        std::fs::write(storage.resolve(&locator).unwrap(), data).unwrap();

        vl_db::queries::videos::create_video(
            &self.conn(),
            &NewVideo {
                name: name.into(),
                size: size as i64,
                duration,
                path: locator,
            },
        )
        .unwrap()
    }

    pub fn files_in(&self, dir: PathBuf) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    pub fn staged_count(&self) -> usize {
        self.files_in(self.ctx.storage().staging_dir())
    }

    pub fn stored_count(&self) -> usize {
        self.files_in(self.ctx.storage().videos_dir())
    }
}

/// A multipart form with one `video` file part.
pub fn upload_form(file_name: &str, bytes: Vec<u8>) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str("video/mp4")
        .unwrap();
    reqwest::multipart::Form::new().part("video", part)
}
