//! vl-db: metadata store for videos and shared links.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, typed models, and one query module per table.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
