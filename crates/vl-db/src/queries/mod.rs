//! Database query modules.

pub mod pending_outputs;
pub mod shared_links;
pub mod videos;
