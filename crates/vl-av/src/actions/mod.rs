//! ffmpeg-backed transformations: range extraction and concatenation.

mod concat;
mod trim;

pub use concat::{concat, render_manifest};
pub use trim::trim;
