//! # vl-av
//!
//! Media probing and transformation for vidlink, backed by ffmpeg/ffprobe.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with a timeout
//!   that kills the child process.
//! - **Probing** ([`probe::probe_duration`]) -- container duration in seconds.
//! - **Actions** ([`actions`]) -- range extraction and stream-copy concat.
//! - **Concurrency** ([`TranscodeGate`]) -- bounds simultaneous engine runs.
//! - **Cleanup** ([`ArtifactGuard`]) -- removes temporary files on drop.
//! - **The seam** ([`Transcoder`]) -- implemented by [`FfmpegTranscoder`].

pub mod actions;
pub mod command;
pub mod gate;
pub mod janitor;
pub mod probe;
pub mod tools;
pub mod transcoder;

pub use command::{ToolCommand, ToolOutput};
pub use gate::TranscodeGate;
pub use janitor::{sweep_dir, ArtifactGuard};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use transcoder::{FfmpegTranscoder, Transcoder};
