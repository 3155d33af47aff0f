//! The [`Transcoder`] seam used by the lifecycle manager.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use vl_core::config::{ToolsConfig, TranscodeConfig};
use vl_core::Result;

use crate::gate::TranscodeGate;
use crate::tools::ToolRegistry;
use crate::{actions, probe};

/// Probe, extract and concatenate media files.
///
/// Every method is a single awaitable call that resolves once the external
/// engine has exited.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Duration of `path` in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Write the `[start, end)` range of `input` to `output`.
    async fn trim(&self, input: &Path, start: i64, end: i64, output: &Path) -> Result<()>;

    /// Concatenate `inputs` in order into `output`.
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// [`Transcoder`] backed by the ffmpeg/ffprobe CLIs.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    tools: ToolRegistry,
    gate: TranscodeGate,
    scratch_dir: PathBuf,
}

impl FfmpegTranscoder {
    /// Build from config. Concat manifests are written into `scratch_dir`.
    pub fn new(tools: &ToolsConfig, transcode: &TranscodeConfig, scratch_dir: PathBuf) -> Self {
        let timeout = Duration::from_secs(transcode.timeout_secs.max(1));
        Self {
            tools: ToolRegistry::discover(tools, timeout),
            gate: TranscodeGate::new(transcode.max_concurrent),
            scratch_dir,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn gate(&self) -> &TranscodeGate {
        &self.gate
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let _permit = self.gate.acquire().await?;
        probe::probe_duration(&self.tools, path).await
    }

    async fn trim(&self, input: &Path, start: i64, end: i64, output: &Path) -> Result<()> {
        let _permit = self.gate.acquire().await?;
        actions::trim(&self.tools, input, start, end, output).await
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let _permit = self.gate.acquire().await?;
        actions::concat(&self.tools, inputs, &self.scratch_dir, output).await
    }
}
