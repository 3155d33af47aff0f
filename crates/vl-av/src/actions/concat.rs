//! Stream-copy concatenation using ffmpeg's concat demuxer.

use std::path::{Path, PathBuf};

use vl_core::{Error, Result};

use crate::command::ToolCommand;
use crate::janitor::ArtifactGuard;
use crate::tools::ToolRegistry;

/// Render a concat-demuxer manifest: one `file '<path>'` line per input.
///
/// Single quotes are closed, escaped and reopened (`'\''`).
pub fn render_manifest(inputs: &[PathBuf]) -> String {
    let mut out = String::new();
    for input in inputs {
        let escaped = input.to_string_lossy().replace('\'', r"'\''");
        out.push_str("file '");
        out.push_str(&escaped);
        out.push_str("'\n");
    }
    out
}

/// Anchor relative inputs to the current directory. The demuxer resolves
/// relative `file` entries against the manifest's directory instead.
fn absolute_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    inputs
        .iter()
        .map(|p| std::path::absolute(p).map_err(Error::from))
        .collect()
}

/// Concatenate `inputs` in order into `output` without re-encoding.
///
/// The manifest is written into `scratch_dir` and removed on every exit
/// path. Inputs are assumed to share container and codec parameters.
pub async fn concat(
    tools: &ToolRegistry,
    inputs: &[PathBuf],
    scratch_dir: &Path,
    output: &Path,
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;
    let inputs = absolute_inputs(inputs)?;

    let manifest = ArtifactGuard::new(
        scratch_dir.join(format!("concat-{}.txt", uuid::Uuid::new_v4())),
    );
    tokio::fs::write(manifest.path(), render_manifest(&inputs))
        .await
        .map_err(|e| Error::Internal(format!("failed to write concat manifest: {e}")))?;

    tracing::info!(inputs = inputs.len(), output = %output.display(), "concat");

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(ffmpeg.timeout);
    cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"]);
    cmd.arg(manifest.path().to_string_lossy().as_ref());
    cmd.args(["-c", "copy"]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.execute().await?;

    Ok(())
}
