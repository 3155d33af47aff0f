//! Time-range extraction using ffmpeg.

use std::path::Path;

use vl_core::Result;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Write the `[start, end)` range of `input` (whole seconds) to `output`.
///
/// The caller validates the range; this only builds the invocation.
pub async fn trim(
    tools: &ToolRegistry,
    input: &Path,
    start: i64,
    end: i64,
    output: &Path,
) -> Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    tracing::info!(input = %input.display(), start, end, "trim");

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.timeout(ffmpeg.timeout);
    cmd.args(["-y", "-i"]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.args(["-ss", &start.to_string()]);
    cmd.args(["-t", &(end - start).to_string()]);
    cmd.arg(output.to_string_lossy().as_ref());
    cmd.execute().await?;

    Ok(())
}
