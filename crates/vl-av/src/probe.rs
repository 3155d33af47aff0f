//! Duration probing via `ffprobe`.
//!
//! Shells out to `ffprobe -v error -show_entries format=duration -of json`
//! and reads the container-level duration in seconds.

use std::path::Path;

use serde::Deserialize;
use vl_core::{Error, Result};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe the duration of `path` in seconds.
///
/// # Errors
///
/// [`Error::Probe`] when the file is missing, ffprobe rejects it, or no
/// usable duration is reported. A missing or failing-to-spawn ffprobe is a
/// [`Error::Transcode`].
pub async fn probe_duration(tools: &ToolRegistry, path: &Path) -> Result<f64> {
    if !path.is_file() {
        return Err(Error::Probe(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let ffprobe = tools.require("ffprobe")?;
    let mut cmd = ToolCommand::new(ffprobe.path.clone());
    cmd.args(["-v", "error", "-show_entries", "format=duration", "-of", "json"]);
    cmd.arg(path.to_string_lossy().as_ref());
    cmd.timeout(ffprobe.timeout);

    let output = cmd.execute_unchecked().await?;
    if !output.status.success() {
        return Err(Error::Probe(format!(
            "ffprobe could not read {}: {}",
            path.display(),
            output.stderr.trim()
        )));
    }

    let duration = parse_duration(&output.stdout)?;
    tracing::debug!(path = %path.display(), duration, "probed duration");
    Ok(duration)
}

/// Extract `format.duration` from ffprobe's JSON output.
pub fn parse_duration(json: &str) -> Result<f64> {
    let parsed: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| Error::Probe("no duration reported".into()))?;

    match raw.trim().parse::<f64>() {
        Ok(d) if d.is_finite() && d >= 0.0 => Ok(d),
        _ => Err(Error::Probe(format!("unusable duration: {raw}"))),
    }
}
