//! Scripted transcoder and fixtures for unit tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use vl_av::Transcoder;
use vl_core::config::LimitsConfig;
use vl_core::{Error, Result};
use vl_db::models::{NewVideo, PendingOutput, Video};
use vl_db::pool::{init_memory_pool, DbPool};
use vl_db::queries::{pending_outputs, videos};

use crate::lifecycle::{StagedUpload, VideoLifecycle};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Probe(PathBuf),
    Trim { start: i64, end: i64 },
    Merge(Vec<PathBuf>),
}

/// Transcoder that never runs an engine.
///
/// Trim writes one byte per second of output; merge concatenates the input
/// files. A failing transcoder writes a partial output and then errors, so
/// tests observe cleanup.
#[derive(Debug, Clone)]
pub struct FakeTranscoder {
    duration: Option<f64>,
    fail: bool,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Default for FakeTranscoder {
    fn default() -> Self {
        Self {
            duration: Some(10.0),
            fail: false,
            calls: Arc::default(),
        }
    }
}

impl FakeTranscoder {
    pub fn with_duration(d: f64) -> Self {
        Self {
            duration: Some(d),
            ..Self::default()
        }
    }

    pub fn unprobeable() -> Self {
        Self {
            duration: None,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Trim and merge invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !matches!(c, Call::Probe(_)))
            .count()
    }

    pub fn last_merge_inputs(&self) -> Option<Vec<PathBuf>> {
        self.calls.lock().unwrap().iter().rev().find_map(|c| match c {
            Call::Merge(inputs) => Some(inputs.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        self.calls.lock().unwrap().push(Call::Probe(path.to_path_buf()));
        self.duration
            .ok_or_else(|| Error::Probe("no duration reported".into()))
    }

    async fn trim(&self, _input: &Path, start: i64, end: i64, output: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Trim { start, end });
        if self.fail {
            std::fs::write(output, b"partial")?;
            return Err(Error::transcode("ffmpeg", "Invalid data found when processing input"));
        }
        std::fs::write(output, vec![0u8; (end - start) as usize])?;
        Ok(())
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Merge(inputs.to_vec()));
        if self.fail {
            std::fs::write(output, b"partial")?;
            return Err(Error::transcode("ffmpeg", "Non-monotonous DTS"));
        }
        let mut bytes = Vec::new();
        for input in inputs {
            bytes.extend(std::fs::read(input)?);
        }
        std::fs::write(output, bytes)?;
        Ok(())
    }
}

/// In-memory database plus a temporary storage root.
pub struct Fixture {
    pub db: DbPool,
    pub lifecycle: VideoLifecycle,
    _root: TempDir,
}

impl Fixture {
    pub fn new(transcoder: FakeTranscoder) -> Self {
        let root = tempfile::tempdir().unwrap();
        let storage = Storage::new(root.path());
        storage.ensure_layout().unwrap();
        let db = init_memory_pool().unwrap();
        let lifecycle = VideoLifecycle::new(
            db.clone(),
            storage,
            Arc::new(transcoder),
            LimitsConfig::default(),
        );
        Self {
            db,
            lifecycle,
            _root: root,
        }
    }

    pub fn storage(&self) -> &Storage {
        self.lifecycle.storage()
    }

    pub fn stage_upload(&self, name: &str, bytes: &[u8]) -> StagedUpload {
        let path = self.storage().staging_file("upload-");
        std::fs::write(&path, bytes).unwrap();
        StagedUpload {
            path,
            original_name: name.into(),
            size: bytes.len() as u64,
        }
    }

    /// Insert a video row with a file of `size` bytes behind it.
    pub fn insert_video(&self, name: &str, duration: i64, size: i64) -> Video {
        let locator = self.storage().new_video_locator();
        std::fs::write(
            self.storage().resolve(&locator).unwrap(),
            vec![1u8; size as usize],
        )
        .unwrap();
        let conn = self.db.get().unwrap();
        videos::create_video(
            &conn,
            &NewVideo {
                name: name.into(),
                size,
                duration,
                path: locator,
            },
        )
        .unwrap()
    }

    pub fn video_count(&self) -> i64 {
        videos::count_videos(&self.db.get().unwrap()).unwrap()
    }

    pub fn pending(&self) -> Vec<PendingOutput> {
        pending_outputs::list_pending(&self.db.get().unwrap()).unwrap()
    }

    pub fn stored_files(&self) -> Vec<PathBuf> {
        list_files(&self.storage().videos_dir())
    }

    pub fn staged_files(&self) -> Vec<PathBuf> {
        list_files(&self.storage().staging_dir())
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}
