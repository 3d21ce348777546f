use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::Result;
use crate::stamp;

/// Content directory for raw uploaded artifacts. Saved files stay on disk
/// even when a later extraction fails.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub file_name: String,
    pub path: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<SavedUpload> {
        fs::create_dir_all(&self.dir)?;
        let file_name = format!("{}-{}", stamp::next_millis(), sanitize_name(original_name));
        let path = self.dir.join(&file_name);
        fs::write(&path, bytes)?;
        info!(file = %file_name, bytes = bytes.len(), "upload saved");
        Ok(SavedUpload { file_name, path })
    }
}

/// Collapses every whitespace run to a single underscore.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_gap = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_gap {
                out.push('_');
            }
            in_gap = true;
        } else {
            out.push(ch);
            in_gap = false;
        }
    }
    out
}
