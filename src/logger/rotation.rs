//! Size based rotation of the log file

use std::fs;
use std::path::{Path, PathBuf};

use jiff::Zoned;

use super::config::RotationConfig;
use super::error::LoggerError;

pub struct RotationManager {
    config: RotationConfig,
}

impl RotationManager {
    pub fn new(config: RotationConfig) -> Self {
        Self { config }
    }

    pub fn should_rotate(&self, current_file_size: u64) -> bool {
        current_file_size >= self.config.max_size
    }

    /// Moves the active file aside and prunes old rotations.
    pub fn rotate(&self, current_path: &Path) -> Result<(), LoggerError> {
        if current_path.exists() {
            let rotated_path = rotated_path(current_path);
            fs::rename(current_path, &rotated_path).map_err(|e| {
                LoggerError::rotation(format!(
                    "cannot rename {} to {}: {e}",
                    current_path.display(),
                    rotated_path.display()
                ))
            })?;
        }
        self.cleanup_old_files(current_path)
    }

    /// Keeps at most `max_files` rotated files, dropping the oldest first.
    fn cleanup_old_files(&self, base_path: &Path) -> Result<(), LoggerError> {
        let mut rotated = rotated_files(base_path)?;
        // rotated names embed a sortable timestamp
        rotated.sort();

        let excess = rotated.len().saturating_sub(self.config.max_files);
        for oldest in rotated.iter().take(excess) {
            fs::remove_file(oldest)?;
        }
        Ok(())
    }
}

fn split_name(base_path: &Path) -> (String, String) {
    let stem = base_path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let ext = base_path
        .extension()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    (stem, ext)
}

/// `app.log` becomes `app.20261016_101500_000.log`, with a counter appended
/// if that name is already taken.
fn rotated_path(base_path: &Path) -> PathBuf {
    let timestamp = Zoned::now().strftime("%Y%m%d_%H%M%S_%3f").to_string();
    let (stem, ext) = split_name(base_path);

    let name = |seq: u32| {
        let tag = if seq == 0 {
            timestamp.clone()
        } else {
            format!("{timestamp}-{seq}")
        };
        if ext.is_empty() {
            format!("{stem}.{tag}")
        } else {
            format!("{stem}.{tag}.{ext}")
        }
    };

    (0..)
        .map(|seq| base_path.with_file_name(name(seq)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| base_path.with_file_name(name(0)))
}

fn rotated_files(base_path: &Path) -> Result<Vec<PathBuf>, LoggerError> {
    let parent = match base_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let (stem, _) = split_name(base_path);
    let prefix = format!("{stem}.");

    Ok(fs::read_dir(parent)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            let file_name = path.file_name().unwrap_or_default().to_string_lossy();
            file_name.starts_with(&prefix) && path != base_path
        })
        .collect())
}
