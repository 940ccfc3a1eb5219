//! Rotating file writer for the logger

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing_subscriber::fmt::MakeWriter;

use super::config::FileConfig;
use super::error::LoggerError;
use super::rotation::RotationManager;

/// File writer with size based rotation.
///
/// When the file cannot be written the writer switches to stderr for the
/// rest of the process instead of losing events.
#[derive(Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
}

struct WriterState {
    file: BufWriter<File>,
    current_size: u64,
    rotation: RotationManager,
    fallback_mode: bool,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> Result<Self, LoggerError> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            std::fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                file,
                current_size,
                rotation: RotationManager::new(config.rotation.clone()),
                fallback_mode: false,
            })),
            path: config.path.clone(),
        })
    }

    pub fn is_in_fallback_mode(&self) -> bool {
        lock(&self.state).fallback_mode
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            state: self.state.clone(),
            path: self.path.clone(),
        }
    }
}

/// Per-event handle; flushes on drop.
pub struct RotatingWriterGuard {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
}

fn lock(state: &Mutex<WriterState>) -> MutexGuard<'_, WriterState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Write for RotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = lock(&self.state);
        if state.fallback_mode {
            return io::stderr().write(buf);
        }

        if state.rotation.should_rotate(state.current_size)
            && let Err(e) = rotate(&mut state, &self.path)
        {
            return fall_back(&mut state, buf, &e.to_string());
        }

        match state.file.write(buf) {
            Ok(written) => {
                state.current_size += written as u64;
                Ok(written)
            }
            Err(e) => fall_back(&mut state, buf, &e.to_string()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = lock(&self.state);
        if state.fallback_mode {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

impl Drop for RotatingWriterGuard {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if !state.fallback_mode {
            state.file.flush().ok();
        }
    }
}

fn rotate(state: &mut WriterState, path: &Path) -> Result<(), LoggerError> {
    state.file.flush()?;
    state.rotation.rotate(path)?;
    state.file = open_log_file(path, false)?;
    state.current_size = 0;
    Ok(())
}

fn fall_back(state: &mut WriterState, buf: &[u8], reason: &str) -> io::Result<usize> {
    state.fallback_mode = true;
    eprintln!("[Logger] File write failed, falling back to stderr: {reason}");
    io::stderr().write(buf)
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(BufWriter::new(file))
}
