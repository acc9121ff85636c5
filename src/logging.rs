//! Log setup: stdout plus a size-capped file with numbered backups.
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::Settings;

/// Appends to `path`; once a write would push the file past `max_bytes` the
/// file is shifted to `path.1` (older backups move up, `path.<backups>` is
/// dropped) and a fresh file is started. With zero backups the file is never
/// rotated and grows without bound.
pub struct RotatingFile {
    state: Mutex<RotatingState>,
}

struct RotatingState {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    backups: usize,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            state: Mutex::new(RotatingState {
                path,
                file,
                written,
                max_bytes,
                backups,
            }),
        })
    }
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

impl RotatingState {
    fn should_rotate(&self, incoming: usize) -> bool {
        self.backups > 0 && self.written > 0 && self.written + incoming as u64 > self.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = backup_path(&self.path, self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.backups).rev() {
            let from = backup_path(&self.path, n);
            if from.exists() {
                fs::rename(&from, backup_path(&self.path, n + 1))?;
            }
        }
        fs::rename(&self.path, backup_path(&self.path, 1))?;
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

pub struct RotatingWriter<'a> {
    state: MutexGuard<'a, RotatingState>,
}

impl Write for RotatingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let state = &mut *self.state;
        if state.should_rotate(buf.len()) {
            state.rotate()?;
        }
        let n = state.file.write(buf)?;
        state.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        RotatingWriter { state }
    }
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Stdout defaults to `info`; the file keeps `debug` unless `RUST_LOG` says
/// otherwise.
pub fn subscriber(settings: &Settings) -> io::Result<impl Subscriber + Send + Sync + 'static> {
    let file = RotatingFile::open(
        &settings.log_file,
        settings.log_max_bytes,
        settings.log_backups,
    )?;
    Ok(tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact()
                .with_filter(filter_or("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file)
                .with_filter(filter_or("debug")),
        ))
}

pub fn init(settings: &Settings) -> io::Result<()> {
    subscriber(settings)?.init();
    Ok(())
}
