use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Send log records to `path` so they never scribble over the TUI.
///
/// `RUST_LOG` overrides the default `info` level.
pub fn init(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    builder(Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

fn builder(target: Target) -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder
        .target(target)
        .filter_module("reqwest", LevelFilter::Warn)
        .format_timestamp_secs();
    builder
}
