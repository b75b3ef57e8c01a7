use std::{env, io, path::PathBuf};

use anyhow::{Context, Result};

pub const APPLICATION_DIR_NAME: &str = "punchclock";

/// Resolves the directory holding the store, logs and `config.json`, creating it when missing.
pub fn create_application_default_path() -> Result<PathBuf> {
    let path = {
        #[cfg(windows)]
        {
            let mut path = env::var("APPDATA")
                .map(PathBuf::from)
                .context("APPDATA should be present on Windows")?;
            path.push(APPLICATION_DIR_NAME);
            path
        }
        #[cfg(not(windows))]
        {
            let mut path = env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .context("Couldn't find neither XDG_STATE_HOME nor HOME")?;
            path.push(APPLICATION_DIR_NAME);
            path
        }
    };

    ensure_dir(path)
}

/// Uses `dir` when given, otherwise falls back to [create_application_default_path].
pub fn resolve_application_path(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => ensure_dir(dir),
        None => create_application_default_path(),
    }
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v).with_context(|| format!("Failed to create directory {path:?}")),
    }
}
