use std::{io::ErrorKind, path::PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::debug;

use super::KeyValueStore;

/// Stores every key as `<dir>/<key>.json`. Reads take a shared lock and writes an exclusive one,
/// so a one-shot `punchclock in` running next to a session never sees a half written file.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("Illegal storage key {key:?}");
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        debug!("Reading {path:?}");

        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to open {path:?}")),
        };

        file.lock_shared()?;
        let mut content = String::new();
        let result = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to read {path:?}"))?;

        Ok(Some(content))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        debug!("Writing {} bytes into {path:?}", value.len());

        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open {path:?}"))?;

        // Truncation waits for the lock so that readers never observe an empty file.
        file.lock_exclusive()?;
        let result = async {
            file.set_len(0).await?;
            file.seek(std::io::SeekFrom::Start(0)).await?;
            file.write_all(value.as_bytes()).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;
        file.unlock_async().await?;
        result.with_context(|| format!("Failed to write {path:?}"))?;

        Ok(())
    }
}
