use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::APP_DIR_NAME;
use crate::error::{AppError, AppResult};

use super::KeyValue;

/// File-per-key store under the app data directory.
///
/// Each logical key is one pretty-printed JSON file. Writes go through a
/// temp file and a rename so a crash mid-write never leaves a partially
/// written collection behind.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::storage_write(format!("failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    /// Open the store at the platform-local data directory.
    pub fn open_default() -> AppResult<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| AppError::storage_read("failed to get local data dir"))?
            .join(APP_DIR_NAME);
        Self::new(dir)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValue for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path).map(Some).map_err(|e| {
            AppError::storage_read(format!("failed to read {}: {}", path.display(), e))
        })
    }

    fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        let path = self.key_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path).map_err(|e| {
            AppError::storage_write(format!("failed to create {}: {}", tmp_path.display(), e))
        })?;
        file.write_all(value.as_bytes())
            .map_err(|e| AppError::storage_write(format!("failed to write temp file: {e}")))?;
        file.sync_all()
            .map_err(|e| AppError::storage_write(format!("failed to sync temp file: {e}")))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            AppError::storage_write(format!("failed to move {} into place: {}", path.display(), e))
        })
    }
}
