//! Local directory for files produced by remote runs
//!
//! Every file is written as `<dir>/<file_id><ext>`, where the extension is
//! sniffed from the content (see [`crate::sniff`]). Writing the same id twice
//! overwrites the previous copy.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};
use crate::sniff::detect_extension;

/// Default directory for downloaded files
pub const DEFAULT_FILES_DIR: &str = "./files";

/// Configuration for FileStore
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Directory that receives downloaded files
    pub dir: PathBuf,
}

impl FileStoreConfig {
    /// Create config from a directory path
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FILES_DIR)
    }
}

/// A directory of downloaded files named by remote file id
#[derive(Debug, Clone)]
pub struct FileStore {
    config: FileStoreConfig,
}

impl FileStore {
    /// Open the store, creating its directory if needed
    pub async fn new(config: FileStoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir).await?;
        Ok(Self { config })
    }

    /// Directory backing this store
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Local path a file with this id and content would be written to
    pub fn path_for(&self, file_id: &str, data: &[u8]) -> Result<PathBuf> {
        if file_id.is_empty()
            || file_id == "."
            || file_id == ".."
            || file_id.contains(['/', '\\'])
        {
            return Err(Error::Internal(format!("Invalid remote file id: {file_id:?}")));
        }
        Ok(self
            .config
            .dir
            .join(format!("{}{}", file_id, detect_extension(data))))
    }

    /// Write `data` under the name derived from `file_id` and return the path
    pub async fn persist(&self, file_id: &str, data: &[u8]) -> Result<String> {
        let path = self.path_for(file_id, data)?;
        // The directory may have been removed since the store was opened.
        fs::create_dir_all(&self.config.dir).await?;
        fs::write(&path, data).await?;
        debug!(file_id, path = %path.display(), bytes = data.len(), "Stored remote file");
        Ok(path.display().to_string())
    }
}
