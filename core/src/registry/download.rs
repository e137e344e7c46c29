//! The "save as" side channel for downloads.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// A downloaded file ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Destination for downloaded files.
#[async_trait::async_trait]
pub trait SaveSink: Send + Sync {
    async fn save(&self, file: DownloadedFile) -> io::Result<()>;
}

/// Writes downloads to `<dir>/<file_name>`, replacing existing files.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl SaveSink for DirectorySink {
    async fn save(&self, file: DownloadedFile) -> io::Result<()> {
        // Only a bare file name may be joined onto the directory.
        let name = Path::new(&file.file_name);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a plain file name: {:?}", file.file_name),
            ));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, &file.bytes).await?;
        debug!("Saved {} ({}) to {}", file.file_name, file.content_type, path.display());
        Ok(())
    }
}
