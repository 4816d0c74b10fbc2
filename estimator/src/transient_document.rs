use std::io;
use std::path::{Path, PathBuf};

pub const TRANSIENT_FILE_NAME: &str = "temp_uploaded.pdf";

/// On-disk copy of an upload that lives exactly as long as this value.
/// Dropping it removes the file; removal failures are logged and swallowed.
#[derive(Debug)]
pub struct TransientDocument {
    path: PathBuf,
}

impl TransientDocument {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(TRANSIENT_FILE_NAME)
    }

    pub async fn persist(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        // Guard exists before the write so a partial file is removed too.
        let document = Self {
            path: Self::path_in(dir),
        };
        tokio::fs::write(&document.path, bytes).await?;
        log::debug!("Staged {} bytes at {}", bytes.len(), document.path.display());
        Ok(document)
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

impl Drop for TransientDocument {
    fn drop(&mut self) {
        remove_best_effort(&self.path);
    }
}

/// Deletes `path`, treating "already gone" as success.
pub fn remove_best_effort(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed transient document {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove transient document {}: {}", path.display(), e),
    }
}
