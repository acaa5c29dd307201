use std::path::{Path, PathBuf};
use tokio::fs;

use crate::buffer::TextBuffer;
use crate::error::FileError;

pub type Result<T> = std::result::Result<T, FileError>;

const DEFAULT_EXTENSION: &str = "txt";

/// Result of a plain save request.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// No current file: the caller must run the save-as flow.
    NeedsPath,
}

/// Reads and writes the document and tracks which file it belongs to.
pub struct FileController {
    current_path: Option<PathBuf>,
}

impl FileController {
    pub fn new() -> Self {
        Self { current_path: None }
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    pub fn has_file(&self) -> bool {
        self.current_path.is_some()
    }

    pub fn new_document(&mut self, buffer: &mut TextBuffer) {
        buffer.clear();
        self.current_path = None;
        log::info!("Started a new document");
    }

    /// Load `path` into `buffer`, replacing its content entirely.
    pub async fn open(&mut self, path: &Path, buffer: &mut TextBuffer) -> Result<()> {
        let content = read_text(path).await?;
        buffer.set_content(content);
        self.current_path = Some(path.to_path_buf());
        log::info!("Opened {}", path.display());
        Ok(())
    }

    pub async fn save(&mut self, buffer: &mut TextBuffer) -> Result<SaveOutcome> {
        let Some(path) = self.current_path.clone() else {
            return Ok(SaveOutcome::NeedsPath);
        };
        write_text(&path, &buffer.text()).await?;
        buffer.mark_saved();
        log::info!("Saved {}", path.display());
        Ok(SaveOutcome::Saved(path))
    }

    /// Write the buffer to `path` and make it the current file. A path
    /// without an extension gets `.txt`.
    pub async fn save_as(&mut self, path: &Path, buffer: &mut TextBuffer) -> Result<PathBuf> {
        let path = with_default_extension(path);
        write_text(&path, &buffer.text()).await?;
        buffer.mark_saved();
        self.current_path = Some(path.clone());
        log::info!("Saved as {}", path.display());
        Ok(path)
    }
}

impl Default for FileController {
    fn default() -> Self {
        Self::new()
    }
}

pub fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(DEFAULT_EXTENSION)
    }
}

async fn read_text(path: &Path) -> Result<String> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| FileError::io(path, e))?;
    if !metadata.is_file() {
        return Err(FileError::NotAFile(path.to_path_buf()));
    }

    let bytes = fs::read(path).await.map_err(|e| FileError::io(path, e))?;
    String::from_utf8(bytes).map_err(|_| FileError::InvalidEncoding(path.to_path_buf()))
}

async fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content.as_bytes())
        .await
        .map_err(|e| FileError::io(path, e))
}
