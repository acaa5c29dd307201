use std::path::{Path, PathBuf};

use crate::buffer::TextBuffer;
use crate::clipboard::Clipboard;
use crate::error::{FileError, SessionError};
use crate::file_manager::{FileController, SaveOutcome};
use crate::session_store::{SessionPaths, SessionStore};
use crate::zoom::FontZoom;

/// Outcome of the two best-effort writes performed at exit.
#[derive(Debug)]
pub struct ExitReport {
    pub recovery: Result<(), SessionError>,
    pub config: Result<(), SessionError>,
}

impl ExitReport {
    pub fn is_clean(&self) -> bool {
        self.recovery.is_ok() && self.config.is_ok()
    }

    pub fn log(&self) {
        if let Err(e) = &self.recovery {
            log::warn!("Failed to write recovery snapshot: {}", e);
        }
        if let Err(e) = &self.config {
            log::warn!("Failed to record last file: {}", e);
        }
    }
}

/// The document, the file it belongs to, and everything persisted around it.
pub struct EditorSession {
    pub buffer: TextBuffer,
    files: FileController,
    store: SessionStore,
    zoom: FontZoom,
}

impl EditorSession {
    pub fn new(store: SessionStore, zoom: FontZoom) -> Self {
        Self {
            buffer: TextBuffer::new(),
            files: FileController::new(),
            store,
            zoom,
        }
    }

    /// Rebuild the session left by the previous run: recovery text first,
    /// then the last file on top of it when it still exists.
    pub async fn restore(paths: SessionPaths, zoom: FontZoom) -> Self {
        let mut session = Self::new(SessionStore::new(paths), zoom);

        match session.store.load_recovery() {
            Ok(Some(text)) => session.buffer.set_content(text),
            Ok(None) => {}
            Err(e) => log::debug!("Recovery snapshot unreadable: {}", e),
        }

        let record = match session.store.load_config() {
            Ok(record) => record,
            Err(e) => {
                log::debug!("Session record unreadable: {}", e);
                return session;
            }
        };

        if let Some(last) = record.existing_last_file() {
            let last = last.to_path_buf();
            if let Err(e) = session.files.open(&last, &mut session.buffer).await {
                log::warn!("Could not reopen {}: {}", last.display(), e);
            }
        }

        session
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.files.current_path()
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// File name for the title bar.
    pub fn display_name(&self) -> String {
        self.current_path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    pub fn new_document(&mut self) {
        self.files.new_document(&mut self.buffer);
    }

    pub async fn open(&mut self, path: &Path) -> Result<(), FileError> {
        self.files.open(path, &mut self.buffer).await?;
        self.record_current_file();
        Ok(())
    }

    /// Save to the current file; `NeedsPath` means the caller runs save-as.
    pub async fn save(&mut self) -> Result<SaveOutcome, FileError> {
        let outcome = self.files.save(&mut self.buffer).await?;
        if matches!(outcome, SaveOutcome::Saved(_)) {
            self.record_current_file();
        }
        Ok(outcome)
    }

    pub async fn save_as(&mut self, path: &Path) -> Result<PathBuf, FileError> {
        let saved = self.files.save_as(path, &mut self.buffer).await?;
        self.record_current_file();
        Ok(saved)
    }

    /// Replace the selection (if any) with the clipboard text. A clipboard
    /// that cannot be read leaves the buffer untouched.
    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) {
        match clipboard.get_text() {
            Ok(text) => self.buffer.paste(&text),
            Err(e) => log::debug!("Paste skipped: {}", e),
        }
    }

    /// Copy the selection; returns false when nothing is selected.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard) -> bool {
        let Some(text) = self.buffer.selected_text() else {
            return false;
        };
        if let Err(e) = clipboard.set_text(&text) {
            log::debug!("Copy failed: {}", e);
            return false;
        }
        true
    }

    pub fn cut(&mut self, clipboard: &mut dyn Clipboard) -> bool {
        if !self.copy(clipboard) {
            return false;
        }
        self.buffer.delete_selection();
        true
    }

    pub fn zoom(&self) -> FontZoom {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> u16 {
        self.zoom.zoom_in()
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.zoom.zoom_out()
    }

    /// Write the recovery snapshot and the last-file record. Both writes are
    /// attempted regardless of the other's result.
    pub fn persist_on_exit(&self) -> ExitReport {
        let recovery = self.store.write_recovery(&self.buffer.text());
        let config = self.store.write_config(self.current_path());
        ExitReport { recovery, config }
    }

    fn record_current_file(&self) {
        if let Err(e) = self.store.write_config(self.current_path()) {
            log::warn!("Failed to record last file: {}", e);
        }
    }
}
