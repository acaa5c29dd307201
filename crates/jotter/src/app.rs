use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use std::path::{Path, PathBuf};

use crate::clipboard::{Clipboard, FallbackClipboard};
use crate::config::Config;
use crate::file_manager::{with_default_extension, SaveOutcome};
use crate::file_picker::{FilePicker, PickerMode, PickerOutcome};
use crate::keymap::{Action, Keymap, Platform};
use crate::session::{EditorSession, ExitReport};
use crate::session_store::SessionPaths;
use crate::text_width::TextWidth;
use crate::ui_state::{Mode, UIState};
use crate::zoom::FontZoom;

const SCROLL_LINES: usize = 3;

pub struct App {
    pub session: EditorSession,
    pub config: Config,
    pub ui_state: UIState,
    pub keymap: Keymap,
    pub picker: Option<FilePicker>,
    /// Save-as target waiting for the user to allow replacing it.
    pending_save: Option<PathBuf>,
    clipboard: Box<dyn Clipboard>,
    text_width: TextWidth,
    persisted: bool,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        Ok(Self::with_config(config, Box::new(FallbackClipboard::new())).await)
    }

    pub async fn with_config(config: Config, clipboard: Box<dyn Clipboard>) -> Self {
        let paths = SessionPaths::resolve(&config);
        log::debug!(
            "Recovery file {}, session record {}",
            paths.recovery_file.display(),
            paths.session_file.display()
        );
        let session = EditorSession::restore(paths, FontZoom::new(config.font.size)).await;
        let keymap = Keymap::with_overrides(Platform::current(), &config.keybindings);

        let mut ui_state = UIState::new();
        if let Some(path) = session.current_path() {
            ui_state.status.info(format!("Reopened {}", path.display()));
        }

        Self {
            session,
            text_width: TextWidth::new(config.editor.tab_size),
            config,
            ui_state,
            keymap,
            picker: None,
            pending_save: None,
            clipboard,
            persisted: false,
        }
    }

    pub fn text_width(&self) -> TextWidth {
        self.text_width
    }

    pub fn mode(&self) -> Mode {
        self.ui_state.mode
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.session.current_path()
    }

    pub fn is_modified(&self) -> bool {
        self.session.buffer.is_modified()
    }

    pub fn should_quit(&self) -> bool {
        self.ui_state.should_quit()
    }

    pub fn quit(&mut self) {
        self.ui_state.quit();
    }

    pub fn update_status(&mut self) {
        self.ui_state.status.update();
    }

    /// Write the recovery snapshot and session record. Runs once; later
    /// calls return `None`.
    pub fn persist_on_exit(&mut self) -> Option<ExitReport> {
        if self.persisted {
            return None;
        }
        self.persisted = true;
        let report = self.session.persist_on_exit();
        report.log();
        if report.is_clean() {
            log::info!("Session persisted");
        }
        Some(report)
    }

    pub async fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key_event(key).await
            }
            Event::Mouse(mouse) => self.handle_mouse_event(mouse).await,
            Event::Paste(text) if self.mode() == Mode::Editing => {
                self.session.buffer.paste(&text);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match self.mode() {
            Mode::Editing => self.handle_editing_key(key).await,
            Mode::Picker => self.handle_picker_key(key).await,
            Mode::Notice => {
                self.handle_notice_key(key);
                Ok(())
            }
            Mode::Confirm => self.handle_confirm_key(key).await,
        }
    }

    async fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.mode() != Mode::Editing {
            return Ok(());
        }
        if let Some(action) = self.keymap.resolve_mouse(&mouse) {
            return self.perform(action).await;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => self.session.buffer.page_up(SCROLL_LINES, false),
            MouseEventKind::ScrollDown => self.session.buffer.page_down(SCROLL_LINES, false),
            _ => {}
        }
        Ok(())
    }

    async fn handle_editing_key(&mut self, key: KeyEvent) -> Result<()> {
        if let Some(action) = self.keymap.resolve_key(&key) {
            return self.perform(action).await;
        }

        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let page = self.ui_state.viewport.page();
        let buffer = &mut self.session.buffer;

        match key.code {
            // Ctrl+Alt is AltGr on some layouts.
            KeyCode::Char(c) if ctrl == alt => buffer.insert_char(c),
            KeyCode::Enter => buffer.insert_newline(),
            KeyCode::Tab => {
                buffer.insert_tab(self.config.editor.tab_size, self.config.editor.use_spaces)
            }
            KeyCode::Backspace => buffer.delete_char_backward(),
            KeyCode::Delete => buffer.delete_char_forward(),
            KeyCode::Left => buffer.move_left(shift),
            KeyCode::Right => buffer.move_right(shift),
            KeyCode::Up => buffer.move_up(shift),
            KeyCode::Down => buffer.move_down(shift),
            KeyCode::Home if ctrl => buffer.move_to_start(shift),
            KeyCode::End if ctrl => buffer.move_to_end(shift),
            KeyCode::Home => buffer.move_to_line_start(shift),
            KeyCode::End => buffer.move_to_line_end(shift),
            KeyCode::PageUp => buffer.page_up(page, shift),
            KeyCode::PageDown => buffer.page_down(page, shift),
            KeyCode::Esc => buffer.clear_selection(),
            _ => {}
        }
        Ok(())
    }

    /// Run a bound action.
    pub async fn perform(&mut self, action: Action) -> Result<()> {
        log::debug!("Action {:?}", action);
        match action {
            Action::NewDocument => {
                self.session.new_document();
                self.ui_state.status.info("New document");
            }
            Action::Open => self.show_picker(PickerMode::Open),
            Action::Save => self.save().await,
            Action::SaveAs => self.show_picker(PickerMode::Save),
            Action::Print => {
                self.ui_state.show_notice(
                    "Print",
                    "Printing is simulated. Nothing was sent to a printer.",
                );
            }
            Action::Undo => {
                if !self.session.buffer.undo() {
                    self.ui_state.status.warning("Nothing to undo");
                }
            }
            Action::Redo => {
                if !self.session.buffer.redo() {
                    self.ui_state.status.warning("Nothing to redo");
                }
            }
            Action::SelectAll => self.session.buffer.select_all(),
            Action::Paste => self.session.paste(self.clipboard.as_mut()),
            Action::Copy => {
                if self.session.copy(self.clipboard.as_mut()) {
                    self.ui_state.status.info("Copied");
                }
            }
            Action::Cut => {
                self.session.cut(self.clipboard.as_mut());
            }
            Action::ZoomIn => {
                let size = self.session.zoom_in();
                self.ui_state.status.info(format!("Font size {}", size));
            }
            Action::ZoomOut => {
                let size = self.session.zoom_out();
                self.ui_state.status.info(format!("Font size {}", size));
            }
            Action::Quit => self.quit(),
        }
        Ok(())
    }

    fn show_picker(&mut self, mode: PickerMode) {
        self.picker = Some(FilePicker::for_document(mode, self.session.current_path()));
        self.ui_state.mode = Mode::Picker;
    }

    fn close_picker(&mut self) {
        self.picker = None;
        self.pending_save = None;
        self.ui_state.close_notice(Mode::Editing);
    }

    async fn handle_picker_key(&mut self, key: KeyEvent) -> Result<()> {
        let page = self.ui_state.viewport.page();
        let Some(picker) = self.picker.as_mut() else {
            self.ui_state.mode = Mode::Editing;
            return Ok(());
        };
        let mode = picker.mode();

        match picker.handle_key(key, page) {
            PickerOutcome::Pending => {}
            PickerOutcome::Cancelled => self.close_picker(),
            PickerOutcome::Chosen(path) => match mode {
                PickerMode::Open => {
                    self.close_picker();
                    self.open_path(&path).await;
                }
                PickerMode::Save => self.choose_save_target(path).await,
            },
        }
        Ok(())
    }

    /// Save to `path`, first asking before another existing file is replaced.
    async fn choose_save_target(&mut self, path: PathBuf) {
        let target = with_default_extension(&path);
        let is_current = self.session.current_path() == Some(target.as_path());
        let exists = tokio::fs::try_exists(&target).await.unwrap_or(false);

        if exists && !is_current {
            let name = target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| target.display().to_string());
            log::debug!("Asking before replacing {}", target.display());
            self.ui_state.ask(
                "Confirm Save As",
                format!("{} already exists. Replace it?", name),
            );
            self.pending_save = Some(target);
            return;
        }

        self.close_picker();
        self.save_as_path(&target).await;
    }

    async fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let target = self.pending_save.take();
                self.close_picker();
                if let Some(target) = target {
                    self.save_as_path(&target).await;
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending_save = None;
                let next = if self.picker.is_some() {
                    Mode::Picker
                } else {
                    Mode::Editing
                };
                self.ui_state.close_notice(next);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_notice_key(&mut self, key: KeyEvent) {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            self.ui_state.dismiss_notice();
        }
    }

    pub async fn open_path(&mut self, path: &Path) {
        match self.session.open(path).await {
            Ok(()) => {
                self.ui_state.viewport.top_line = 0;
                self.ui_state.viewport.left_col = 0;
                self.ui_state
                    .status
                    .success(format!("Opened {}", self.session.display_name()));
            }
            Err(e) => {
                log::error!("Open failed: {}", e);
                self.ui_state.status.error(e.to_string());
            }
        }
    }

    /// Save to the current file, or start the save-as flow when there is none.
    pub async fn save(&mut self) {
        match self.session.save().await {
            Ok(SaveOutcome::Saved(path)) => self.report_saved(&path),
            Ok(SaveOutcome::NeedsPath) => self.show_picker(PickerMode::Save),
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.ui_state.status.error(e.to_string());
            }
        }
    }

    pub async fn save_as_path(&mut self, path: &Path) {
        match self.session.save_as(path).await {
            Ok(saved) => self.report_saved(&saved),
            Err(e) => {
                log::error!("Save failed: {}", e);
                self.ui_state.status.error(e.to_string());
            }
        }
    }

    fn report_saved(&mut self, path: &Path) {
        self.ui_state.status.success(format!("Saved {}", path.display()));
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.persist_on_exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use std::fs;
    use tempfile::TempDir;

    async fn test_app(dir: &TempDir) -> App {
        let mut config = Config::default();
        let paths = SessionPaths::in_dir(dir.path());
        config.paths.recovery_file = Some(paths.recovery_file);
        config.paths.session_file = Some(paths.session_file);
        App::with_config(config, Box::new(MemoryClipboard::with_text("Hi"))).await
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key_event(key(KeyCode::Char(c), KeyModifiers::NONE))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_app_creation() {
        let dir = TempDir::new().unwrap();
        let app = test_app(&dir).await;

        assert_eq!(app.mode(), Mode::Editing);
        assert!(!app.is_modified());
        assert!(!app.should_quit());
        assert!(app.file_path().is_none());
    }

    #[tokio::test]
    async fn test_typing_and_navigation() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;

        type_text(&mut app, "abc").await;
        app.handle_key_event(key(KeyCode::Left, KeyModifiers::SHIFT))
            .await
            .unwrap();
        assert_eq!(app.session.buffer.selected_text().as_deref(), Some("c"));

        type_text(&mut app, "Z").await;
        assert_eq!(app.session.buffer.text(), "abZ");
        assert!(app.is_modified());
    }

    #[tokio::test]
    async fn test_unbound_ctrl_chord_does_not_type() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key_event(key(KeyCode::Char('k'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert!(app.session.buffer.is_empty());
    }

    #[tokio::test]
    async fn test_select_all_then_paste() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;
        type_text(&mut app, "Hello").await;

        app.handle_key_event(key(KeyCode::Char('a'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        app.handle_key_event(key(KeyCode::Char('v'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert_eq!(app.session.buffer.text(), "Hi");
    }

    #[tokio::test]
    async fn test_undo_redo_shortcuts() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;
        type_text(&mut app, "x").await;

        app.perform(Action::Undo).await.unwrap();
        assert_eq!(app.session.buffer.text(), "");
        app.perform(Action::Redo).await.unwrap();
        assert_eq!(app.session.buffer.text(), "x");
    }

    #[tokio::test]
    async fn test_save_without_file_opens_save_picker() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;
        type_text(&mut app, "draft").await;

        app.handle_key_event(key(KeyCode::Char('s'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert_eq!(app.mode(), Mode::Picker);
        assert_eq!(app.picker.as_ref().unwrap().mode(), PickerMode::Save);

        app.handle_key_event(key(KeyCode::Esc, KeyModifiers::NONE))
            .await
            .unwrap();
        assert_eq!(app.mode(), Mode::Editing);
        assert!(app.picker.is_none());
    }

    #[tokio::test]
    async fn test_save_as_through_picker() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;
        type_text(&mut app, "draft").await;

        app.perform(Action::SaveAs).await.unwrap();
        app.picker
            .as_mut()
            .unwrap()
            .navigate_to(dir.path().to_path_buf());
        for c in "memo".chars() {
            app.handle_key_event(key(KeyCode::Char(c), KeyModifiers::NONE))
                .await
                .unwrap();
        }
        app.handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE))
            .await
            .unwrap();

        let saved = dir.path().join("memo.txt");
        assert_eq!(app.mode(), Mode::Editing);
        assert_eq!(app.file_path(), Some(saved.as_path()));
        assert_eq!(fs::read_to_string(&saved).unwrap(), "draft");
    }

    async fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(key(code, KeyModifiers::NONE))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_save_as_asks_before_replacing_existing_file() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("important.txt");
        fs::write(&existing, "precious data").unwrap();

        let mut app = test_app(&dir).await;
        type_text(&mut app, "scratch").await;
        app.perform(Action::SaveAs).await.unwrap();
        app.picker
            .as_mut()
            .unwrap()
            .navigate_to(dir.path().to_path_buf());

        // Highlighting the file proposes its name.
        press(&mut app, KeyCode::End).await;
        assert_eq!(app.picker.as_ref().unwrap().filename(), "important.txt");
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.mode(), Mode::Confirm);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "precious data");

        press(&mut app, KeyCode::Char('n')).await;
        assert_eq!(app.mode(), Mode::Picker);
        press(&mut app, KeyCode::Esc).await;
        assert_eq!(app.mode(), Mode::Editing);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "precious data");
        assert!(app.file_path().is_none());
        assert!(app.is_modified());
    }

    #[tokio::test]
    async fn test_save_as_replaces_after_confirmation() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("important.txt");
        fs::write(&existing, "precious data").unwrap();

        let mut app = test_app(&dir).await;
        type_text(&mut app, "scratch").await;
        app.perform(Action::SaveAs).await.unwrap();
        app.picker
            .as_mut()
            .unwrap()
            .navigate_to(dir.path().to_path_buf());
        // No extension typed: the default one still hits the existing file.
        type_text(&mut app, "important").await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(app.mode(), Mode::Confirm);

        press(&mut app, KeyCode::Char('y')).await;
        assert_eq!(app.mode(), Mode::Editing);
        assert!(app.picker.is_none());
        assert_eq!(fs::read_to_string(&existing).unwrap(), "scratch");
        assert_eq!(app.file_path(), Some(existing.as_path()));
    }

    #[tokio::test]
    async fn test_save_as_over_current_file_does_not_ask() {
        let dir = TempDir::new().unwrap();
        let current = dir.path().join("notes.txt");
        fs::write(&current, "old").unwrap();

        let mut app = test_app(&dir).await;
        app.open_path(&current).await;
        app.perform(Action::SelectAll).await.unwrap();
        type_text(&mut app, "new").await;

        app.perform(Action::SaveAs).await.unwrap();
        assert_eq!(app.picker.as_ref().unwrap().filename(), "notes.txt");
        press(&mut app, KeyCode::Enter).await;

        assert_eq!(app.mode(), Mode::Editing);
        assert_eq!(fs::read_to_string(&current).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_open_error_becomes_status_message() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;

        app.open_path(&dir.path().join("absent.txt")).await;
        let message = app.ui_state.status.current().unwrap();
        assert_eq!(
            message.message_type,
            crate::status_manager::MessageType::Error
        );
        assert!(app.file_path().is_none());
    }

    #[tokio::test]
    async fn test_print_shows_notice_until_dismissed() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key_event(key(KeyCode::Char('p'), KeyModifiers::CONTROL))
            .await
            .unwrap();
        assert_eq!(app.mode(), Mode::Notice);

        type_text(&mut app, "q").await;
        assert_eq!(app.mode(), Mode::Notice);
        assert!(app.session.buffer.is_empty());

        app.handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE))
            .await
            .unwrap();
        assert_eq!(app.mode(), Mode::Editing);
    }

    #[tokio::test]
    async fn test_ctrl_scroll_zooms() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;
        let scroll = |kind| {
            Event::Mouse(MouseEvent {
                kind,
                column: 0,
                row: 0,
                modifiers: if cfg!(any(target_os = "macos", target_os = "windows")) {
                    KeyModifiers::ALT
                } else {
                    KeyModifiers::CONTROL
                },
            })
        };

        app.handle_event(scroll(MouseEventKind::ScrollUp)).await.unwrap();
        assert_eq!(app.session.zoom().size(), 13);
        for _ in 0..10 {
            app.handle_event(scroll(MouseEventKind::ScrollDown)).await.unwrap();
        }
        assert_eq!(app.session.zoom().size(), 8);
    }

    #[tokio::test]
    async fn test_quit_and_persist_once() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir).await;
        type_text(&mut app, "unsaved").await;

        app.perform(Action::Quit).await.unwrap();
        assert!(app.should_quit());

        let report = app.persist_on_exit().unwrap();
        assert!(report.is_clean());
        assert!(app.persist_on_exit().is_none());

        let paths = SessionPaths::in_dir(dir.path());
        assert_eq!(fs::read_to_string(paths.recovery_file).unwrap(), "unsaved");
    }

    #[tokio::test]
    async fn test_drop_persists_recovery() {
        let dir = TempDir::new().unwrap();
        {
            let mut app = test_app(&dir).await;
            type_text(&mut app, "crash me").await;
        }

        let app = test_app(&dir).await;
        assert_eq!(app.session.buffer.text(), "crash me");
    }
}
