//! In-terminal open/save dialog.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};

const TEXT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Open,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    Text,
    All,
}

impl FileFilter {
    pub fn label(&self) -> &'static str {
        match self {
            FileFilter::Text => "Text files (*.txt)",
            FileFilter::All => "All files (*.*)",
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        match self {
            FileFilter::All => true,
            FileFilter::Text => path
                .extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case(TEXT_EXTENSION))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub modified: Option<DateTime<Local>>,
}

impl FileEntry {
    pub fn modified_label(&self) -> String {
        self.modified
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickerOutcome {
    Pending,
    Cancelled,
    Chosen(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FilePicker {
    mode: PickerMode,
    current_dir: PathBuf,
    entries: Vec<FileEntry>,
    selected: usize,
    filter: FileFilter,
    filename: String,
    error: Option<String>,
}

impl FilePicker {
    pub fn new(mode: PickerMode, start_dir: PathBuf) -> Self {
        let mut picker = Self {
            mode,
            current_dir: start_dir,
            entries: Vec::new(),
            selected: 0,
            filter: FileFilter::Text,
            filename: String::new(),
            error: None,
        };
        picker.refresh();
        picker
    }

    /// Picker rooted next to `current`, or in the working directory.
    pub fn for_document(mode: PickerMode, current: Option<&Path>) -> Self {
        let start_dir = current
            .and_then(Path::parent)
            .filter(|p| p.is_dir())
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut picker = Self::new(mode, start_dir);
        if mode == PickerMode::Save {
            if let Some(name) = current.and_then(Path::file_name) {
                picker.filename = name.to_string_lossy().into_owned();
            }
        }
        picker
    }

    pub fn mode(&self) -> PickerMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            PickerMode::Open => "Open",
            PickerMode::Save => "Save As",
        }
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&FileEntry> {
        self.entries.get(self.selected)
    }

    pub fn filter(&self) -> FileFilter {
        self.filter
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Re-read the current directory: `..` first, then directories, then
    /// files passing the filter. Hidden entries are skipped.
    pub fn refresh(&mut self) {
        self.entries.clear();
        self.selected = 0;
        self.error = None;

        if let Some(parent) = self.current_dir.parent() {
            self.entries.push(FileEntry {
                name: "..".to_string(),
                path: parent.to_path_buf(),
                is_directory: true,
                modified: None,
            });
        }

        let read_dir = match std::fs::read_dir(&self.current_dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                log::warn!("Cannot list {}: {}", self.current_dir.display(), e);
                self.error = Some(e.to_string());
                return;
            }
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let is_directory = path.is_dir();
            if !is_directory && !self.filter.accepts(&path) {
                continue;
            }

            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Local>::from);
            let entry = FileEntry {
                name,
                path,
                is_directory,
                modified,
            };
            if is_directory {
                dirs.push(entry);
            } else {
                files.push(entry);
            }
        }

        dirs.sort_by_key(|e| e.name.to_lowercase());
        files.sort_by_key(|e| e.name.to_lowercase());
        self.entries.extend(dirs);
        self.entries.extend(files);
    }

    pub fn navigate_to(&mut self, path: PathBuf) {
        if path.is_dir() {
            self.current_dir = path;
            self.refresh();
        }
    }

    pub fn toggle_filter(&mut self) {
        self.filter = match self.filter {
            FileFilter::Text => FileFilter::All,
            FileFilter::All => FileFilter::Text,
        };
        self.refresh();
    }

    pub fn select_next(&mut self) {
        self.move_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.move_selection(-1);
    }

    fn move_selection(&mut self, delta: isize) {
        if self.entries.is_empty() {
            return;
        }
        let last = self.entries.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
        self.sync_filename();
    }

    fn select_index(&mut self, idx: usize) {
        if !self.entries.is_empty() {
            self.selected = idx.min(self.entries.len() - 1);
            self.sync_filename();
        }
    }

    /// In save mode, highlighting a file proposes its name.
    fn sync_filename(&mut self) {
        if self.mode != PickerMode::Save {
            return;
        }
        if let Some(entry) = self.entries.get(self.selected) {
            if !entry.is_directory {
                self.filename = entry.name.clone();
            }
        }
    }

    /// Jump to the first entry whose name starts with `c`.
    fn jump_to(&mut self, c: char) {
        let c = c.to_lowercase().to_string();
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.name != ".." && e.name.to_lowercase().starts_with(&c))
        {
            self.selected = idx;
        }
    }

    pub fn confirm(&mut self) -> PickerOutcome {
        if self.mode == PickerMode::Save && !self.filename.trim().is_empty() {
            let target = self.current_dir.join(self.filename.trim());
            if target.is_dir() {
                self.filename.clear();
                self.navigate_to(target);
                return PickerOutcome::Pending;
            }
            return PickerOutcome::Chosen(target);
        }

        match self.selected_entry().cloned() {
            Some(entry) if entry.is_directory => {
                self.navigate_to(entry.path);
                PickerOutcome::Pending
            }
            Some(entry) => PickerOutcome::Chosen(entry.path),
            None => PickerOutcome::Pending,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, page: usize) -> PickerOutcome {
        match key.code {
            KeyCode::Esc => return PickerOutcome::Cancelled,
            KeyCode::Enter => return self.confirm(),
            KeyCode::Up => self.select_prev(),
            KeyCode::Down => self.select_next(),
            KeyCode::PageUp => self.move_selection(-(page.max(1) as isize)),
            KeyCode::PageDown => self.move_selection(page.max(1) as isize),
            KeyCode::Home => self.select_index(0),
            KeyCode::End => self.select_index(usize::MAX),
            KeyCode::Tab => self.toggle_filter(),
            KeyCode::Left => {
                if let Some(parent) = self.current_dir.parent().map(Path::to_path_buf) {
                    self.navigate_to(parent);
                }
            }
            KeyCode::Backspace => match self.mode {
                PickerMode::Save => {
                    self.filename.pop();
                }
                PickerMode::Open => {
                    if let Some(parent) = self.current_dir.parent().map(Path::to_path_buf) {
                        self.navigate_to(parent);
                    }
                }
            },
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                match self.mode {
                    PickerMode::Save => self.filename.push(c),
                    PickerMode::Open => self.jump_to(c),
                }
            }
            _ => {}
        }
        PickerOutcome::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("A.TXT"), "").unwrap();
        fs::write(dir.path().join("image.png"), "").unwrap();
        fs::write(dir.path().join(".hidden.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        dir
    }

    fn names(picker: &FilePicker) -> Vec<&str> {
        picker.entries().iter().map(|e| e.name.as_str()).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_text_filter_lists_dirs_then_txt_files() {
        let dir = sample_dir();
        let picker = FilePicker::new(PickerMode::Open, dir.path().to_path_buf());
        assert_eq!(names(&picker), vec!["..", "sub", "A.TXT", "b.txt"]);
    }

    #[test]
    fn test_toggle_filter_shows_all_files() {
        let dir = sample_dir();
        let mut picker = FilePicker::new(PickerMode::Open, dir.path().to_path_buf());
        picker.handle_key(key(KeyCode::Tab), 10);

        assert_eq!(picker.filter(), FileFilter::All);
        assert!(names(&picker).contains(&"image.png"));
        assert!(!names(&picker).contains(&".hidden.txt"));
    }

    #[test]
    fn test_open_enter_on_file_chooses_it() {
        let dir = sample_dir();
        let mut picker = FilePicker::new(PickerMode::Open, dir.path().to_path_buf());
        picker.handle_key(key(KeyCode::Char('b')), 10);

        assert_eq!(
            picker.handle_key(key(KeyCode::Enter), 10),
            PickerOutcome::Chosen(dir.path().join("b.txt"))
        );
    }

    #[test]
    fn test_enter_on_directory_navigates() {
        let dir = sample_dir();
        fs::write(dir.path().join("sub").join("inner.txt"), "").unwrap();
        let mut picker = FilePicker::new(PickerMode::Open, dir.path().to_path_buf());
        picker.handle_key(key(KeyCode::Down), 10);

        assert_eq!(picker.handle_key(key(KeyCode::Enter), 10), PickerOutcome::Pending);
        assert_eq!(picker.current_dir(), dir.path().join("sub"));
        assert_eq!(names(&picker), vec!["..", "inner.txt"]);
    }

    #[test]
    fn test_escape_cancels() {
        let dir = sample_dir();
        let mut picker = FilePicker::new(PickerMode::Save, dir.path().to_path_buf());
        assert_eq!(picker.handle_key(key(KeyCode::Esc), 10), PickerOutcome::Cancelled);
    }

    #[test]
    fn test_save_mode_typed_name() {
        let dir = sample_dir();
        let mut picker = FilePicker::new(PickerMode::Save, dir.path().to_path_buf());
        for c in "notes".chars() {
            picker.handle_key(key(KeyCode::Char(c)), 10);
        }
        picker.handle_key(key(KeyCode::Backspace), 10);
        assert_eq!(picker.filename(), "note");

        assert_eq!(
            picker.handle_key(key(KeyCode::Enter), 10),
            PickerOutcome::Chosen(dir.path().join("note"))
        );
    }

    #[test]
    fn test_save_mode_highlighting_file_proposes_name() {
        let dir = sample_dir();
        let mut picker = FilePicker::new(PickerMode::Save, dir.path().to_path_buf());
        picker.handle_key(key(KeyCode::End), 10);
        assert_eq!(picker.filename(), "b.txt");
    }

    #[test]
    fn test_save_mode_typed_directory_navigates() {
        let dir = sample_dir();
        let mut picker = FilePicker::new(PickerMode::Save, dir.path().to_path_buf());
        for c in "sub".chars() {
            picker.handle_key(key(KeyCode::Char(c)), 10);
        }
        assert_eq!(picker.confirm(), PickerOutcome::Pending);
        assert_eq!(picker.current_dir(), dir.path().join("sub"));
        assert_eq!(picker.filename(), "");
    }

    #[test]
    fn test_for_document_starts_beside_current_file() {
        let dir = sample_dir();
        let current = dir.path().join("b.txt");
        let picker = FilePicker::for_document(PickerMode::Save, Some(&current));

        assert_eq!(picker.current_dir(), dir.path());
        assert_eq!(picker.filename(), "b.txt");
        assert_eq!(picker.title(), "Save As");
    }

    #[test]
    fn test_files_carry_modification_time() {
        let dir = sample_dir();
        let picker = FilePicker::new(PickerMode::Open, dir.path().to_path_buf());
        let file = picker.entries().iter().find(|e| e.name == "b.txt").unwrap();

        assert!(file.modified.is_some());
        assert_eq!(file.modified_label().len(), "2024-01-01 00:00".len());
        assert_eq!(picker.entries()[0].modified_label(), "");
    }

    #[test]
    fn test_unreadable_directory_reports_error() {
        let dir = TempDir::new().unwrap();
        let picker = FilePicker::new(PickerMode::Open, dir.path().join("gone"));
        assert!(picker.error().is_some());
    }
}
