use ropey::Rope;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

const HISTORY_LIMIT: usize = 100;

/// The document being edited: a rope plus cursor, selection and a
/// snapshot-based undo history.
///
/// Positions are char indices into the rope. A selection exists when an
/// anchor is set and differs from the cursor.
#[derive(Clone)]
pub struct TextBuffer {
    rope: Rope,
    cursor: usize,
    anchor: Option<usize>,
    goal_col: Option<usize>,
    modified: bool,
    history: Vec<EditorState>,
    history_index: usize,
}

#[derive(Clone)]
struct EditorState {
    content: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor: 0,
            anchor: None,
            goal_col: None,
            modified: false,
            history: vec![EditorState {
                content: String::new(),
                cursor: 0,
            }],
            history_index: 0,
        }
    }

    /// Replace the whole document. Resets cursor, selection and history.
    pub fn set_content(&mut self, content: String) {
        self.rope = Rope::from_str(&content);
        self.cursor = 0;
        self.anchor = None;
        self.goal_col = None;
        self.modified = false;
        self.history = vec![EditorState { content, cursor: 0 }];
        self.history_index = 0;
    }

    pub fn clear(&mut self) {
        self.set_content(String::new());
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of line `idx` including its line break, if any.
    pub fn line_text(&self, idx: usize) -> Option<String> {
        self.rope.get_line(idx).map(|l| l.to_string())
    }

    /// Char index where line `idx` starts; the buffer end past the last line.
    pub fn line_to_char(&self, idx: usize) -> usize {
        self.rope.line_to_char(idx.min(self.rope.len_lines()))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Zero-based (line, char column) of the cursor.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let line = self.rope.char_to_line(self.cursor);
        (line, self.cursor - self.rope.line_to_char(line))
    }

    // Selection

    pub fn selection(&self) -> Option<Range<usize>> {
        match self.anchor {
            Some(anchor) if anchor != self.cursor => {
                Some(anchor.min(self.cursor)..anchor.max(self.cursor))
            }
            _ => None,
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection().is_some()
    }

    pub fn select(&mut self, range: Range<usize>) {
        let len = self.rope.len_chars();
        self.anchor = Some(range.start.min(len));
        self.cursor = range.end.min(len);
        self.goal_col = None;
    }

    pub fn select_all(&mut self) {
        self.select(0..self.rope.len_chars());
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selection()
            .map(|range| self.rope.slice(range).to_string())
    }

    // Editing primitives

    /// Insert `text` at char index `at`, leaving the cursor after it.
    pub fn insert(&mut self, at: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let at = at.min(self.rope.len_chars());
        self.rope.insert(at, text);
        self.cursor = at + text.chars().count();
        self.anchor = None;
        self.goal_col = None;
        self.modified = true;
        self.save_state();
    }

    /// Remove `range` and return the removed text. The cursor lands at the
    /// start of the range.
    pub fn delete_range(&mut self, range: Range<usize>) -> String {
        let len = self.rope.len_chars();
        let range = range.start.min(len)..range.end.min(len);
        if range.is_empty() {
            return String::new();
        }
        let removed = self.rope.slice(range.clone()).to_string();
        self.rope.remove(range.clone());
        self.cursor = range.start;
        self.anchor = None;
        self.goal_col = None;
        self.modified = true;
        self.save_state();
        removed
    }

    pub fn delete_selection(&mut self) -> Option<String> {
        let range = self.selection()?;
        Some(self.delete_range(range))
    }

    /// Type `text` at the cursor, replacing the selection if there is one.
    pub fn insert_str(&mut self, text: &str) {
        self.replace_selection(text);
    }

    pub fn insert_char(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        self.replace_selection(c.encode_utf8(&mut tmp));
    }

    pub fn insert_newline(&mut self) {
        self.replace_selection("\n");
    }

    pub fn insert_tab(&mut self, tab_size: usize, use_spaces: bool) {
        if use_spaces {
            let (_, col) = self.cursor_line_col();
            let n = tab_size.max(1) - (col % tab_size.max(1));
            self.replace_selection(&" ".repeat(n));
        } else {
            self.replace_selection("\t");
        }
    }

    /// Delete the selection, then insert `text` at the cursor. Recorded as a
    /// single undo step.
    pub fn paste(&mut self, text: &str) {
        self.replace_selection(text);
    }

    fn replace_selection(&mut self, text: &str) {
        let at = match self.selection() {
            Some(range) => {
                self.rope.remove(range.clone());
                self.modified = true;
                range.start
            }
            None => self.cursor,
        };
        self.cursor = at;
        self.anchor = None;
        if text.is_empty() {
            self.save_state();
            return;
        }
        self.insert(at, text);
    }

    pub fn delete_char_backward(&mut self) {
        if self.delete_selection().is_some() {
            return;
        }
        if self.cursor > 0 {
            let start = self.prev_boundary(self.cursor);
            self.delete_range(start..self.cursor);
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.delete_selection().is_some() {
            return;
        }
        if self.cursor < self.rope.len_chars() {
            let end = self.next_boundary(self.cursor);
            self.delete_range(self.cursor..end);
        }
    }

    // Movement. `extend` grows the selection instead of clearing it.

    pub fn move_left(&mut self, extend: bool) {
        let target = self.prev_boundary(self.cursor);
        self.move_to(target, extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        let target = self.next_boundary(self.cursor);
        self.move_to(target, extend);
    }

    pub fn move_up(&mut self, extend: bool) {
        self.move_lines(-1, extend);
    }

    pub fn move_down(&mut self, extend: bool) {
        self.move_lines(1, extend);
    }

    pub fn page_up(&mut self, rows: usize, extend: bool) {
        self.move_lines(-(rows.max(1) as isize), extend);
    }

    pub fn page_down(&mut self, rows: usize, extend: bool) {
        self.move_lines(rows.max(1) as isize, extend);
    }

    pub fn move_to_line_start(&mut self, extend: bool) {
        let (line, _) = self.cursor_line_col();
        let target = self.rope.line_to_char(line);
        self.move_to(target, extend);
    }

    pub fn move_to_line_end(&mut self, extend: bool) {
        let (line, _) = self.cursor_line_col();
        let target = self.rope.line_to_char(line) + self.line_len(line);
        self.move_to(target, extend);
    }

    pub fn move_to_start(&mut self, extend: bool) {
        self.move_to(0, extend);
    }

    pub fn move_to_end(&mut self, extend: bool) {
        self.move_to(self.rope.len_chars(), extend);
    }

    fn move_to(&mut self, target: usize, extend: bool) {
        self.update_anchor(extend);
        self.cursor = target.min(self.rope.len_chars());
        self.goal_col = None;
    }

    fn move_lines(&mut self, delta: isize, extend: bool) {
        let (line, col) = self.cursor_line_col();
        let goal = self.goal_col.unwrap_or(col);
        let last = self.rope.len_lines().saturating_sub(1);
        let target_line = if delta < 0 {
            line.saturating_sub(delta.unsigned_abs())
        } else {
            (line + delta as usize).min(last)
        };

        self.update_anchor(extend);
        if target_line == line {
            // Top or bottom edge: snap to the document boundary.
            self.cursor = if delta < 0 { 0 } else { self.rope.len_chars() };
        } else {
            self.cursor =
                self.rope.line_to_char(target_line) + goal.min(self.line_len(target_line));
        }
        self.goal_col = Some(goal);
    }

    fn update_anchor(&mut self, extend: bool) {
        if extend {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
        }
    }

    /// Length of line `idx` in chars, excluding its line break.
    fn line_len(&self, idx: usize) -> usize {
        let Some(line) = self.rope.get_line(idx) else {
            return 0;
        };
        let mut len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && line.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    fn next_boundary(&self, idx: usize) -> usize {
        if idx >= self.rope.len_chars() {
            return self.rope.len_chars();
        }
        let line = self.rope.char_to_line(idx);
        let start = self.rope.line_to_char(line);
        let offset = idx - start;
        let text = self.rope.line(line).to_string();

        let mut seen = 0;
        for g in text.graphemes(true) {
            let n = g.chars().count();
            if seen + n > offset {
                return start + seen + n;
            }
            seen += n;
        }
        idx + 1
    }

    fn prev_boundary(&self, idx: usize) -> usize {
        if idx == 0 {
            return 0;
        }
        let idx = idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(idx - 1);
        let start = self.rope.line_to_char(line);
        let offset = idx - start;
        let text = self.rope.line(line).to_string();

        let mut seen = 0;
        for g in text.graphemes(true) {
            let n = g.chars().count();
            if seen + n >= offset {
                return start + seen;
            }
            seen += n;
        }
        idx - 1
    }

    // History

    fn save_state(&mut self) {
        let content = self.rope.to_string();

        if let Some(last) = self.history.get(self.history_index) {
            if last.content == content {
                return;
            }
        }

        self.history.truncate(self.history_index + 1);
        self.history.push(EditorState {
            content,
            cursor: self.cursor,
        });
        self.history_index += 1;

        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
            self.history_index -= 1;
        }
    }

    pub fn undo(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        self.history_index -= 1;
        self.restore_state();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.history_index + 1 >= self.history.len() {
            return false;
        }
        self.history_index += 1;
        self.restore_state();
        true
    }

    fn restore_state(&mut self) {
        let state = &self.history[self.history_index];
        self.rope = Rope::from_str(&state.content);
        self.cursor = state.cursor.min(self.rope.len_chars());
        self.anchor = None;
        self.goal_col = None;
        self.modified = true;
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}
