use crate::status_manager::StatusManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Editing,
    /// The open/save picker has focus.
    Picker,
    /// A modal notice waits to be dismissed.
    Notice,
    /// A yes/no question blocks the picker behind it.
    Confirm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

/// First visible line and display column of the text area, plus the size
/// it had on the last draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub top_line: usize,
    pub left_col: usize,
    pub height: usize,
    pub width: usize,
}

impl Viewport {
    /// Scroll just enough for (`line`, `col`) to be on screen.
    pub fn follow(&mut self, line: usize, col: usize) {
        if self.height > 0 {
            if line < self.top_line {
                self.top_line = line;
            } else if line >= self.top_line + self.height {
                self.top_line = line + 1 - self.height;
            }
        }
        if self.width > 0 {
            if col < self.left_col {
                self.left_col = col;
            } else if col >= self.left_col + self.width {
                self.left_col = col + 1 - self.width;
            }
        }
    }

    pub fn page(&self) -> usize {
        self.height.saturating_sub(1).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct UIState {
    pub mode: Mode,
    pub status: StatusManager,
    pub notice: Option<Notice>,
    pub viewport: Viewport,
    should_quit: bool,
}

impl UIState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Editing,
            status: StatusManager::new(),
            notice: None,
            viewport: Viewport::default(),
            should_quit: false,
        }
    }

    pub fn mode_label(&self) -> &'static str {
        match self.mode {
            Mode::Editing => "EDIT",
            Mode::Picker => "FILE",
            Mode::Notice => "NOTICE",
            Mode::Confirm => "CONFIRM",
        }
    }

    pub fn show_notice(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.notice = Some(Notice {
            title: title.into(),
            body: body.into(),
        });
        self.mode = Mode::Notice;
    }

    /// Like [`show_notice`](Self::show_notice), but the popup asks a
    /// yes/no question.
    pub fn ask(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.show_notice(title, body);
        self.mode = Mode::Confirm;
    }

    pub fn dismiss_notice(&mut self) {
        self.close_notice(Mode::Editing);
    }

    /// Drop the popup and hand focus to `next`.
    pub fn close_notice(&mut self, next: Mode) {
        self.notice = None;
        self.mode = next;
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

impl Default for UIState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_round_trip() {
        let mut state = UIState::new();
        assert_eq!(state.mode, Mode::Editing);

        state.show_notice("Print", "Nothing was sent to a printer.");
        assert_eq!(state.mode, Mode::Notice);
        assert_eq!(state.notice.as_ref().unwrap().title, "Print");

        state.dismiss_notice();
        assert_eq!(state.mode, Mode::Editing);
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_question_returns_to_requested_mode() {
        let mut state = UIState::new();
        state.mode = Mode::Picker;

        state.ask("Confirm Save As", "memo.txt already exists. Replace it?");
        assert_eq!(state.mode, Mode::Confirm);
        assert_eq!(state.mode_label(), "CONFIRM");

        state.close_notice(Mode::Picker);
        assert_eq!(state.mode, Mode::Picker);
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_quit_flag() {
        let mut state = UIState::new();
        assert!(!state.should_quit());
        state.quit();
        assert!(state.should_quit());
    }

    #[test]
    fn test_viewport_follows_cursor_down_and_back() {
        let mut viewport = Viewport {
            height: 10,
            width: 20,
            ..Viewport::default()
        };

        viewport.follow(25, 0);
        assert_eq!(viewport.top_line, 16);

        viewport.follow(3, 0);
        assert_eq!(viewport.top_line, 3);
    }

    #[test]
    fn test_viewport_follows_horizontally() {
        let mut viewport = Viewport {
            height: 10,
            width: 20,
            ..Viewport::default()
        };

        viewport.follow(0, 45);
        assert_eq!(viewport.left_col, 26);
        viewport.follow(0, 30);
        assert_eq!(viewport.left_col, 26);
        viewport.follow(0, 2);
        assert_eq!(viewport.left_col, 2);
    }

    #[test]
    fn test_unsized_viewport_does_not_scroll() {
        let mut viewport = Viewport::default();
        viewport.follow(100, 100);
        assert_eq!(viewport, Viewport::default());
        assert_eq!(viewport.page(), 1);
    }
}
