// Jotter library exports

pub mod app;
pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod file_picker;
pub mod keymap;
pub mod session;
pub mod session_store;
pub mod status_manager;
pub mod text_width;
pub mod ui;
pub mod ui_state;
pub mod zoom;

pub use app::App;
pub use buffer::TextBuffer;
pub use config::Config;
pub use error::{ClipboardError, FileError, SessionError};
pub use file_manager::{FileController, SaveOutcome};
pub use keymap::{Action, Keymap, Platform};
pub use session::{EditorSession, ExitReport};
pub use session_store::{SessionConfig, SessionPaths, SessionStore};
pub use ui_state::{Mode, UIState};
pub use zoom::FontZoom;
