use crate::error::ClipboardError;

pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Source and sink for copy/paste text.
pub trait Clipboard {
    fn get_text(&mut self) -> Result<String>;
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. The handle is opened lazily and reopened after a
/// failure, since display servers can come and go under a terminal.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    fn handle(&mut self) -> Result<&mut arboard::Clipboard> {
        if self.inner.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ClipboardError::Unavailable("no clipboard handle".to_string()))
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Result<String> {
        let result = self.handle()?.get_text();
        match result {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Err(ClipboardError::Empty),
            Err(e) => {
                self.inner = None;
                Err(ClipboardError::Unavailable(e.to_string()))
            }
        }
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        let result = self.handle()?.set_text(text.to_owned());
        result.map_err(|e| {
            self.inner = None;
            ClipboardError::Unavailable(e.to_string())
        })
    }
}

/// Process-local clipboard, used when no desktop clipboard is reachable
/// and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Result<String> {
        self.text.clone().ok_or(ClipboardError::Empty)
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.text = Some(text.to_string());
        Ok(())
    }
}

/// Desktop clipboard with a local fallback so copy/paste keeps working in a
/// bare console.
#[derive(Default)]
pub struct FallbackClipboard {
    system: SystemClipboard,
    local: MemoryClipboard,
}

impl FallbackClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for FallbackClipboard {
    fn get_text(&mut self) -> Result<String> {
        match self.system.get_text() {
            Ok(text) => Ok(text),
            Err(ClipboardError::Unavailable(reason)) => {
                log::debug!("System clipboard unavailable ({}), using local copy", reason);
                self.local.get_text()
            }
            Err(e) => Err(e),
        }
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.local.set_text(text)?;
        if let Err(e) = self.system.set_text(text) {
            log::debug!("System clipboard write failed: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard_round_trip() {
        let mut clipboard = MemoryClipboard::default();
        assert!(matches!(clipboard.get_text(), Err(ClipboardError::Empty)));

        clipboard.set_text("Hi").unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "Hi");
    }

    #[test]
    fn test_with_text_preloads() {
        let mut clipboard = MemoryClipboard::with_text("preloaded");
        assert_eq!(clipboard.get_text().unwrap(), "preloaded");
    }
}
