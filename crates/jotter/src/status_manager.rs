use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

impl MessageType {
    fn lifetime(&self) -> Duration {
        match self {
            MessageType::Info => Duration::from_secs(3),
            MessageType::Success => Duration::from_secs(2),
            MessageType::Warning => Duration::from_secs(5),
            MessageType::Error => Duration::from_secs(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub content: String,
    pub message_type: MessageType,
    created_at: Instant,
    lifetime: Duration,
}

impl StatusMessage {
    pub fn new(content: impl Into<String>, message_type: MessageType) -> Self {
        Self::with_duration(content, message_type, message_type.lifetime())
    }

    pub fn with_duration(
        content: impl Into<String>,
        message_type: MessageType,
        lifetime: Duration,
    ) -> Self {
        Self {
            content: content.into(),
            message_type,
            created_at: Instant::now(),
            lifetime,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.lifetime
    }
}

/// The transient message shown in the status line.
#[derive(Debug, Clone, Default)]
pub struct StatusManager {
    current: Option<StatusMessage>,
}

impl StatusManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, message: StatusMessage) {
        self.current = Some(message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.set(StatusMessage::new(message, MessageType::Info));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.set(StatusMessage::new(message, MessageType::Success));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.set(StatusMessage::new(message, MessageType::Warning));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.set(StatusMessage::new(message, MessageType::Error));
    }

    /// Drop the message once its lifetime has passed.
    pub fn update(&mut self) {
        if self.current.as_ref().is_some_and(StatusMessage::is_expired) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }
}
