use std::fmt;
use std::sync::OnceLock;

use time::{OffsetDateTime, UtcOffset};
use time::macros::format_description;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The student.
    User,
    /// The tutor model.
    Model,
}

impl Role {
    /// The label shown under a message.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Student",
            Role::Model => "CloudStratus Tutor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
        }
    }
}

/// Identity of a transcript entry. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Lifecycle of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    /// Final; will never change again.
    Complete,
    /// The placeholder of the active stream; text is still growing.
    Streaming,
    /// The stream was cancelled; text holds whatever arrived first.
    Interrupted,
    /// The stream failed; text holds the static error notice.
    Failed,
}

/// One turn in the conversation.
///
/// Only the session mutates messages, and only the placeholder of the active
/// stream, so the text is exposed read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: MessageId,
    role: Role,
    text: String,
    timestamp: OffsetDateTime,
    status: MessageStatus,
}

impl Message {
    pub(crate) fn new(
        id: MessageId,
        role: Role,
        text: impl Into<String>,
        status: MessageStatus,
    ) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: now(),
            status,
        }
    }

    /// The identity of this entry.
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Who wrote this entry.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the entry was created.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// The lifecycle state of this entry.
    pub fn status(&self) -> MessageStatus {
        self.status
    }

    /// True while this is the placeholder of an active stream.
    pub fn is_streaming(&self) -> bool {
        self.status == MessageStatus::Streaming
    }

    /// The creation time formatted as `HH:MM`.
    pub fn clock(&self) -> String {
        self.timestamp
            .format(format_description!("[hour]:[minute]"))
            .unwrap_or_default()
    }

    pub(crate) fn append(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    pub(crate) fn settle(&mut self, status: MessageStatus) {
        self.status = status;
    }

    pub(crate) fn replace_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Resolves the local UTC offset used for message timestamps.
///
/// The offset can only be read while the process has a single thread, so
/// call this before starting the async runtime. Timestamps are in UTC until
/// it has been called, and stay in UTC if the offset cannot be determined.
pub fn capture_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

fn now() -> OffsetDateTime {
    let offset = LOCAL_OFFSET.get().copied().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_use_captured_offset() {
        let offset = capture_local_offset();
        assert_eq!(capture_local_offset(), offset);
        let message = Message::new(MessageId(1), Role::User, "hi", MessageStatus::Complete);
        assert_eq!(message.timestamp().offset(), offset);
        assert_eq!(message.clock().len(), 5);
    }

    #[test]
    fn role_labels() {
        assert_eq!(Role::User.label(), "Student");
        assert_eq!(Role::Model.label(), "CloudStratus Tutor");
        assert_eq!(Role::Model.to_string(), "model");
    }

    #[test]
    fn append_accumulates_in_order() {
        let mut message = Message::new(MessageId(7), Role::Model, "", MessageStatus::Streaming);
        message.append("Hel");
        message.append("lo wor");
        message.append("ld");
        assert_eq!(message.text(), "Hello world");
        assert!(message.is_streaming());
        message.settle(MessageStatus::Complete);
        assert_eq!(message.status(), MessageStatus::Complete);
    }

    #[test]
    fn clock_is_hours_and_minutes() {
        let message = Message::new(MessageId(1), Role::User, "hi", MessageStatus::Complete);
        let clock = message.clock();
        assert_eq!(clock.len(), 5);
        assert_eq!(&clock[2..3], ":");
    }
}
