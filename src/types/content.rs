use serde::{Deserialize, Serialize};

/// One turn of conversation as the hosted API sees it.
///
/// The API is stateless, so the full history is replayed as a list of
/// `Content` values on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    /// `"user"` or `"model"`. Omitted for system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// The parts making up this turn.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Creates a user turn holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// Creates a model turn holding a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Some("model".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// Creates a role-less content block, as used for system instructions.
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenates the text of every answer part, skipping reasoning parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .collect()
    }
}

/// A piece of a content turn. Only text parts are used by the tutor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    /// The text of this part, if it is a text part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Set on parts carrying model reasoning rather than answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            thought: None,
        }
    }
}
