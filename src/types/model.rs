use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// A hosted model identifier, e.g. `gemini-3-pro-preview`.
///
/// Any string is accepted; the hosted API rejects unknown names with a
/// not-found error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(String);

impl Model {
    /// Creates a model identifier from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the model name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Model {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim()))
    }
}

impl From<&str> for Model {
    fn from(model: &str) -> Self {
        Self::new(model)
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        Self(model)
    }
}
