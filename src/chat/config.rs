//! Configuration types for the tutor application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling session behavior.

use arrrg_derive::CommandLine;

use crate::catalog::{CloudFocus, starter_prompt};
use crate::types::{GenerationConfig, Model};

/// Command-line arguments for the stratus-tutor tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for the session.
    #[arrrg(optional, "Model to use (default: gemini-3-pro-preview)", "MODEL")]
    pub model: Option<String>,

    /// Provider to focus on.
    #[arrrg(optional, "Cloud focus: multi, aws, azure or gcp (default: multi)", "CLOUD")]
    pub cloud: Option<String>,

    /// Opening topic: a starter card number or title, or free text.
    #[arrrg(optional, "Start immediately with a topic (1-4, a card title, or text)", "TOPIC")]
    pub topic: Option<String>,

    /// Sampling temperature, parsed as a float when the config is built.
    #[arrrg(optional, "Sampling temperature (default: model default)", "TEMP")]
    pub temperature: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: model default)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Emit logs as JSON.
    #[arrrg(flag, "Write logs to stderr as JSON lines")]
    pub log_json: bool,
}

/// Configuration for a tutoring session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// The provider prompts are focused on.
    pub cloud_focus: CloudFocus,

    /// Prompt sent right after the greeting, if any.
    pub topic: Option<String>,

    /// Optional sampling temperature.
    pub temperature: Option<f32>,

    /// Optional cap on response tokens.
    pub max_tokens: Option<u32>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether logs are written as JSON.
    pub log_json: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-3-pro-preview
    /// - Cloud focus: Multi
    /// - Sampling: model defaults
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: Model::default(),
            cloud_focus: CloudFocus::default(),
            topic: None,
            temperature: None,
            max_tokens: None,
            use_color: true,
            log_json: false,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the cloud focus.
    pub fn with_cloud_focus(mut self, focus: CloudFocus) -> Self {
        self.cloud_focus = focus;
        self
    }

    /// Sets the opening topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// The sampling overrides for every request.
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_tokens,
            ..GenerationConfig::default()
        }
    }

    /// The prompt to open the session with, resolved by [`starter_prompt`].
    pub fn opening_prompt(&self) -> Option<String> {
        self.topic
            .as_deref()
            .filter(|topic| !topic.trim().is_empty())
            .map(starter_prompt)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let cloud_focus = match args.cloud.as_deref().map(str::parse::<CloudFocus>) {
            Some(Ok(focus)) => focus,
            Some(Err(err)) => {
                tracing::warn!(%err, "falling back to multi-cloud focus");
                CloudFocus::default()
            }
            None => CloudFocus::default(),
        };
        let temperature = match args.temperature.as_deref().map(str::parse::<f32>) {
            Some(Ok(value)) if value.is_finite() && value >= 0.0 => Some(value),
            Some(Ok(value)) => {
                tracing::warn!(value, "ignoring out-of-range temperature");
                None
            }
            Some(Err(err)) => {
                tracing::warn!(%err, "ignoring unparseable temperature");
                None
            }
            None => None,
        };

        ChatConfig {
            model: args.model.map(Model::from).unwrap_or_default(),
            cloud_focus,
            topic: args.topic,
            temperature,
            max_tokens: args.max_tokens,
            use_color: !args.no_color,
            log_json: args.log_json,
        }
    }
}
