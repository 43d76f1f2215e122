// Public modules
pub mod content;
pub mod generate_content;
pub mod message;
pub mod model;

// Re-exports
pub use content::{Content, Part};
pub use generate_content::{
    Candidate, GenerateContentRequest, GenerateContentResponse, GenerationConfig, UsageMetadata,
};
pub use message::{Message, MessageId, MessageStatus, Role, capture_local_offset};
pub use model::{DEFAULT_MODEL, Model};
