// Public modules
pub mod catalog;
pub mod chat;
pub mod client;
pub mod error;
pub mod markdown;
pub mod render;
pub mod service;
pub mod types;

mod observability;
mod sse;

// Re-exports
pub use client::Gemini;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use service::{ChunkStream, StreamHandle, TextGeneration, TutorService};
pub use types::*;
