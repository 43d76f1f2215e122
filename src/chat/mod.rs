//! Tutoring session built on top of the text-generation service.
//!
//! This module provides the session controller behind the interactive
//! tutor. It supports:
//!
//! - Streaming replies applied fragment by fragment
//! - Interrupting and resetting a session mid-stream
//! - Slash commands for session control
//! - HTML export of the transcript
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the transcript and the exchange state machine
//! - [`commands`]: Slash command parsing
//! - [`export`]: standalone HTML transcripts

mod commands;
mod config;
mod export;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use export::{transcript_html, write_transcript_html};
pub use session::{
    Exchange, ExchangeState, LearningPhase, Outcome, STREAM_ERROR_MESSAGE, Session, SessionStats,
    Settled, StreamId,
};
