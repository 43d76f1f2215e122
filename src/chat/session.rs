//! Core chat session management.
//!
//! This module provides the [`Session`] struct which owns the transcript and
//! at most one in-flight streamed reply.
//!
//! Every exchange moves through `Idle -> UserSubmitted -> Streaming ->
//! Settled`. Fragments are applied by identity: each stream gets a fresh
//! [`StreamId`] and only the stream that is currently active may touch its
//! placeholder, so fragments that arrive after a reset are discarded.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::catalog::CloudFocus;
use crate::chat::export::write_transcript_html;
use crate::error::{Error, Result};
use crate::markdown::{self, Document};
use crate::observability::{
    SESSION_EXCHANGE_ERRORS, SESSION_EXCHANGES, SESSION_INTERRUPTS, SESSION_REJECTED_SENDS,
    SESSION_RESETS, SESSION_STALE_CHUNKS, SESSION_START_ERRORS, SESSION_STARTS, STREAM_CHUNKS,
    STREAM_DURATION,
};
use crate::render::Renderer;
use crate::service::{StreamHandle, TextGeneration};
use crate::types::{Message, MessageId, MessageStatus, Role};

/// The text a failed reply is replaced with.
pub const STREAM_ERROR_MESSAGE: &str = "Error encountered. Verify connection or API key.";

const INTERRUPT_POLL: Duration = Duration::from_millis(50);

/// Identity of one streamed reply. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// How an exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every fragment arrived.
    Success,
    /// Opening or reading the stream failed.
    Error,
    /// The student stopped the reply; partial text is kept.
    Interrupted,
}

/// Where the current exchange is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing has been sent since the last reset.
    Idle,
    /// The student message is in the transcript; the stream is opening.
    UserSubmitted,
    /// Fragments are arriving.
    Streaming,
    /// The last exchange is over.
    Settled(Outcome),
}

/// Where the student is in the tutoring flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningPhase {
    /// The greeting and assessment questions.
    Onboarding,
    /// Answering the assessment.
    Discovery,
    /// A learning path has come up.
    PathSelected,
    /// Working through content.
    Learning,
}

impl fmt::Display for LearningPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LearningPhase::Onboarding => "Onboarding",
            LearningPhase::Discovery => "Discovery",
            LearningPhase::PathSelected => "Path Selected",
            LearningPhase::Learning => "Learning",
        };
        f.write_str(name)
    }
}

/// An opened exchange: the caller pumps `handle` into
/// [`Session::apply_chunk`] and then calls [`Session::finish`].
#[derive(Debug)]
pub struct Exchange {
    /// The stream this exchange is bound to.
    pub stream: StreamId,
    /// The model placeholder receiving fragments.
    pub message: MessageId,
    /// The fragments.
    pub handle: StreamHandle,
}

/// The result of settling an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    /// The placeholder that was settled.
    pub message: MessageId,
    /// How it ended.
    pub outcome: Outcome,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// Messages currently in the transcript.
    pub message_count: usize,
    /// Student messages currently in the transcript.
    pub user_messages: usize,
    /// Tutor messages currently in the transcript.
    pub model_messages: usize,
    /// Exchanges opened over the session's lifetime.
    pub exchanges: u64,
    /// Exchanges that ended in an error.
    pub failed_exchanges: u64,
    /// Exchanges the student interrupted.
    pub interrupted_exchanges: u64,
    /// Fragments discarded because their stream was no longer active.
    pub stale_chunks: u64,
    /// The selected cloud focus.
    pub cloud_focus: CloudFocus,
    /// The current learning phase.
    pub phase: LearningPhase,
    /// True once the greeting has been received.
    pub started: bool,
}

struct ActiveStream {
    id: StreamId,
    message: MessageId,
    canceller: CancellationToken,
    started_at: Instant,
}

#[derive(Default)]
struct Counters {
    exchanges: u64,
    failed: u64,
    interrupted: u64,
    stale_chunks: u64,
}

enum Step {
    Chunk(Option<Result<String>>),
    Tick,
}

/// A tutoring session: the transcript plus at most one active stream.
pub struct Session<S: TextGeneration> {
    service: S,
    messages: Vec<Message>,
    next_message_id: u64,
    next_stream_id: u64,
    active: Option<ActiveStream>,
    state: ExchangeState,
    started: bool,
    cloud_focus: CloudFocus,
    counters: Counters,
}

impl<S: TextGeneration> Session<S> {
    /// Creates an empty, not yet started session.
    pub fn new(service: S) -> Self {
        Self {
            service,
            messages: Vec::new(),
            next_message_id: 1,
            next_stream_id: 1,
            active: None,
            state: ExchangeState::Idle,
            started: false,
            cloud_focus: CloudFocus::default(),
            counters: Counters::default(),
        }
    }

    /// Sets the cloud focus used for new prompts.
    pub fn with_cloud_focus(mut self, focus: CloudFocus) -> Self {
        self.cloud_focus = focus;
        self
    }

    /// The text-generation service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Starts a new conversation and appends the tutor's greeting.
    ///
    /// Any previous transcript is cleared first. On failure the session is
    /// left not started with an empty transcript.
    pub async fn start(&mut self) -> Result<MessageId> {
        self.clear();
        SESSION_STARTS.click();
        match self.service.start().await {
            Ok(greeting) => {
                let id = self.push(Role::Model, greeting, MessageStatus::Complete);
                self.started = true;
                tracing::info!(message = %id, "session started");
                Ok(id)
            }
            Err(err) => {
                SESSION_START_ERRORS.click();
                tracing::error!(error = %err, "failed to start session");
                Err(err)
            }
        }
    }

    /// Starts a new conversation, displays the greeting, then sends `prompt`.
    ///
    /// The greeting cannot be interrupted, so an interrupt requested while it
    /// was pending is cleared before `prompt` is sent.
    pub async fn start_with(
        &mut self,
        prompt: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<Settled>> {
        let greeting = self.start().await?;
        if let Some(message) = self.message(greeting) {
            renderer.print_message(message);
        }
        renderer.clear_interrupt();
        self.send(prompt, renderer).await
    }

    /// Opens an exchange for `text`.
    ///
    /// Returns `Ok(None)` without touching the transcript when `text` is
    /// blank or a stream is already active. Otherwise the student message and
    /// an empty model placeholder are appended and the stream is opened. If
    /// opening fails the placeholder settles as an error and the error is
    /// returned.
    pub async fn begin_send(&mut self, text: &str) -> Result<Option<Exchange>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if let Some(active) = &self.active {
            SESSION_REJECTED_SENDS.click();
            tracing::debug!(stream = %active.id, "send ignored while streaming");
            return Ok(None);
        }

        self.push(Role::User, text, MessageStatus::Complete);
        self.state = ExchangeState::UserSubmitted;
        let placeholder = self.push(Role::Model, "", MessageStatus::Streaming);
        let stream = StreamId(self.next_stream_id);
        self.next_stream_id += 1;
        let canceller = CancellationToken::new();
        self.active = Some(ActiveStream {
            id: stream,
            message: placeholder,
            canceller: canceller.clone(),
            started_at: Instant::now(),
        });
        self.counters.exchanges += 1;
        SESSION_EXCHANGES.click();

        let prompt = self.cloud_focus.apply(text);
        match self.service.send_stream(&prompt).await {
            Ok(chunks) => {
                self.state = ExchangeState::Streaming;
                Ok(Some(Exchange {
                    stream,
                    message: placeholder,
                    handle: StreamHandle::with_canceller(chunks, canceller),
                }))
            }
            Err(err) => {
                self.finish(stream, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Appends `fragment` to the placeholder of `stream`.
    ///
    /// Returns false, changing nothing, when `stream` is not the active stream
    /// or its placeholder is gone.
    pub fn apply_chunk(&mut self, stream: StreamId, fragment: &str) -> bool {
        let target = match &self.active {
            Some(active) if active.id == stream => active.message,
            _ => {
                self.discard_stale(stream);
                return false;
            }
        };
        match self.message_mut(target) {
            Some(message) => {
                message.append(fragment);
                STREAM_CHUNKS.click();
                true
            }
            None => {
                self.discard_stale(stream);
                false
            }
        }
    }

    /// Settles the exchange of `stream` as a success or an error.
    ///
    /// On error the placeholder's text is replaced with
    /// [`STREAM_ERROR_MESSAGE`]. Returns `None` for a stream that is not
    /// active.
    pub fn finish(&mut self, stream: StreamId, result: Result<()>) -> Option<Settled> {
        let outcome = match result {
            Ok(()) => Outcome::Success,
            Err(err) => {
                tracing::warn!(%stream, error = %err, "stream failed");
                Outcome::Error
            }
        };
        self.settle(stream, outcome)
    }

    /// Settles the exchange of `stream` as interrupted, keeping partial text.
    pub fn interrupt(&mut self, stream: StreamId) -> Option<Settled> {
        self.settle(stream, Outcome::Interrupted)
    }

    /// Sends `text` and drives the reply to completion through `renderer`.
    ///
    /// The accumulated text is re-parsed and handed to the renderer after
    /// every fragment. The renderer's interrupt flag is polled while waiting.
    /// Returns `Ok(None)` when the send was ignored, and the stream error
    /// after settling when the reply failed.
    pub async fn send(
        &mut self,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<Option<Settled>> {
        let opened = self.begin_send(text).await;
        if !matches!(opened, Ok(None))
            && let Some(user) = self.last_with_role(Role::User)
        {
            renderer.print_user(user);
        }
        let exchange = match opened {
            Ok(Some(exchange)) => exchange,
            Ok(None) => return Ok(None),
            Err(err) => {
                if let Some(placeholder) = self.last_with_role(Role::Model) {
                    renderer.finish_response(placeholder);
                }
                return Err(err);
            }
        };
        let Exchange {
            stream,
            message,
            mut handle,
        } = exchange;
        if let Some(placeholder) = self.message(message) {
            renderer.start_response(placeholder);
        }

        let mut ticker = tokio::time::interval(INTERRUPT_POLL);
        let mut failure: Option<Error> = None;
        let mut interrupted = false;
        loop {
            let step = tokio::select! {
                next = handle.next() => Step::Chunk(next),
                _ = ticker.tick() => Step::Tick,
            };
            if renderer.should_interrupt() {
                handle.cancel();
                interrupted = true;
                break;
            }
            match step {
                Step::Tick => {}
                Step::Chunk(None) => break,
                Step::Chunk(Some(Ok(fragment))) => {
                    if !self.apply_chunk(stream, &fragment) {
                        break;
                    }
                    if let Some(placeholder) = self.message(message) {
                        let document = Document::parse(placeholder.text());
                        renderer.update_response(placeholder, &document);
                    }
                }
                Step::Chunk(Some(Err(err))) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        let settled = if interrupted {
            self.interrupt(stream)
        } else {
            self.finish(stream, failure.clone().map_or(Ok(()), Err))
        };
        if let Some(placeholder) = self.message(message) {
            renderer.finish_response(placeholder);
        }
        if interrupted {
            renderer.print_interrupted();
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(settled),
        }
    }

    /// Clears the transcript and all transient state.
    ///
    /// Safe at any time. An active stream is cancelled and any fragment that
    /// still arrives for it is rejected.
    pub fn reset(&mut self) {
        if let Some(active) = &self.active {
            tracing::info!(stream = %active.id, "reset cancelled active stream");
        }
        self.clear();
        SESSION_RESETS.click();
    }

    /// The transcript, oldest first.
    pub fn transcript(&self) -> &[Message] {
        &self.messages
    }

    /// Looks up a transcript entry.
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id() == id)
    }

    /// True while a reply is streaming.
    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// True once a greeting has been received and until the next reset.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// The state of the current exchange.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// The selected cloud focus.
    pub fn cloud_focus(&self) -> CloudFocus {
        self.cloud_focus
    }

    /// Selects the cloud focus for subsequent prompts.
    pub fn set_cloud_focus(&mut self, focus: CloudFocus) {
        self.cloud_focus = focus;
    }

    /// Estimates the learning phase from the transcript.
    pub fn learning_phase(&self) -> LearningPhase {
        match self.messages.len() {
            0 | 1 => LearningPhase::Onboarding,
            2..=4 => LearningPhase::Discovery,
            _ if self
                .messages
                .iter()
                .any(|message| message.text().to_lowercase().contains("path")) =>
            {
                LearningPhase::PathSelected
            }
            _ => LearningPhase::Learning,
        }
    }

    /// The learning paths offered by the latest tutor message.
    ///
    /// Empty while a reply is streaming.
    pub fn path_options(&self) -> Vec<String> {
        if self.is_streaming() {
            return Vec::new();
        }
        self.last_with_role(Role::Model)
            .map(|message| markdown::path_options(message.text()))
            .unwrap_or_default()
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        let count = |role| {
            self.messages
                .iter()
                .filter(|message| message.role() == role)
                .count()
        };
        SessionStats {
            message_count: self.messages.len(),
            user_messages: count(Role::User),
            model_messages: count(Role::Model),
            exchanges: self.counters.exchanges,
            failed_exchanges: self.counters.failed,
            interrupted_exchanges: self.counters.interrupted,
            stale_chunks: self.counters.stale_chunks,
            cloud_focus: self.cloud_focus,
            phase: self.learning_phase(),
            started: self.started,
        }
    }

    /// Writes the transcript to `path` as a standalone HTML page.
    pub fn save_html_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .map_err(|err| Error::io("failed to create transcript file", err))?;
        let writer = BufWriter::new(file);
        write_transcript_html(&self.messages, writer)
    }

    fn clear(&mut self) {
        if let Some(active) = self.active.take() {
            active.canceller.cancel();
        }
        self.messages.clear();
        self.started = false;
        self.state = ExchangeState::Idle;
    }

    fn push(&mut self, role: Role, text: impl Into<String>, status: MessageStatus) -> MessageId {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        self.messages.push(Message::new(id, role, text, status));
        id
    }

    fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| message.id() == id)
    }

    fn last_with_role(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|message| message.role() == role)
    }

    fn discard_stale(&mut self, stream: StreamId) {
        self.counters.stale_chunks += 1;
        SESSION_STALE_CHUNKS.click();
        tracing::debug!(%stream, "discarding fragment for inactive stream");
    }

    fn settle(&mut self, stream: StreamId, outcome: Outcome) -> Option<Settled> {
        let active = match self.active.take() {
            Some(active) if active.id == stream => active,
            other => {
                self.active = other;
                tracing::debug!(%stream, "ignoring settle for inactive stream");
                return None;
            }
        };
        active.canceller.cancel();
        STREAM_DURATION.add(active.started_at.elapsed().as_secs_f64());

        if let Some(message) = self.message_mut(active.message) {
            match outcome {
                Outcome::Success => message.settle(MessageStatus::Complete),
                Outcome::Error => {
                    message.replace_text(STREAM_ERROR_MESSAGE);
                    message.settle(MessageStatus::Failed);
                }
                Outcome::Interrupted => message.settle(MessageStatus::Interrupted),
            }
        }
        match outcome {
            Outcome::Success => {}
            Outcome::Error => {
                self.counters.failed += 1;
                SESSION_EXCHANGE_ERRORS.click();
            }
            Outcome::Interrupted => {
                self.counters.interrupted += 1;
                SESSION_INTERRUPTS.click();
            }
        }
        self.state = ExchangeState::Settled(outcome);
        Some(Settled {
            message: active.message,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ChunkStream;
    use futures::stream;

    struct Canned {
        greeting: Result<String>,
        reply: Vec<&'static str>,
    }

    #[async_trait::async_trait]
    impl TextGeneration for Canned {
        async fn start(&self) -> Result<String> {
            self.greeting.clone()
        }

        async fn send_stream(&self, _: &str) -> Result<ChunkStream> {
            let parts: Vec<Result<String>> = self.reply.iter().map(|p| Ok(p.to_string())).collect();
            Ok(Box::pin(stream::iter(parts)))
        }
    }

    fn session(reply: Vec<&'static str>) -> Session<Canned> {
        Session::new(Canned {
            greeting: Ok("Welcome!".to_string()),
            reply,
        })
    }

    #[tokio::test]
    async fn start_appends_greeting() {
        let mut session = session(vec![]);
        let id = session.start().await.unwrap();
        assert!(session.is_started());
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.message(id).unwrap().text(), "Welcome!");
        assert_eq!(session.message(id).unwrap().role(), Role::Model);
    }

    #[tokio::test]
    async fn start_failure_leaves_nothing() {
        let mut session = Session::new(Canned {
            greeting: Err(Error::authentication("no key")),
            reply: vec![],
        });
        assert!(session.start().await.is_err());
        assert!(!session.is_started());
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn blank_send_is_ignored() {
        let mut session = session(vec!["x"]);
        assert!(session.begin_send("   \n").await.unwrap().is_none());
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), ExchangeState::Idle);
    }

    #[tokio::test]
    async fn fragments_accumulate_by_identity() {
        let mut session = session(vec!["Hel", "lo wor", "ld"]);
        let mut exchange = session.begin_send("hi").await.unwrap().unwrap();
        assert_eq!(session.state(), ExchangeState::Streaming);
        while let Some(chunk) = exchange.handle.next().await {
            assert!(session.apply_chunk(exchange.stream, &chunk.unwrap()));
        }
        let settled = session.finish(exchange.stream, Ok(())).unwrap();
        assert_eq!(settled.outcome, Outcome::Success);
        let message = session.message(exchange.message).unwrap();
        assert_eq!(message.text(), "Hello world");
        assert_eq!(message.status(), MessageStatus::Complete);
        assert_eq!(session.state(), ExchangeState::Settled(Outcome::Success));
    }

    #[tokio::test]
    async fn second_send_while_streaming_is_rejected() {
        let mut session = session(vec!["a"]);
        let _exchange = session.begin_send("first").await.unwrap().unwrap();
        assert!(session.begin_send("second").await.unwrap().is_none());
        assert_eq!(session.transcript().len(), 2);
    }

    #[tokio::test]
    async fn reset_rejects_late_fragments() {
        let mut session = session(vec!["a"]);
        let exchange = session.begin_send("hi").await.unwrap().unwrap();
        session.reset();
        assert!(exchange.handle.is_cancelled());
        assert!(!session.apply_chunk(exchange.stream, "late"));
        assert!(session.finish(exchange.stream, Ok(())).is_none());
        assert!(session.transcript().is_empty());
        assert_eq!(session.stats().stale_chunks, 1);
        assert_eq!(session.state(), ExchangeState::Idle);
    }

    #[tokio::test]
    async fn failure_replaces_partial_text() {
        let mut session = session(vec![]);
        let exchange = session.begin_send("hi").await.unwrap().unwrap();
        assert!(session.apply_chunk(exchange.stream, "partial"));
        let settled = session
            .finish(exchange.stream, Err(Error::streaming("reset by peer", None)))
            .unwrap();
        assert_eq!(settled.outcome, Outcome::Error);
        let message = session.message(exchange.message).unwrap();
        assert_eq!(message.text(), STREAM_ERROR_MESSAGE);
        assert_eq!(message.status(), MessageStatus::Failed);
        assert!(!session.is_streaming());
    }

    #[tokio::test]
    async fn interrupt_keeps_partial_text() {
        let mut session = session(vec![]);
        let exchange = session.begin_send("hi").await.unwrap().unwrap();
        session.apply_chunk(exchange.stream, "partial");
        session.interrupt(exchange.stream).unwrap();
        let message = session.message(exchange.message).unwrap();
        assert_eq!(message.text(), "partial");
        assert_eq!(message.status(), MessageStatus::Interrupted);
        assert!(exchange.handle.is_cancelled());
    }

    #[tokio::test]
    async fn cloud_focus_is_kept_in_stats() {
        let mut session = session(vec![]).with_cloud_focus(CloudFocus::Azure);
        assert_eq!(session.cloud_focus(), CloudFocus::Azure);
        session.set_cloud_focus(CloudFocus::Gcp);
        assert_eq!(session.stats().cloud_focus, CloudFocus::Gcp);
    }

    #[tokio::test]
    async fn learning_phases() {
        let mut session = session(vec!["ok"]);
        assert_eq!(session.learning_phase(), LearningPhase::Onboarding);
        session.start().await.unwrap();
        assert_eq!(session.learning_phase(), LearningPhase::Onboarding);
        session.push(Role::User, "I know AWS", MessageStatus::Complete);
        session.push(Role::Model, "Great", MessageStatus::Complete);
        assert_eq!(session.learning_phase(), LearningPhase::Discovery);
        session.push(Role::User, "Beginner", MessageStatus::Complete);
        session.push(Role::Model, "Noted", MessageStatus::Complete);
        assert_eq!(session.learning_phase(), LearningPhase::Learning);
        session.push(Role::Model, "**Path A: Serverless**", MessageStatus::Complete);
        assert_eq!(session.learning_phase(), LearningPhase::PathSelected);
        assert_eq!(session.path_options(), vec!["Path A"]);
    }

    #[test]
    fn phase_labels() {
        assert_eq!(LearningPhase::PathSelected.to_string(), "Path Selected");
        assert_eq!(StreamId(3).to_string(), "stream-3");
    }
}
