//! The text-generation boundary the session talks to.
//!
//! [`TextGeneration`] is the only capability the session needs: a greeting to
//! open the conversation and a stream of text fragments for every reply.
//! [`TutorService`] implements it over the hosted [`Gemini`] API.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::{Gemini, ResponseStream};
use crate::error::Result;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, Model};

/// The tutor persona sent as the system instruction of every request.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a Cloud Learning & Migration Tutor helping students understand cloud fundamentals, migration strategies, system architectures, and MLOps (Machine Learning Operations) on AWS, GCP, Azure, and other major clouds.
Your goal is to provide clean, structured, UI-friendly explanations and diagrams-in-words, plus simple hands-on examples using open public datasets and services. The context is academic and educational only.

Style & UX Guidelines:
- Use very clear section headings and short paragraphs.
- Prefer bullet points over dense text.
- When describing an architecture (including MLOps pipelines), always provide a simple, labeled "mental diagram in text" (e.g., Raw Data → Feature Store → Training Job → Model Registry → Serving).
- Avoid vendor sales language; keep everything neutral and educational.
- At the end of each major topic, explicitly invite questions like: "What part of this architecture would you like to dive deeper into?" or "Do you want an AWS, GCP, or Azure mapping for these components?"

Scope:
- Cloud platforms: AWS, GCP, Azure, and multi-cloud patterns.
- Topics: basics, migration, observability, cost-awareness.
- Architecture examples: WhatsApp-like chat, Netflix-style streaming, Uber-like ride-hailing.
- MLOps coverage:
  - The MLOps lifecycle (Data Prep, Training, Evaluation, Registry, Deployment, Monitoring).
  - CI/CD for Machine Learning (CT, Continuous Training).
  - Feature Stores & Model Registries.
  - Serving patterns (Real-time, Batch, Edge).
  - Cloud mappings (e.g., SageMaker on AWS, Vertex AI on GCP, Azure Machine Learning).

Interaction Flow:
1. First, ask 3-4 short questions to understand goal, cloud, skill, and focus.
2. Present 5 learning paths (Path A-E) based on user info.
3. Once a path is chosen, use the "Cloud Learning Content Model": Concept -> Cloud Mapping -> Architecture Diagram -> Hands-on Lab -> Checkpoint Question.
4. If teaching migration or MLOps pipelines, use the specialized workflows (Assess, Design, Data, App/Model, Validation/Monitoring).
"#;

/// The first user turn of every conversation.
pub const GREETING_PROMPT: &str = "Hello. I am a new student. Please start our session by asking the 4 initial assessment questions mentioned in your instructions.";

/// Returned by [`TutorService::start`] when the greeting has no text.
pub const START_FALLBACK: &str = "Failed to start session.";

/// Ordered text fragments of one reply.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Something that can hold a tutoring conversation.
#[async_trait::async_trait]
pub trait TextGeneration: Send + Sync {
    /// Starts a fresh conversation and returns the tutor's greeting.
    async fn start(&self) -> Result<String>;

    /// Sends `prompt` and returns the reply as a stream of fragments.
    ///
    /// Concatenating the fragments in delivery order reconstructs the reply.
    async fn send_stream(&self, prompt: &str) -> Result<ChunkStream>;
}

/////////////////////////////////////////// StreamHandle //////////////////////////////////////////

/// A cancellable [`ChunkStream`].
///
/// Once cancelled the handle yields no further fragments, even if the
/// underlying stream already has some buffered.
///
/// ```
/// use futures::{StreamExt, stream};
/// use stratus_tutor::StreamHandle;
///
/// # tokio_test::block_on(async {
/// let parts = vec![Ok("Hel".to_string()), Ok("lo".to_string())];
/// let mut handle = StreamHandle::new(Box::pin(stream::iter(parts)));
/// assert_eq!(handle.next().await.unwrap().unwrap(), "Hel");
/// handle.cancel();
/// assert!(handle.next().await.is_none());
/// # });
/// ```
pub struct StreamHandle {
    chunks: ChunkStream,
    cancel: CancellationToken,
}

impl StreamHandle {
    /// Wraps `chunks` with a fresh cancellation token.
    pub fn new(chunks: ChunkStream) -> Self {
        Self::with_canceller(chunks, CancellationToken::new())
    }

    /// Wraps `chunks` so that cancelling `cancel` ends the stream.
    pub fn with_canceller(chunks: ChunkStream, cancel: CancellationToken) -> Self {
        let guarded = chunks.take_until(cancel.clone().cancelled_owned());
        Self {
            chunks: Box::pin(guarded),
            cancel,
        }
    }

    /// Stops the stream.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once [`cancel`](Self::cancel) was called on this handle or its token.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that cancels this handle from elsewhere.
    pub fn canceller(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Stream for StreamHandle {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.chunks.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/////////////////////////////////////////// TutorService //////////////////////////////////////////

/// The production [`TextGeneration`] over the hosted API.
///
/// The API is stateless, so the service keeps the conversation and replays
/// it with every request.
pub struct TutorService {
    client: Gemini,
    model: Model,
    system_instruction: String,
    generation_config: Option<GenerationConfig>,
    history: Arc<Mutex<Vec<Content>>>,
    started: AtomicBool,
}

impl TutorService {
    /// Creates a service using the default persona.
    pub fn new(client: Gemini, model: Model) -> Self {
        Self {
            client,
            model,
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            generation_config: None,
            history: Arc::new(Mutex::new(Vec::new())),
            started: AtomicBool::new(false),
        }
    }

    /// Replaces the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Sets sampling overrides. An empty config sends none.
    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = (!config.is_empty()).then_some(config);
        self
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Number of turns replayed with the next request.
    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }

    fn request(&self, prompt: &str) -> GenerateContentRequest {
        let mut contents = lock(&self.history).clone();
        contents.push(Content::user(prompt));
        GenerateContentRequest::new(contents)
            .with_system_instruction(self.system_instruction.clone())
            .with_generation_config(self.generation_config)
    }

    async fn ensure_started(&self) -> Result<()> {
        if !self.started.load(Ordering::Acquire) {
            self.start().await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TextGeneration for TutorService {
    async fn start(&self) -> Result<String> {
        lock(&self.history).clear();
        self.started.store(false, Ordering::Release);

        let request = self.request(GREETING_PROMPT);
        let response = self.client.generate(&self.model, &request).await?;
        let text = response.text();
        record_turn(&self.history, GREETING_PROMPT, &text);
        self.started.store(true, Ordering::Release);
        if text.is_empty() {
            tracing::warn!(model = %self.model, "greeting had no text");
            return Ok(START_FALLBACK.to_string());
        }
        Ok(text)
    }

    async fn send_stream(&self, prompt: &str) -> Result<ChunkStream> {
        self.ensure_started().await?;
        let request = self.request(prompt);
        let responses = self.client.stream(&self.model, &request).await?;
        Ok(Box::pin(HistoryStream::new(
            responses,
            Arc::clone(&self.history),
            prompt,
        )))
    }
}

fn lock(history: &Mutex<Vec<Content>>) -> MutexGuard<'_, Vec<Content>> {
    history.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Appends one exchange to the replayed history.
///
/// The API rejects turns with empty text, so a reply without text (a blocked
/// candidate, say) records neither side of the exchange.
fn record_turn(history: &Mutex<Vec<Content>>, prompt: &str, reply: &str) {
    if reply.is_empty() {
        tracing::debug!(prompt, "reply had no text; not recorded");
        return;
    }
    let mut history = lock(history);
    history.push(Content::user(prompt));
    history.push(Content::model(reply));
}

/// Passes reply text through while accumulating it.
///
/// When the stream drains without error the prompt and the accumulated reply
/// are appended to the shared history. A failed or abandoned stream, or one
/// that carried no text, leaves history untouched.
struct HistoryStream {
    inner: ResponseStream,
    history: Arc<Mutex<Vec<Content>>>,
    prompt: Option<String>,
    reply: String,
    failed: bool,
}

impl HistoryStream {
    fn new(inner: ResponseStream, history: Arc<Mutex<Vec<Content>>>, prompt: &str) -> Self {
        Self {
            inner,
            history,
            prompt: Some(prompt.to_string()),
            reply: String::new(),
            failed: false,
        }
    }

    fn record(&mut self) {
        if self.failed {
            return;
        }
        if let Some(prompt) = self.prompt.take() {
            record_turn(&self.history, &prompt, &self.reply);
        }
    }
}

impl Stream for HistoryStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(response))) => {
                    let text = response.text();
                    if text.is_empty() {
                        continue;
                    }
                    self.reply.push_str(&text);
                    return Poll::Ready(Some(Ok(text)));
                }
                Poll::Ready(Some(Err(err))) => {
                    self.failed = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    self.record();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
