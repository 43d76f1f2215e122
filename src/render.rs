//! Terminal display of a tutoring session.
//!
//! The session reports every transcript change to a [`Renderer`]; the
//! [`PlainTextRenderer`] turns those reports into terminal output.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::markdown::{self, ANSI_BOLD, ANSI_CYAN, ANSI_DIM, ANSI_RED, ANSI_RESET, Document};
use crate::types::{Message, MessageStatus};

/// Receives transcript changes for display.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Recording renderers in tests
pub trait Renderer: Send {
    /// Called when a model placeholder is created.
    fn start_response(&mut self, message: &Message) {
        _ = message;
    }

    /// Called after every fragment with the re-parsed accumulated text.
    fn update_response(&mut self, message: &Message, document: &Document);

    /// Called once the response has settled, whatever the outcome.
    fn finish_response(&mut self, message: &Message);

    /// Called when a student message is added to the transcript.
    fn print_user(&mut self, message: &Message) {
        _ = message;
    }

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self) {}

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }

    /// Forgets an interrupt request that arrived while nothing was streaming.
    fn clear_interrupt(&mut self) {}

    /// Displays a message that is already complete, such as the greeting.
    fn print_message(&mut self, message: &Message) {
        self.start_response(message);
        self.update_response(message, &Document::parse(message.text()));
        self.finish_response(message);
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// Blocks are printed once a blank line follows them, since the parser closes
/// every block there and later fragments cannot change them. Everything after
/// the last blank line waits for the next fragment or for the finish. Nothing
/// is printed while a fenced block is open, so diagrams never appear half
/// drawn.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    printed_blocks: usize,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }

    /// Creates a new PlainTextRenderer with specified color and interrupt flag.
    pub fn with_color_and_interrupt(use_color: bool, interrupted: Arc<AtomicBool>) -> Self {
        Self::with_color(use_color).with_interrupt(interrupted)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            printed_blocks: 0,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn print_blocks(&mut self, document: &Document, upto: usize) {
        let upto = upto.min(document.blocks.len());
        if upto <= self.printed_blocks {
            return;
        }
        let mut text = String::new();
        for block in &document.blocks[self.printed_blocks..upto] {
            text.push_str(&block.to_ansi(self.use_color));
            text.push_str("\n\n");
        }
        self.printed_blocks = upto;
        self.write(&text);
    }

    fn footer(&mut self, message: &Message) {
        let label = format!("{} · {}", message.role().label(), message.clock());
        let line = if self.use_color {
            format!("{ANSI_DIM}{label}{ANSI_RESET}\n\n")
        } else {
            format!("{label}\n\n")
        };
        self.write(&line);
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn start_response(&mut self, _: &Message) {
        self.printed_blocks = 0;
    }

    fn update_response(&mut self, message: &Message, _: &Document) {
        let text = message.text();
        if markdown::has_open_fence(text) {
            return;
        }
        let Some(boundary) = text.rfind("\n\n") else {
            return;
        };
        let stable = &text[..boundary];
        if markdown::has_open_fence(stable) {
            return;
        }
        let document = Document::parse(stable);
        let complete = document.blocks.len();
        self.print_blocks(&document, complete);
    }

    fn finish_response(&mut self, message: &Message) {
        if message.status() == MessageStatus::Failed {
            self.printed_blocks = 0;
            self.print_error(message.text());
            return;
        }
        let document = Document::parse(message.text());
        let total = document.blocks.len();
        self.print_blocks(&document, total);
        self.printed_blocks = 0;
        self.footer(message);
    }

    fn print_user(&mut self, message: &Message) {
        self.footer(message);
    }

    fn print_error(&mut self, error: &str) {
        let line = if self.use_color {
            format!("{ANSI_RED}Error: {error}{ANSI_RESET}\n\n")
        } else {
            format!("Error: {error}\n\n")
        };
        self.write(&line);
    }

    fn print_info(&mut self, info: &str) {
        self.write(&format!("{info}\n"));
    }

    fn print_interrupted(&mut self) {
        let line = if self.use_color {
            format!("{ANSI_BOLD}{ANSI_CYAN}[interrupted]{ANSI_RESET}\n\n")
        } else {
            "[interrupted]\n\n".to_string()
        };
        self.write(&line);
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn clear_interrupt(&mut self) {
        if let Some(flag) = &self.interrupted {
            flag.store(false, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageId, Role};

    fn model(text: &str, status: MessageStatus) -> Message {
        Message::new(MessageId(1), Role::Model, text, status)
    }

    fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn last_block_is_held_back() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let message = model("First paragraph.\n\nSecond", MessageStatus::Streaming);
        renderer.start_response(&message);
        renderer.update_response(&message, &Document::parse(message.text()));
        assert_eq!(output(renderer), "First paragraph.\n\n");
    }

    #[test]
    fn open_fence_holds_output() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let message = model("Intro.\n\n```\nClient → API", MessageStatus::Streaming);
        renderer.update_response(&message, &Document::parse(message.text()));
        assert_eq!(output(renderer), "");
    }

    #[test]
    fn finish_flushes_everything_once() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let streaming = model("One.\n\nTwo.", MessageStatus::Streaming);
        renderer.start_response(&streaming);
        renderer.update_response(&streaming, &Document::parse(streaming.text()));
        let done = model("One.\n\nTwo.", MessageStatus::Complete);
        renderer.finish_response(&done);
        let text = output(renderer);
        assert!(text.starts_with("One.\n\nTwo.\n\nCloudStratus Tutor · "));
        assert_eq!(text.matches("One.").count(), 1);
    }

    #[test]
    fn list_split_mid_marker_keeps_every_item() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let first = model("- alpha\n-", MessageStatus::Streaming);
        renderer.start_response(&first);
        for text in ["- alpha\n-", "- alpha\n- beta", "- alpha\n- beta\n- gamma"] {
            let message = model(text, MessageStatus::Streaming);
            renderer.update_response(&message, &Document::parse(text));
        }
        let done = model("- alpha\n- beta\n- gamma", MessageStatus::Complete);
        renderer.finish_response(&done);
        let text = output(renderer);
        for item in ["alpha", "beta", "gamma"] {
            assert_eq!(text.matches(item).count(), 1, "{item} in {text:?}");
        }
        assert!(!text.contains("\n-\n"));
    }

    #[test]
    fn blocks_print_once_a_blank_line_follows() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let chunks = [
            "Intro.\n- a",
            "Intro.\n- a\n- b\n\nNext",
            "Intro.\n- a\n- b\n\nNext up.",
        ];
        renderer.start_response(&model(chunks[0], MessageStatus::Streaming));
        let mut seen = Vec::new();
        for text in chunks {
            let message = model(text, MessageStatus::Streaming);
            renderer.update_response(&message, &Document::parse(text));
            seen.push(renderer.printed_blocks);
        }
        assert_eq!(seen, vec![0, 2, 2]);
        renderer.finish_response(&model(chunks[2], MessageStatus::Complete));
        let text = output(renderer);
        assert!(text.starts_with("Intro.\n\n  - a\n  - b\n\nNext up.\n\n"), "{text:?}");
    }

    #[test]
    fn failed_response_prints_error() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.finish_response(&model("Error encountered.", MessageStatus::Failed));
        assert_eq!(output(renderer), "Error: Error encountered.\n\n");
    }

    #[test]
    fn interrupt_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let renderer = PlainTextRenderer::with_writer(Vec::new(), false).with_interrupt(flag.clone());
        assert!(!renderer.should_interrupt());
        flag.store(true, Ordering::Relaxed);
        assert!(renderer.should_interrupt());
    }

    #[test]
    fn clear_interrupt_resets_shared_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut renderer =
            PlainTextRenderer::with_writer(Vec::new(), false).with_interrupt(flag.clone());
        renderer.clear_interrupt();
        assert!(!flag.load(Ordering::Relaxed));
        assert!(!renderer.should_interrupt());
    }
}
