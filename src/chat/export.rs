//! Standalone HTML export of a transcript.

use std::io::Write;

use crate::error::{Error, Result};
use crate::markdown::{self, Document};
use crate::types::{Message, MessageStatus, Role};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<title>CloudStratus Tutor transcript</title>
<script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-slate-950 text-slate-200">
<main class="max-w-3xl mx-auto p-8 space-y-8">"#;

const PAGE_TAIL: &str = "</main>\n</body>\n</html>\n";

/// Renders the transcript as a complete HTML page.
pub fn transcript_html(messages: &[Message]) -> String {
    let mut page = String::from(PAGE_HEAD);
    page.push('\n');
    for message in messages {
        page.push_str(&message_html(message));
        page.push('\n');
    }
    page.push_str(PAGE_TAIL);
    page
}

/// Writes [`transcript_html`] to `writer`.
pub fn write_transcript_html<W: Write>(messages: &[Message], mut writer: W) -> Result<()> {
    writer
        .write_all(transcript_html(messages).as_bytes())
        .and_then(|()| writer.flush())
        .map_err(|err| Error::io("failed to write transcript", err))
}

fn message_html(message: &Message) -> String {
    let body = match (message.role(), message.status()) {
        (Role::User, _) => format!(
            r#"<p class="text-sm leading-relaxed whitespace-pre-wrap">{}</p>"#,
            markdown::escape(message.text())
        ),
        (Role::Model, MessageStatus::Failed) => format!(
            r#"<p class="text-red-400">{}</p>"#,
            markdown::escape(message.text())
        ),
        (Role::Model, _) => Document::parse(message.text()).to_html(),
    };
    let bubble = match message.role() {
        Role::User => "ml-auto max-w-[85%] bg-cyan-600 text-white rounded-2xl p-5",
        Role::Model => "max-w-[85%] bg-slate-900 border border-slate-800 rounded-2xl p-6",
    };
    format!(
        r#"<section class="{bubble}" data-role="{}">
{body}
<footer class="mt-3 text-[10px] font-bold uppercase tracking-widest text-slate-500">{} · {}</footer>
</section>"#,
        message.role(),
        message.role().label(),
        message.clock(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageId;

    #[test]
    fn empty_transcript_is_a_page() {
        let page = transcript_html(&[]);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.ends_with("</html>\n"));
    }

    #[test]
    fn messages_render_by_role() {
        let messages = vec![
            Message::new(MessageId(1), Role::User, "<b>hi</b>", MessageStatus::Complete),
            Message::new(
                MessageId(2),
                Role::Model,
                "**Concept overview:** S3 stores objects.",
                MessageStatus::Complete,
            ),
        ];
        let page = transcript_html(&messages);
        assert!(page.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(page.contains(r#"data-role="user""#));
        assert!(page.contains("Core Insight"));
        assert!(page.contains("CloudStratus Tutor · "));
    }

    #[test]
    fn write_to_buffer() {
        let messages = vec![Message::new(
            MessageId(1),
            Role::Model,
            "Error encountered.",
            MessageStatus::Failed,
        )];
        let mut buffer = Vec::new();
        write_transcript_html(&messages, &mut buffer).unwrap();
        let page = String::from_utf8(buffer).unwrap();
        assert!(page.contains(r#"<p class="text-red-400">Error encountered.</p>"#));
    }
}
