//! HTML rendering with the tutor's presentation classes.

use super::parse::{Block, CalloutKind, Document, Fence, FenceKind, Inline};

const H2_CLASS: &str = "text-2xl font-bold text-white mb-6 mt-2";
const H3_CLASS: &str =
    "text-lg font-bold text-cyan-400 mt-8 mb-4 flex items-center gap-2 border-b border-slate-800 pb-2";
const H4_CLASS: &str = "text-md font-bold text-slate-200 mt-6 mb-3";
const RULE: &str = r#"<hr class="my-8 border-slate-800" />"#;
const LIST_CLASS: &str = "list-disc ml-6 mb-6 text-slate-400 space-y-1";
const ITEM_CLASS: &str = "mb-2 ml-1";
const PARAGRAPH_CLASS: &str = "mb-4 leading-relaxed text-slate-400";
const STRONG_CLASS: &str =
    "font-bold text-white underline decoration-cyan-500/30 decoration-2 underline-offset-4";
const EMPHASIS_CLASS: &str = "italic text-slate-300";
const CODE_CLASS: &str = "bg-slate-800 text-cyan-400 px-1.5 py-0.5 rounded text-xs font-mono";
const FIGURE_CLASS: &str = "bg-slate-900 text-cyan-300 p-6 rounded-2xl overflow-x-auto my-6 font-mono text-sm border border-slate-800 shadow-inner relative group";
const FIGCAPTION_CLASS: &str = "absolute top-2 right-4 text-[10px] text-slate-600 font-sans uppercase tracking-widest";
const PRE_CLASS: &str = "bg-slate-950 text-cyan-400 p-5 rounded-xl overflow-x-auto font-mono text-xs border border-slate-800 shadow-xl";

impl CalloutKind {
    fn accent(&self) -> &'static str {
        match self {
            CalloutKind::ConceptOverview => "cyan",
            CalloutKind::HandsOnLab => "indigo",
            CalloutKind::CheckpointQuestion => "amber",
        }
    }
}

impl Document {
    /// Renders every block, one per line. Empty documents render as "".
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            block.write_html(&mut out);
        }
        out
    }
}

impl Block {
    /// Renders this block alone.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Block::Heading { level, content } => {
                let (tag, class) = match level {
                    1 => ("h2", H2_CLASS),
                    2 => ("h3", H3_CLASS),
                    _ => ("h4", H4_CLASS),
                };
                out.push_str(&format!(r#"<{tag} class="{class}">"#));
                write_inlines(content, out);
                out.push_str(&format!("</{tag}>"));
            }
            Block::Callout { kind, body } => {
                let accent = kind.accent();
                out.push_str(&format!(
                    r#"<div class="bg-{accent}-500/5 border-l-4 border-{accent}-500 p-5 my-6 rounded-r-2xl">"#
                ));
                out.push_str(&format!(
                    r#"<span class="block text-[10px] font-black text-{accent}-500 uppercase mb-2 tracking-widest">{}</span>"#,
                    kind.label()
                ));
                if !body.is_empty() {
                    out.push_str(r#"<p class="leading-relaxed">"#);
                    write_lines(body, out);
                    out.push_str("</p>");
                }
                out.push_str("</div>");
            }
            Block::Rule => out.push_str(RULE),
            Block::List { items } => {
                out.push_str(&format!(r#"<ul class="{LIST_CLASS}">"#));
                for item in items {
                    out.push_str(&format!(r#"<li class="{ITEM_CLASS}">"#));
                    write_inlines(item, out);
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
            Block::Paragraph { lines } => {
                out.push_str(&format!(r#"<p class="{PARAGRAPH_CLASS}">"#));
                write_lines(lines, out);
                out.push_str("</p>");
            }
            Block::Fence(fence) => write_fence(fence, out),
        }
    }
}

fn write_fence(fence: &Fence, out: &mut String) {
    match fence.kind {
        FenceKind::Diagram => {
            out.push_str(&format!(r#"<figure class="{FIGURE_CLASS}">"#));
            out.push_str(&format!(
                r#"<figcaption class="{FIGCAPTION_CLASS}">Architectural Schema</figcaption>"#
            ));
            out.push_str(
                r#"<div class="leading-relaxed" aria-label="ASCII Architecture Diagram">"#,
            );
            escape_into(&fence.text, out);
            out.push_str("</div></figure>");
        }
        FenceKind::Code => {
            out.push_str(r#"<div class="relative group my-6">"#);
            out.push_str(&format!(r#"<pre class="{PRE_CLASS}">"#));
            match &fence.lang {
                Some(lang) => {
                    out.push_str(r#"<code class="language-"#);
                    escape_into(lang, out);
                    out.push_str(r#"">"#);
                }
                None => out.push_str("<code>"),
            }
            escape_into(&fence.text, out);
            out.push_str("</code></pre></div>");
        }
    }
}

fn write_lines(lines: &[Vec<Inline>], out: &mut String) {
    for (idx, line) in lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        write_inlines(line, out);
    }
}

fn write_inlines(spans: &[Inline], out: &mut String) {
    for span in spans {
        match span {
            Inline::Text(text) => escape_into(text, out),
            Inline::Strong(text) => wrap("strong", STRONG_CLASS, text, out),
            Inline::Emphasis(text) => wrap("em", EMPHASIS_CLASS, text, out),
            Inline::Code(text) => wrap("code", CODE_CLASS, text, out),
        }
    }
}

fn wrap(tag: &str, class: &str, text: &str, out: &mut String) {
    out.push_str(&format!(r#"<{tag} class="{class}">"#));
    escape_into(text, out);
    out.push_str(&format!("</{tag}>"));
}

/// Escapes text for use in element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(text: &str) -> String {
        Document::parse(text).to_html()
    }

    #[test]
    fn empty_renders_empty() {
        assert_eq!(html(""), "");
    }

    #[test]
    fn callout_with_heading_marker() {
        let rendered = html("## Concept overview\nLambda is serverless.");
        assert!(rendered.starts_with(r#"<div class="bg-cyan-500/5"#));
        assert!(rendered.contains("Core Insight"));
        assert!(rendered.contains("Lambda is serverless."));
        assert!(!rendered.contains("<h3"));
    }

    #[test]
    fn callout_accents() {
        assert!(html("Hands-on lab: go").contains("border-indigo-500"));
        assert!(html("**Checkpoint question:** why").contains("text-amber-500"));
        assert!(html("**Checkpoint question:** why").contains("Self Review"));
    }

    #[test]
    fn heading_levels_map_down_one() {
        assert_eq!(
            html("# Title"),
            format!(r#"<h2 class="{H2_CLASS}">Title</h2>"#)
        );
        assert!(html("## Sub").starts_with("<h3"));
        assert!(html("### Minor").starts_with("<h4"));
    }

    #[test]
    fn diagram_figure() {
        let rendered = html("```\nClient → API → DB\n```");
        assert!(rendered.starts_with("<figure"));
        assert!(rendered.contains("Architectural Schema"));
        assert!(rendered.contains("Client → API → DB"));
    }

    #[test]
    fn code_block_is_escaped_and_literal() {
        let rendered = html("```\nif a < b && **c**: pass\n```");
        assert!(rendered.contains("<pre"));
        assert!(rendered.contains("if a &lt; b &amp;&amp; **c**: pass"));
        assert!(!rendered.contains("<strong"));
    }

    #[test]
    fn code_block_language_class() {
        let rendered = html("```python\nprint(1)\n```");
        assert!(rendered.contains(r#"<code class="language-python">print(1)</code>"#));
    }

    #[test]
    fn list_and_paragraph() {
        assert_eq!(
            html("- one\n- two"),
            format!(
                r#"<ul class="{LIST_CLASS}"><li class="{ITEM_CLASS}">one</li><li class="{ITEM_CLASS}">two</li></ul>"#
            )
        );
        assert_eq!(
            html("hello"),
            format!(r#"<p class="{PARAGRAPH_CLASS}">hello</p>"#)
        );
    }

    #[test]
    fn paragraph_keeps_line_breaks() {
        assert_eq!(
            html("a\nb"),
            format!(r#"<p class="{PARAGRAPH_CLASS}">a
b</p>"#)
        );
    }

    #[test]
    fn inline_spans() {
        let rendered = html("**S3** is *durable* via `PUT`");
        assert!(rendered.contains(&format!(r#"<strong class="{STRONG_CLASS}">S3</strong>"#)));
        assert!(rendered.contains(&format!(r#"<em class="{EMPHASIS_CLASS}">durable</em>"#)));
        assert!(rendered.contains(&format!(r#"<code class="{CODE_CLASS}">PUT</code>"#)));
    }

    #[test]
    fn markup_in_text_is_escaped() {
        let rendered = html("<script>alert(\"x\")</script>");
        assert!(rendered.contains("&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"));
        assert!(!rendered.contains("<script>"));
    }

    #[test]
    fn rule() {
        assert_eq!(html("a\n---\nb").lines().nth(1), Some(RULE));
    }

    #[test]
    fn escape_helper() {
        assert_eq!(escape("a & b"), "a &amp; b");
    }
}
