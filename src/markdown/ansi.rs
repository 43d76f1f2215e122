//! Terminal rendering of parsed messages.

use super::parse::{Block, CalloutKind, Document, Fence, FenceKind, Inline};

/// ANSI escape code for bold text.
pub(crate) const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (captions, footers, rules).
pub(crate) const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text.
pub(crate) const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code for underlined text.
pub(crate) const ANSI_UNDERLINE: &str = "\x1b[4m";

/// ANSI escape code to reset all styling.
pub(crate) const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text.
pub(crate) const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for blue text.
pub(crate) const ANSI_BLUE: &str = "\x1b[34m";

/// ANSI escape code for yellow text.
pub(crate) const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text.
pub(crate) const ANSI_RED: &str = "\x1b[31m";

const RULE_WIDTH: usize = 40;

impl CalloutKind {
    fn ansi_accent(&self) -> &'static str {
        match self {
            CalloutKind::ConceptOverview => ANSI_CYAN,
            CalloutKind::HandsOnLab => ANSI_BLUE,
            CalloutKind::CheckpointQuestion => ANSI_YELLOW,
        }
    }
}

impl Document {
    /// Renders every block for a terminal, separated by blank lines.
    pub fn to_ansi(&self, use_color: bool) -> String {
        self.blocks
            .iter()
            .map(|block| block.to_ansi(use_color))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Block {
    /// Renders this block for a terminal, without a trailing newline.
    pub fn to_ansi(&self, use_color: bool) -> String {
        let mut out = String::new();
        match self {
            Block::Heading { level, content } => {
                let text = plain_inlines(content);
                if use_color {
                    let style = match level {
                        1 => format!("{ANSI_BOLD}{ANSI_UNDERLINE}"),
                        2 => format!("{ANSI_BOLD}{ANSI_CYAN}"),
                        _ => ANSI_BOLD.to_string(),
                    };
                    out.push_str(&format!("{style}{text}{ANSI_RESET}"));
                } else {
                    let width = text.chars().count();
                    out.push_str(&text);
                    match level {
                        1 => out.push_str(&format!("\n{}", "=".repeat(width))),
                        2 => out.push_str(&format!("\n{}", "-".repeat(width))),
                        _ => {}
                    }
                }
            }
            Block::Callout { kind, body } => {
                let label = kind.label().to_uppercase();
                if use_color {
                    let accent = kind.ansi_accent();
                    out.push_str(&format!("{accent}{ANSI_BOLD}▌ {label}{ANSI_RESET}"));
                    for line in body {
                        out.push_str(&format!("\n{accent}▌{ANSI_RESET} "));
                        write_inlines(line, true, &mut out);
                    }
                } else {
                    out.push_str(&format!("[{label}]"));
                    for line in body {
                        out.push_str("\n| ");
                        write_inlines(line, false, &mut out);
                    }
                }
            }
            Block::Rule => {
                let rule = if use_color {
                    format!("{ANSI_DIM}{}{ANSI_RESET}", "─".repeat(RULE_WIDTH))
                } else {
                    "-".repeat(RULE_WIDTH)
                };
                out.push_str(&rule);
            }
            Block::List { items } => {
                let bullet = if use_color { "•" } else { "-" };
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push('\n');
                    }
                    out.push_str(&format!("  {bullet} "));
                    write_inlines(item, use_color, &mut out);
                }
            }
            Block::Paragraph { lines } => {
                for (idx, line) in lines.iter().enumerate() {
                    if idx > 0 {
                        out.push('\n');
                    }
                    write_inlines(line, use_color, &mut out);
                }
            }
            Block::Fence(fence) => write_fence(fence, use_color, &mut out),
        }
        out
    }
}

fn write_fence(fence: &Fence, use_color: bool, out: &mut String) {
    let (caption, indent, color) = match (fence.kind, &fence.lang) {
        (FenceKind::Diagram, _) => ("Architectural Schema".to_string(), "  ", ANSI_CYAN),
        (FenceKind::Code, Some(lang)) => (lang.clone(), "    ", ANSI_YELLOW),
        (FenceKind::Code, None) => ("code".to_string(), "    ", ANSI_YELLOW),
    };
    if use_color {
        out.push_str(&format!("{ANSI_DIM}{caption}{ANSI_RESET}"));
    } else {
        out.push_str(&format!("[{caption}]"));
    }
    for line in fence.text.lines() {
        out.push('\n');
        if use_color {
            out.push_str(&format!("{indent}{color}{line}{ANSI_RESET}"));
        } else {
            out.push_str(&format!("{indent}{line}"));
        }
    }
}

fn write_inlines(spans: &[Inline], use_color: bool, out: &mut String) {
    for span in spans {
        match (span, use_color) {
            (Inline::Text(text), _) => out.push_str(text),
            (Inline::Strong(text), true) => out.push_str(&format!("{ANSI_BOLD}{text}{ANSI_RESET}")),
            (Inline::Emphasis(text), true) => {
                out.push_str(&format!("{ANSI_ITALIC}{text}{ANSI_RESET}"))
            }
            (Inline::Code(text), true) => out.push_str(&format!("{ANSI_CYAN}{text}{ANSI_RESET}")),
            (Inline::Strong(text), false) | (Inline::Emphasis(text), false) => out.push_str(text),
            (Inline::Code(text), false) => out.push_str(&format!("`{text}`")),
        }
    }
}

fn plain_inlines(spans: &[Inline]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Inline::Text(text)
            | Inline::Strong(text)
            | Inline::Emphasis(text)
            | Inline::Code(text) => out.push_str(text),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> String {
        Document::parse(text).to_ansi(false)
    }

    #[test]
    fn plain_output_has_no_escapes() {
        let rendered = plain("# Title\n\n**Concept overview:** x\n\n- **a**\n\n```\nClient → API\n```");
        assert!(!rendered.contains('\x1b'));
    }

    #[test]
    fn plain_headings_are_underlined_with_ascii() {
        assert_eq!(plain("# Title"), "Title\n=====");
        assert_eq!(plain("## Sub"), "Sub\n---");
        assert_eq!(plain("### Minor"), "Minor");
    }

    #[test]
    fn plain_callout() {
        assert_eq!(
            plain("Hands-on lab: open the console\nthen create a bucket"),
            "[STEP-BY-STEP LAB]\n| open the console\n| then create a bucket"
        );
    }

    #[test]
    fn plain_list_and_code() {
        assert_eq!(plain("- one\n- `two`"), "  - one\n  - `two`");
        assert_eq!(
            plain("```sql\nSELECT 1;\n```"),
            "[sql]\n    SELECT 1;"
        );
    }

    #[test]
    fn blocks_are_separated_by_blank_lines() {
        assert_eq!(plain("one\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn colored_spans() {
        let rendered = Document::parse("a **b** *c*").to_ansi(true);
        assert_eq!(
            rendered,
            format!("a {ANSI_BOLD}b{ANSI_RESET} {ANSI_ITALIC}c{ANSI_RESET}")
        );
    }

    #[test]
    fn diagram_caption() {
        let rendered = plain("```\nUser | API\n```");
        assert_eq!(rendered, "[Architectural Schema]\n  User | API");
    }
}
