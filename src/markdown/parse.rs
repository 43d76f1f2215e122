//! Parsing of tutor markdown into blocks and inline spans.

/// Delimiter of a fenced block.
pub const FENCE: &str = "```";

/// A parsed message: an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Blocks in display order.
    pub blocks: Vec<Block>,
}

/// A block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `#`, `##` or `###` heading (levels 1 to 3).
    Heading {
        /// Heading level, 1 to 3.
        level: u8,
        /// Heading text.
        content: Vec<Inline>,
    },
    /// A styled section opened by a recognized line prefix.
    Callout {
        /// Which callout.
        kind: CalloutKind,
        /// Lines following the marker, up to the end of the paragraph.
        body: Vec<Vec<Inline>>,
    },
    /// `---` alone on a line.
    Rule,
    /// Consecutive `-` or `*` items.
    List {
        /// One entry per item.
        items: Vec<Vec<Inline>>,
    },
    /// Plain text; line breaks inside the paragraph are kept.
    Paragraph {
        /// One entry per source line.
        lines: Vec<Vec<Inline>>,
    },
    /// Literal text between fences.
    Fence(Fence),
}

/// Contents of a fenced block. Never touched by inline parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    /// How the block is displayed.
    pub kind: FenceKind,
    /// The info string after the opening fence, e.g. `python`.
    pub lang: Option<String>,
    /// The trimmed literal text.
    pub text: String,
}

/// Display class of a fenced block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    /// ASCII architecture art, shown as a captioned figure.
    Diagram,
    /// Source code, shown monospaced.
    Code,
}

/// The three recognized callouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    /// Opened by "Concept overview".
    ConceptOverview,
    /// Opened by "Hands-on lab".
    HandsOnLab,
    /// Opened by "Checkpoint question".
    CheckpointQuestion,
}

impl CalloutKind {
    /// Every callout, in matching order.
    pub const ALL: [CalloutKind; 3] = [
        CalloutKind::ConceptOverview,
        CalloutKind::HandsOnLab,
        CalloutKind::CheckpointQuestion,
    ];

    /// The line prefix that opens this callout (matched case-insensitively).
    pub fn marker(&self) -> &'static str {
        match self {
            CalloutKind::ConceptOverview => "Concept overview",
            CalloutKind::HandsOnLab => "Hands-on lab",
            CalloutKind::CheckpointQuestion => "Checkpoint question",
        }
    }

    /// The label shown at the top of the callout.
    pub fn label(&self) -> &'static str {
        match self {
            CalloutKind::ConceptOverview => "Core Insight",
            CalloutKind::HandsOnLab => "Step-by-Step Lab",
            CalloutKind::CheckpointQuestion => "Self Review",
        }
    }
}

/// An inline span. Spans do not nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Literal text.
    Text(String),
    /// `**x**` or `__x__`.
    Strong(String),
    /// `*x*` or `_x_`.
    Emphasis(String),
    /// `` `x` ``.
    Code(String),
}

impl Document {
    /// Parses accumulated message text.
    pub fn parse(text: &str) -> Self {
        let mut blocks = Vec::new();
        for segment in split_fences(text) {
            match segment {
                Segment::Text(text) => parse_text(text, &mut blocks),
                Segment::Fence(raw) => blocks.push(Block::Fence(parse_fence(raw))),
            }
        }
        Self { blocks }
    }

    /// True when there is nothing to display.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// True while `text` contains an opening fence with no matching close.
pub fn has_open_fence(text: &str) -> bool {
    text.matches(FENCE).count() % 2 == 1
}

enum Segment<'a> {
    Text(&'a str),
    Fence(&'a str),
}

/// Pairs fences left to right. An unmatched opening fence stays in the text.
fn split_fences(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let after = &rest[open + FENCE.len()..];
        let Some(close) = after.find(FENCE) else {
            break;
        };
        if open > 0 {
            segments.push(Segment::Text(&rest[..open]));
        }
        segments.push(Segment::Fence(&after[..close]));
        rest = &after[close + FENCE.len()..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

/// Only code fences carry an info string; a diagram's first line is content.
fn parse_fence(raw: &str) -> Fence {
    if is_diagram(raw) {
        return Fence {
            kind: FenceKind::Diagram,
            lang: None,
            text: raw.trim().to_string(),
        };
    }
    let (lang, body) = match raw.split_once('\n') {
        Some((first, body)) if is_info_string(first) => (Some(first.trim().to_string()), body),
        _ => (None, raw),
    };
    Fence {
        kind: FenceKind::Code,
        lang,
        text: body.trim().to_string(),
    }
}

/// Diagrams are recognized by arrows, table pipes, rules, or a "Client" box.
pub fn is_diagram(text: &str) -> bool {
    text.contains('→') || text.contains('|') || text.contains("---") || text.contains("Client")
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.' | '#'))
}

///////////////////////////////////////////// Blocks ////////////////////////////////////////////

#[derive(Default)]
enum Open<'a> {
    #[default]
    Nothing,
    Paragraph(Vec<&'a str>),
    List(Vec<&'a str>),
    Callout(CalloutKind, Vec<&'a str>),
}

impl<'a> Open<'a> {
    fn close(self, blocks: &mut Vec<Block>) {
        match self {
            Open::Nothing => {}
            Open::Paragraph(lines) => {
                let last = lines.len().saturating_sub(1);
                let lines = lines
                    .into_iter()
                    .enumerate()
                    .map(|(idx, line)| {
                        let line = if idx == 0 { line.trim_start() } else { line };
                        let line = if idx == last { line.trim_end() } else { line };
                        parse_inline(line)
                    })
                    .collect();
                blocks.push(Block::Paragraph { lines });
            }
            Open::List(items) => blocks.push(Block::List {
                items: items.into_iter().map(parse_inline).collect(),
            }),
            Open::Callout(kind, body) => blocks.push(Block::Callout {
                kind,
                body: body.into_iter().map(parse_inline).collect(),
            }),
        }
    }
}

fn parse_text<'a>(text: &'a str, blocks: &mut Vec<Block>) {
    let mut open = Open::Nothing;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            std::mem::take(&mut open).close(blocks);
            continue;
        }
        if let Some((kind, rest)) = callout(line) {
            std::mem::take(&mut open).close(blocks);
            let body = if rest.is_empty() { vec![] } else { vec![rest] };
            open = Open::Callout(kind, body);
        } else if let Some((level, rest)) = heading(line) {
            std::mem::take(&mut open).close(blocks);
            blocks.push(Block::Heading {
                level,
                content: parse_inline(rest.trim()),
            });
        } else if line == "---" {
            std::mem::take(&mut open).close(blocks);
            blocks.push(Block::Rule);
        } else if let Some(item) = list_item(line) {
            match &mut open {
                Open::List(items) => items.push(item),
                _ => {
                    std::mem::take(&mut open).close(blocks);
                    open = Open::List(vec![item]);
                }
            }
        } else {
            match &mut open {
                Open::Paragraph(lines) | Open::Callout(_, lines) => lines.push(line),
                _ => {
                    std::mem::take(&mut open).close(blocks);
                    open = Open::Paragraph(vec![line]);
                }
            }
        }
    }
    open.close(blocks);
}

fn heading(line: &str) -> Option<(u8, &str)> {
    [(3, "### "), (2, "## "), (1, "# ")]
        .into_iter()
        .find_map(|(level, marker)| line.strip_prefix(marker).map(|rest| (level, rest)))
}

fn callout(line: &str) -> Option<(CalloutKind, &str)> {
    let mut rest = heading(line).map_or(line, |(_, rest)| rest);
    rest = rest.strip_prefix("**").unwrap_or(rest);
    CalloutKind::ALL.into_iter().find_map(|kind| {
        let marker = kind.marker();
        let prefix = rest.get(..marker.len())?;
        if !prefix.eq_ignore_ascii_case(marker) {
            return None;
        }
        let mut tail = &rest[marker.len()..];
        tail = tail.strip_prefix(':').unwrap_or(tail);
        tail = tail.strip_prefix("**").unwrap_or(tail);
        tail = tail.strip_prefix(':').unwrap_or(tail);
        Some((kind, tail.trim()))
    })
}

fn list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('*'))?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}

///////////////////////////////////////////// Inline ////////////////////////////////////////////

/// Splits one line into spans.
///
/// Scans left to right; at each position code spans win, then `**`/`__`,
/// then `*`/`_`. Underscores only open a span at a word boundary so
/// identifiers like `snake_case_name` stay literal. A marker without a
/// closing partner on the same line is literal text.
pub fn parse_inline(line: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut prev: Option<char> = None;
    let mut rest = line;
    while let Some(c) = rest.chars().next() {
        if let Some((span, consumed)) = match_span(rest, prev) {
            if !plain.is_empty() {
                spans.push(Inline::Text(std::mem::take(&mut plain)));
            }
            spans.push(span);
            prev = rest[..consumed].chars().next_back();
            rest = &rest[consumed..];
            continue;
        }
        plain.push(c);
        prev = Some(c);
        rest = &rest[c.len_utf8()..];
    }
    if !plain.is_empty() {
        spans.push(Inline::Text(plain));
    }
    spans
}

fn match_span(rest: &str, prev: Option<char>) -> Option<(Inline, usize)> {
    let at_boundary = !prev.is_some_and(char::is_alphanumeric);
    if rest.starts_with('`') {
        return delimited(rest, "`").map(|(body, n)| (Inline::Code(body), n));
    }
    let strong = if rest.starts_with("**") {
        delimited(rest, "**")
    } else if at_boundary && rest.starts_with("__") {
        delimited(rest, "__")
    } else {
        None
    };
    if let Some((body, n)) = strong {
        return Some((Inline::Strong(body), n));
    }
    let emphasis = if rest.starts_with('*') {
        delimited(rest, "*")
    } else if at_boundary && rest.starts_with('_') {
        delimited(rest, "_")
    } else {
        None
    };
    emphasis.map(|(body, n)| (Inline::Emphasis(body), n))
}

/// Finds the shortest non-empty `delim body delim` at the start of `rest`.
fn delimited(rest: &str, delim: &str) -> Option<(String, usize)> {
    let body = &rest[delim.len()..];
    let end = body.find(delim)?;
    if end == 0 {
        return None;
    }
    Some((body[..end].to_string(), end + 2 * delim.len()))
}
