//! Tutor markdown: a deliberately small dialect.
//!
//! Messages are parsed into a [`Document`] and rendered either as HTML with
//! the tutor's presentation classes or as terminal text. Parsing never fails;
//! anything unrecognized is kept as literal text.
//!
//! ```rust
//! use stratus_tutor::markdown;
//!
//! let html = markdown::to_html("**Concept overview:** Queues decouple producers.");
//! assert!(html.contains("Core Insight"));
//! ```

use std::sync::LazyLock;

use regex::Regex;

mod ansi;
mod html;
mod parse;

pub use html::escape;
pub use parse::{
    Block, CalloutKind, Document, FENCE, Fence, FenceKind, Inline, has_open_fence, is_diagram,
    parse_inline,
};

pub(crate) use ansi::{ANSI_BOLD, ANSI_CYAN, ANSI_DIM, ANSI_RED, ANSI_RESET};

static PATH_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\*\*)?Path [A-E]:[^*|\n]*").expect("path option pattern is valid")
});

/// Parses message text.
pub fn parse(text: &str) -> Document {
    Document::parse(text)
}

/// Converts message text to HTML.
pub fn to_html(text: &str) -> String {
    Document::parse(text).to_html()
}

/// Converts message text to terminal output.
pub fn to_ansi(text: &str, use_color: bool) -> String {
    Document::parse(text).to_ansi(use_color)
}

/// Finds the learning paths a message offers, e.g. `["Path A", "Path B"]`.
///
/// Duplicates are dropped; order of first appearance is kept.
pub fn path_options(text: &str) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for found in PATH_OPTION.find_iter(text) {
        let cleaned = found.as_str().replace("**", "");
        let label = cleaned.split(':').next().unwrap_or_default().trim();
        if !label.is_empty() && !options.iter().any(|option| option == label) {
            options.push(label.to_string());
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_options_in_order() {
        let text = "Choose one:\n**Path A: Serverless**\n**Path B: Containers**\nPath C: VMs";
        assert_eq!(path_options(text), vec!["Path A", "Path B", "Path C"]);
    }

    #[test]
    fn path_options_deduplicated() {
        let text = "Path B: x\nPath A: y\nPath B: again";
        assert_eq!(path_options(text), vec!["Path B", "Path A"]);
    }

    #[test]
    fn path_options_ignore_other_letters() {
        assert!(path_options("Path F: nope\npath a: lower").is_empty());
    }

    #[test]
    fn convenience_wrappers() {
        assert_eq!(to_html(""), "");
        assert_eq!(to_ansi("hi", false), "hi");
        assert_eq!(parse("- a").blocks.len(), 1);
    }
}
