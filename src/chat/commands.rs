//! Slash command parsing for the tutor application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing students to control the session without sending messages
//! to the tutor.

use crate::catalog::{CloudFocus, MODULES};

/// A parsed chat command.
///
/// These commands control the session and are not sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start the session, optionally opening with a topic.
    Start(Option<String>),

    /// Clear the transcript and start over.
    Reset,

    /// Change the cloud focus for subsequent prompts.
    Cloud(CloudFocus),

    /// Study a sidebar module, by zero-based index into [`MODULES`].
    Module(usize),

    /// Pick a learning path offered by the tutor, `'A'` to `'E'`.
    Path(char),

    /// List topic suggestions, optionally filtered.
    Topics(Option<String>),

    /// Show the estimated learning phase.
    Phase,

    /// Export the transcript as an HTML page.
    Export(String),

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use stratus_tutor::chat::{ChatCommand, parse_command};
/// assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
/// assert_eq!(parse_command("/path b"), Some(ChatCommand::Path('B')));
/// assert!(parse_command("What is a VPC?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "start" => ChatCommand::Start(argument.map(|s| s.to_string())),
        "reset" | "clear" => ChatCommand::Reset,
        "cloud" => match argument {
            Some(name) => match name.parse::<CloudFocus>() {
                Ok(focus) => ChatCommand::Cloud(focus),
                Err(err) => ChatCommand::Invalid(format!("/cloud: {err}")),
            },
            None => ChatCommand::Invalid(
                "/cloud requires one of multi, aws, azure or gcp".to_string(),
            ),
        },
        "module" => parse_module(argument),
        "path" => parse_path(argument),
        "topics" | "search" => ChatCommand::Topics(argument.map(|s| s.to_string())),
        "phase" => ChatCommand::Phase,
        "export" => match argument {
            Some(path) => ChatCommand::Export(path.to_string()),
            None => ChatCommand::Invalid("/export requires a file path".to_string()),
        },
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_module(argument: Option<&str>) -> ChatCommand {
    let expects = format!("/module expects a number from 1 to {}", MODULES.len());
    match argument.map(str::parse::<usize>) {
        Some(Ok(number)) if (1..=MODULES.len()).contains(&number) => {
            ChatCommand::Module(number - 1)
        }
        Some(_) => ChatCommand::Invalid(expects),
        None => ChatCommand::Invalid(format!(
            "/module requires a number from 1 to {}",
            MODULES.len()
        )),
    }
}

fn parse_path(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid("/path requires a letter from A to E".to_string());
    };
    let arg = arg
        .strip_prefix("path ")
        .or_else(|| arg.strip_prefix("Path "))
        .unwrap_or(arg)
        .trim();
    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if ('A'..='E').contains(&letter.to_ascii_uppercase()) => {
            ChatCommand::Path(letter.to_ascii_uppercase())
        }
        _ => ChatCommand::Invalid("/path expects a letter from A to E".to_string()),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /start [topic]         Start the session (topic: 1-4, a card title, or text)
  /reset                 Clear the transcript and start a new session
  /cloud <name>          Focus on multi, aws, azure or gcp
  /module <1-4>          Study a learning module in depth
  /path <A-E>            Choose a learning path offered by the tutor
  /topics [query]        List topic suggestions (optionally filtered)
  /phase                 Show the current learning phase
  /export <file.html>    Save the transcript as an HTML page
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the tutor"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_start() {
        assert_eq!(parse_command("/start"), Some(ChatCommand::Start(None)));
        assert_eq!(
            parse_command("/start 2"),
            Some(ChatCommand::Start(Some("2".to_string())))
        );
    }

    #[test]
    fn parse_reset() {
        assert_eq!(parse_command("/reset"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Reset));
        assert_eq!(parse_command("/RESET"), Some(ChatCommand::Reset));
    }

    #[test]
    fn parse_cloud() {
        assert_eq!(
            parse_command("/cloud aws"),
            Some(ChatCommand::Cloud(CloudFocus::Aws))
        );
        assert_eq!(
            parse_command("/cloud   GCP  "),
            Some(ChatCommand::Cloud(CloudFocus::Gcp))
        );
        assert!(matches!(
            parse_command("/cloud oracle"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("oracle")
        ));
        assert!(matches!(
            parse_command("/cloud"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_module_command() {
        assert_eq!(parse_command("/module 1"), Some(ChatCommand::Module(0)));
        assert_eq!(parse_command("/module 4"), Some(ChatCommand::Module(3)));
        assert!(matches!(
            parse_command("/module 5"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("1 to 4")
        ));
        assert!(matches!(
            parse_command("/module zero"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/module"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_path_command() {
        assert_eq!(parse_command("/path A"), Some(ChatCommand::Path('A')));
        assert_eq!(parse_command("/path e"), Some(ChatCommand::Path('E')));
        assert_eq!(parse_command("/path Path C"), Some(ChatCommand::Path('C')));
        assert!(matches!(
            parse_command("/path F"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("A to E")
        ));
        assert!(matches!(
            parse_command("/path AB"),
            Some(ChatCommand::Invalid(_))
        ));
        assert!(matches!(
            parse_command("/path"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_topics() {
        assert_eq!(parse_command("/topics"), Some(ChatCommand::Topics(None)));
        assert_eq!(
            parse_command("/topics lambda vs"),
            Some(ChatCommand::Topics(Some("lambda vs".to_string())))
        );
    }

    #[test]
    fn parse_export() {
        assert_eq!(
            parse_command("/export notes.html"),
            Some(ChatCommand::Export("notes.html".to_string()))
        );
        assert!(matches!(
            parse_command("/export"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_info_commands() {
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/phase"), Some(ChatCommand::Phase));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What is S3?"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/model gemini"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for command in [
            "/start", "/reset", "/cloud", "/module", "/path", "/topics", "/phase", "/export", "/stats",
            "/help", "/quit",
        ] {
            assert!(help.contains(command), "missing {command}");
        }
    }
}
