//! Text layout of a log entry.

use conflusso_core::LogEntry;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// `chrono` layout of the bracketed timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static ENTRY_HEADER: OnceLock<Regex> = OnceLock::new();
static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

/// `[timestamp] speaker: message`, where an empty message may lose its trailing space.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn entry_header() -> &'static Regex {
    ENTRY_HEADER.get_or_init(|| {
        Regex::new(r"^\[([^\]\n]*)\] ([^\n]*?):(?: |$)((?s:.*))$")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn blank_lines() -> &'static Regex {
    BLANK_LINES.get_or_init(|| {
        Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)*")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Collapse blank lines so a message can never contain the block separator.
#[must_use]
pub fn sanitize_message(message: &str) -> String {
    let unified = message.replace("\r\n", "\n");
    blank_lines()
        .replace_all(unified.trim(), "\n")
        .into_owned()
}

/// Render one block, separator included.
#[must_use]
pub fn format_entry(timestamp: &str, speaker: &str, message: &str) -> String {
    let speaker = speaker.replace(['\r', '\n'], " ");
    format!("[{timestamp}] {speaker}: {}\n\n", sanitize_message(message))
}

/// Parse the whole log text into entries, dropping malformed blocks.
///
/// Blocks are split before any trimming so an entry with an empty message
/// keeps its header intact even when it is the last one in the file.
#[must_use]
pub fn parse_entries(content: &str) -> Vec<LogEntry> {
    let unified = content.replace("\r\n", "\n");
    unified
        .split("\n\n")
        .map(|block| block.trim_start().trim_end_matches('\n'))
        .filter(|block| !block.trim().is_empty())
        .filter_map(|block| {
            let parsed = entry_header()
                .captures(block)
                .map(|caps| LogEntry::new(&caps[1], &caps[2], caps[3].trim_end()));
            if parsed.is_none() {
                debug!("Skipping malformed log block: {:?}", block.lines().next());
            }
            parsed
        })
        .collect()
}
