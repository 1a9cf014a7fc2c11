#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Plain-text conversation log.
//!
//! The log is one human-readable file of blocks separated by a blank line:
//!
//! ```text
//! [2025-03-01 09:00:00] Lumen: Benvenuta nel Conflusso.
//!
//! [2025-03-01 09:00:12] Lumira: elayra, ci sei?
//! ```
//!
//! Reading is best effort: a block that does not start with the
//! `[timestamp] speaker: ` header is skipped rather than failing the read.

mod format;
mod log;

pub use format::{TIMESTAMP_FORMAT, format_entry, parse_entries, sanitize_message};
pub use log::ConversationLog;
