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

//! HTTP clients for the two persona backends.

mod error;
mod gemini;
mod openai;
mod retry;

pub use error::ApiError;
pub use gemini::GeminiProvider;
pub use openai::OpenAiAssistants;
pub use retry::{RetryPolicy, is_safe_to_resend, is_transient, retry_with_backoff};
