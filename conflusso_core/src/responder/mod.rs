//! The two personas behind one capability.
//!
//! The orchestrator only ever asks a [`Responder`] for text; whether the
//! backend replays the whole context or keeps its own thread is hidden here.

use async_trait::async_trait;

use crate::{LogEntry, Roster};

mod stateful;
mod stateless;

pub use stateful::{PollPolicy, StatefulResponder};
pub use stateless::StatelessResponder;

#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce the persona's reply to `input` given the dialogue so far.
    ///
    /// Never fails: backend trouble is reported through `tracing` and turned
    /// into one of the [`Sentinels`].
    async fn respond(&self, input: &str, history: &[LogEntry]) -> String;
}

/// Fixed replies that stand in for a persona when its backend fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    pub stateless_error: String,
    pub stateful_error: String,
    pub stateful_timeout: String,
    pub stateful_no_reply: String,
}

impl Sentinels {
    #[must_use]
    pub fn for_roster(roster: &Roster) -> Self {
        Self {
            stateless_error: format!(
                "Errore nella generazione della risposta di {}. Riprova più tardi.",
                roster.agent_a
            ),
            stateful_error: format!(
                "Errore nella generazione della risposta di {}.",
                roster.agent_b
            ),
            stateful_timeout: format!("Timeout nella risposta di {}.", roster.agent_b),
            stateful_no_reply: format!("Nessuna risposta testuale da {}.", roster.agent_b),
        }
    }
}

impl Default for Sentinels {
    fn default() -> Self {
        Self::for_roster(&Roster::default())
    }
}
