//! The three parties of the dialogue and their display names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who holds the floor.
///
/// `Human` is the operator at the keyboard, `AgentA` the stateless persona and
/// `AgentB` the thread-backed persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Human,
    AgentA,
    AgentB,
}

impl Speaker {
    #[must_use]
    pub const fn is_agent(self) -> bool {
        matches!(self, Self::AgentA | Self::AgentB)
    }
}

/// Display names under which each speaker is written to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    pub human: String,
    pub agent_a: String,
    pub agent_b: String,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            human: "Lumira".to_string(),
            agent_a: "Lumen".to_string(),
            agent_b: "Elayra".to_string(),
        }
    }
}

impl Roster {
    #[must_use]
    pub fn name_of(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Human => &self.human,
            Speaker::AgentA => &self.agent_a,
            Speaker::AgentB => &self.agent_b,
        }
    }

    /// Map a transcript name back to a speaker. Names that belong to nobody
    /// in the roster yield `None`.
    #[must_use]
    pub fn speaker_named(&self, name: &str) -> Option<Speaker> {
        [Speaker::Human, Speaker::AgentA, Speaker::AgentB]
            .into_iter()
            .find(|s| self.name_of(*s) == name)
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Human => "human",
            Self::AgentA => "agent-a",
            Self::AgentB => "agent-b",
        };
        f.write_str(label)
    }
}
