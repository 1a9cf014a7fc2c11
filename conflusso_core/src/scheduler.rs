//! Who speaks next.
//!
//! The operator hands the floor to the stateless persona unless the line opens
//! by addressing the stateful persona by name (`"elayra, ..."`,
//! `"Elayra: ..."`). The personas then alternate back to the operator:
//! `AgentA -> AgentB -> Human`.

use regex::Regex;

use crate::Speaker;

/// Outcome of routing one operator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub next: Speaker,
    /// Text to forward to `next`, with any address prefix removed.
    pub payload: String,
}

#[derive(Debug, Clone)]
pub struct TurnScheduler {
    /// `None` when no alias is configured: nothing addresses `AgentB`.
    address: Option<Regex>,
}

impl TurnScheduler {
    /// Build a scheduler that recognises any of `aliases` as an address to
    /// `AgentB`. Matching is case-insensitive; blank aliases are ignored.
    pub fn new<I, S>(aliases: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = aliases
            .into_iter()
            .map(|a| a.as_ref().trim().to_string())
            .filter(|a| !a.is_empty())
            .map(|a| regex::escape(&a))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { address: None });
        }

        let pattern = format!(r"(?i)^\s*(?:{})(?:[\s,:]+|$)", alternatives.join("|"));
        Ok(Self {
            address: Some(Regex::new(&pattern)?),
        })
    }

    /// Whether `raw` opens by addressing `AgentB`.
    #[must_use]
    pub fn addresses_agent_b(&self, raw: &str) -> bool {
        self.address
            .as_ref()
            .is_some_and(|re| re.is_match(raw.trim()))
    }

    #[must_use]
    pub fn next_speaker(&self, current: Speaker, raw: &str) -> Speaker {
        match current {
            Speaker::Human if self.addresses_agent_b(raw) => Speaker::AgentB,
            Speaker::Human => Speaker::AgentA,
            Speaker::AgentA => Speaker::AgentB,
            Speaker::AgentB => Speaker::Human,
        }
    }

    /// Transition and payload in one step. Only an explicit address has its
    /// prefix stripped; every other line is forwarded trimmed but intact.
    #[must_use]
    pub fn route(&self, current: Speaker, raw: &str) -> Routing {
        let next = self.next_speaker(current, raw);
        let trimmed = raw.trim();
        let payload = match &self.address {
            Some(re) if current == Speaker::Human && next == Speaker::AgentB => {
                re.replace(trimmed, "").trim().to_string()
            }
            _ => trimmed.to_string(),
        };
        Routing { next, payload }
    }
}
