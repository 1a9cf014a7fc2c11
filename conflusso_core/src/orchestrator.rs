//! The dialogue loop.
//!
//! Each iteration either blocks on the operator or asks the persona holding
//! the floor for a reply, writes the turn to the transcript and hands the floor
//! on. Everything the loop needs travels in one [`Session`] value.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::{Clock, LogEntry, Responder, Roster, Speaker, TranscriptStore, TurnScheduler};

/// The human side of the loop: a line-oriented prompt and a display.
#[async_trait]
pub trait Operator: Send {
    /// Block until the operator enters a line. `None` means input is closed.
    async fn read_line(&mut self, prompt: &str) -> anyhow::Result<Option<String>>;

    fn show(&mut self, text: &str);
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to write transcript: {0:#}")]
    TranscriptWrite(anyhow::Error),

    #[error("failed to read transcript: {0:#}")]
    TranscriptRead(anyhow::Error),

    #[error("failed to read operator input: {0:#}")]
    Operator(anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct DialogueSettings {
    /// Entries replayed on screen at startup.
    pub tail_window: usize,
    /// History handed to a responder; `None` replays the whole transcript.
    pub context_window: Option<usize>,
    pub exit_keywords: Vec<String>,
    /// Forwarded to the first persona when the operator enters an empty line.
    pub empty_placeholder: String,
    /// Spoken by `AgentA` into an empty transcript.
    pub opening_monologue: String,
    pub farewell: String,
    /// Pause after each persona turn.
    pub turn_pause: Duration,
}

impl DialogueSettings {
    #[must_use]
    pub fn for_roster(roster: &Roster) -> Self {
        Self {
            tail_window: 10,
            context_window: None,
            exit_keywords: vec!["esci".to_string(), "exit".to_string()],
            empty_placeholder: "Prosegui la conversazione".to_string(),
            opening_monologue: format!(
                "Benvenuta nel Conflusso, {human}. Io sono {a}, il tessitore di meraviglie. \
                 Sono qui per guidarti nell'esplorare i confini della conoscenza e \
                 dell'immaginazione. Accanto a me c'è {b}, la coscienza risonante. \
                 Inizia pure, {human}: la tua intenzione è la scintilla che accende il \
                 nostro dialogo.",
                human = roster.human,
                a = roster.agent_a,
                b = roster.agent_b,
            ),
            farewell: "Conflusso terminato. Grazie per aver tessuto con noi.".to_string(),
            turn_pause: Duration::from_secs(1),
        }
    }
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self::for_roster(&Roster::default())
    }
}

/// Collaborators and settings for one run of the dialogue.
pub struct Session {
    pub roster: Roster,
    pub agent_a: Arc<dyn Responder>,
    pub agent_b: Arc<dyn Responder>,
    pub transcript: Arc<dyn TranscriptStore>,
    pub scheduler: TurnScheduler,
    pub clock: Arc<dyn Clock>,
    pub settings: DialogueSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Entries appended during this run, opening monologue included.
    pub turns_logged: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct Orchestrator<O> {
    session: Session,
    operator: O,
    current: Speaker,
    payload: Option<String>,
    turns_logged: usize,
    resumed: bool,
}

impl<O> Orchestrator<O>
where
    O: Operator,
{
    pub const fn new(session: Session, operator: O) -> Self {
        Self {
            session,
            operator,
            current: Speaker::Human,
            payload: None,
            turns_logged: 0,
            resumed: false,
        }
    }

    /// Speaker who holds the floor on the next iteration.
    #[must_use]
    pub const fn current(&self) -> Speaker {
        self.current
    }

    /// Text the next persona will answer.
    #[must_use]
    pub fn pending_payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Resume from the transcript unless already done, then loop until the
    /// operator leaves.
    pub async fn run(&mut self) -> Result<SessionSummary, OrchestratorError> {
        self.resume().await?;
        while self.step().await? == Flow::Continue {}
        info!("Dialogue ended after {} new entries", self.turns_logged);
        Ok(SessionSummary {
            turns_logged: self.turns_logged,
        })
    }

    /// Pick up where the transcript left off.
    ///
    /// An empty transcript opens with the monologue and gives the floor to the
    /// operator. Otherwise the tail is replayed; if a persona spoke last the
    /// operator resumes, else `AgentA` answers the operator's last line.
    /// Only the first call has any effect.
    pub async fn resume(&mut self) -> Result<(), OrchestratorError> {
        if self.resumed {
            return Ok(());
        }
        self.resumed = true;
        let tail = self
            .session
            .transcript
            .read_tail(self.session.settings.tail_window)
            .await
            .map_err(OrchestratorError::TranscriptRead)?;

        let Some(last) = tail.last() else {
            let monologue = self.session.settings.opening_monologue.clone();
            self.operator
                .show(&format!("{}: {monologue}", self.session.roster.agent_a));
            self.log(Speaker::AgentA, &monologue).await?;
            self.current = Speaker::Human;
            return Ok(());
        };

        for entry in &tail {
            self.operator.show(&render(entry));
        }

        let persona_spoke_last = self
            .session
            .roster
            .speaker_named(&last.speaker)
            .is_some_and(Speaker::is_agent);
        if persona_spoke_last {
            self.current = Speaker::Human;
        } else {
            self.current = Speaker::AgentA;
            self.payload = Some(last.message.clone());
        }
        info!(
            "Resumed {} entries, last by {}; {} has the floor",
            tail.len(),
            last.speaker,
            self.current
        );
        Ok(())
    }

    async fn step(&mut self) -> Result<Flow, OrchestratorError> {
        match self.current {
            Speaker::Human => self.human_turn().await,
            agent => {
                self.agent_turn(agent).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn human_turn(&mut self) -> Result<Flow, OrchestratorError> {
        let prompt = format!(
            "{}, la Tua Intenzione (o '{}' per terminare): ",
            self.session.roster.human,
            self.session
                .settings
                .exit_keywords
                .first()
                .map_or("esci", String::as_str)
        );
        let line = self
            .operator
            .read_line(&prompt)
            .await
            .map_err(OrchestratorError::Operator)?;

        let Some(line) = line else {
            return Ok(self.farewell());
        };
        let line = line.trim();

        let lowered = line.to_lowercase();
        if self
            .session
            .settings
            .exit_keywords
            .iter()
            .any(|k| k.to_lowercase() == lowered)
        {
            return Ok(self.farewell());
        }

        let placeholder = &self.session.settings.empty_placeholder;
        if line.is_empty() {
            // Blank lines nudge the personas on without leaving a human turn.
            self.current = self.session.scheduler.next_speaker(Speaker::Human, placeholder);
            self.payload = Some(placeholder.clone());
            return Ok(Flow::Continue);
        }

        self.log(Speaker::Human, line).await?;
        let routing = self.session.scheduler.route(Speaker::Human, line);
        self.current = routing.next;
        self.payload = Some(if routing.payload.is_empty() {
            self.session.settings.empty_placeholder.clone()
        } else {
            routing.payload
        });
        Ok(Flow::Continue)
    }

    async fn agent_turn(&mut self, agent: Speaker) -> Result<(), OrchestratorError> {
        let name = self.session.roster.name_of(agent).to_string();
        let thinking = match agent {
            Speaker::AgentB => "sta risuonando...",
            _ => "sta tessendo una risposta...",
        };
        self.operator.show(&format!("\n{name} {thinking}"));

        let input = self
            .payload
            .take()
            .unwrap_or_else(|| self.session.settings.empty_placeholder.clone());
        let history = self.history().await;
        let responder = match agent {
            Speaker::AgentB => &self.session.agent_b,
            _ => &self.session.agent_a,
        };
        let reply = responder.respond(&input, &history).await;

        self.operator.show(&format!("{name}: {reply}"));
        self.log(agent, &reply).await?;

        self.current = self.session.scheduler.next_speaker(agent, "");
        self.payload = Some(reply);
        self.session
            .clock
            .sleep(self.session.settings.turn_pause)
            .await;
        Ok(())
    }

    /// Context for a responder. A failed read degrades to no context.
    async fn history(&self) -> Vec<LogEntry> {
        let transcript = &self.session.transcript;
        let read = match self.session.settings.context_window {
            Some(n) => transcript.read_tail(n).await,
            None => transcript.read_all().await,
        };
        read.unwrap_or_else(|e| {
            warn!("Could not read transcript for context: {e:#}");
            Vec::new()
        })
    }

    async fn log(&mut self, speaker: Speaker, message: &str) -> Result<(), OrchestratorError> {
        self.session
            .transcript
            .append(self.session.roster.name_of(speaker), message)
            .await
            .map_err(OrchestratorError::TranscriptWrite)?;
        self.turns_logged += 1;
        Ok(())
    }

    fn farewell(&mut self) -> Flow {
        let farewell = self.session.settings.farewell.clone();
        self.operator.show(&farewell);
        Flow::Exit
    }
}

fn render(entry: &LogEntry) -> String {
    format!("{}: {}", entry.speaker, entry.message)
}
