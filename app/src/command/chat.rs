//! The interactive three-voice dialogue.

use conflusso_config::{BindingStore, Personas};
use conflusso_core::{
    AssistantProfile, AssistantsApi, Orchestrator, Responder, Sentinels, Session,
    StatefulResponder, StatelessResponder, SystemClock, TurnScheduler, provision,
};
use conflusso_providers::{GeminiProvider, OpenAiAssistants};
use conflusso_transcript::ConversationLog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::operator::StdioOperator;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    pub config_path: Option<PathBuf>,
}

/// Provisions the stateful persona, then runs the dialogue until the operator
/// leaves.
///
/// Missing credentials and provisioning failures abort here, before the loop
/// starts; once it runs only the operator ends it.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = super::load_config(input.config_path.as_deref())?;
        let roster = config.dialogue.roster();
        let sentinels = Sentinels::for_roster(&roster);
        let personas = Personas::load(&config);

        let mut assistants = OpenAiAssistants::new(config.providers.openai.api_key.clone());
        if let Some(base_url) = &config.providers.openai.base_url {
            assistants = assistants.with_base_url(base_url.clone());
        }
        let assistants: Arc<dyn AssistantsApi> = Arc::new(assistants);

        let binding_store = BindingStore::new(config.binding_path());
        let profile = AssistantProfile {
            name: config.dialogue.registered_title(),
            instructions: personas.agent_b,
            model: config.providers.openai.model.clone(),
        };
        let (binding, report) = provision(assistants.as_ref(), binding_store.load(), &profile)
            .await
            .map_err(|e| anyhow::anyhow!("{} could not be provisioned: {e}", roster.agent_b))?;
        binding_store.save(&binding)?;

        println!(
            "{} assistant {}: {}",
            roster.agent_b,
            if report.assistant_reused { "recuperato" } else { "creato" },
            binding.agent_id.as_deref().unwrap_or_default()
        );
        println!(
            "{} thread {}: {}",
            roster.agent_b,
            if report.thread_reused { "recuperato" } else { "creato" },
            binding.thread_id.as_deref().unwrap_or_default()
        );

        let gemini = GeminiProvider::new(config.providers.gemini.api_key.clone())
            .with_default_model(config.providers.gemini.model.clone());
        let agent_a: Arc<dyn Responder> = Arc::new(StatelessResponder::new(
            gemini,
            roster.agent_a.clone(),
            personas.agent_a,
            sentinels.stateless_error.clone(),
        ));

        let clock = Arc::new(SystemClock);
        let agent_b: Arc<dyn Responder> = Arc::new(
            StatefulResponder::new(assistants, binding, clock.clone(), sentinels)
                .with_poll_policy(config.dialogue.poll_policy()),
        );

        let log_path = config.log_path();
        info!("Conversation log: {}", log_path.display());

        let session = Session {
            scheduler: TurnScheduler::new(config.dialogue.address_aliases())?,
            settings: config.dialogue.settings(),
            roster,
            agent_a,
            agent_b,
            transcript: Arc::new(ConversationLog::new(log_path)),
            clock,
        };

        let summary = Orchestrator::new(session, StdioOperator::new()).run().await?;
        info!("Session closed with {} new entries", summary.turns_logged);
        Ok(())
    }
}
