//! Validate-or-recreate of the stateful persona's assistant and thread.

use thiserror::Error;
use tracing::{info, warn};

use crate::{AssistantBinding, AssistantsApi};

/// What to register when the stored assistant is missing or stale.
#[derive(Debug, Clone)]
pub struct AssistantProfile {
    pub name: String,
    pub instructions: String,
    pub model: String,
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to create assistant: {0:#}")]
    CreateAssistant(anyhow::Error),

    #[error("failed to create thread: {0:#}")]
    CreateThread(anyhow::Error),
}

/// Whether each identifier was reused from the stored binding or created anew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
    pub assistant_reused: bool,
    pub thread_reused: bool,
}

/// Bring `binding` to a state where both ids point at live remote objects.
///
/// A stored id that fails validation for any reason is replaced. The thread is
/// validated independently of the assistant but is always created for the
/// assistant id that survives this call. Persisting the result is left to the
/// caller.
pub async fn provision(
    api: &dyn AssistantsApi,
    mut binding: AssistantBinding,
    profile: &AssistantProfile,
) -> Result<(AssistantBinding, ProvisionReport), ProvisionError> {
    let live_agent = match binding.agent_id.take() {
        Some(id) => validate(&id, api.retrieve_assistant(&id).await, "assistant").then_some(id),
        None => None,
    };
    let (agent_id, assistant_reused) = match live_agent {
        Some(id) => (id, true),
        None => {
            info!("Creating assistant {:?} on {}", profile.name, profile.model);
            let id = api
                .create_assistant(&profile.name, &profile.instructions, &profile.model)
                .await
                .map_err(ProvisionError::CreateAssistant)?;
            info!("Created assistant {id}");
            (id, false)
        }
    };

    let live_thread = match binding.thread_id.take() {
        Some(id) => validate(&id, api.retrieve_thread(&id).await, "thread").then_some(id),
        None => None,
    };
    let (thread_id, thread_reused) = match live_thread {
        Some(id) => (id, true),
        None => {
            info!("Creating thread for assistant {agent_id}");
            let id = api
                .create_thread(&agent_id)
                .await
                .map_err(ProvisionError::CreateThread)?;
            info!("Created thread {id}");
            (id, false)
        }
    };

    binding.agent_id = Some(agent_id);
    binding.thread_id = Some(thread_id);
    Ok((
        binding,
        ProvisionReport {
            assistant_reused,
            thread_reused,
        },
    ))
}

fn validate(id: &str, lookup: anyhow::Result<()>, kind: &str) -> bool {
    match lookup {
        Ok(()) => {
            info!("Reusing {kind} {id}");
            true
        }
        Err(e) => {
            warn!("Stored {kind} {id} is no longer valid: {e:#}");
            false
        }
    }
}
