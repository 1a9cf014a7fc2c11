use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::{AssistantBinding, AssistantsApi, Clock, LogEntry, Responder, Role, RunStatus, Sentinels};

/// How long and how often to poll a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            deadline: Duration::from_secs(10),
        }
    }
}

enum Outcome {
    Reply(String),
    TimedOut,
    RunFailed(RunStatus),
    NoText,
}

/// Persona backed by a remote thread.
///
/// Each call posts the input to the bound thread, starts a run against the
/// bound assistant and polls it on the injected clock until it completes, fails
/// or the deadline passes.
pub struct StatefulResponder {
    api: Arc<dyn AssistantsApi>,
    binding: AssistantBinding,
    clock: Arc<dyn Clock>,
    poll: PollPolicy,
    sentinels: Sentinels,
}

impl StatefulResponder {
    #[must_use]
    pub fn new(
        api: Arc<dyn AssistantsApi>,
        binding: AssistantBinding,
        clock: Arc<dyn Clock>,
        sentinels: Sentinels,
    ) -> Self {
        Self {
            api,
            binding,
            clock,
            poll: PollPolicy::default(),
            sentinels,
        }
    }

    #[must_use]
    pub const fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn exchange(&self, input: &str) -> anyhow::Result<Outcome> {
        let (Some(agent_id), Some(thread_id)) =
            (self.binding.agent_id.as_deref(), self.binding.thread_id.as_deref())
        else {
            anyhow::bail!("no provisioned assistant/thread binding");
        };

        self.api.add_user_message(thread_id, input).await?;
        let mut run = self.api.create_run(thread_id, agent_id).await?;
        info!("Started run {} on thread {thread_id}", run.id);

        let started = self.clock.now();
        let mut polls = 0_usize;
        loop {
            match run.status {
                RunStatus::Completed => break,
                status if status.is_failure() => return Ok(Outcome::RunFailed(status)),
                _ => {}
            }
            if self.clock.now().duration_since(started) >= self.poll.deadline {
                return Ok(Outcome::TimedOut);
            }
            self.clock.sleep(self.poll.interval).await;
            run = self.api.retrieve_run(thread_id, &run.id).await?;
            polls += 1;
            debug!("Run {} poll {polls}: {:?}", run.id, run.status);
        }

        let messages = self.api.list_messages(thread_id).await?;
        let reply = messages
            .into_iter()
            .filter(|m| m.role == Role::Assistant)
            .find_map(|m| m.texts.into_iter().find(|t| !t.trim().is_empty()));

        Ok(reply.map_or(Outcome::NoText, Outcome::Reply))
    }
}

#[async_trait]
impl Responder for StatefulResponder {
    async fn respond(&self, input: &str, _history: &[LogEntry]) -> String {
        match self.exchange(input).await {
            Ok(Outcome::Reply(text)) => text,
            Ok(Outcome::TimedOut) => {
                warn!("Run did not complete within {:?}", self.poll.deadline);
                self.sentinels.stateful_timeout.clone()
            }
            Ok(Outcome::RunFailed(status)) => {
                error!("Run ended with status {status:?}");
                self.sentinels.stateful_error.clone()
            }
            Ok(Outcome::NoText) => self.sentinels.stateful_no_reply.clone(),
            Err(e) => {
                error!("Assistant exchange failed: {e:#}");
                self.sentinels.stateful_error.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ManualClock, Run, ThreadMessage};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeThread {
        statuses: Mutex<VecDeque<RunStatus>>,
        messages: Vec<ThreadMessage>,
        polls: AtomicUsize,
        posted: Mutex<Vec<String>>,
        fail_post: bool,
    }

    impl FakeThread {
        fn new(statuses: &[RunStatus], messages: Vec<ThreadMessage>) -> Self {
            Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                messages,
                polls: AtomicUsize::new(0),
                posted: Mutex::new(Vec::new()),
                fail_post: false,
            }
        }

        fn next_status(&self) -> RunStatus {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().copied().unwrap_or(RunStatus::Queued)
            }
        }
    }

    #[async_trait]
    impl AssistantsApi for FakeThread {
        async fn retrieve_assistant(&self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn create_assistant(&self, _: &str, _: &str, _: &str) -> anyhow::Result<String> {
            Ok("asst_new".to_string())
        }
        async fn retrieve_thread(&self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
        async fn create_thread(&self, _: &str) -> anyhow::Result<String> {
            Ok("thread_new".to_string())
        }
        async fn add_user_message(&self, _: &str, content: &str) -> anyhow::Result<()> {
            if self.fail_post {
                anyhow::bail!("connection reset");
            }
            self.posted.lock().unwrap().push(content.to_string());
            Ok(())
        }
        async fn create_run(&self, _: &str, _: &str) -> anyhow::Result<Run> {
            Ok(Run {
                id: "run_1".to_string(),
                status: self.next_status(),
            })
        }
        async fn retrieve_run(&self, _: &str, run_id: &str) -> anyhow::Result<Run> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(Run {
                id: run_id.to_string(),
                status: self.next_status(),
            })
        }
        async fn list_messages(&self, _: &str) -> anyhow::Result<Vec<ThreadMessage>> {
            Ok(self.messages.clone())
        }
    }

    fn bound() -> AssistantBinding {
        AssistantBinding {
            agent_id: Some("asst_1".to_string()),
            thread_id: Some("thread_1".to_string()),
        }
    }

    fn said(role: Role, text: &str) -> ThreadMessage {
        ThreadMessage {
            role,
            texts: vec![text.to_string()],
        }
    }

    fn responder(api: &Arc<FakeThread>, clock: &Arc<ManualClock>) -> StatefulResponder {
        StatefulResponder::new(api.clone(), bound(), clock.clone(), Sentinels::default())
    }

    #[tokio::test]
    async fn completes_on_third_poll() {
        let api = Arc::new(FakeThread::new(
            &[
                RunStatus::Queued,
                RunStatus::InProgress,
                RunStatus::InProgress,
                RunStatus::Completed,
            ],
            vec![
                said(Role::User, "tell me something"),
                said(Role::Assistant, "newest reply"),
                said(Role::Assistant, "older reply"),
            ],
        ));
        let clock = Arc::new(ManualClock::new());

        let reply = responder(&api, &clock).respond("tell me something", &[]).await;

        assert_eq!(reply, "newest reply");
        assert_eq!(api.polls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.elapsed(), Duration::from_millis(1500));
        assert_eq!(*api.posted.lock().unwrap(), vec!["tell me something"]);
    }

    #[tokio::test]
    async fn never_completing_run_times_out() {
        let api = Arc::new(FakeThread::new(&[RunStatus::InProgress], Vec::new()));
        let clock = Arc::new(ManualClock::new());

        let reply = responder(&api, &clock).respond("hello", &[]).await;

        assert_eq!(reply, Sentinels::default().stateful_timeout);
        assert_eq!(api.polls.load(Ordering::SeqCst), 20);
        assert_eq!(clock.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn failed_run_is_generation_error() {
        let api = Arc::new(FakeThread::new(
            &[RunStatus::Queued, RunStatus::Failed],
            vec![said(Role::Assistant, "unused")],
        ));
        let clock = Arc::new(ManualClock::new());

        let reply = responder(&api, &clock).respond("hello", &[]).await;

        assert_eq!(reply, Sentinels::default().stateful_error);
        assert_eq!(api.polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skips_user_messages_when_picking_reply() {
        let api = Arc::new(FakeThread::new(
            &[RunStatus::Completed],
            vec![
                said(Role::User, "echo"),
                ThreadMessage {
                    role: Role::Assistant,
                    texts: Vec::new(),
                },
                said(Role::Assistant, "with text"),
            ],
        ));
        let clock = Arc::new(ManualClock::new());

        let reply = responder(&api, &clock).respond("hello", &[]).await;

        assert_eq!(reply, "with text");
        assert_eq!(api.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_assistant_text_is_no_reply() {
        let api = Arc::new(FakeThread::new(
            &[RunStatus::Completed],
            vec![said(Role::User, "hello")],
        ));
        let clock = Arc::new(ManualClock::new());

        let reply = responder(&api, &clock).respond("hello", &[]).await;

        assert_eq!(reply, Sentinels::default().stateful_no_reply);
    }

    #[tokio::test]
    async fn blank_assistant_text_is_no_reply() {
        let api = Arc::new(FakeThread::new(
            &[RunStatus::Completed],
            vec![said(Role::Assistant, "   "), said(Role::User, "hello")],
        ));
        let clock = Arc::new(ManualClock::new());

        let reply = responder(&api, &clock).respond("hello", &[]).await;

        assert_eq!(reply, Sentinels::default().stateful_no_reply);
    }

    #[tokio::test]
    async fn transport_error_is_generation_error() {
        let mut fake = FakeThread::new(&[RunStatus::Completed], Vec::new());
        fake.fail_post = true;
        let api = Arc::new(fake);
        let clock = Arc::new(ManualClock::new());

        let reply = responder(&api, &clock).respond("hello", &[]).await;

        assert_eq!(reply, Sentinels::default().stateful_error);
    }

    #[tokio::test]
    async fn unbound_responder_is_generation_error() {
        let api = Arc::new(FakeThread::new(&[RunStatus::Completed], Vec::new()));
        let clock = Arc::new(ManualClock::new());
        let responder = StatefulResponder::new(
            api.clone(),
            AssistantBinding::default(),
            clock,
            Sentinels::default(),
        );

        assert_eq!(
            responder.respond("hello", &[]).await,
            Sentinels::default().stateful_error
        );
        assert!(api.posted.lock().unwrap().is_empty());
    }
}
