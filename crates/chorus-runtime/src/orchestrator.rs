//! Orchestrator — the facade a UI layer talks to.
//!
//! Owns the job manager, session broker, readiness verifier, adapter
//! factory, and event emitter. `submit_job` validates, records the job,
//! and launches one independent execution per agent without waiting for
//! any of them; results and failures flow back into each agent's task
//! slot, observable through `progress()` and the event stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::{info, instrument};

use chorus_agents::adapter::{AdapterFactory, WireAdapterFactory};
use chorus_agents::exchange::Exchange;
use chorus_agents::registry::AgentRegistry;
use chorus_agents::transport::ChannelTransport;
use chorus_core::events::{BaseEvent, ChorusEvent};
use chorus_core::ids::{AgentId, JobId};
use chorus_settings::ChorusSettings;

use crate::broker::SessionBroker;
use crate::errors::RuntimeError;
use crate::events::EventEmitter;
use crate::handshake::ReadinessVerifier;
use crate::jobs::manager::JobManager;
use crate::jobs::types::{JobSnapshot, ProgressSnapshot};
use crate::refine;
use crate::runner::{Pipeline, run_agent_task};

/// Dispatch engine facade.
pub struct Orchestrator {
    settings: ChorusSettings,
    registry: Arc<AgentRegistry>,
    manager: JobManager,
    pipeline: Arc<Pipeline>,
    emitter: Arc<EventEmitter>,
    accepting: AtomicBool,
}

impl Orchestrator {
    /// Create an orchestrator over a channel transport with the built-in
    /// agent registry and the generic wire adapter.
    #[must_use]
    pub fn new(transport: Arc<dyn ChannelTransport>, settings: ChorusSettings) -> Self {
        let exchange = Arc::new(Exchange::from_settings(
            Arc::clone(&transport),
            &settings.exchange,
        ));
        let factory = Arc::new(WireAdapterFactory::new(
            Arc::clone(&exchange),
            settings.detector.clone(),
        ));
        Self::with_parts(
            transport,
            settings,
            Arc::new(AgentRegistry::builtin()),
            factory,
        )
    }

    /// Create an orchestrator with an explicit registry and adapter
    /// factory (custom fleets, alternative adapter strategies, tests).
    #[must_use]
    pub fn with_parts(
        transport: Arc<dyn ChannelTransport>,
        settings: ChorusSettings,
        registry: Arc<AgentRegistry>,
        factory: Arc<dyn AdapterFactory>,
    ) -> Self {
        let exchange = Arc::new(Exchange::from_settings(
            Arc::clone(&transport),
            &settings.exchange,
        ));
        let broker = Arc::new(SessionBroker::new(
            Arc::clone(&transport),
            settings.broker.clone(),
        ));
        let verifier = Arc::new(ReadinessVerifier::new(
            exchange,
            transport,
            settings.handshake.clone(),
        ));
        let emitter = Arc::new(EventEmitter::new());
        let pipeline = Arc::new(Pipeline {
            broker,
            verifier,
            factory,
            emitter: Arc::clone(&emitter),
        });
        Self {
            settings,
            registry,
            manager: JobManager::new(),
            pipeline,
            emitter,
            accepting: AtomicBool::new(true),
        }
    }

    /// The agent registry in use.
    #[must_use]
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Dispatch a prompt to the given agents.
    ///
    /// Validates, creates the job with every task pending, launches one
    /// independent execution per agent, and returns the job ID immediately
    /// — no synchronous result aggregation. Must be called from within a
    /// tokio runtime.
    #[instrument(skip(self, prompt), fields(agents = agent_ids.len()))]
    pub fn submit_job(
        &self,
        prompt: &str,
        agent_ids: &[AgentId],
    ) -> Result<JobId, RuntimeError> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(RuntimeError::Internal(
                "orchestrator is shutting down".into(),
            ));
        }

        let job = self.manager.create_job(prompt, agent_ids, &self.registry)?;
        let _ = self.emitter.emit(ChorusEvent::JobCreated {
            base: BaseEvent::now(job.id.as_str()),
            agents: job.agent_ids().iter().map(ToString::to_string).collect(),
        });

        for (agent_id, slot) in job.slots() {
            // Validated above, so the descriptor lookup cannot miss.
            let Some(descriptor) = self.registry.get(&agent_id).cloned() else {
                continue;
            };
            let _handle = tokio::spawn(run_agent_task(
                Arc::clone(&self.pipeline),
                job.id.clone(),
                job.prompt.clone(),
                descriptor,
                slot,
            ));
        }

        Ok(job.id.clone())
    }

    /// Snapshot of the most recently created job's tasks. With no job yet,
    /// an empty map with `all_completed = true`.
    #[must_use]
    pub fn progress(&self) -> ProgressSnapshot {
        self.manager.progress()
    }

    /// Snapshot one job by ID.
    #[must_use]
    pub fn job(&self, id: &JobId) -> Option<JobSnapshot> {
        self.manager.job_snapshot(id)
    }

    /// ID of the most recently created job.
    #[must_use]
    pub fn latest_job_id(&self) -> Option<JobId> {
        self.manager.latest_job_id()
    }

    /// Subscribe to job lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChorusEvent> {
        self.emitter.subscribe()
    }

    /// Refine a raw query through the configured refiner agent and return
    /// the improved prompt. Runs synchronously (a single-agent dispatch
    /// outside the job arena).
    #[instrument(skip(self, query))]
    pub async fn refine_prompt(&self, query: &str) -> Result<String, RuntimeError> {
        if query.trim().is_empty() {
            return Err(RuntimeError::InvalidInput("query must not be empty".into()));
        }
        let descriptor = self.refiner_descriptor()?;
        let outcome = self
            .pipeline
            .dispatch(&descriptor, &refine::refinement_prompt(query), None)
            .await?;
        Ok(outcome.text)
    }

    /// Refine further based on user feedback about the current refinement.
    #[instrument(skip_all)]
    pub async fn refine_with_feedback(
        &self,
        original: &str,
        current: &str,
        feedback: &str,
    ) -> Result<String, RuntimeError> {
        if feedback.trim().is_empty() {
            return Err(RuntimeError::InvalidInput(
                "feedback must not be empty".into(),
            ));
        }
        let descriptor = self.refiner_descriptor()?;
        let outcome = self
            .pipeline
            .dispatch(
                &descriptor,
                &refine::feedback_prompt(original, current, feedback),
                None,
            )
            .await?;
        Ok(outcome.text)
    }

    /// Stop accepting new jobs. In-flight executions run to their own
    /// timeouts — there is no mid-flight cancellation, only timeout-based
    /// abandonment.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        info!("orchestrator shutdown requested; no longer accepting jobs");
        self.accepting.store(false, Ordering::Release);
    }

    fn refiner_descriptor(
        &self,
    ) -> Result<chorus_agents::registry::AgentDescriptor, RuntimeError> {
        let refiner = AgentId::new(self.settings.refiner_agent.clone());
        self.registry
            .get(&refiner)
            .cloned()
            .ok_or(RuntimeError::UnknownAgent(refiner))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
