//! Per-agent execution pipeline.
//!
//! One runner invocation owns one agent's task slot for one job: acquire a
//! channel, wait for it to load, verify the adapter with the readiness
//! handshake, check authentication, submit the prompt, and write the
//! outcome into the slot. Failures land in the slot and never escape to
//! sibling agents.

use std::sync::Arc;

use metrics::gauge;
use tracing::{info, instrument, warn};

use chorus_agents::adapter::AdapterFactory;
use chorus_agents::detector::DetectionOutcome;
use chorus_agents::registry::AgentDescriptor;
use chorus_core::events::{BaseEvent, ChorusEvent};
use chorus_core::ids::JobId;

use crate::broker::SessionBroker;
use crate::errors::RuntimeError;
use crate::events::EventEmitter;
use crate::handshake::{HandshakeStep, ReadinessVerifier};
use crate::jobs::types::TaskSlot;

/// Shared pieces every agent execution needs.
pub(crate) struct Pipeline {
    pub broker: Arc<SessionBroker>,
    pub verifier: Arc<ReadinessVerifier>,
    pub factory: Arc<dyn AdapterFactory>,
    pub emitter: Arc<EventEmitter>,
}

impl Pipeline {
    /// Run the full acquire → verify → login → submit sequence for one
    /// agent. When `tracking` is provided, the acquired channel and any
    /// handshake escalation are recorded against the job's task slot.
    pub(crate) async fn dispatch(
        &self,
        descriptor: &AgentDescriptor,
        prompt: &str,
        tracking: Option<(&JobId, &TaskSlot)>,
    ) -> Result<DetectionOutcome, RuntimeError> {
        let channel = self.broker.acquire(descriptor).await?;
        if let Some((_, slot)) = tracking {
            slot.set_channel(channel.id.clone());
        }

        self.broker.await_loaded(&channel.id).await?;

        let report = self.verifier.verify(&channel.id).await?;
        if report.step != HandshakeStep::Ping {
            if let Some((job_id, _)) = tracking {
                let _ = self.emitter.emit(ChorusEvent::HandshakeEscalated {
                    base: BaseEvent::now(job_id.as_str()),
                    agent: descriptor.id.to_string(),
                    step: report.step.to_string(),
                });
            }
        }

        let adapter = self.factory.create(descriptor, channel.id.clone()).await?;

        let login = adapter.check_logged_in().await?;
        if !login.logged_in {
            return Err(RuntimeError::LoginRequired {
                agent: descriptor.id.clone(),
                needs_login: login.needs_login,
            });
        }

        Ok(adapter.submit(prompt).await?)
    }
}

/// Execute one agent's task end to end, mutating only its own slot.
#[instrument(skip_all, fields(job_id = %job_id, agent = %descriptor.id))]
pub(crate) async fn run_agent_task(
    pipeline: Arc<Pipeline>,
    job_id: JobId,
    prompt: String,
    descriptor: AgentDescriptor,
    slot: Arc<TaskSlot>,
) {
    if !slot.start() {
        return;
    }
    let _ = pipeline.emitter.emit(ChorusEvent::TaskStarted {
        base: BaseEvent::now(job_id.as_str()),
        agent: descriptor.id.to_string(),
    });
    gauge!("chorus_tasks_running").increment(1.0);

    let outcome = pipeline
        .dispatch(&descriptor, &prompt, Some((&job_id, slot.as_ref())))
        .await;

    match outcome {
        Ok(outcome) => {
            let partial = !outcome.complete;
            info!(
                samples = outcome.samples,
                partial, "agent task completed"
            );
            let _ = slot.complete(outcome.text, partial);
            let _ = pipeline.emitter.emit(ChorusEvent::TaskCompleted {
                base: BaseEvent::now(job_id.as_str()),
                agent: descriptor.id.to_string(),
                partial,
            });
        }
        Err(e) => {
            warn!(error = %e, category = e.category(), "agent task failed");
            let needs_login = e.needs_login();
            let _ = slot.fail(e.to_string(), needs_login);
            let _ = pipeline.emitter.emit(ChorusEvent::TaskFailed {
                base: BaseEvent::now(job_id.as_str()),
                agent: descriptor.id.to_string(),
                error: e.to_string(),
                needs_login,
            });
        }
    }

    gauge!("chorus_tasks_running").decrement(1.0);
}
