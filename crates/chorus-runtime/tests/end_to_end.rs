#![allow(missing_docs)]

//! End-to-end dispatch tests over the scripted transport: fan-out,
//! per-agent isolation, progress aggregation, and event emission.

use std::sync::Arc;

use chorus_agents::testing::{ChannelScript, OutputMode, ScriptedTransport, snapshot};
use chorus_core::events::ChorusEvent;
use chorus_core::ids::AgentId;
use chorus_runtime::{Orchestrator, RuntimeError, TaskStatus};
use chorus_settings::ChorusSettings;

fn fast_settings() -> ChorusSettings {
    let mut settings = ChorusSettings::default();
    settings.broker.settle_ms = 100;
    settings.broker.load_poll_ms = 50;
    settings.broker.load_timeout_ms = 2_000;
    settings.handshake.reinit_settle_ms = 100;
    settings.handshake.inject_settle_ms = 100;
    settings.detector.sample_interval_ms = 200;
    settings.detector.grace_ms = 100;
    settings.detector.ceiling_ms = 30_000;
    settings
}

fn ids(keys: &[&str]) -> Vec<AgentId> {
    keys.iter().map(|k| AgentId::new(*k)).collect()
}

/// Output that grows twice and then holds still long enough to settle.
fn stabilizing_output(final_len: usize) -> OutputMode {
    OutputMode::Sequence(vec![
        snapshot(10, true),
        snapshot(final_len / 2, true),
        snapshot(final_len, false),
        snapshot(final_len, false),
        snapshot(final_len, false),
        snapshot(final_len, false),
    ])
}

/// Drive the paused clock until the latest job reports all tasks terminal.
async fn drain(orchestrator: &Orchestrator) {
    for _ in 0..10_000 {
        if orchestrator.progress().all_completed {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    panic!("job never completed: {:?}", orchestrator.progress());
}

#[tokio::test(start_paused = true)]
async fn one_agent_completes_while_the_other_fails_handshake() {
    let transport = Arc::new(ScriptedTransport::new());
    let openai_channel = transport.add_channel(
        "https://chat.openai.com",
        ChannelScript::responsive("openai").with_output(stabilizing_output(120)),
    );
    let _claude_channel =
        transport.add_channel("https://claude.ai", ChannelScript::dead("claude"));

    let orchestrator = Orchestrator::new(Arc::clone(&transport) as _, fast_settings());
    let job_id = orchestrator
        .submit_job("summarize X", &ids(&["openai", "claude"]))
        .unwrap();

    // Fire-and-forget: nothing has run yet at submission time
    let initial = orchestrator.progress();
    assert!(!initial.all_completed);

    drain(&orchestrator).await;

    let progress = orchestrator.progress();
    assert!(progress.all_completed);

    let openai = &progress.tasks[&AgentId::new("openai")];
    assert_eq!(openai.status, TaskStatus::Completed);
    assert_eq!(openai.result.as_deref().map(str::len), Some(120));
    assert!(!openai.partial);
    assert!(openai.error.is_none());

    let claude = &progress.tasks[&AgentId::new("claude")];
    assert_eq!(claude.status, TaskStatus::Failed);
    assert!(
        claude
            .error
            .as_deref()
            .unwrap()
            .contains("adapter unavailable")
    );
    assert!(claude.result.is_none());

    // The completed agent actually received the prompt
    assert_eq!(
        transport.submitted_prompts(&openai_channel),
        vec!["summarize X"]
    );
    assert_eq!(orchestrator.latest_job_id(), Some(job_id));
}

#[tokio::test(start_paused = true)]
async fn adapter_failure_never_perturbs_sibling_agents() {
    let transport = Arc::new(ScriptedTransport::new());
    let _a = transport.add_channel(
        "https://gemini.google.com/app",
        ChannelScript::responsive("gemini").with_output(stabilizing_output(64)),
    );
    let _b = transport.add_channel(
        "https://chat.deepseek.com",
        ChannelScript::responsive("deepseek").with_output(stabilizing_output(256)),
    );
    let _dead = transport.add_channel("https://grok.com", ChannelScript::dead("grok"));

    let orchestrator = Orchestrator::new(Arc::clone(&transport) as _, fast_settings());
    let _ = orchestrator
        .submit_job("compare approaches", &ids(&["gemini", "deepseek", "grok"]))
        .unwrap();
    drain(&orchestrator).await;

    let progress = orchestrator.progress();
    assert_eq!(
        progress.tasks[&AgentId::new("gemini")].status,
        TaskStatus::Completed
    );
    assert_eq!(
        progress.tasks[&AgentId::new("deepseek")].status,
        TaskStatus::Completed
    );
    assert_eq!(
        progress.tasks[&AgentId::new("grok")].status,
        TaskStatus::Failed
    );
    assert_eq!(
        progress.tasks[&AgentId::new("deepseek")]
            .result
            .as_deref()
            .map(str::len),
        Some(256)
    );
}

#[tokio::test(start_paused = true)]
async fn login_required_fails_the_task_with_the_ui_flag() {
    let transport = Arc::new(ScriptedTransport::new());
    let mut script = ChannelScript::responsive("claude");
    script.login = chorus_core::wire::LoginStatus {
        logged_in: false,
        needs_login: true,
    };
    let _channel = transport.add_channel("https://claude.ai", script);

    let orchestrator = Orchestrator::new(Arc::clone(&transport) as _, fast_settings());
    let _ = orchestrator.submit_job("hello", &ids(&["claude"])).unwrap();
    drain(&orchestrator).await;

    let progress = orchestrator.progress();
    let claude = &progress.tasks[&AgentId::new("claude")];
    assert_eq!(claude.status, TaskStatus::Failed);
    assert!(claude.needs_login);
    assert!(claude.error.as_deref().unwrap().contains("login required"));
}

#[tokio::test(start_paused = true)]
async fn detection_ceiling_completes_with_partial_output() {
    let transport = Arc::new(ScriptedTransport::new());
    let _channel = transport.add_channel(
        "https://chat.deepseek.com",
        ChannelScript::responsive("deepseek").with_output(OutputMode::Growing { step: 10 }),
    );

    let mut settings = fast_settings();
    settings.detector.ceiling_ms = 2_000;
    let orchestrator = Orchestrator::new(Arc::clone(&transport) as _, settings);
    let _ = orchestrator
        .submit_job("never ends", &ids(&["deepseek"]))
        .unwrap();
    drain(&orchestrator).await;

    let progress = orchestrator.progress();
    let task = &progress.tasks[&AgentId::new("deepseek")];
    // The ceiling is not an error: the task completes with partial content
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.partial);
    assert!(task.result.as_deref().is_some_and(|r| !r.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn channel_is_reused_across_consecutive_jobs() {
    let transport = Arc::new(ScriptedTransport::new());
    let channel = transport.add_channel(
        "https://gemini.google.com/app",
        ChannelScript::responsive("gemini").with_output(stabilizing_output(32)),
    );

    let orchestrator = Orchestrator::new(Arc::clone(&transport) as _, fast_settings());
    let first = orchestrator.submit_job("first", &ids(&["gemini"])).unwrap();
    drain(&orchestrator).await;
    let second = orchestrator.submit_job("second", &ids(&["gemini"])).unwrap();
    drain(&orchestrator).await;

    assert_ne!(first, second);
    // Both jobs drove the same channel; none were opened fresh
    assert!(transport.opened().is_empty());
    assert_eq!(
        transport.submitted_prompts(&channel),
        vec!["first", "second"]
    );

    // Progress reflects the latest job only; the first stays addressable
    assert_eq!(orchestrator.latest_job_id(), Some(second.clone()));
    let first_snap = orchestrator.job(&first).unwrap();
    assert_eq!(first_snap.prompt, "first");
    assert!(first_snap.all_completed);
}

#[tokio::test(start_paused = true)]
async fn events_trace_the_task_lifecycle() {
    let transport = Arc::new(ScriptedTransport::new());
    let _good = transport.add_channel(
        "https://chat.openai.com",
        ChannelScript::responsive("openai").with_output(stabilizing_output(48)),
    );
    let _stale =
        transport.add_channel("https://claude.ai", ChannelScript::stale_listener("claude"));

    let orchestrator = Orchestrator::new(Arc::clone(&transport) as _, fast_settings());
    let mut rx = orchestrator.subscribe();
    let _ = orchestrator
        .submit_job("hello", &ids(&["openai", "claude"]))
        .unwrap();
    drain(&orchestrator).await;

    let mut created = 0;
    let mut started = 0;
    let mut escalated = Vec::new();
    let mut completed = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            ChorusEvent::JobCreated { .. } => created += 1,
            ChorusEvent::TaskStarted { .. } => started += 1,
            ChorusEvent::HandshakeEscalated { agent, step, .. } => escalated.push((agent, step)),
            ChorusEvent::TaskCompleted { .. } => completed += 1,
            ChorusEvent::TaskFailed { .. } => {}
        }
    }
    assert_eq!(created, 1);
    assert_eq!(started, 2);
    // claude needed a soft reinit; openai pinged clean. claude's stale
    // listener revives, so both tasks complete.
    assert_eq!(
        escalated,
        vec![("claude".to_owned(), "soft_reinit".to_owned())]
    );
    assert_eq!(completed, 2);
}

#[tokio::test]
async fn submitting_requires_valid_input() {
    let transport = Arc::new(ScriptedTransport::new());
    let orchestrator = Orchestrator::new(transport, fast_settings());
    assert!(matches!(
        orchestrator.submit_job("  ", &ids(&["openai"])),
        Err(RuntimeError::InvalidInput(_))
    ));
    // Failed submissions leave no trace in progress
    assert!(orchestrator.progress().all_completed);
    assert!(orchestrator.latest_job_id().is_none());
}
