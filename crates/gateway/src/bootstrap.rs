//! AppState construction and background-task spawning extracted from `main.rs`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use relay_domain::config::{AgentProfile, Config, ConfigSeverity};
use relay_sessions::{ConversationStore, EvictionPolicy};

use crate::runtime::{ManagedAgent, SharedAgent};
use crate::state::AppState;

/// Validate config and wire every component into an [`AppState`].
///
/// Credentials are not checked here; each outbound call reads its own and
/// fails with a configuration error if it is missing.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config has {error_count} error(s); refusing to start");
    }

    // ── Agent profile ────────────────────────────────────────────────
    let profile = AgentProfile::load(&config.agent);
    tracing::info!(
        agent = %profile.name,
        model = %profile.model,
        max_tokens = profile.max_tokens,
        backend = ?config.chat.backend,
        "agent profile loaded"
    );

    // ── Conversation store ───────────────────────────────────────────
    let conversations = Arc::new(ConversationStore::new(
        profile.instructions.clone(),
        EvictionPolicy::from_config(&config.sessions),
    ));

    // ── Agents ───────────────────────────────────────────────────────
    let managed = Arc::new(
        ManagedAgent::from_config(&config.managed_agent)
            .context("building managed agent runtime client")?,
    );
    let chat_agent = Arc::new(SharedAgent::from_config(
        &config,
        profile,
        conversations.clone(),
        managed.clone(),
    ));

    Ok(AppState {
        config,
        conversations,
        managed,
        chat_agent,
    })
}

/// Spawn the idle-session sweeper. Nothing is spawned when idle expiry is
/// disabled.
pub fn spawn_background_tasks(state: &AppState) {
    let sessions = &state.config.sessions;
    if sessions.idle_ttl_secs == 0 || sessions.sweep_interval_secs == 0 {
        tracing::debug!("idle session sweeper disabled");
        return;
    }

    let conversations = state.conversations.clone();
    let period = Duration::from_secs(sessions.sweep_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = conversations.sweep(Instant::now());
            if evicted > 0 {
                tracing::info!(evicted, live = conversations.len(), "idle sessions swept");
            }
        }
    });
}
