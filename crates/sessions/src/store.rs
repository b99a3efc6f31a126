//! Process-lifetime conversation store.
//!
//! Maps a session key to its [`Transcript`]. Nothing is persisted; the
//! eviction policy is the only thing that ever drops a transcript before
//! the process exits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use relay_domain::config::SessionsConfig;
use relay_domain::trace::TraceEvent;

use crate::transcript::Transcript;

/// Session key used when the client sends none (or an empty one).
pub const DEFAULT_SESSION_KEY: &str = "default";

/// Substitute [`DEFAULT_SESSION_KEY`] for a missing or blank key.
pub fn resolve_session_key(raw: Option<&str>) -> &str {
    match raw {
        Some(key) if !key.trim().is_empty() => key,
        _ => DEFAULT_SESSION_KEY,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Eviction policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Maximum live sessions; `0` disables the bound.
    pub max_sessions: usize,
    /// Drop sessions idle for at least this long; `None` disables expiry.
    pub idle_ttl: Option<Duration>,
}

impl EvictionPolicy {
    pub fn from_config(cfg: &SessionsConfig) -> Self {
        Self {
            max_sessions: cfg.max_sessions,
            idle_ttl: (cfg.idle_ttl_secs > 0).then(|| Duration::from_secs(cfg.idle_ttl_secs)),
        }
    }

    /// No capacity bound and no expiry.
    pub fn unbounded() -> Self {
        Self {
            max_sessions: 0,
            idle_ttl: None,
        }
    }

    fn is_expired(&self, last_access: Instant, now: Instant) -> bool {
        self.idle_ttl
            .is_some_and(|ttl| now.saturating_duration_since(last_access) >= ttl)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Slot {
    transcript: Arc<Transcript>,
    last_access: Instant,
}

/// Owns every live transcript.
pub struct ConversationStore {
    instructions: String,
    policy: EvictionPolicy,
    sessions: RwLock<HashMap<String, Slot>>,
}

impl ConversationStore {
    pub fn new(instructions: impl Into<String>, policy: EvictionPolicy) -> Self {
        Self {
            instructions: instructions.into(),
            policy,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The system instructions every new transcript starts with.
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Return the live transcript for `session_key`, creating and
    /// registering a seeded one if there is none. Never fails.
    pub fn get_or_create(&self, session_key: &str) -> Arc<Transcript> {
        self.get_or_create_at(session_key, Instant::now())
    }

    /// [`get_or_create`](Self::get_or_create) with an explicit clock.
    ///
    /// Creating a session while at capacity finds the least recently used
    /// entry with a linear scan under the write lock, so each such insert is
    /// O(n) in live sessions. Lookups of existing sessions stay O(1).
    pub fn get_or_create_at(&self, session_key: &str, now: Instant) -> Arc<Transcript> {
        let mut evicted: Vec<(String, &'static str)> = Vec::new();

        let (transcript, live) = {
            let mut sessions = self.sessions.write();

            if let Some(slot) = sessions.get_mut(session_key) {
                if !self.policy.is_expired(slot.last_access, now) {
                    slot.last_access = now;
                    return slot.transcript.clone();
                }
            }
            if sessions.remove(session_key).is_some() {
                evicted.push((session_key.to_owned(), "idle"));
            }

            if self.policy.max_sessions > 0 && sessions.len() >= self.policy.max_sessions {
                let oldest = sessions
                    .iter()
                    .min_by_key(|(_, slot)| slot.last_access)
                    .map(|(key, _)| key.clone());
                if let Some(key) = oldest {
                    sessions.remove(&key);
                    evicted.push((key, "capacity"));
                }
            }

            let transcript = Arc::new(Transcript::seeded(session_key, &self.instructions));
            sessions.insert(
                session_key.to_owned(),
                Slot {
                    transcript: transcript.clone(),
                    last_access: now,
                },
            );
            (transcript, sessions.len())
        };

        for (key, reason) in evicted {
            TraceEvent::SessionEvicted {
                session_key: key,
                reason: reason.to_owned(),
            }
            .emit();
        }
        TraceEvent::SessionCreated {
            session_key: session_key.to_owned(),
            live_sessions: live,
        }
        .emit();

        transcript
    }

    /// Drop every session idle past the TTL. Returns how many were dropped.
    pub fn sweep(&self, now: Instant) -> usize {
        if self.policy.idle_ttl.is_none() {
            return 0;
        }

        let mut expired = Vec::new();
        self.sessions.write().retain(|key, slot| {
            let keep = !self.policy.is_expired(slot.last_access, now);
            if !keep {
                expired.push(key.clone());
            }
            keep
        });

        for key in &expired {
            TraceEvent::SessionEvicted {
                session_key: key.clone(),
                reason: "idle".into(),
            }
            .emit();
        }
        expired.len()
    }

    pub fn contains(&self, session_key: &str) -> bool {
        self.sessions.read().contains_key(session_key)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
