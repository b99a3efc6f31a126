use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation store limits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Eviction policy for in-memory transcripts.
///
/// Transcripts live only as long as the process. `max_sessions` bounds the
/// map (least recently used sessions go first) and `idle_ttl_secs` drops
/// sessions nobody has touched for that long. Either limit can be disabled
/// with `0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "d_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "d_idle_ttl")]
    pub idle_ttl_secs: u64,
    /// How often the background sweeper drops idle sessions.
    #[serde(default = "d_sweep")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_sessions: d_max_sessions(),
            idle_ttl_secs: d_idle_ttl(),
            sweep_interval_secs: d_sweep(),
        }
    }
}

fn d_max_sessions() -> usize {
    10_000
}
fn d_idle_ttl() -> u64 {
    86_400
}
fn d_sweep() -> u64 {
    300
}
