use std::time::Duration;

/// Runtime tunables, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seconds between live snapshot pulses on a subscription stream.
    pub live_pulse_secs: u64,
    /// Documents removed per batch while tearing a tournament down.
    pub deletion_batch_size: usize,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            live_pulse_secs: read_var("LIVE_PULSE_SECS", 30),
            deletion_batch_size: read_var("DELETION_BATCH_SIZE", 100),
        }
    }

    pub fn pulse_interval(&self) -> Duration {
        Duration::from_secs(self.live_pulse_secs.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            live_pulse_secs: 30,
            deletion_batch_size: 100,
        }
    }
}

fn read_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
