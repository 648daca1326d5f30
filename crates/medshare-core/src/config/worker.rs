//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the invitation expiry sweep.
    #[serde(default = "default_expiry_sweep_cron")]
    pub expiry_sweep_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            expiry_sweep_cron: default_expiry_sweep_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_expiry_sweep_cron() -> String {
    "0 */10 * * * *".to_string()
}
