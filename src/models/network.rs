// Network interface models

use serde::{Deserialize, Serialize};

/// Cumulative counters since the interface came up; they reset when it restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub interface: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}
