use serde::{Deserialize, Serialize};

/// Interpreter limits applied to every compiled routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Per-frame budget in thousands of VM instructions, 0 disables it.
    /// Canvas work is charged at one unit per thousand points or pixels.
    pub instruction_budget: u64,
    /// Interpreter memory limit in MiB, 0 disables it.
    pub memory_limit_mb: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            instruction_budget: 50_000,
            memory_limit_mb: 64,
        }
    }
}

impl PreviewOptions {
    /// No limits at all. Only for trusted snippets.
    pub fn unlimited() -> Self {
        Self {
            instruction_budget: 0,
            memory_limit_mb: 0,
        }
    }
}
