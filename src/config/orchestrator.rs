//! Orchestrator configuration.

use serde::Deserialize;

/// Settings for composite action runs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Hand uncaught failures to the failure sink before propagating.
    /// Default: true
    pub report_uncaught: bool,
    /// Include argument sets in debug logs. Argument sets may carry query
    /// results, so this is off by default.
    pub trace_arguments: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            report_uncaught: true,
            trace_arguments: false,
        }
    }
}
