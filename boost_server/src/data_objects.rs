use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderParams {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommissionConfigUpdate {
    pub worker_percentage: f64,
}

/// `null` (or a missing field) clears the override.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorkerOverrideUpdate {
    #[serde(default)]
    pub commission_override: Option<f64>,
}
