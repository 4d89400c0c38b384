use crate::runner::state::{RunState, RunSummary, ScenarioReport};
use serde::{Deserialize, Serialize};

/// Test results for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub session_id: String,
    pub scenarios: Vec<ScenarioReport>,
    pub summary: RunSummary,
    pub generated_at: String,
}

impl TestResults {
    pub fn from_state(state: &RunState) -> Self {
        Self {
            session_id: state.session_id.clone(),
            scenarios: state.reports(),
            summary: state.summary(),
            generated_at: chrono::Local::now().to_rfc3339(),
        }
    }
}
