use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::scenarios::{ScenarioId, Suite};

/// Scenario execution status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    Failed { error: String, kind: String },
    Skipped { reason: String },
}

impl ScenarioStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScenarioStatus::Passed | ScenarioStatus::Failed { .. } | ScenarioStatus::Skipped { .. }
        )
    }
}

/// State for a single scenario execution
#[derive(Debug, Clone)]
pub struct ScenarioState {
    pub id: ScenarioId,
    pub status: ScenarioStatus,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub duration_ms: Option<u64>,
    /// Label of the last flow stage reached
    pub last_stage: Option<String>,
    pub screenshot_path: Option<String>,
}

impl ScenarioState {
    pub fn new(id: ScenarioId) -> Self {
        Self {
            id,
            status: ScenarioStatus::Pending,
            started_at: None,
            finished_at: None,
            duration_ms: None,
            last_stage: None,
            screenshot_path: None,
        }
    }

    pub fn start(&mut self) {
        self.status = ScenarioStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn reach(&mut self, stage: &str) {
        self.last_stage = Some(stage.to_string());
    }

    pub fn pass(&mut self) {
        self.finish(ScenarioStatus::Passed);
    }

    pub fn fail(&mut self, error: String, kind: &str) {
        self.finish(ScenarioStatus::Failed {
            error,
            kind: kind.to_string(),
        });
    }

    pub fn skip(&mut self, reason: &str) {
        self.status = ScenarioStatus::Skipped {
            reason: reason.to_string(),
        };
    }

    fn finish(&mut self, status: ScenarioStatus) {
        self.status = status;
        self.finished_at = Some(Instant::now());
        if let Some(start) = self.started_at {
            self.duration_ms = Some(start.elapsed().as_millis() as u64);
        }
    }

    /// Serialize state for reporting (without Instant which isn't serializable)
    pub fn to_report(&self) -> ScenarioReport {
        ScenarioReport {
            id: self.id.as_str().to_string(),
            suite: self.id.suite(),
            description: self.id.description().to_string(),
            status: self.status.clone(),
            duration_ms: self.duration_ms,
            last_stage: self.last_stage.clone(),
            screenshot_path: self.screenshot_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub id: String,
    pub suite: Suite,
    pub description: String,
    pub status: ScenarioStatus,
    pub duration_ms: Option<u64>,
    pub last_stage: Option<String>,
    pub screenshot_path: Option<String>,
}

/// State for a whole run
#[derive(Debug, Clone)]
pub struct RunState {
    pub session_id: String,
    pub scenarios: Vec<ScenarioState>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl RunState {
    pub fn new(session_id: &str, ids: &[ScenarioId]) -> Self {
        Self {
            session_id: session_id.to_string(),
            scenarios: ids.iter().copied().map(ScenarioState::new).collect(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Instant::now());
    }

    pub fn scenario_mut(&mut self, id: ScenarioId) -> Option<&mut ScenarioState> {
        self.scenarios.iter_mut().find(|s| s.id == id)
    }

    /// Mark everything not yet started as skipped
    pub fn skip_remaining(&mut self, reason: &str) {
        for scenario in &mut self.scenarios {
            if matches!(scenario.status, ScenarioStatus::Pending) {
                scenario.skip(reason);
            }
        }
    }

    pub fn summary(&self) -> RunSummary {
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for scenario in &self.scenarios {
            match scenario.status {
                ScenarioStatus::Passed => passed += 1,
                ScenarioStatus::Failed { .. } => failed += 1,
                ScenarioStatus::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }

        let total_duration_ms = self.started_at.map(|start| {
            self.finished_at
                .unwrap_or_else(Instant::now)
                .duration_since(start)
                .as_millis() as u64
        });

        RunSummary {
            session_id: self.session_id.clone(),
            total: self.scenarios.len() as u32,
            passed,
            failed,
            skipped,
            total_duration_ms,
        }
    }

    pub fn reports(&self) -> Vec<ScenarioReport> {
        self.scenarios.iter().map(|s| s.to_report()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub session_id: String,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_duration_ms: Option<u64>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}
