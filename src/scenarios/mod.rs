//! Named business scenarios
//!
//! Each scenario is independent: it gets its own page (UI) or client (API)
//! and shares nothing with the others but the configuration.

pub mod api;
pub mod ui;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::runner::context::ScenarioContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    Ui,
    Api,
}

impl Suite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Ui => "ui",
            Suite::Api => "api",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    MessageBoxTask,
    MessageBoxElements,
    FormUpload,
    FormElements,
    LearningInstanceFlow,
    LearningInstanceSchema,
}

impl ScenarioId {
    pub const ALL: [ScenarioId; 6] = [
        ScenarioId::MessageBoxTask,
        ScenarioId::MessageBoxElements,
        ScenarioId::FormUpload,
        ScenarioId::FormElements,
        ScenarioId::LearningInstanceFlow,
        ScenarioId::LearningInstanceSchema,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioId::MessageBoxTask => "message-box-task",
            ScenarioId::MessageBoxElements => "message-box-elements",
            ScenarioId::FormUpload => "form-upload",
            ScenarioId::FormElements => "form-elements",
            ScenarioId::LearningInstanceFlow => "learning-instance-flow",
            ScenarioId::LearningInstanceSchema => "learning-instance-schema",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == value.trim())
    }

    pub fn suite(&self) -> Suite {
        match self {
            ScenarioId::LearningInstanceFlow | ScenarioId::LearningInstanceSchema => Suite::Api,
            _ => Suite::Ui,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::MessageBoxTask => "Create a task bot with a configured Message Box",
            ScenarioId::MessageBoxElements => "Message Box task flow, step by step",
            ScenarioId::FormUpload => "Create a form with a textbox and a document upload",
            ScenarioId::FormElements => "Form builder elements, step by step",
            ScenarioId::LearningInstanceFlow => "Create and read back a learning instance",
            ScenarioId::LearningInstanceSchema => "Learning instance response schema",
        }
    }

    /// Scenarios of `suite`, or all of them
    pub fn select(suite: Option<Suite>) -> Vec<ScenarioId> {
        Self::ALL
            .into_iter()
            .filter(|id| suite.map_or(true, |s| id.suite() == s))
            .collect()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run one scenario to completion
pub async fn run_scenario(id: ScenarioId, ctx: &ScenarioContext) -> Result<()> {
    match id {
        ScenarioId::MessageBoxTask => ui::message_box_task(ctx).await,
        ScenarioId::MessageBoxElements => ui::message_box_elements(ctx).await,
        ScenarioId::FormUpload => ui::form_upload(ctx).await,
        ScenarioId::FormElements => ui::form_elements(ctx).await,
        ScenarioId::LearningInstanceFlow => api::learning_instance_flow(&ctx.config).await,
        ScenarioId::LearningInstanceSchema => api::learning_instance_schema(&ctx.config).await,
    }
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Millisecond timestamp, strictly increasing within the process
pub fn unique_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::SeqCst);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// `<prefix>-<unique millisecond stamp>`
pub fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, unique_stamp())
}
