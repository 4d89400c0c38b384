pub mod context;
pub mod events;
pub mod state;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::driver::traits::BrowserPage;
use crate::driver::web::{WebDriver, WebDriverConfig};
use crate::error::failure_kind;
use crate::pages::{FlowStage, ProgressSink};
use crate::report;
use crate::scenarios::{run_scenario, ScenarioId, Suite};
use crate::utils::config::Config;

pub use context::ScenarioContext;
pub use events::*;
pub use state::*;

/// How a run is executed
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub scenarios: Vec<ScenarioId>,
    pub parallel: bool,
    pub workers: usize,
    pub output: PathBuf,
    pub assets_dir: PathBuf,
    pub report: bool,
    pub snapshot: bool,
    pub continue_on_failure: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            scenarios: ScenarioId::ALL.to_vec(),
            parallel: false,
            workers: 2,
            output: PathBuf::from("output"),
            assets_dir: PathBuf::from("tests/assets"),
            report: false,
            snapshot: false,
            continue_on_failure: false,
        }
    }
}

/// Opens one isolated page per UI scenario
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn open(&self, config: &Config) -> Result<Arc<dyn BrowserPage>>;
}

/// Fresh Playwright browser, context and page
pub struct PlaywrightFactory;

#[async_trait]
impl PageFactory for PlaywrightFactory {
    async fn open(&self, config: &Config) -> Result<Arc<dyn BrowserPage>> {
        let driver = WebDriver::new(WebDriverConfig::from_config(config))
            .await
            .context("Failed to launch browser")?;
        Ok(Arc::new(driver))
    }
}

/// Run the selected scenarios and return the final state
pub async fn run_scenarios(
    config: Arc<Config>,
    options: &RunOptions,
    factory: Arc<dyn PageFactory>,
    emitter: &EventEmitter,
) -> Result<RunState> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let state = Arc::new(Mutex::new(RunState::new(&session_id, &options.scenarios)));
    with_state(&state, |s| s.start());

    emitter.emit(ScenarioEvent::SessionStarted {
        session_id: session_id.clone(),
        scenario_count: options.scenarios.len(),
    });

    if options.parallel && options.scenarios.len() > 1 {
        let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
        let mut handles = Vec::new();

        for id in options.scenarios.iter().copied() {
            let semaphore = semaphore.clone();
            let config = config.clone();
            let options = options.clone();
            let factory = factory.clone();
            let emitter = emitter.clone();
            let state = state.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                execute_one(id, config, &options, factory.as_ref(), &emitter, &state).await;
                Ok::<(), anyhow::Error>(())
            }));
        }

        for handle in handles {
            handle.await??;
        }
    } else {
        for id in options.scenarios.iter().copied() {
            let passed =
                execute_one(id, config.clone(), options, factory.as_ref(), emitter, &state).await;
            if !passed && !options.continue_on_failure {
                skip_rest(&state, emitter, "stopped after first failure");
                break;
            }
        }
    }

    let final_state = {
        let mut guard = state
            .lock()
            .map_err(|_| anyhow::anyhow!("run state lock poisoned"))?;
        guard.finish();
        guard.clone()
    };
    let summary = final_state.summary();

    if options.report {
        let results = report::types::TestResults::from_state(&final_state);
        report::write_reports(&results, &options.output)?;
    }

    emitter.emit(ScenarioEvent::SessionFinished { summary });
    Ok(final_state)
}

fn with_state<F: FnOnce(&mut RunState)>(state: &Mutex<RunState>, f: F) {
    match state.lock() {
        Ok(mut guard) => f(&mut *guard),
        Err(poisoned) => f(&mut *poisoned.into_inner()),
    }
}

fn with_scenario<F: FnOnce(&mut ScenarioState)>(state: &Mutex<RunState>, id: ScenarioId, f: F) {
    with_state(state, |s| {
        if let Some(scenario) = s.scenario_mut(id) {
            f(scenario);
        }
    });
}

fn skip_rest(state: &Mutex<RunState>, emitter: &EventEmitter, reason: &str) {
    let mut skipped = Vec::new();
    with_state(state, |s| {
        s.skip_remaining(reason);
        skipped = s
            .scenarios
            .iter()
            .filter(|sc| matches!(sc.status, ScenarioStatus::Skipped { .. }))
            .map(|sc| sc.id)
            .collect();
    });
    for id in skipped {
        emitter.emit(ScenarioEvent::ScenarioSkipped {
            id: id.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Run one scenario in its own context; returns whether it passed
async fn execute_one(
    id: ScenarioId,
    config: Arc<Config>,
    options: &RunOptions,
    factory: &dyn PageFactory,
    emitter: &EventEmitter,
    state: &Arc<Mutex<RunState>>,
) -> bool {
    with_scenario(state, id, |s| s.start());
    emitter.emit(ScenarioEvent::ScenarioStarted {
        id: id.to_string(),
        description: id.description().to_string(),
    });

    let progress: ProgressSink = {
        let emitter = emitter.clone();
        let state = state.clone();
        Arc::new(move |stage: FlowStage| {
            let label = stage.to_string();
            with_scenario(&state, id, |s| s.reach(&label));
            emitter.emit(ScenarioEvent::StepReached {
                id: id.to_string(),
                stage: label,
            });
        })
    };

    let mut ctx = ScenarioContext::new(config.clone())
        .with_progress(progress)
        .with_assets_dir(&options.assets_dir)
        .with_output_dir(&options.output);

    let outcome = match id.suite() {
        Suite::Ui => match factory.open(&config).await {
            Ok(page) => {
                log::debug!("{} running on {}", id, page.engine_name());
                ctx = ctx.with_page(page);
                run_scenario(id, &ctx).await
            }
            Err(e) => Err(e),
        },
        Suite::Api => run_scenario(id, &ctx).await,
    };

    match outcome {
        Ok(()) => {
            let mut duration_ms = 0;
            with_scenario(state, id, |s| {
                s.pass();
                duration_ms = s.duration_ms.unwrap_or(0);
            });
            emitter.emit(ScenarioEvent::ScenarioPassed {
                id: id.to_string(),
                duration_ms,
            });
            true
        }
        Err(e) => {
            let screenshot = if options.snapshot {
                capture_failure(&ctx, id).await
            } else {
                None
            };

            let error = format!("{:#}", e);
            let kind = failure_kind(&e);
            let mut duration_ms = 0;
            with_scenario(state, id, |s| {
                s.screenshot_path = screenshot;
                s.fail(error.clone(), kind);
                duration_ms = s.duration_ms.unwrap_or(0);
            });
            emitter.emit(ScenarioEvent::ScenarioFailed {
                id: id.to_string(),
                error,
                duration_ms,
            });
            false
        }
    }
}

/// `<output>/<id>-failure.png`, when the scenario had a page
async fn capture_failure(ctx: &ScenarioContext, id: ScenarioId) -> Option<String> {
    let page = ctx.page.as_ref()?;
    let path = ctx.output_path(&format!("{}-failure.png", id));
    match page.screenshot(&path).await {
        Ok(()) => Some(path.to_string_lossy().to_string()),
        Err(e) => {
            log::warn!("Failed to capture screenshot for {}: {:#}", id, e);
            None
        }
    }
}
