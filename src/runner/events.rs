use super::state::RunSummary;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Run events for real-time updates
#[derive(Debug, Clone)]
pub enum ScenarioEvent {
    SessionStarted {
        session_id: String,
        scenario_count: usize,
    },
    SessionFinished {
        summary: RunSummary,
    },
    ScenarioStarted {
        id: String,
        description: String,
    },
    StepReached {
        id: String,
        stage: String,
    },
    ScenarioPassed {
        id: String,
        duration_ms: u64,
    },
    ScenarioFailed {
        id: String,
        error: String,
        duration_ms: u64,
    },
    ScenarioSkipped {
        id: String,
        reason: String,
    },
}

/// Event emitter for broadcasting run events
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<ScenarioEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<ScenarioEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: ScenarioEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScenarioEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<ScenarioEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            // Piped output: no escape codes
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        // One spinner per running scenario; parallel runs interleave
        let mut spinners: HashMap<String, ProgressBar> = HashMap::new();

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    log::debug!("Console listener skipped {} events", missed);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                ScenarioEvent::SessionStarted {
                    session_id,
                    scenario_count,
                } => {
                    multi
                        .println(format!(
                            "\n{} Session started: {} ({} scenarios)",
                            "▶".green().bold(),
                            session_id.cyan(),
                            scenario_count
                        ))
                        .ok();
                }

                ScenarioEvent::SessionFinished { summary } => {
                    for (_, pb) in spinners.drain() {
                        pb.finish_and_clear();
                    }

                    println!("\n{} Session finished", "■".blue().bold());
                    println!("  Total scenarios: {}", summary.total);
                    println!(
                        "  {} passed, {} failed, {} skipped",
                        summary.passed.to_string().green(),
                        summary.failed.to_string().red(),
                        summary.skipped.to_string().yellow()
                    );
                    if let Some(duration) = summary.total_duration_ms {
                        println!("  Duration: {}ms", duration);
                    }
                    break;
                }

                ScenarioEvent::ScenarioStarted { id, description } => {
                    let pb = multi.add(ProgressBar::new_spinner());
                    if let Ok(style) = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("  {spinner} {msg}")
                    {
                        pb.set_style(style);
                    }
                    pb.set_message(format!("{} {}", id.white().bold(), description.dimmed()));
                    pb.enable_steady_tick(StdDuration::from_millis(100));
                    spinners.insert(id, pb);
                }

                ScenarioEvent::StepReached { id, stage } => {
                    if let Some(pb) = spinners.get(&id) {
                        pb.set_message(format!("{} {}", id.white().bold(), stage.dimmed()));
                    }
                }

                ScenarioEvent::ScenarioPassed { id, duration_ms } => {
                    if let Some(pb) = spinners.remove(&id) {
                        pb.finish_and_clear();
                    }
                    multi
                        .println(format!("  {} {} ({}ms)", "✓".green(), id, duration_ms))
                        .ok();
                }

                ScenarioEvent::ScenarioFailed {
                    id,
                    error,
                    duration_ms,
                } => {
                    if let Some(pb) = spinners.remove(&id) {
                        pb.finish_and_clear();
                    }
                    multi
                        .println(format!(
                            "  {} {} ({}ms)\n      {}",
                            "✗".red(),
                            id,
                            duration_ms,
                            error.red()
                        ))
                        .ok();
                }

                ScenarioEvent::ScenarioSkipped { id, reason } => {
                    multi
                        .println(format!("  {} {} ({})", "○".yellow(), id, reason.dimmed()))
                        .ok();
                }
            }
        }
    }
}
