use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use flowcheck::runner::{self, ConsoleEventListener, EventEmitter, PlaywrightFactory, RunOptions};
use flowcheck::scenarios::{ScenarioId, Suite};
use flowcheck::utils::config::{BrowserKind, Config};
use flowcheck::utils::{check, setup};

#[derive(Parser)]
#[command(name = "flowcheck")]
#[command(version = "0.1.0")]
#[command(about = "End-to-end UI and API scenarios for the automation platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SuiteArg {
    Ui,
    Api,
    All,
}

impl SuiteArg {
    fn suite(self) -> Option<Suite> {
        match self {
            SuiteArg::Ui => Some(Suite::Ui),
            SuiteArg::Api => Some(Suite::Api),
            SuiteArg::All => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios
    Run {
        /// Which suite to run
        #[arg(long, value_enum, default_value = "all")]
        suite: SuiteArg,

        /// Run only these scenario ids (repeatable)
        #[arg(long)]
        scenario: Vec<String>,

        /// Run scenarios concurrently, one browser each
        #[arg(long, default_value = "false")]
        parallel: bool,

        /// Maximum concurrent scenarios with --parallel
        #[arg(long, default_value = "2")]
        workers: usize,

        /// Output directory for reports and screenshots
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Write results.json and junit.xml
        #[arg(long, default_value = "false")]
        report: bool,

        /// Capture a screenshot when a UI scenario fails
        #[arg(long, short = 's', default_value = "false")]
        snapshot: bool,

        /// Browser engine (chromium, firefox, webkit); overrides BROWSER
        #[arg(long)]
        browser: Option<String>,

        /// Show the browser window; overrides HEADLESS
        #[arg(long, default_value = "false")]
        headed: bool,

        /// Environment file to load
        #[arg(long)]
        env_file: Option<PathBuf>,

        /// Directory holding upload fixtures
        #[arg(long, default_value = "tests/assets")]
        assets: PathBuf,

        /// Keep running after a scenario fails
        #[arg(long, default_value = "false")]
        continue_on_failure: bool,
    },

    /// Write a .env file interactively
    Configure {
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },

    /// Print the configuration and probe the endpoints
    Check {
        #[arg(long)]
        env_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            suite,
            scenario,
            parallel,
            workers,
            output,
            report,
            snapshot,
            browser,
            headed,
            env_file,
            assets,
            continue_on_failure,
        } => {
            let mut config = Config::load(env_file.as_deref())?;
            if let Some(name) = browser {
                config.browser = BrowserKind::parse(&name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown browser: {}", name))?;
            }
            if headed {
                config.headless = false;
            }

            let scenarios = if scenario.is_empty() {
                ScenarioId::select(suite.suite())
            } else {
                scenario
                    .iter()
                    .map(|s| {
                        ScenarioId::parse(s).ok_or_else(|| anyhow::anyhow!("Unknown scenario: {}", s))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?
            };

            println!("{} Running {} scenario(s)", "▶".green().bold(), scenarios.len());
            println!("  UI: {}", config.ui_base_url.cyan());
            println!("  API: {}", config.api_base_url.cyan());
            println!(
                "  Browser: {} ({})",
                config.browser.as_str().cyan(),
                if config.headless { "headless" } else { "headed" }
            );
            if parallel {
                println!("  Parallel: {} ({} workers)", "Enabled".yellow(), workers);
            }
            println!("  Output: {}", output.display().to_string().cyan());
            if snapshot {
                println!("  Snapshots: {}", "Enabled".green());
            }
            if report {
                println!("  Reports: {}", "Enabled".green());
            }

            let options = RunOptions {
                scenarios,
                parallel,
                workers,
                output,
                assets_dir: assets,
                report,
                snapshot,
                continue_on_failure,
            };

            let (emitter, receiver) = EventEmitter::new();
            let listener = tokio::spawn(ConsoleEventListener::listen(receiver));

            let state = runner::run_scenarios(
                Arc::new(config),
                &options,
                Arc::new(PlaywrightFactory),
                &emitter,
            )
            .await?;
            drop(emitter);
            let _ = listener.await;

            if !state.summary().success() {
                std::process::exit(1);
            }
        }

        Commands::Configure { env_file } => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            let mut output = std::io::stdout();
            setup::run_configure(&mut input, &mut output, &env_file)?;
        }

        Commands::Check { env_file } => {
            let config = Config::load(env_file.as_deref())?;
            let raw_token = std::env::var("API_TOKEN").ok();
            check::run_check(&config, raw_token.as_deref()).await;
        }
    }

    Ok(())
}
