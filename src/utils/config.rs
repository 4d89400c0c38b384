use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_UI_BASE_URL: &str = "https://community.automationanywhere.com";
pub const DEFAULT_API_BASE_URL: &str = "https://community.automationanywhere.com/api/v1";
/// Value written by `configure` when no token was entered
pub const TOKEN_PLACEHOLDER: &str = "your_api_token_here";

/// Variables read from the environment, in `.env` order
pub const ENV_KEYS: [&str; 6] = [
    "UI_BASE_URL",
    "UI_USERNAME",
    "UI_PASSWORD",
    "HEADLESS",
    "API_BASE_URL",
    "API_TOKEN",
];

/// Browser engine used for UI scenarios
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "chromium" | "chrome" => Some(Self::Chromium),
            "firefox" => Some(Self::Firefox),
            "webkit" | "safari" => Some(Self::Webkit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
        }
    }
}

/// Wait budgets (ms) for every blocking step
#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    /// Default per-action budget (clicks, fills)
    pub action_ms: u64,
    /// `expect_visible` / `expect_text`
    pub visible_ms: u64,
    /// Login form fields and submit button
    pub field_ms: u64,
    /// URL leaving the login page after submit
    pub navigation_ms: u64,
    /// Document load fallback after navigation
    pub load_ms: u64,
    /// Each positive logged-in indicator
    pub indicator_ms: u64,
    /// Save confirmation toast
    pub confirmation_ms: u64,
    /// 2xx response expected while saving
    pub response_ms: u64,
    /// HTTP client request timeout
    pub api_ms: u64,
    /// URL reachability probes of `check`
    pub probe_ms: u64,
    /// Network idle approximation between navigation steps
    pub network_idle_ms: u64,
    /// Multiplier for fixed settle pauses (0 disables them)
    pub settle_factor: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: 5000,
            visible_ms: 7000,
            field_ms: 10000,
            navigation_ms: 30000,
            load_ms: 15000,
            indicator_ms: 5000,
            confirmation_ms: 10000,
            response_ms: 30000,
            api_ms: 10000,
            probe_ms: 5000,
            network_idle_ms: 10000,
            settle_factor: 1,
        }
    }
}

impl Timeouts {
    /// Uniformly tiny budgets, for driving flows against scripted pages
    pub fn scaled_down(ms: u64) -> Self {
        Self {
            action_ms: ms,
            visible_ms: ms,
            field_ms: ms,
            navigation_ms: ms,
            load_ms: ms,
            indicator_ms: ms,
            confirmation_ms: ms,
            response_ms: ms,
            api_ms: ms.max(1000),
            probe_ms: ms.max(1000),
            network_idle_ms: ms,
            settle_factor: 0,
        }
    }

    pub fn settle(&self, ms: u64) -> u64 {
        ms * self.settle_factor
    }
}

/// Run configuration, loaded once and shared read-only by every scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub ui_base_url: String,
    pub ui_username: String,
    pub ui_password: String,
    pub headless: bool,
    pub api_base_url: String,
    /// `None` when unset or still the placeholder
    pub api_token: Option<String>,
    pub browser: BrowserKind,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ui_base_url: DEFAULT_UI_BASE_URL.to_string(),
            ui_username: String::new(),
            ui_password: String::new(),
            headless: true,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            browser: BrowserKind::Chromium,
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    /// Load `.env` (if present) into the process environment, then read it
    ///
    /// Variables already set in the environment win over the file.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) if path.exists() => {
                dotenvy::from_path(path)?;
                log::debug!("Loaded environment from {}", path.display());
            }
            Some(path) => {
                log::warn!("Env file {} not found, using environment only", path.display());
            }
            None => {
                if let Ok(path) = dotenvy::dotenv() {
                    log::debug!("Loaded environment from {}", path.display());
                }
            }
        }
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build a config from any key lookup (environment, map, ...)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            ui_base_url: get("UI_BASE_URL").unwrap_or(defaults.ui_base_url),
            ui_username: get("UI_USERNAME").unwrap_or_default(),
            ui_password: get("UI_PASSWORD").unwrap_or_default(),
            headless: get("HEADLESS").map_or(true, |v| v != "false"),
            api_base_url: get("API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_token: get("API_TOKEN").filter(|t| t != TOKEN_PLACEHOLDER),
            browser: get("BROWSER")
                .and_then(|b| BrowserKind::parse(&b))
                .unwrap_or_default(),
            timeouts: defaults.timeouts,
        }
    }

    pub fn from_map(values: &HashMap<String, String>) -> Self {
        Self::from_lookup(|key| values.get(key).cloned())
    }

    /// Resolve a path against the UI base URL; absolute URLs pass through
    pub fn ui_url(&self, path: &str) -> String {
        join_url(&self.ui_base_url, path)
    }

    pub fn api_url(&self, path: &str) -> String {
        join_url(&self.api_base_url, path)
    }

    pub fn has_ui_credentials(&self) -> bool {
        !self.ui_username.is_empty() && !self.ui_password.is_empty()
    }
}

pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.is_empty() || path == "/" {
        format!("{}/", base)
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
