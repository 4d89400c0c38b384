//! Configuration check: print what is set and probe the endpoints

use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Duration;

use super::config::{Config, TOKEN_PLACEHOLDER};
use crate::api::learning_instance::LEARNING_INSTANCES_PATH;
use crate::api::ApiClient;

/// Result of a HEAD probe against a base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Accessible(u16),
    Status(u16),
    DomainNotFound,
    ConnectionRefused,
    Error(String),
}

impl ProbeOutcome {
    pub fn from_status(status: u16) -> Self {
        if status < 400 {
            Self::Accessible(status)
        } else {
            Self::Status(status)
        }
    }

    /// Classify a transport failure from its rendered cause chain
    pub fn from_transport_error(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("dns error")
            || lower.contains("failed to lookup address")
            || lower.contains("name or service not known")
            || lower.contains("no such host")
        {
            Self::DomainNotFound
        } else if lower.contains("connection refused") {
            Self::ConnectionRefused
        } else {
            Self::Error(message.to_string())
        }
    }
}

/// Meaning of the status returned by the authenticated list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Unauthorized,
    EndpointNotFound,
    Other(u16),
}

impl AuthOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Success,
            401 => Self::Unauthorized,
            404 => Self::EndpointNotFound,
            other => Self::Other(other),
        }
    }
}

/// How a raw `API_TOKEN` value reads
pub fn token_state(raw: Option<&str>) -> &'static str {
    match raw.map(str::trim) {
        None | Some("") => "NOT SET",
        Some(TOKEN_PLACEHOLDER) => "NOT CONFIGURED (still placeholder)",
        Some(_) => "SET",
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Plain client for reachability probes; carries no credentials
pub fn probe_client(timeout_ms: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .context("Failed to create probe client")
}

/// HEAD `url` and classify the answer
pub async fn probe_url(client: &reqwest::Client, url: &str) -> ProbeOutcome {
    match client.head(url).send().await {
        Ok(response) => ProbeOutcome::from_status(response.status().as_u16()),
        Err(e) => ProbeOutcome::from_transport_error(&error_chain(&e)),
    }
}

fn print_probe(name: &str, url: &str, outcome: &ProbeOutcome) {
    match outcome {
        ProbeOutcome::Accessible(status) => println!(
            "  {} {}: {} - Accessible (Status: {})",
            "✓".green(),
            name,
            url,
            status
        ),
        ProbeOutcome::Status(status) => {
            println!("  {} {}: {} - Status: {}", "⚠".yellow(), name, url, status)
        }
        ProbeOutcome::DomainNotFound => {
            println!("  {} {}: {} - Domain not found", "✗".red(), name, url)
        }
        ProbeOutcome::ConnectionRefused => {
            println!("  {} {}: {} - Connection refused", "✗".red(), name, url)
        }
        ProbeOutcome::Error(message) => {
            println!("  {} {}: {} - Error: {}", "✗".red(), name, url, message)
        }
    }
}

/// Print the configuration and probe results; never fails the process
pub async fn run_check(config: &Config, raw_token: Option<&str>) {
    println!("{} Configuration check\n", "🔍".blue());

    let or_missing = |value: &str| {
        if value.is_empty() {
            "NOT SET".red().to_string()
        } else {
            value.to_string()
        }
    };
    println!("{} UI", "📱".blue());
    println!("  UI_BASE_URL:  {}", config.ui_base_url);
    println!("  UI_USERNAME:  {}", or_missing(&config.ui_username));
    println!(
        "  UI_PASSWORD:  {}",
        if config.ui_password.is_empty() {
            "NOT SET".red().to_string()
        } else {
            "***".to_string()
        }
    );
    println!("  HEADLESS:     {}", config.headless);
    println!("  BROWSER:      {}", config.browser.as_str());

    println!("\n{} API", "🔌".blue());
    println!("  API_BASE_URL: {}", config.api_base_url);
    println!("  API_TOKEN:    {}", token_state(raw_token));

    let (prober, client) = match (
        probe_client(config.timeouts.probe_ms),
        ApiClient::from_config(config),
    ) {
        (Ok(prober), Ok(client)) => (prober, client),
        (Err(e), _) | (_, Err(e)) => {
            println!("\n{} Cannot build HTTP client: {:#}", "✗".red(), e);
            return;
        }
    };

    println!("\n{} URL accessibility\n", "🌐".blue());
    for (name, url) in [
        ("UI Base URL", config.ui_base_url.as_str()),
        ("API Base URL", config.api_base_url.as_str()),
    ] {
        let outcome = probe_url(&prober, url).await;
        print_probe(name, url, &outcome);
    }

    if config.api_token.is_some() {
        println!("\n{} API authentication", "🔐".blue());
        match client.get(LEARNING_INSTANCES_PATH).await {
            Ok(response) => match AuthOutcome::from_status(response.status) {
                AuthOutcome::Success => println!("  {} SUCCESS (Status: 200)", "✓".green()),
                AuthOutcome::Unauthorized => {
                    println!("  {} FAILED - Unauthorized (invalid token?)", "✗".red())
                }
                AuthOutcome::EndpointNotFound => println!(
                    "  {} Token might be valid, but endpoint not found",
                    "⚠".yellow()
                ),
                AuthOutcome::Other(status) => println!("  {} Status {}", "⚠".yellow(), status),
            },
            Err(e) => println!("  {} Error - {:#}", "✗".red(), e),
        }
    } else {
        println!("\n{} Skipping API authentication - API_TOKEN not configured", "⚠".yellow());
    }

    println!("\nNext steps:");
    println!("  1. Verify all URLs are accessible");
    println!("  2. Ensure API_TOKEN is set (not the placeholder)");
    println!("  3. Log in manually once to confirm the credentials");
    println!("  4. Run the suite: flowcheck run");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_outcomes() {
        assert_eq!(ProbeOutcome::from_status(200), ProbeOutcome::Accessible(200));
        assert_eq!(ProbeOutcome::from_status(302), ProbeOutcome::Accessible(302));
        assert_eq!(ProbeOutcome::from_status(403), ProbeOutcome::Status(403));

        assert_eq!(
            ProbeOutcome::from_transport_error(
                "error sending request: client error (Connect): dns error: failed to lookup address information"
            ),
            ProbeOutcome::DomainNotFound
        );
        assert_eq!(
            ProbeOutcome::from_transport_error("tcp connect error: Connection refused (os error 111)"),
            ProbeOutcome::ConnectionRefused
        );
        assert!(matches!(
            ProbeOutcome::from_transport_error("operation timed out"),
            ProbeOutcome::Error(_)
        ));
    }

    #[test]
    fn test_auth_outcomes() {
        assert_eq!(AuthOutcome::from_status(200), AuthOutcome::Success);
        assert_eq!(AuthOutcome::from_status(401), AuthOutcome::Unauthorized);
        assert_eq!(AuthOutcome::from_status(404), AuthOutcome::EndpointNotFound);
        assert_eq!(AuthOutcome::from_status(500), AuthOutcome::Other(500));
    }

    #[test]
    fn test_token_state() {
        assert_eq!(token_state(None), "NOT SET");
        assert_eq!(token_state(Some(" ")), "NOT SET");
        assert_eq!(token_state(Some(TOKEN_PLACEHOLDER)), "NOT CONFIGURED (still placeholder)");
        assert_eq!(token_state(Some("abc")), "SET");
    }
}
