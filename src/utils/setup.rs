//! Interactive `.env` setup

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::Path;

use super::config::{DEFAULT_API_BASE_URL, DEFAULT_UI_BASE_URL, TOKEN_PLACEHOLDER};

/// Answers collected by the prompts
#[derive(Debug, Clone, PartialEq)]
pub struct EnvAnswers {
    pub ui_base_url: String,
    pub ui_username: String,
    pub ui_password: String,
    pub headless: bool,
    pub api_base_url: String,
    pub api_token: String,
}

/// Token preview: first 20 characters, or NOT SET
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        "NOT SET".to_string()
    } else {
        format!("{}...", token.chars().take(20).collect::<String>())
    }
}

/// Commented `.env` file in the layout `Config::load` reads
pub fn render_env_file(answers: &EnvAnswers) -> String {
    let token = if answers.api_token.is_empty() {
        TOKEN_PLACEHOLDER
    } else {
        answers.api_token.as_str()
    };
    format!(
        "# ============================================
# UI Test Configuration
# ============================================
# Base URL of the automation platform UI
UI_BASE_URL={}

# Login email
UI_USERNAME={}

# Login password
UI_PASSWORD={}

# Run the browser headless (true) or visible (false)
HEADLESS={}

# ============================================
# API Test Configuration
# ============================================
# Base URL of the REST API
API_BASE_URL={}

# Bearer token for API requests
API_TOKEN={}
",
        answers.ui_base_url,
        answers.ui_username,
        answers.ui_password,
        answers.headless,
        answers.api_base_url,
        token
    )
}

struct Prompter<'a, R: BufRead, W: Write> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Prompter<'_, R, W> {
    /// Read one trimmed line; EOF counts as an empty answer
    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn ask_or(&mut self, prompt: &str, default: &str) -> Result<String> {
        let answer = self.ask(&format!("{} [{}]: ", prompt, default))?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    fn ask_yes(&mut self, prompt: &str) -> Result<bool> {
        Ok(self.ask_or(prompt, "y")?.eq_ignore_ascii_case("y"))
    }
}

/// Prompt for every variable, show a summary and write `env_path` on confirmation
///
/// # Returns
/// The answers, and whether the file was written.
pub fn run_configure<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    env_path: &Path,
) -> Result<(EnvAnswers, bool)> {
    let mut p = Prompter { input, output };

    writeln!(p.output, "{} Environment configuration\n", "🔧".blue())?;
    writeln!(p.output, "Press Enter to use default values (shown in brackets)")?;

    writeln!(p.output, "\n{} UI", "📱".blue())?;
    let ui_base_url = p.ask_or("UI Base URL", DEFAULT_UI_BASE_URL)?;
    let ui_username = p.ask("UI Username (email): ")?;
    if ui_username.is_empty() {
        writeln!(p.output, "{} UI_USERNAME is required for UI tests", "⚠".yellow())?;
    }
    let ui_password = p.ask("UI Password: ")?;
    if ui_password.is_empty() {
        writeln!(p.output, "{} UI_PASSWORD is required for UI tests", "⚠".yellow())?;
    }
    let headless = p.ask_yes("Run browser in headless mode? (y/n)")?;

    writeln!(p.output, "\n{} API", "🔌".blue())?;
    let api_base_url = p.ask_or("API Base URL", DEFAULT_API_BASE_URL)?;
    let mut api_token = p.ask("API Token: ")?;
    if api_token.is_empty() || api_token == TOKEN_PLACEHOLDER {
        api_token.clear();
        writeln!(p.output, "{} API_TOKEN is required for API tests", "⚠".yellow())?;
        writeln!(p.output, "   You can set it later by editing {}", env_path.display())?;
    }

    let answers = EnvAnswers {
        ui_base_url,
        ui_username,
        ui_password,
        headless,
        api_base_url,
        api_token,
    };

    writeln!(p.output, "\n{} Summary", "📋".blue())?;
    writeln!(p.output, "  UI_BASE_URL:  {}", answers.ui_base_url)?;
    writeln!(p.output, "  UI_USERNAME:  {}", answers.ui_username)?;
    writeln!(p.output, "  UI_PASSWORD:  ***")?;
    writeln!(p.output, "  HEADLESS:     {}", answers.headless)?;
    writeln!(p.output, "  API_BASE_URL: {}", answers.api_base_url)?;
    writeln!(p.output, "  API_TOKEN:    {}", mask_token(&answers.api_token))?;

    if !p.ask_yes(&format!("\nSave this configuration to {}? (y/n)", env_path.display()))? {
        writeln!(p.output, "\n{} Configuration not saved", "✗".red())?;
        return Ok((answers, false));
    }

    std::fs::write(env_path, render_env_file(&answers))
        .with_context(|| format!("Failed to write {}", env_path.display()))?;
    writeln!(p.output, "\n{} Saved to {}", "✓".green(), env_path.display())?;
    writeln!(p.output, "Next: `flowcheck check`, then `flowcheck run`")?;
    Ok((answers, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::Config;
    use std::io::Cursor;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(""), "NOT SET");
        assert_eq!(mask_token("abc"), "abc...");
        assert_eq!(
            mask_token("0123456789abcdefghijXYZ"),
            "0123456789abcdefghij..."
        );
    }

    #[test]
    fn test_defaults_and_written_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        let mut input = Cursor::new("\nme@example.com\nsecret\nn\n\n\n\n");
        let mut output = Vec::new();

        let (answers, saved) = run_configure(&mut input, &mut output, &env_path).unwrap();
        assert!(saved);
        assert_eq!(answers.ui_base_url, DEFAULT_UI_BASE_URL);
        assert!(!answers.headless);
        assert!(answers.api_token.is_empty());

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("API_TOKEN is required"));
        assert!(printed.contains("UI_PASSWORD:  ***"));
        assert!(!printed.contains("secret"));

        let written = std::fs::read_to_string(&env_path).unwrap();
        let values: std::collections::HashMap<String, String> = written
            .lines()
            .filter(|l| !l.starts_with('#'))
            .filter_map(|l| l.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_map(&values);
        assert_eq!(config.ui_username, "me@example.com");
        assert!(!config.headless);
        assert_eq!(config.api_token, None);
        assert_eq!(values["API_TOKEN"], TOKEN_PLACEHOLDER);
    }

    #[test]
    fn test_declined_save_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join(".env");
        let mut input = Cursor::new("\nu\np\ny\n\ntok\nn\n");
        let mut output = Vec::new();

        let (answers, saved) = run_configure(&mut input, &mut output, &env_path).unwrap();
        assert!(!saved);
        assert_eq!(answers.api_token, "tok");
        assert!(!env_path.exists());
    }
}
