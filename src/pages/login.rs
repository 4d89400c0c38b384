use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use super::BasePage;
use crate::driver::selector::TolerantSelector;
use crate::driver::traits::BrowserPage;
use crate::error::E2eError;
use crate::utils::config::Config;

const PASSWORD_INPUT: &str = "input[type=\"password\"]";

fn login_path() -> &'static Regex {
    static LOGIN_PATH: OnceLock<Regex> = OnceLock::new();
    LOGIN_PATH.get_or_init(|| Regex::new(r"/(login|signin|auth)").expect("static regex"))
}

/// Whether a URL still points at a login-shaped page
pub fn is_login_url(url: &str) -> bool {
    login_path().is_match(url)
}

/// What convinced `expect_logged_in` that the session is authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginEvidence {
    /// A logged-in indicator became visible
    Indicator(String),
    /// No indicator found, but no login form and no login URL either
    NoLoginForm,
}

pub struct LoginPage {
    page: Arc<dyn BrowserPage>,
    config: Arc<Config>,
    username: TolerantSelector,
    password: TolerantSelector,
    submit: TolerantSelector,
    logged_in_indicators: TolerantSelector,
}

impl LoginPage {
    pub fn new(page: Arc<dyn BrowserPage>, config: Arc<Config>) -> Self {
        Self {
            page,
            config,
            username: TolerantSelector::new("username field")
                .css("input[name=\"email\"]")
                .css("input[name=\"username\"]")
                .css("input[type=\"email\"]")
                .css("input[placeholder*=\"email\" i]")
                .css("input[placeholder*=\"username\" i]")
                .css("input[id*=\"email\"]")
                .css("input[id*=\"username\"]"),
            password: TolerantSelector::new("password field")
                .css("input[name=\"password\"]")
                .css(PASSWORD_INPUT)
                .css("input[placeholder*=\"password\" i]")
                .css("input[id*=\"password\"]"),
            submit: TolerantSelector::new("submit button")
                .css("button[type=\"submit\"]")
                .has_text("button", "Sign In")
                .has_text("button", "Login")
                .has_text("button", "Log In")
                .css("input[type=\"submit\"]"),
            // Logout controls first, then dashboard landmarks
            logged_in_indicators: TolerantSelector::new("logged-in indicator")
                .text("Logout")
                .text("Log Out")
                .text("Sign Out")
                .css("[aria-label*=\"logout\" i]")
                .css("[aria-label*=\"sign out\" i]")
                .has_text("button", "Logout")
                .css("[class*=\"user-menu\"]")
                .css("[class*=\"profile-menu\"]")
                .css("[data-testid*=\"user\"]")
                .css("nav a[href*=\"dashboard\"]")
                .css("nav a[href*=\"home\"]")
                .text("Dashboard")
                .text("Home")
                .css("[class*=\"dashboard\"]")
                .css("[class*=\"main-content\"]")
                .css("nav")
                .css("[role=\"navigation\"]"),
        }
    }

    /// Fill credentials, submit, and wait for the app to leave the login page
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let timeouts = &self.config.timeouts;
        self.wait_for_dom_ready(timeouts.load_ms).await?;

        let field = self
            .expect_visible_within(&self.username, timeouts.field_ms)
            .await?;
        self.page.fill(&field, username).await?;

        let field = self
            .expect_visible_within(&self.password, timeouts.field_ms)
            .await?;
        self.page.fill(&field, password).await?;

        let submit = self
            .expect_visible_within(&self.submit, timeouts.field_ms)
            .await?;
        self.page.click(&submit).await?;

        let left_login = self
            .wait_for_url(|url| !is_login_url(url), timeouts.navigation_ms)
            .await?;
        if left_login {
            log::info!("Left login page after submit");
        } else {
            log::warn!(
                "URL still login-shaped after {}ms, falling back to load state",
                timeouts.navigation_ms
            );
            if !self.wait_for_dom_ready(timeouts.load_ms).await? {
                log::warn!("Document not ready after {}ms", timeouts.load_ms);
            }
        }

        self.wait_for_dom_ready(timeouts.load_ms).await?;
        Ok(())
    }

    /// Heuristic post-login check
    ///
    /// A password field or a login-shaped URL fails the check. Otherwise the
    /// first visible indicator is returned; when none shows up the absence of
    /// the login form is accepted on its own.
    pub async fn expect_logged_in(&self) -> Result<LoginEvidence> {
        self.pause(1000).await;

        let password_fields = self.page.count(PASSWORD_INPUT).await?;
        let url = self.page.current_url().await?;
        let on_login_page = is_login_url(&url);

        if on_login_page || password_fields > 0 {
            return Err(E2eError::LoginVerification(format!(
                "still on login page or login form is visible (url: {}, password fields: {})",
                url, password_fields
            ))
            .into());
        }

        let budget = self.config.timeouts.indicator_ms;
        for candidate in self.logged_in_indicators.candidates() {
            if self.page.count(&candidate).await? == 0 {
                continue;
            }
            if self.wait_candidate_visible(&candidate, budget).await {
                log::info!("Logged in: found indicator {}", candidate);
                return Ok(LoginEvidence::Indicator(candidate));
            }
        }

        log::info!("Logged in: no indicator visible, login form absent at {}", url);
        Ok(LoginEvidence::NoLoginForm)
    }
}

#[async_trait]
impl BasePage for LoginPage {
    fn page(&self) -> &dyn BrowserPage {
        self.page.as_ref()
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
