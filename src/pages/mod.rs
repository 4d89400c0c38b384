//! Page objects
//!
//! `BasePage` carries the navigation and assertion primitives every flow is
//! built from. Concrete pages only declare their selectors and step order.

pub mod form;
pub mod login;
pub mod message_box;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::driver::common::{poll_for, settle, PollConfig};
use crate::driver::selector::TolerantSelector;
use crate::driver::traits::BrowserPage;
use crate::error::E2eError;
use crate::utils::config::Config;

pub use form::FormPage;
pub use login::{LoginEvidence, LoginPage};
pub use message_box::MessageBoxPage;

/// Milestones of a builder flow, in the order they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Idle,
    Navigated,
    DialogOpen,
    ObjectCreated,
    ElementsPlaced,
    ElementConfigured(usize),
    Saved,
    Confirmed,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStage::Idle => write!(f, "idle"),
            FlowStage::Navigated => write!(f, "navigated"),
            FlowStage::DialogOpen => write!(f, "dialog open"),
            FlowStage::ObjectCreated => write!(f, "object created"),
            FlowStage::ElementsPlaced => write!(f, "elements placed"),
            FlowStage::ElementConfigured(n) => write!(f, "element {} configured", n),
            FlowStage::Saved => write!(f, "saved"),
            FlowStage::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// Receives each stage a flow reaches
pub type ProgressSink = Arc<dyn Fn(FlowStage) + Send + Sync>;

/// Base navigable page
///
/// Every method blocks the calling scenario until its condition holds or its
/// budget runs out. Waits never retry the step that preceded them.
#[async_trait]
pub trait BasePage: Send + Sync {
    fn page(&self) -> &dyn BrowserPage;

    fn config(&self) -> &Config;

    /// Navigate to `ui_base_url + path`
    async fn goto(&self, path: &str) -> Result<()> {
        let url = self.config().ui_url(path);
        log::debug!("goto {}", url);
        self.page().goto(&url).await
    }

    /// Wait up to the default visibility budget (7s)
    ///
    /// # Returns
    /// The candidate selector that became visible.
    async fn expect_visible(&self, selector: &TolerantSelector) -> Result<String> {
        self.expect_visible_within(selector, self.config().timeouts.visible_ms)
            .await
    }

    async fn expect_visible_within(
        &self,
        selector: &TolerantSelector,
        timeout_ms: u64,
    ) -> Result<String> {
        let page = self.page();
        // Driver errors end the wait at once
        let found = poll_for(
            || async move { selector.resolve_visible(page).await.transpose() },
            PollConfig::with_timeout(timeout_ms),
        )
        .await;

        match found {
            Some(Ok(candidate)) => {
                log::debug!("'{}' visible via {}", selector, candidate);
                Ok(candidate)
            }
            Some(Err(e)) => Err(e.context(format!("Failed to look up '{}'", selector.name()))),
            None => Err(E2eError::VisibilityTimeout {
                selector: selector.name().to_string(),
                timeout_ms,
            }
            .into()),
        }
    }

    /// Wait until the first visible match has exactly `text` (trimmed)
    async fn expect_text(&self, selector: &TolerantSelector, text: &str) -> Result<()> {
        let timeout_ms = self.config().timeouts.visible_ms;
        let page = self.page();
        let last_seen = std::sync::Mutex::new(None::<String>);

        let matched = poll_for(
            || {
                let last_seen = &last_seen;
                async move {
                    let candidate = selector.resolve_visible(page).await.ok().flatten()?;
                    let content = page.text_content(&candidate).await.ok().flatten()?;
                    let trimmed = content.trim().to_string();
                    let hit = trimmed == text;
                    if let Ok(mut guard) = last_seen.lock() {
                        *guard = Some(trimmed);
                    }
                    hit.then_some(())
                }
            },
            PollConfig::with_timeout(timeout_ms),
        )
        .await;

        if matched.is_some() {
            return Ok(());
        }
        let actual = last_seen.lock().ok().and_then(|g| g.clone());
        Err(E2eError::TextMismatch {
            selector: selector.name().to_string(),
            expected: text.to_string(),
            actual,
        }
        .into())
    }

    /// Visible check on one concrete candidate
    async fn wait_candidate_visible(&self, candidate: &str, timeout_ms: u64) -> bool {
        let page = self.page();
        poll_for(
            || async move { page.is_visible(candidate).await.ok().filter(|v| *v) },
            PollConfig::with_timeout(timeout_ms),
        )
        .await
        .is_some()
    }

    async fn expect_enabled(&self, candidate: &str, name: &str) -> Result<()> {
        if self.page().is_enabled(candidate).await? {
            Ok(())
        } else {
            Err(E2eError::ElementDisabled {
                selector: name.to_string(),
            }
            .into())
        }
    }

    /// Click the first visible candidate within the action budget
    async fn click(&self, selector: &TolerantSelector) -> Result<()> {
        let timeout_ms = self.config().timeouts.action_ms;
        let candidate = self.expect_visible_within(selector, timeout_ms).await?;
        self.page().click(&candidate).await
    }

    /// Fill the first visible candidate within the action budget
    async fn fill(&self, selector: &TolerantSelector, text: &str) -> Result<()> {
        let timeout_ms = self.config().timeouts.action_ms;
        let candidate = self.expect_visible_within(selector, timeout_ms).await?;
        self.page().fill(&candidate, text).await
    }

    /// DOM parsed (`readyState` past "loading")
    async fn wait_for_dom_ready(&self, timeout_ms: u64) -> Result<bool> {
        let page = self.page();
        Ok(poll_for(
            || async move {
                page.ready_state()
                    .await
                    .ok()
                    .filter(|state| state != "loading")
            },
            PollConfig::with_timeout(timeout_ms),
        )
        .await
        .is_some())
    }

    /// Approximation of network idle: document complete, then a short quiet period
    async fn wait_for_network_idle(&self) -> Result<()> {
        let timeouts = &self.config().timeouts;
        let page = self.page();
        let complete = poll_for(
            || async move { page.ready_state().await.ok().filter(|s| s == "complete") },
            PollConfig::with_timeout(timeouts.network_idle_ms),
        )
        .await;
        if complete.is_none() {
            log::warn!(
                "Document not complete after {}ms, continuing",
                timeouts.network_idle_ms
            );
        }
        settle(timeouts.settle(500)).await;
        Ok(())
    }

    /// Wait until the current URL satisfies `predicate`
    async fn wait_for_url<F>(&self, predicate: F, timeout_ms: u64) -> Result<bool>
    where
        F: Fn(&str) -> bool + Send + Sync,
    {
        let page = self.page();
        let predicate = &predicate;
        Ok(poll_for(
            || async move {
                page.current_url()
                    .await
                    .ok()
                    .filter(|url| predicate(url))
            },
            PollConfig::with_timeout(timeout_ms),
        )
        .await
        .is_some())
    }

    /// Fail unless the URL matches `pattern` (case-insensitive) in time
    async fn expect_url_matches(&self, pattern: &str, timeout_ms: u64) -> Result<()> {
        let re = Regex::new(&format!("(?i){}", pattern))?;
        if self.wait_for_url(|url| re.is_match(url), timeout_ms).await? {
            Ok(())
        } else {
            Err(E2eError::UrlTimeout {
                pattern: pattern.to_string(),
                timeout_ms,
            }
            .into())
        }
    }

    /// Fixed pause, scaled by `Timeouts::settle_factor`
    async fn pause(&self, ms: u64) {
        settle(self.config().timeouts.settle(ms)).await;
    }

    /// Click save while waiting for a 2xx response, then require a confirmation
    async fn save_and_confirm(
        &self,
        save_button: &TolerantSelector,
        confirmation: &TolerantSelector,
    ) -> Result<u16> {
        let timeouts = &self.config().timeouts;
        let candidate = self
            .expect_visible_within(save_button, timeouts.action_ms)
            .await?;

        let status = self
            .page()
            .click_awaiting_success(&candidate, timeouts.response_ms)
            .await?
            .ok_or_else(|| E2eError::ResponseTimeout {
                action: save_button.name().to_string(),
                timeout_ms: timeouts.response_ms,
            })?;
        log::info!("Save acknowledged with HTTP {}", status);

        self.pause(1000).await;
        self.expect_visible_within(confirmation, timeouts.confirmation_ms)
            .await?;
        Ok(status)
    }
}

/// Left-hand "Automation" menu entry
pub(crate) fn automation_menu() -> TolerantSelector {
    TolerantSelector::new("Automation menu")
        .has_text("nav a", "Automation")
        .css("[aria-label=\"Automation\"]")
        .has_text("li", "Automation")
}

/// "Create" dropdown on the Automation page
pub(crate) fn create_dropdown() -> TolerantSelector {
    TolerantSelector::new("Create dropdown")
        .has_text("button", "Create")
        .css("[aria-label=\"Create\"]")
        .has_text("button.dropdown-toggle", "Create")
}

/// Submit button of a creation dialog
pub(crate) fn create_button() -> TolerantSelector {
    TolerantSelector::new("Create button")
        .has_text("button[type=\"submit\"]", "Create")
        .has_text("button", "Create")
}

pub(crate) fn description_input() -> TolerantSelector {
    TolerantSelector::new("description input")
        .css("textarea[name=\"description\"]")
        .css("textarea[placeholder*=\"description\" i]")
}

/// Configuration side panel of the selected element
pub(crate) fn right_panel() -> TolerantSelector {
    TolerantSelector::new("right panel")
        .css("[class*=\"right-panel\"]")
        .css("[class*=\"properties\"]")
        .css("[class*=\"config\"]")
        .css("[class*=\"panel\"][class*=\"right\"]")
}

pub(crate) fn save_button() -> TolerantSelector {
    TolerantSelector::new("Save button")
        .has_text("button", "Save")
        .has_text("button[type=\"submit\"]", "Save")
}

/// Shared first two steps of every builder flow
pub(crate) async fn open_create_menu<P: BasePage + ?Sized>(
    page: &P,
    option: &TolerantSelector,
) -> Result<()> {
    page.click(&create_dropdown()).await?;
    page.pause(500).await;
    page.click(option).await?;
    page.wait_for_network_idle().await
}

pub(crate) async fn navigate_to_automation<P: BasePage + ?Sized>(page: &P) -> Result<()> {
    page.wait_for_network_idle().await?;
    page.click(&automation_menu()).await?;
    page.wait_for_network_idle().await
}

pub(crate) fn report(progress: &Option<ProgressSink>, stage: FlowStage) {
    log::debug!("Flow stage: {}", stage);
    if let Some(sink) = progress {
        sink(stage);
    }
}
