use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Browser page interface used by every flow
///
/// Selectors are single Playwright selector strings (one candidate of a
/// `TolerantSelector`). Element operations act on the first match. All calls
/// suspend the calling scenario until the browser has answered; a flow never
/// has two calls in flight on the same page.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Engine name (e.g., "chromium", "webkit", "fake")
    fn engine_name(&self) -> &str;

    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// Current page URL
    async fn current_url(&self) -> Result<String>;

    /// `document.readyState` of the current document
    async fn ready_state(&self) -> Result<String>;

    /// Number of elements matching the selector (0 when absent)
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Whether the first match exists and is visible
    async fn is_visible(&self, selector: &str) -> Result<bool>;

    /// Whether the first match exists and is enabled
    async fn is_enabled(&self, selector: &str) -> Result<bool>;

    /// Click the first match
    async fn click(&self, selector: &str) -> Result<()>;

    /// Double click the first match
    async fn double_click(&self, selector: &str) -> Result<()>;

    /// Replace the value of the first matching input
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Current value of the first matching input
    async fn input_value(&self, selector: &str) -> Result<String>;

    /// Text content of the first match, `None` when absent
    async fn text_content(&self, selector: &str) -> Result<Option<String>>;

    /// Drag the first match of `source` onto the first match of `target`
    async fn drag_to(&self, source: &str, target: &str) -> Result<()>;

    /// Attach a local file to the first matching file input
    async fn set_input_files(&self, selector: &str, file: &Path) -> Result<()>;

    /// Click the first match and wait for a 2xx HTTP response
    ///
    /// # Returns
    /// The status of the first successful response, or `None` if none
    /// arrived within `timeout_ms`.
    async fn click_awaiting_success(&self, selector: &str, timeout_ms: u64)
        -> Result<Option<u16>>;

    /// Save a PNG screenshot of the viewport
    async fn screenshot(&self, path: &Path) -> Result<()>;
}
