//! Web Driver implementation using Playwright
//!
//! Each `WebDriver` owns its own browser, context and page, so scenarios
//! running in parallel never share browser state.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use futures::stream::StreamExt;
use playwright::api::page::Event;
use playwright::api::{Browser, BrowserContext, File, Page, Viewport};
use playwright::Playwright;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::driver::common::{first_success_status, guess_mime};
use crate::driver::traits::BrowserPage;
use crate::utils::config::{BrowserKind, Config};

/// Web Driver configuration
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Default budget for clicks and fills (ms)
    pub action_timeout_ms: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 5000,
        }
    }
}

impl WebDriverConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            browser: config.browser,
            headless: config.headless,
            action_timeout_ms: config.timeouts.action_ms,
            ..Self::default()
        }
    }
}

/// Web Driver using Playwright
pub struct WebDriver {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    #[allow(dead_code)]
    browser: Arc<Browser>,
    #[allow(dead_code)]
    context: Arc<BrowserContext>,
    page: Arc<Mutex<Page>>,
    config: WebDriverConfig,
}

impl WebDriver {
    /// Launch a fresh browser with an isolated context and page
    pub async fn new(config: WebDriverConfig) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let browser = match config.browser {
            BrowserKind::Chromium => launch_chromium_browser(&playwright.chromium(), &config).await?,
            BrowserKind::Firefox => {
                playwright
                    .firefox()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await?
            }
            BrowserKind::Webkit => {
                playwright
                    .webkit()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await?
            }
        };

        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;

        page.set_viewport_size(Viewport {
            width: config.viewport_width as i32,
            height: config.viewport_height as i32,
        })
        .await?;

        log::debug!(
            "Launched {} (headless: {})",
            config.browser.as_str(),
            config.headless
        );

        Ok(Self {
            playwright: Arc::new(playwright),
            browser: Arc::new(browser),
            context: Arc::new(context),
            page: Arc::new(Mutex::new(page)),
            config,
        })
    }

    fn action_timeout(&self) -> f64 {
        self.config.action_timeout_ms as f64
    }
}

#[async_trait]
impl BrowserPage for WebDriver {
    fn engine_name(&self) -> &str {
        self.config.browser.as_str()
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let page = self.page.lock().await;
        let url: String = page.evaluate("() => window.location.href", ()).await?;
        Ok(url)
    }

    async fn ready_state(&self) -> Result<String> {
        let page = self.page.lock().await;
        let state: String = page.evaluate("() => document.readyState", ()).await?;
        Ok(state)
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let page = self.page.lock().await;
        match page.query_selector_all(selector).await {
            Ok(elements) => Ok(elements.len()),
            Err(e) => {
                // Engines reject some selector syntaxes; treat as no match
                log::debug!("Selector '{}' rejected: {:?}", selector, e);
                Ok(0)
            }
        }
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let page = self.page.lock().await;
        match page.query_selector(selector).await {
            Ok(Some(el)) => Ok(el.is_visible().await.unwrap_or(false)),
            Ok(None) => Ok(false),
            Err(e) => {
                log::debug!("Selector '{}' rejected: {:?}", selector, e);
                Ok(false)
            }
        }
    }

    async fn is_enabled(&self, selector: &str) -> Result<bool> {
        let page = self.page.lock().await;
        match page.query_selector(selector).await? {
            Some(el) => Ok(el.is_enabled().await?),
            None => Ok(false),
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let page = self.page.lock().await;
        match page
            .click_builder(selector)
            .timeout(self.action_timeout())
            .click()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                println!(
                    "{} Click failed for selector '{}': {:?}",
                    "❌".red(),
                    selector,
                    e
                );
                Err(anyhow::anyhow!("Failed to click: {}. Error: {:?}", selector, e))
            }
        }
    }

    async fn double_click(&self, selector: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.dblclick_builder(selector)
            .timeout(self.action_timeout())
            .dblclick()
            .await
            .with_context(|| format!("Failed to double click: {}", selector))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let page = self.page.lock().await;
        let el = page
            .query_selector(selector)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Element not found for fill: {}", selector))?;
        el.fill_builder(text)
            .fill()
            .await
            .with_context(|| format!("Failed to fill: {}", selector))?;
        Ok(())
    }

    async fn input_value(&self, selector: &str) -> Result<String> {
        let page = self.page.lock().await;
        let value = page
            .evaluate_on_selector::<String, _>(selector, "el => el.value ?? ''", None::<String>)
            .await
            .unwrap_or_default();
        Ok(value)
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        let page = self.page.lock().await;
        if page.query_selector(selector).await?.is_none() {
            return Ok(None);
        }
        let js = "el => el.innerText || el.textContent || ''";
        let text = page
            .evaluate_on_selector::<String, _>(selector, js, None::<String>)
            .await
            .ok();
        Ok(text)
    }

    async fn drag_to(&self, source: &str, target: &str) -> Result<()> {
        let page = self.page.lock().await;

        let (sx, sy) = element_center(&page, source).await?;
        let (tx, ty) = element_center(&page, target).await?;

        // Intermediate move so HTML5 drag handlers see dragover before drop
        page.mouse.r#move(sx, sy, None).await?;
        page.mouse.down(None, None).await?;
        page.mouse.r#move((sx + tx) / 2.0, (sy + ty) / 2.0, None).await?;
        page.mouse.r#move(tx, ty, None).await?;
        page.mouse.up(None, None).await?;
        Ok(())
    }

    async fn set_input_files(&self, selector: &str, file: &Path) -> Result<()> {
        let bytes = std::fs::read(file)
            .with_context(|| format!("Failed to read upload file {}", file.display()))?;
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let payload = File::new(name, guess_mime(file).to_string(), &bytes);

        let page = self.page.lock().await;
        let el = page
            .query_selector(selector)
            .await?
            .ok_or_else(|| anyhow::anyhow!("File input not found: {}", selector))?;
        el.set_input_files_builder(payload)
            .set_input_files()
            .await
            .with_context(|| format!("Failed to set files on {}", selector))?;
        Ok(())
    }

    async fn click_awaiting_success(
        &self,
        selector: &str,
        timeout_ms: u64,
    ) -> Result<Option<u16>> {
        let page = self.page.lock().await;

        // One subscription for the whole wait, taken before the click
        let events = page
            .subscribe_event()
            .map_err(|e| anyhow::anyhow!("Failed to subscribe to page events: {:?}", e))?;
        let statuses = events.filter_map(|event| async move {
            match event {
                Ok(Event::Response(response)) => Some(
                    response
                        .status()
                        .map(|status| status as u16)
                        .map_err(|e| format!("{:?}", e)),
                ),
                Ok(_) => None,
                Err(e) => Some(Err(e.to_string())),
            }
        });
        let waiter = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            first_success_status(Box::pin(statuses)),
        );
        let clicker = page
            .click_builder(selector)
            .timeout(self.action_timeout())
            .click();

        let (response, clicked) = tokio::join!(waiter, clicker);
        clicked.with_context(|| format!("Failed to click: {}", selector))?;

        let status = response.ok().flatten();
        if let Some(status) = status {
            log::debug!("Response {} after '{}'", status, selector);
        }
        Ok(status)
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let page = self.page.lock().await;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        page.screenshot_builder()
            .path(path.to_path_buf())
            .screenshot()
            .await?;
        Ok(())
    }
}

/// Center of the first match, scrolled into view
async fn element_center(page: &Page, selector: &str) -> Result<(f64, f64)> {
    let el = page
        .query_selector(selector)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Drag element not found: {}", selector))?;
    el.scroll_into_view_if_needed(None).await?;
    let rect = el
        .bounding_box()
        .await?
        .ok_or_else(|| anyhow::anyhow!("No bounding box for: {}", selector))?;
    Ok((rect.x + rect.width / 2.0, rect.y + rect.height / 2.0))
}

/// Launch Chromium, preferring a system browser when one is installed
async fn launch_chromium_browser(
    chromium: &playwright::api::BrowserType,
    config: &WebDriverConfig,
) -> Result<Browser> {
    let mut launcher = chromium.launcher();
    launcher = launcher.headless(config.headless);

    let env_path = std::env::var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH")
        .ok()
        .map(PathBuf::from);
    let system_path = if env_path.is_none() { find_system_browser() } else { None };

    if let Some(ref path) = env_path {
        println!("{} Using browser from env: {}", "🌐".blue(), path.display());
        launcher = launcher.executable(path);
    } else if let Some(ref path) = system_path {
        log::info!("Using discovered browser: {}", path.display());
        launcher = launcher.executable(path);
    } else {
        log::info!("No system browser found, using Playwright's bundled Chromium");
    }

    let args: Vec<String> = [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--ignore-certificate-errors",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    launcher = launcher.args(&args);

    Ok(launcher.launch().await?)
}

fn find_system_browser() -> Option<PathBuf> {
    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ];

    common_paths
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}
