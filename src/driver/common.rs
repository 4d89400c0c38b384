//! Common utilities shared by the page driver and the flows
//!
//! Polling helpers used for every bounded wait, plus small file helpers for
//! uploads.

use futures::stream::{Stream, StreamExt};
use std::fmt::Display;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

// ============================================================================
// Polling Utilities
// ============================================================================

/// Configuration for polling operations
#[derive(Clone)]
pub struct PollConfig {
    pub timeout_ms: u64,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub use_exponential_backoff: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10000,
            initial_interval_ms: 100,
            max_interval_ms: 500,
            use_exponential_backoff: true,
        }
    }
}

impl PollConfig {
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            ..Self::default()
        }
    }
}

/// Poll until `check_fn` yields a value
///
/// The check always runs at least once, so a zero timeout still observes the
/// current state. Returns `None` on timeout.
pub async fn poll_for<F, Fut, T>(check_fn: F, config: PollConfig) -> Option<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut interval = config.initial_interval_ms;

    loop {
        if let Some(value) = check_fn().await {
            return Some(value);
        }
        if start.elapsed() >= timeout {
            return None;
        }

        let remaining = timeout.saturating_sub(start.elapsed());
        tokio::time::sleep(Duration::from_millis(interval).min(remaining)).await;

        if config.use_exponential_backoff {
            interval = (interval * 3 / 2).min(config.max_interval_ms);
        }
    }
}

/// Fixed pause for UI transitions that expose no observable signal
pub async fn settle(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// First 2xx status on a response stream
///
/// Non-2xx statuses and stream errors (a lagged subscriber, an unreadable
/// response) are skipped. `None` only when the stream ends.
pub async fn first_success_status<S, E>(mut statuses: S) -> Option<u16>
where
    S: Stream<Item = Result<u16, E>> + Unpin,
    E: Display,
{
    while let Some(item) = statuses.next().await {
        match item {
            Ok(status) if (200..300).contains(&status) => return Some(status),
            Ok(status) => log::debug!("Ignoring response {}", status),
            Err(e) => log::debug!("Response stream: {}", e),
        }
    }
    None
}

// ============================================================================
// File Utilities
// ============================================================================

/// MIME type for an upload, by extension
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Last path component, accepting both separators
pub fn file_name_of(path: &str) -> String {
    path.rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or("file")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_poll_for_succeeds_after_retries() {
        let calls = AtomicUsize::new(0);
        let found = poll_for(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { (n >= 2).then_some(n) }
            },
            PollConfig {
                timeout_ms: 1000,
                initial_interval_ms: 1,
                max_interval_ms: 5,
                use_exponential_backoff: true,
            },
        )
        .await;
        assert_eq!(found, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_poll_for_times_out() {
        let start = Instant::now();
        let result: Option<()> = poll_for(|| async { None }, PollConfig::with_timeout(50)).await;
        assert!(result.is_none());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_zero_timeout_checks_once() {
        let calls = AtomicUsize::new(0);
        let result = poll_for(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Some(7) }
            },
            PollConfig::with_timeout(0),
        )
        .await;
        assert_eq!(result, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_success_skips_redirects_and_lag() {
        let statuses = futures::stream::iter(vec![
            Ok(304),
            Err("lagged by 3"),
            Ok(404),
            Ok(201),
            Ok(200),
        ]);
        assert_eq!(first_success_status(statuses).await, Some(201));
    }

    #[tokio::test]
    async fn test_first_success_none_when_stream_ends() {
        let statuses = futures::stream::iter(vec![Ok::<u16, &str>(500), Err("closed")]);
        assert_eq!(first_success_status(statuses).await, None);
    }

    #[test]
    fn test_file_helpers() {
        assert_eq!(file_name_of("tests/assets/sample.txt"), "sample.txt");
        assert_eq!(file_name_of("C:\\data\\report.pdf"), "report.pdf");
        assert_eq!(file_name_of(""), "file");
        assert_eq!(guess_mime(Path::new("a/sample.TXT")), "text/plain");
        assert_eq!(guess_mime(Path::new("blob")), "application/octet-stream");
    }
}
