//! Tolerant selectors
//!
//! The target application's markup is not under our control, so every element
//! a flow touches is described by an ordered list of alternative matchers.
//! Candidates are tried in order and the first one that matches wins.

use anyhow::Result;
use std::fmt;

use crate::driver::traits::BrowserPage;

/// One way of locating an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Plain CSS selector
    Css(String),
    /// Case-insensitive substring match on visible text
    Text(String),
    /// Regex on visible text, always case-insensitive
    TextPattern(String),
    /// CSS selector restricted to elements containing the text
    HasText { css: String, text: String },
}

impl Matcher {
    /// Render as a Playwright selector string
    pub fn to_playwright(&self) -> String {
        match self {
            Matcher::Css(css) => css.clone(),
            Matcher::Text(text) => format!("text={}", text),
            Matcher::TextPattern(pattern) => format!("text=/{}/i", pattern),
            Matcher::HasText { css, text } => {
                format!("{}:has-text(\"{}\")", css, text.replace('"', "\\\""))
            }
        }
    }
}

/// Ordered union of matchers for one logical element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TolerantSelector {
    name: String,
    candidates: Vec<Matcher>,
}

impl TolerantSelector {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            candidates: Vec::new(),
        }
    }

    pub fn css(mut self, css: &str) -> Self {
        self.candidates.push(Matcher::Css(css.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.candidates.push(Matcher::Text(text.to_string()));
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.candidates.push(Matcher::TextPattern(pattern.to_string()));
        self
    }

    pub fn has_text(mut self, css: &str, text: &str) -> Self {
        self.candidates.push(Matcher::HasText {
            css: css.to_string(),
            text: text.to_string(),
        });
        self
    }

    /// Candidates of `self` followed by those of `other`
    pub fn or(&self, other: &TolerantSelector) -> TolerantSelector {
        let mut merged = self.clone();
        merged.name = format!("{} | {}", self.name, other.name);
        merged.candidates.extend(other.candidates.iter().cloned());
        merged
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.candidates
    }

    /// Playwright selector strings in priority order
    pub fn candidates(&self) -> Vec<String> {
        self.candidates.iter().map(Matcher::to_playwright).collect()
    }

    /// First candidate that matches at least one element
    pub async fn resolve(&self, page: &dyn BrowserPage) -> Result<Option<String>> {
        for candidate in self.candidates() {
            if page.count(&candidate).await? > 0 {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// First candidate whose first match is visible
    pub async fn resolve_visible(&self, page: &dyn BrowserPage) -> Result<Option<String>> {
        for candidate in self.candidates() {
            if page.is_visible(&candidate).await? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Whether any candidate matches (the `count() > 0` probe for optional elements)
    pub async fn exists(&self, page: &dyn BrowserPage) -> Result<bool> {
        Ok(self.resolve(page).await?.is_some())
    }
}

impl fmt::Display for TolerantSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_matchers() {
        assert_eq!(Matcher::Css("nav".into()).to_playwright(), "nav");
        assert_eq!(Matcher::Text("Logout".into()).to_playwright(), "text=Logout");
        assert_eq!(
            Matcher::TextPattern("saved successfully".into()).to_playwright(),
            "text=/saved successfully/i"
        );
        assert_eq!(
            Matcher::HasText {
                css: "button".into(),
                text: "Sign In".into()
            }
            .to_playwright(),
            "button:has-text(\"Sign In\")"
        );
    }

    #[test]
    fn test_candidates_keep_declaration_order() {
        let selector = TolerantSelector::new("submit")
            .css("button[type=\"submit\"]")
            .has_text("button", "Login")
            .css("input[type=\"submit\"]");
        assert_eq!(
            selector.candidates(),
            vec![
                "button[type=\"submit\"]",
                "button:has-text(\"Login\")",
                "input[type=\"submit\"]"
            ]
        );
    }

    #[test]
    fn test_or_appends_candidates() {
        let toast = TolerantSelector::new("toast").pattern("saved successfully");
        let message = TolerantSelector::new("message").pattern("successfully");
        let either = toast.or(&message);
        assert_eq!(either.name(), "toast | message");
        assert_eq!(either.matchers().len(), 2);
        assert_eq!(either.candidates()[1], "text=/successfully/i");
    }

    #[test]
    fn test_has_text_escapes_quotes() {
        let m = Matcher::HasText {
            css: "a".into(),
            text: "say \"hi\"".into(),
        };
        assert_eq!(m.to_playwright(), "a:has-text(\"say \\\"hi\\\"\")");
    }
}
