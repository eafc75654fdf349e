//! Browser capability used by the pipeline.
//!
//! Everything that touches a live page goes through [`Browser`] and [`Node`], so
//! the pager, extractor and detail fetcher never see the WebDriver client directly.

pub mod webdriver;

#[cfg(test)]
pub mod fake;

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("timed out after {timeout:?} waiting for {selector}")]
    Timeout { selector: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("script failed: {0}")]
    Script(String),

    #[error("no such browsing context: {0}")]
    NoContext(String),

    #[error("driver error: {0}")]
    Driver(String),
}

impl WebError {
    /// True when the error only means "the element is not there (yet)".
    pub fn is_absent(&self) -> bool {
        matches!(self, WebError::NotFound(_) | WebError::Timeout { .. })
    }
}

/// How to locate an element. `Cow` keeps the fixed selectors `const`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(Cow<'static, str>),
    XPath(Cow<'static, str>),
    Id(Cow<'static, str>),
}

impl Selector {
    pub const fn css(s: &'static str) -> Self {
        Selector::Css(Cow::Borrowed(s))
    }

    pub const fn xpath(s: &'static str) -> Self {
        Selector::XPath(Cow::Borrowed(s))
    }

    pub const fn id(s: &'static str) -> Self {
        Selector::Id(Cow::Borrowed(s))
    }

    pub fn xpath_owned(s: String) -> Self {
        Selector::XPath(Cow::Owned(s))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selector::Css(s) | Selector::XPath(s) | Selector::Id(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{}", s),
            Selector::XPath(s) => write!(f, "xpath:{}", s),
            Selector::Id(s) => write!(f, "id:{}", s),
        }
    }
}

/// Opaque handle to a browsing context (a tab or window).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub String);

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One element of the current document.
#[async_trait]
pub trait Node: Send + Sync + Sized {
    async fn text(&self) -> Result<String, WebError>;
    async fn attr(&self, name: &str) -> Result<Option<String>, WebError>;
    async fn click(&self) -> Result<(), WebError>;
    async fn find(&self, selector: &Selector) -> Result<Self, WebError>;
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self>, WebError>;
}

/// A controllable web client: one session with a stack of browsing contexts.
///
/// `open_context` creates a context without switching to it, matching WebDriver.
/// After `close_context` there is no current context until `switch_context`.
#[async_trait]
pub trait Browser: Send + Sync {
    type Node: Node;

    async fn goto(&self, url: &str) -> Result<(), WebError>;
    async fn find(&self, selector: &Selector) -> Result<Self::Node, WebError>;
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self::Node>, WebError>;
    async fn wait_for(&self, selector: &Selector, timeout: Duration)
        -> Result<Self::Node, WebError>;
    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, WebError>;

    async fn current_context(&self) -> Result<ContextHandle, WebError>;
    async fn contexts(&self) -> Result<Vec<ContextHandle>, WebError>;
    async fn open_context(&self) -> Result<ContextHandle, WebError>;
    async fn switch_context(&self, handle: &ContextHandle) -> Result<(), WebError>;
    async fn close_context(&self) -> Result<(), WebError>;

    async fn shutdown(&self) -> Result<(), WebError>;
}

/// Quote `s` as an XPath string literal, falling back to `concat()` when it
/// contains both quote kinds.
pub fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
