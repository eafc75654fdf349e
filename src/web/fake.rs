//! Scripted in-memory browser used by the unit tests.
//!
//! Pages are keyed by URL, elements by the selector string that finds them. A page
//! can carry one lazily-loaded list that grows by `step` on every scroll script.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Browser, ContextHandle, Node, Selector, WebError};

type ClickLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    text: String,
    attrs: HashMap<String, String>,
    children: HashMap<String, Vec<FakeNode>>,
    broken: bool,
    clicks: Option<ClickLog>,
}

impl FakeNode {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    /// A node whose every operation fails like a stale element reference.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &Selector, node: FakeNode) -> Self {
        self.children
            .entry(selector.as_str().to_string())
            .or_default()
            .push(node);
        self
    }

    fn attached(&self, clicks: &ClickLog) -> Self {
        let mut node = self.clone();
        node.clicks = Some(Arc::clone(clicks));
        node
    }

    fn check(&self) -> Result<(), WebError> {
        if self.broken {
            Err(WebError::Driver("stale element reference".into()))
        } else {
            Ok(())
        }
    }

    fn children_for(&self, selector: &Selector) -> Vec<FakeNode> {
        let log = self.clicks.clone().unwrap_or_default();
        self.children
            .get(selector.as_str())
            .map(|nodes| nodes.iter().map(|n| n.attached(&log)).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Node for FakeNode {
    async fn text(&self) -> Result<String, WebError> {
        self.check()?;
        Ok(self.text.clone())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, WebError> {
        self.check()?;
        Ok(self.attrs.get(name).cloned())
    }

    async fn click(&self) -> Result<(), WebError> {
        self.check()?;
        if let Some(log) = &self.clicks {
            log.lock().unwrap().push(self.text.clone());
        }
        Ok(())
    }

    async fn find(&self, selector: &Selector) -> Result<Self, WebError> {
        self.check()?;
        self.children_for(selector)
            .into_iter()
            .next()
            .ok_or_else(|| WebError::NotFound(selector.to_string()))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self>, WebError> {
        self.check()?;
        Ok(self.children_for(selector))
    }
}

#[derive(Debug, Clone)]
struct LazyList {
    selector: String,
    items: Vec<FakeNode>,
    visible: usize,
    step: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    nodes: HashMap<String, Vec<FakeNode>>,
    lazy: Option<LazyList>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &Selector, node: FakeNode) -> Self {
        self.nodes
            .entry(selector.as_str().to_string())
            .or_default()
            .push(node);
        self
    }

    pub fn lazy(mut self, selector: &Selector, items: Vec<FakeNode>, initial: usize, step: usize) -> Self {
        self.lazy = Some(LazyList {
            selector: selector.as_str().to_string(),
            visible: initial.min(items.len()),
            items,
            step,
        });
        self
    }

    fn lookup(&self, selector: &Selector) -> Vec<FakeNode> {
        if let Some(lazy) = self.lazy.as_ref().filter(|l| l.selector == selector.as_str()) {
            return lazy.items[..lazy.visible].to_vec();
        }
        self.nodes.get(selector.as_str()).cloned().unwrap_or_default()
    }

    fn scroll(&mut self) {
        if let Some(lazy) = self.lazy.as_mut() {
            lazy.visible = (lazy.visible + lazy.step).min(lazy.items.len());
        }
    }
}

#[derive(Debug)]
struct Window {
    handle: ContextHandle,
    url: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<String, FakePage>,
    failing: HashSet<String>,
    windows: Vec<Window>,
    current: Option<usize>,
    next_id: usize,
    visits: Vec<String>,
    scrolls: usize,
}

impl State {
    fn current_window(&mut self) -> Result<&mut Window, WebError> {
        let idx = self
            .current
            .ok_or_else(|| WebError::NoContext("no current context".into()))?;
        Ok(&mut self.windows[idx])
    }

    fn current_page(&mut self) -> Result<Option<&mut FakePage>, WebError> {
        let url = self.current_window()?.url.clone();
        Ok(url.and_then(|u| self.pages.get_mut(&u)))
    }

    fn lookup(&mut self, selector: &Selector) -> Result<Vec<FakeNode>, WebError> {
        Ok(self
            .current_page()?
            .map(|p| p.lookup(selector))
            .unwrap_or_default())
    }

    fn new_window(&mut self) -> ContextHandle {
        let handle = ContextHandle(format!("ctx-{}", self.next_id));
        self.next_id += 1;
        self.windows.push(Window {
            handle: handle.clone(),
            url: None,
        });
        handle
    }
}

pub struct FakeBrowser {
    state: Mutex<State>,
    clicks: ClickLog,
}

impl FakeBrowser {
    /// A session with one blank context, which is current.
    pub fn new() -> Self {
        let mut state = State::default();
        state.new_window();
        state.current = Some(0);
        Self {
            state: Mutex::new(state),
            clicks: ClickLog::default(),
        }
    }

    pub fn page(self, url: &str, page: FakePage) -> Self {
        self.lock().pages.insert(url.to_string(), page);
        self
    }

    /// Navigation to `url` fails.
    pub fn failing(self, url: &str) -> Self {
        self.lock().failing.insert(url.to_string());
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.lock().visits.clone()
    }

    pub fn scrolls(&self) -> usize {
        self.lock().scrolls
    }

    pub fn context_count(&self) -> usize {
        self.lock().windows.len()
    }

    pub fn current_url(&self) -> Option<String> {
        let mut state = self.lock();
        state.current_window().ok().and_then(|w| w.url.clone())
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    type Node = FakeNode;

    async fn goto(&self, url: &str) -> Result<(), WebError> {
        let mut state = self.lock();
        state.current_window()?;
        state.visits.push(url.to_string());
        if state.failing.contains(url) {
            return Err(WebError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        state.current_window()?.url = Some(url.to_string());
        Ok(())
    }

    async fn find(&self, selector: &Selector) -> Result<FakeNode, WebError> {
        self.lock()
            .lookup(selector)?
            .into_iter()
            .next()
            .map(|n| n.attached(&self.clicks))
            .ok_or_else(|| WebError::NotFound(selector.to_string()))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<FakeNode>, WebError> {
        let nodes = self.lock().lookup(selector)?;
        Ok(nodes.iter().map(|n| n.attached(&self.clicks)).collect())
    }

    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<FakeNode, WebError> {
        self.lock()
            .lookup(selector)?
            .into_iter()
            .next()
            .map(|n| n.attached(&self.clicks))
            .ok_or_else(|| WebError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
    }

    async fn execute(&self, script: &str, _args: Vec<Value>) -> Result<Value, WebError> {
        let mut state = self.lock();
        if script.contains("scrollHeight") && script.contains("return") {
            state.current_window()?;
            return Ok(json!(4000));
        }
        if script.contains("scrollTo") {
            state.scrolls += 1;
            if let Some(page) = state.current_page()? {
                page.scroll();
            }
        }
        Ok(Value::Null)
    }

    async fn current_context(&self) -> Result<ContextHandle, WebError> {
        Ok(self.lock().current_window()?.handle.clone())
    }

    async fn contexts(&self) -> Result<Vec<ContextHandle>, WebError> {
        Ok(self.lock().windows.iter().map(|w| w.handle.clone()).collect())
    }

    async fn open_context(&self) -> Result<ContextHandle, WebError> {
        Ok(self.lock().new_window())
    }

    async fn switch_context(&self, handle: &ContextHandle) -> Result<(), WebError> {
        let mut state = self.lock();
        let idx = state
            .windows
            .iter()
            .position(|w| &w.handle == handle)
            .ok_or_else(|| WebError::NoContext(handle.to_string()))?;
        state.current = Some(idx);
        Ok(())
    }

    async fn close_context(&self) -> Result<(), WebError> {
        let mut state = self.lock();
        let idx = state
            .current
            .take()
            .ok_or_else(|| WebError::NoContext("no current context".into()))?;
        state.windows.remove(idx);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), WebError> {
        Ok(())
    }
}
