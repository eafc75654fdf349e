use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::WindowHandle;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use tracing::info;

use super::{Browser, ContextHandle, Node, Selector, WebError};

/// Chrome flags used for every session.
const CHROME_ARGS: &[&str] = &["--window-size=1920,1080", "--disable-notifications"];

/// [`Browser`] backed by a WebDriver session (chromedriver, geckodriver, selenium).
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    pub async fn connect(webdriver_url: &str, headless: bool) -> anyhow::Result<Self> {
        let mut args: Vec<&str> = CHROME_ARGS.to_vec();
        if headless {
            args.push("--headless=new");
        }

        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        info!("Connecting to WebDriver at {} (headless: {})", webdriver_url, headless);
        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);
        let client = builder
            .connect(webdriver_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start WebDriver session: {}", e))?;

        Ok(Self { client })
    }
}

fn locator(selector: &Selector) -> Locator<'_> {
    match selector {
        Selector::Css(s) => Locator::Css(s.as_ref()),
        Selector::XPath(s) => Locator::XPath(s.as_ref()),
        Selector::Id(s) => Locator::Id(s.as_ref()),
    }
}

fn lookup_error(e: CmdError, selector: &Selector) -> WebError {
    if e.is_no_such_element() {
        WebError::NotFound(selector.to_string())
    } else {
        WebError::Driver(e.to_string())
    }
}

fn driver_error(e: CmdError) -> WebError {
    WebError::Driver(e.to_string())
}

fn window_handle(handle: &ContextHandle) -> Result<WindowHandle, WebError> {
    WindowHandle::try_from(handle.0.clone()).map_err(|e| WebError::NoContext(e.to_string()))
}

#[async_trait]
impl Node for Element {
    async fn text(&self) -> Result<String, WebError> {
        Element::text(self).await.map_err(driver_error)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, WebError> {
        Element::attr(self, name).await.map_err(driver_error)
    }

    async fn click(&self) -> Result<(), WebError> {
        Element::click(self).await.map_err(driver_error)
    }

    async fn find(&self, selector: &Selector) -> Result<Self, WebError> {
        Element::find(self, locator(selector))
            .await
            .map_err(|e| lookup_error(e, selector))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Self>, WebError> {
        Element::find_all(self, locator(selector))
            .await
            .map_err(|e| lookup_error(e, selector))
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Node = Element;

    async fn goto(&self, url: &str) -> Result<(), WebError> {
        self.client.goto(url).await.map_err(|e| WebError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn find(&self, selector: &Selector) -> Result<Element, WebError> {
        self.client
            .find(locator(selector))
            .await
            .map_err(|e| lookup_error(e, selector))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Element>, WebError> {
        self.client
            .find_all(locator(selector))
            .await
            .map_err(|e| lookup_error(e, selector))
    }

    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<Element, WebError> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(locator(selector))
            .await
            .map_err(|e| match e {
                CmdError::WaitTimeout => WebError::Timeout {
                    selector: selector.to_string(),
                    timeout,
                },
                other => lookup_error(other, selector),
            })
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, WebError> {
        self.client
            .execute(script, args)
            .await
            .map_err(|e| WebError::Script(e.to_string()))
    }

    async fn current_context(&self) -> Result<ContextHandle, WebError> {
        let handle = self.client.window().await.map_err(driver_error)?;
        Ok(ContextHandle(handle.into()))
    }

    async fn contexts(&self) -> Result<Vec<ContextHandle>, WebError> {
        let handles = self.client.windows().await.map_err(driver_error)?;
        Ok(handles.into_iter().map(|h| ContextHandle(h.into())).collect())
    }

    async fn open_context(&self) -> Result<ContextHandle, WebError> {
        let created = self.client.new_window(true).await.map_err(driver_error)?;
        Ok(ContextHandle(created.handle.into()))
    }

    async fn switch_context(&self, handle: &ContextHandle) -> Result<(), WebError> {
        let window = window_handle(handle)?;
        self.client
            .switch_to_window(window)
            .await
            .map_err(|e| WebError::NoContext(format!("{}: {}", handle, e)))
    }

    async fn close_context(&self) -> Result<(), WebError> {
        self.client.close_window().await.map_err(driver_error)
    }

    async fn shutdown(&self) -> Result<(), WebError> {
        self.client.clone().close().await.map_err(driver_error)
    }
}

// ── Tests ──
