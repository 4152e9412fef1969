//! The headless browser seen as a small collaborator.
//!
//! A [`Browser`] opens [`Page`]s; a page navigates, reports every outbound
//! request it issues to at most one one-shot listener, and lists its links.
//! [`WebDriverBrowser`] implements this on top of a WebDriver session, reading
//! requests from the Performance API the way a page records them.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use thirtyfour::{DesiredCapabilities, WebDriver, WindowHandle};
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::error::SessionError;

/// Predicate applied to each outbound request URL.
pub type RequestFilter = fn(&str) -> bool;

#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh tab.
    async fn open_page(&self) -> Result<Box<dyn Page>, SessionError>;
}

#[async_trait]
pub trait Page: Send {
    /// Subscribes to the first request matching `filter` during the next
    /// [`Page::navigate`]. The subscription ends when navigation returns.
    fn on_request(&mut self, filter: RequestFilter) -> RequestSubscription;

    /// Loads `url` and waits until the page stops issuing requests.
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Absolute `href` of every anchor on the current page.
    async fn links(&mut self) -> Result<Vec<String>, SessionError>;

    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Page-side half of a subscription.
pub struct RequestListener {
    filter: RequestFilter,
    tx: oneshot::Sender<String>,
}

/// Caller-side half of a subscription. Dropping it cancels the listener.
#[derive(Debug)]
pub struct RequestSubscription {
    rx: oneshot::Receiver<String>,
}

/// Creates a connected listener/subscription pair.
pub fn subscribe(filter: RequestFilter) -> (RequestListener, RequestSubscription) {
    let (tx, rx) = oneshot::channel();
    (RequestListener { filter, tx }, RequestSubscription { rx })
}

impl RequestSubscription {
    /// Resolves with the first matching URL, or `None` once the listener is
    /// gone without a match.
    pub async fn first_match(self) -> Option<String> {
        self.rx.await.ok()
    }
}

/// Holds at most one listener and unsubscribes it after the first delivery.
#[derive(Default)]
pub struct ListenerSlot {
    listener: Option<RequestListener>,
}

impl ListenerSlot {
    pub fn set(&mut self, listener: RequestListener) {
        self.listener = Some(listener);
    }

    /// Moves the listener out, leaving the slot empty.
    pub fn take(&mut self) -> ListenerSlot {
        ListenerSlot {
            listener: self.listener.take(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.tx.is_closed())
    }

    /// Offers one observed request URL to the listener.
    pub fn observe(&mut self, url: &str) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        if listener.tx.is_closed() {
            return;
        }
        if (listener.filter)(url) {
            debug!("request matched: {url}");
            let _ = listener.tx.send(url.to_string());
        } else {
            self.listener = Some(listener);
        }
    }
}

/// Loads `url`, giving up after `timeout` when one is set.
pub async fn navigate_within(
    page: &mut dyn Page,
    url: &str,
    timeout: Option<Duration>,
) -> Result<(), SessionError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, page.navigate(url))
            .await
            .map_err(|_| SessionError::Timeout(limit))?,
        None => page.navigate(url).await,
    }
}

/// Quiescence parameters for [`WebDriverBrowser`] pages.
#[derive(Debug, Clone, Copy)]
pub struct Quiescence {
    /// How long the request log must stay unchanged.
    pub idle: Duration,
    pub poll: Duration,
}

/// Tracks when a page went quiet.
///
/// The window only closes once the document and its fonts report loaded;
/// the resource log lists finished requests only, so a font still in flight
/// must hold it open.
#[derive(Debug)]
pub struct IdleWindow {
    idle: Duration,
    seen: usize,
    quiet_since: Instant,
}

impl IdleWindow {
    pub fn new(idle: Duration, now: Instant) -> Self {
        Self {
            idle,
            seen: 0,
            quiet_since: now,
        }
    }

    /// Requests logged so far.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Records a poll; returns true once the page counts as settled.
    pub fn update(&mut self, logged: usize, ready: bool, now: Instant) -> bool {
        if logged > self.seen || !ready {
            self.seen = self.seen.max(logged);
            self.quiet_since = now;
            return false;
        }
        now.duration_since(self.quiet_since) >= self.idle
    }
}

/// A single WebDriver session shared by every page of a run.
pub struct WebDriverBrowser {
    driver: WebDriver,
    home: WindowHandle,
    quiescence: Quiescence,
}

impl WebDriverBrowser {
    /// Starts a Firefox session on the given WebDriver server.
    ///
    /// # Arguments
    ///
    /// * `server_url` - WebDriver endpoint, e.g. `http://127.0.0.1:4444`.
    /// * `headless` - run without a visible window.
    /// * `quiescence` - idle window and poll interval used by every page.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WebDriver`] when the server is unreachable or
    /// refuses the capabilities.
    pub async fn connect(
        server_url: &str,
        headless: bool,
        quiescence: Quiescence,
    ) -> Result<Self, SessionError> {
        let mut caps = DesiredCapabilities::firefox();
        if headless {
            caps.set_headless()?;
        }
        let driver = WebDriver::new(server_url, caps).await?;
        let home = driver.window().await?;
        info!("connected to webdriver at {server_url}");
        Ok(Self {
            driver,
            home,
            quiescence,
        })
    }

    /// Ends the session, closing every tab it still has open.
    pub async fn quit(self) -> Result<(), SessionError> {
        self.driver.quit().await?;
        debug!("webdriver session closed");
        Ok(())
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open_page(&self) -> Result<Box<dyn Page>, SessionError> {
        self.driver.switch_to_window(self.home.clone()).await?;
        let handle = self.driver.new_tab().await?;
        self.driver.switch_to_window(handle.clone()).await?;
        Ok(Box::new(WebDriverPage {
            driver: self.driver.clone(),
            handle,
            home: self.home.clone(),
            quiescence: self.quiescence,
            listener: ListenerSlot::default(),
            closed: false,
        }))
    }
}

const GROW_RESOURCE_BUFFER: &str = r#"
    performance.setResourceTimingBufferSize(100000);
"#;

const REQUEST_LOG: &str = r#"
    return {
        ready: document.readyState === 'complete'
            && (!document.fonts || document.fonts.status === 'loaded'),
        entries: performance.getEntriesByType('resource').map(r => r.name),
    };
"#;

#[derive(Debug, Deserialize)]
struct RequestLog {
    ready: bool,
    entries: Vec<String>,
}

const ANCHORS: &str = r#"
    return Array.from(document.querySelectorAll('a')).map(a => a.href);
"#;

struct WebDriverPage {
    driver: WebDriver,
    handle: WindowHandle,
    home: WindowHandle,
    quiescence: Quiescence,
    listener: ListenerSlot,
    closed: bool,
}

impl WebDriverPage {
    async fn script_strings(&self, script: &str) -> Result<Vec<String>, SessionError> {
        let ret = self.driver.execute(script, Vec::new()).await?;
        Ok(serde_json::from_value(ret.json().clone())?)
    }
}

#[async_trait]
impl Page for WebDriverPage {
    fn on_request(&mut self, filter: RequestFilter) -> RequestSubscription {
        let (listener, subscription) = subscribe(filter);
        self.listener.set(listener);
        subscription
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let mut listener = self.listener.take();
        self.driver.switch_to_window(self.handle.clone()).await?;
        debug!("navigating to {url}");
        self.driver.goto(url).await?;
        self.driver.execute(GROW_RESOURCE_BUFFER, Vec::new()).await?;

        let mut window = IdleWindow::new(self.quiescence.idle, Instant::now());
        loop {
            let ret = self.driver.execute(REQUEST_LOG, Vec::new()).await?;
            let log: RequestLog = serde_json::from_value(ret.json().clone())?;
            for entry in log.entries.iter().skip(window.seen()) {
                listener.observe(entry);
            }
            if window.update(log.entries.len(), log.ready, Instant::now()) {
                break;
            }
            tokio::time::sleep(self.quiescence.poll).await;
        }
        debug!("{url} settled after {} requests", window.seen());
        Ok(())
    }

    async fn links(&mut self) -> Result<Vec<String>, SessionError> {
        self.driver.switch_to_window(self.handle.clone()).await?;
        self.script_strings(ANCHORS).await
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.driver.switch_to_window(self.handle.clone()).await?;
        self.driver.close_window().await?;
        self.driver.switch_to_window(self.home.clone()).await?;
        Ok(())
    }
}
