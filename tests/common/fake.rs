//! In-memory browser and fetcher for exercising capture without a real catalog.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use woff2_capture::{
    AssetFetcher, Browser, FetchError, Page, RequestSubscription, SessionError,
    browser::{ListenerSlot, RequestFilter, subscribe},
};

/// What a fake page does when navigated to.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    /// Outbound requests, in issue order.
    pub requests: Vec<String>,
    pub links: Vec<String>,
    pub fails: bool,
    /// Never settles.
    pub hangs: bool,
}

impl FakePage {
    pub fn requesting(requests: &[&str]) -> Self {
        Self {
            requests: requests.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn linking(links: &[String]) -> Self {
        Self {
            links: links.to_vec(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeBrowser {
    pages: HashMap<String, FakePage>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub visited: Arc<Mutex<Vec<String>>>,
}

impl FakeBrowser {
    pub fn with_page(mut self, url: impl Into<String>, page: FakePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open_page(&self) -> Result<Box<dyn Page>, SessionError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeTab {
            pages: self.pages.clone(),
            current: None,
            listener: ListenerSlot::default(),
            closed: Arc::clone(&self.closed),
            visited: Arc::clone(&self.visited),
        }))
    }
}

struct FakeTab {
    pages: HashMap<String, FakePage>,
    current: Option<FakePage>,
    listener: ListenerSlot,
    closed: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Page for FakeTab {
    fn on_request(&mut self, filter: RequestFilter) -> RequestSubscription {
        let (listener, subscription) = subscribe(filter);
        self.listener.set(listener);
        subscription
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let mut listener = self.listener.take();
        self.visited.lock().unwrap().push(url.to_string());
        let page = self.pages.get(url).cloned().unwrap_or_default();
        if page.hangs {
            std::future::pending::<()>().await;
        }
        if page.fails {
            return Err(SessionError::Page(format!("{url} crashed")));
        }
        for request in &page.requests {
            listener.observe(request);
            tokio::task::yield_now().await;
        }
        self.current = Some(page);
        Ok(())
    }

    async fn links(&mut self) -> Result<Vec<String>, SessionError> {
        Ok(self.current.as_ref().map(|p| p.links.clone()).unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Writes the asset URL itself as the file body.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pub calls: Mutex<Vec<String>>,
    pub unreachable: HashSet<String>,
    pub fails: bool,
    /// Reachability checks never answer.
    pub stalls: bool,
}

impl FakeFetcher {
    pub fn failing() -> Self {
        Self {
            fails: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fails {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, url.as_bytes()).await?;
        Ok(())
    }

    async fn is_reachable(&self, url: &str) -> bool {
        if self.stalls {
            std::future::pending::<()>().await;
        }
        !self.unreachable.contains(url)
    }
}
