//! In-process browser.
//!
//! Windows and tabs live in a map, every tab owns a [`SharedDocument`], and a
//! [`TabAgent`] is attached to the tab through the [`TabBridge`] once its page
//! finishes loading. Navigation detaches the agent first, so requests sent
//! mid-load find no receiver, exactly like a content script that has not been
//! injected yet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use extensions_bridge::{TabAgent, TabBridge, TabReply, TabRequest};
use pagepilot_core_types::{ScheduledTask, TabId, WindowId};
use parking_lot::Mutex;
use perceiver_structural::{LiveDocument, SharedDocument};
use tracing::{debug, info, warn};

use crate::error::OrchestratorError;
use crate::port::{BrowserPort, CreatedWindow, TabInfo, TabStatus, WindowSpec};

/// Where page markup comes from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// `None` means the page never loads.
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// Fixed URL to markup map.
#[derive(Clone, Debug, Default)]
pub struct StaticPages {
    pages: HashMap<String, String>,
}

impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(url, html);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, html: impl Into<String>) {
        self.pages.insert(url.into(), html.into());
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl PageSource for StaticPages {
    async fn fetch(&self, url: &str) -> Option<String> {
        self.pages.get(url).cloned()
    }
}

struct WindowState {
    tabs: Vec<TabId>,
    focused: bool,
    minimized: bool,
}

struct TabState {
    window: WindowId,
    url: String,
    status: TabStatus,
    document: SharedDocument,
    load: Option<ScheduledTask>,
}

#[derive(Default)]
struct BrowserState {
    windows: HashMap<WindowId, WindowState>,
    tabs: HashMap<TabId, TabState>,
}

struct Inner {
    source: Arc<dyn PageSource>,
    bridge: Arc<TabBridge>,
    load_delay: Duration,
    state: Mutex<BrowserState>,
    stall_loads: AtomicBool,
    refuse_minimize: AtomicBool,
    next_window: AtomicU32,
    next_tab: AtomicU32,
}

pub struct InMemoryBrowser {
    inner: Arc<Inner>,
}

impl InMemoryBrowser {
    pub fn new(source: Arc<dyn PageSource>, bridge: Arc<TabBridge>) -> Self {
        Self::with_load_delay(source, bridge, Duration::from_millis(50))
    }

    pub fn with_load_delay(
        source: Arc<dyn PageSource>,
        bridge: Arc<TabBridge>,
        load_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                bridge,
                load_delay,
                state: Mutex::new(BrowserState::default()),
                stall_loads: AtomicBool::new(false),
                refuse_minimize: AtomicBool::new(false),
                next_window: AtomicU32::new(1),
                next_tab: AtomicU32::new(1),
            }),
        }
    }

    pub fn bridge(&self) -> &Arc<TabBridge> {
        &self.inner.bridge
    }

    /// Pages requested while stalled never finish loading.
    pub fn stall_loads(&self, stalled: bool) {
        self.inner.stall_loads.store(stalled, Ordering::SeqCst);
    }

    pub fn refuse_minimize(&self, refuse: bool) {
        self.inner.refuse_minimize.store(refuse, Ordering::SeqCst);
    }

    /// Close a window as the user would, behind the orchestrator's back.
    pub fn close_externally(&self, window: WindowId) -> bool {
        self.inner.drop_window(window)
    }

    /// Remove the tab's content script; the page itself stays loaded and
    /// the script comes back on the next navigation.
    pub fn detach_script(&self, tab: TabId) -> bool {
        self.inner.bridge.detach(tab)
    }

    pub fn document(&self, tab: TabId) -> Option<SharedDocument> {
        self.inner
            .state
            .lock()
            .tabs
            .get(&tab)
            .map(|state| state.document.clone())
    }

    pub fn window_exists(&self, window: WindowId) -> bool {
        self.inner.state.lock().windows.contains_key(&window)
    }

    pub fn is_minimized(&self, window: WindowId) -> Option<bool> {
        self.inner
            .state
            .lock()
            .windows
            .get(&window)
            .map(|state| state.minimized)
    }

    pub fn is_focused(&self, window: WindowId) -> Option<bool> {
        self.inner
            .state
            .lock()
            .windows
            .get(&window)
            .map(|state| state.focused)
    }

    pub fn tabs_of(&self, window: WindowId) -> Vec<TabId> {
        self.inner
            .state
            .lock()
            .windows
            .get(&window)
            .map(|state| state.tabs.clone())
            .unwrap_or_default()
    }
}

impl Inner {
    fn new_tab(&self, window: WindowId) -> TabId {
        let tab = TabId(self.next_tab.fetch_add(1, Ordering::SeqCst));
        let mut state = self.state.lock();
        state.tabs.insert(
            tab,
            TabState {
                window,
                url: "about:blank".to_string(),
                status: TabStatus::Complete,
                document: LiveDocument::blank().into_shared(),
                load: None,
            },
        );
        if let Some(window) = state.windows.get_mut(&window) {
            window.tabs.push(tab);
        }
        tab
    }

    /// Start loading `url` into the tab. The page's agent attaches when the
    /// load completes.
    fn navigate(self: &Arc<Self>, tab: TabId, url: &str) -> Result<(), OrchestratorError> {
        self.bridge.detach(tab);
        let stalled = self.stall_loads.load(Ordering::SeqCst);
        let load = (!stalled).then(|| {
            let inner = Arc::downgrade(self);
            let target = url.to_string();
            ScheduledTask::after("page-load", self.load_delay, async move {
                finish_load(inner, tab, target).await;
            })
        });

        let mut state = self.state.lock();
        let entry = state
            .tabs
            .get_mut(&tab)
            .ok_or(OrchestratorError::TabNotFound(tab))?;
        entry.url = url.to_string();
        entry.status = TabStatus::Loading;
        entry.load = load;
        debug!(%tab, url, stalled, "tab navigation started");
        Ok(())
    }

    fn drop_window(&self, window: WindowId) -> bool {
        let removed_tabs = {
            let mut state = self.state.lock();
            let Some(removed) = state.windows.remove(&window) else {
                return false;
            };
            for tab in &removed.tabs {
                state.tabs.remove(tab);
            }
            removed.tabs
        };
        for tab in removed_tabs {
            self.bridge.detach(tab);
        }
        info!(%window, "window removed");
        true
    }
}

async fn finish_load(inner: Weak<Inner>, tab: TabId, url: String) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let Some(html) = inner.source.fetch(&url).await else {
        warn!(%tab, url = %url, "page source has no content; tab stays loading");
        return;
    };
    let document = {
        let mut state = inner.state.lock();
        let Some(entry) = state.tabs.get_mut(&tab) else {
            return;
        };
        if entry.url != url {
            return;
        }
        entry.document.write().load(url.as_str(), &html);
        entry.status = TabStatus::Complete;
        entry.document.clone()
    };
    inner.bridge.attach(tab, Arc::new(TabAgent::new(document)));
    debug!(%tab, url = %url, "tab loaded");
}

#[async_trait]
impl BrowserPort for InMemoryBrowser {
    async fn create_window(&self, spec: &WindowSpec) -> Result<CreatedWindow, OrchestratorError> {
        let window = WindowId(self.inner.next_window.fetch_add(1, Ordering::SeqCst));
        self.inner.state.lock().windows.insert(
            window,
            WindowState {
                tabs: Vec::new(),
                focused: spec.focused,
                minimized: false,
            },
        );
        let tab = self.inner.new_tab(window);
        if let Some(url) = &spec.url {
            self.inner.navigate(tab, url)?;
        }
        Ok(CreatedWindow {
            window_id: window,
            tab_id: tab,
        })
    }

    async fn probe_window(&self, window: WindowId) -> Result<(), OrchestratorError> {
        if self.window_exists(window) {
            Ok(())
        } else {
            Err(OrchestratorError::WindowNotFound(window))
        }
    }

    async fn minimize_window(&self, window: WindowId) -> Result<(), OrchestratorError> {
        if self.inner.refuse_minimize.load(Ordering::SeqCst) {
            return Err(OrchestratorError::browser("minimize is not supported"));
        }
        let mut state = self.inner.state.lock();
        let entry = state
            .windows
            .get_mut(&window)
            .ok_or(OrchestratorError::WindowNotFound(window))?;
        entry.minimized = true;
        Ok(())
    }

    async fn remove_window(&self, window: WindowId) -> Result<(), OrchestratorError> {
        if self.inner.drop_window(window) {
            Ok(())
        } else {
            Err(OrchestratorError::WindowNotFound(window))
        }
    }

    async fn open_tab(&self, window: WindowId, url: &str) -> Result<TabId, OrchestratorError> {
        if !self.window_exists(window) {
            return Err(OrchestratorError::WindowNotFound(window));
        }
        let tab = self.inner.new_tab(window);
        self.inner.navigate(tab, url)?;
        Ok(tab)
    }

    async fn update_tab(&self, tab: TabId, url: &str) -> Result<(), OrchestratorError> {
        self.inner.navigate(tab, url)
    }

    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, OrchestratorError> {
        let state = self.inner.state.lock();
        let entry = state.tabs.get(&tab).ok_or(OrchestratorError::TabNotFound(tab))?;
        Ok(TabInfo {
            tab_id: tab,
            window_id: entry.window,
            url: entry.url.clone(),
            status: entry.status,
        })
    }

    async fn send_to_tab(
        &self,
        tab: TabId,
        request: TabRequest,
        deadline: Duration,
    ) -> Result<TabReply, OrchestratorError> {
        Ok(self.inner.bridge.invoke(tab, request, Some(deadline)).await?)
    }
}
