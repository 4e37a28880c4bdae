//! Autocomplete controller
//!
//! All widget state is owned by a single task. UI events, debounce expiries
//! and request completions reach it through one channel, so no state is ever
//! shared. Requests are tagged with a generation; a completion whose
//! generation is no longer the current one was superseded and is dropped
//! without touching the view or the cache.

use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use super::{
    render::{self, Panel, PanelKind, ResultItem},
    view::{follow_link, Document, OnSelect, ResultsView, SelectAction, WidgetContainer},
};
use crate::{
    config::SearchConfig,
    error::AppResult,
    models::{Query, SearchResponse},
    services::{ResponseCache, SearchBackend},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

/// Events the host forwards from the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The input value changed
    Input(String),
    /// The input gained focus, carrying its current value
    Focus(String),
    Key(Key),
    /// A click anywhere on the page, identified by the element it hit
    Click { target: String },
    /// A rendered result item was clicked
    ResultClick(usize),
    ClearCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    Debouncing,
    Searching,
    Displaying(PanelKind),
}

#[derive(Debug)]
pub(crate) enum Msg {
    Ui(UiEvent),
    DebounceElapsed {
        timer: u64,
        query: Query,
    },
    Completed {
        generation: u64,
        epoch: u64,
        query: Query,
        result: AppResult<SearchResponse>,
    },
}

struct Debounce {
    timer: u64,
    task: JoinHandle<()>,
}

struct InFlight {
    generation: u64,
    task: JoinHandle<()>,
}

/// Controller state for one input/results pair
pub struct Autocomplete {
    config: SearchConfig,
    view: Arc<dyn ResultsView>,
    // Without a container every click counts as outside
    container: Option<Arc<dyn WidgetContainer>>,
    backend: Arc<dyn SearchBackend>,
    on_select: OnSelect,
    cache: ResponseCache,
    tx: mpsc::UnboundedSender<Msg>,
    state: watch::Sender<PanelState>,
    debounce: Option<Debounce>,
    next_timer: u64,
    in_flight: Option<InFlight>,
    generation: u64,
    // Bumped whenever the panel content is replaced or hidden. A current
    // response whose epoch is behind is cached but not shown.
    epoch: u64,
    items: Vec<ResultItem>,
    cursor: Option<usize>,
    visible: bool,
}

impl Autocomplete {
    /// Bind a controller to the elements `config` points at and start its
    /// event loop. Must be called from within a tokio runtime.
    ///
    /// When either selector resolves to nothing the returned handle is inert.
    pub fn attach(
        config: SearchConfig,
        document: &dyn Document,
        backend: Arc<dyn SearchBackend>,
        on_select: Option<OnSelect>,
    ) -> AutocompleteHandle {
        if !document.has_input(&config.input_selector) {
            tracing::debug!("No input matches {}, autocomplete inert", config.input_selector);
            return AutocompleteHandle::inert();
        }
        let Some(view) = document.results(&config.results_selector) else {
            tracing::debug!(
                "No results container matches {}, autocomplete inert",
                config.results_selector
            );
            return AutocompleteHandle::inert();
        };
        let container = document.container(&config.container_selector);
        if container.is_none() {
            tracing::debug!(
                "No container matches {}, every click closes the panel",
                config.container_selector
            );
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PanelState::Idle);
        let controller = Self::new(
            config,
            view,
            container,
            backend,
            on_select.unwrap_or_else(follow_link),
            tx.clone(),
            state_tx,
        );
        let task = tokio::spawn(controller.run(rx));

        AutocompleteHandle {
            inner: Some(Attached {
                tx,
                state: state_rx,
                task,
            }),
        }
    }

    pub(crate) fn new(
        config: SearchConfig,
        view: Arc<dyn ResultsView>,
        container: Option<Arc<dyn WidgetContainer>>,
        backend: Arc<dyn SearchBackend>,
        on_select: OnSelect,
        tx: mpsc::UnboundedSender<Msg>,
        state: watch::Sender<PanelState>,
    ) -> Self {
        let cache = ResponseCache::new(config.cache_policy);
        Self {
            config,
            view,
            container,
            backend,
            on_select,
            cache,
            tx,
            state,
            debounce: None,
            next_timer: 0,
            in_flight: None,
            generation: 0,
            epoch: 0,
            items: Vec::new(),
            cursor: None,
            visible: false,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Msg>) {
        while let Some(msg) = rx.recv().await {
            self.handle(msg);
        }
    }

    pub(crate) fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Ui(UiEvent::Input(value)) => self.on_input(&value),
            Msg::Ui(UiEvent::Focus(value)) => self.on_focus(&value),
            Msg::Ui(UiEvent::Key(key)) => self.on_key(key),
            Msg::Ui(UiEvent::Click { target }) => {
                if !self.is_inside(&target) {
                    self.hide();
                }
            }
            Msg::Ui(UiEvent::ResultClick(index)) => self.activate(index),
            Msg::Ui(UiEvent::ClearCache) => {
                tracing::debug!("Clearing {} cached responses", self.cache.len());
                self.cache.clear();
            }
            Msg::DebounceElapsed { timer, query } => {
                if self.debounce.as_ref().map(|d| d.timer) == Some(timer) {
                    self.debounce = None;
                    self.search(query);
                }
            }
            Msg::Completed {
                generation,
                epoch,
                query,
                result,
            } => self.on_completed(generation, epoch, query, result),
        }
    }

    fn on_input(&mut self, value: &str) {
        self.cancel_debounce();

        let Some(query) = Query::qualify(value, self.config.min_chars) else {
            self.hide();
            self.state.send_replace(PanelState::Idle);
            return;
        };

        self.next_timer += 1;
        let timer = self.next_timer;
        let delay = self.config.debounce();
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Msg::DebounceElapsed { timer, query });
        });

        self.debounce = Some(Debounce { timer, task });
        self.state.send_replace(PanelState::Debouncing);
    }

    fn on_focus(&mut self, value: &str) {
        if let Some(query) = Query::qualify(value, self.config.min_chars) {
            self.cancel_debounce();
            self.search(query);
        }
    }

    fn search(&mut self, query: Query) {
        if let Some(response) = self.cache.get(query.as_str()) {
            tracing::debug!("Cache hit for {:?}", query.as_str());
            let panel = render::render_response(response, query.as_str());
            self.epoch += 1;
            self.present(panel);
            return;
        }

        self.cancel_in_flight();
        self.generation += 1;
        self.epoch += 1;

        match render::loading_html() {
            Ok(html) => self.view.set_html(&html),
            Err(e) => tracing::error!("Failed to render loading panel: {}", e),
        }
        self.view.show();
        self.visible = true;
        self.items.clear();
        self.cursor = None;
        self.state.send_replace(PanelState::Searching);

        let generation = self.generation;
        let epoch = self.epoch;
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        tracing::debug!("Searching {:?} (generation {})", query.as_str(), generation);
        let task = tokio::spawn(async move {
            let result = backend.search(query.as_str()).await;
            let _ = tx.send(Msg::Completed {
                generation,
                epoch,
                query,
                result,
            });
        });

        self.in_flight = Some(InFlight { generation, task });
    }

    fn on_completed(
        &mut self,
        generation: u64,
        epoch: u64,
        query: Query,
        result: AppResult<SearchResponse>,
    ) {
        if self.in_flight.as_ref().map(|f| f.generation) != Some(generation) {
            tracing::debug!(
                "Dropping stale response for {:?} (generation {})",
                query.as_str(),
                generation
            );
            return;
        }
        self.in_flight = None;
        let current = epoch == self.epoch;

        match result {
            Ok(response) => {
                let panel = current.then(|| render::render_response(&response, query.as_str()));
                self.cache.insert(query.as_str(), response);
                if let Some(panel) = panel {
                    self.present(panel);
                }
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::error!("Search error for {:?}: {}", query.as_str(), e);
                if current {
                    self.present(render::error_panel(render::SEARCH_FAILED));
                }
            }
        }
    }

    fn on_key(&mut self, key: Key) {
        match key {
            Key::ArrowDown | Key::ArrowUp => {
                if !self.visible || self.items.is_empty() {
                    return;
                }
                let last = self.items.len() - 1;
                let next = match (key, self.cursor) {
                    (Key::ArrowDown, Some(i)) if i < last => i + 1,
                    (Key::ArrowDown, _) => 0,
                    (_, Some(i)) if i > 0 => i - 1,
                    _ => last,
                };
                self.cursor = Some(next);
                self.view.select(next);
            }
            Key::Enter => {
                if let Some(index) = self.cursor.filter(|_| self.visible) {
                    self.activate(index);
                }
            }
            Key::Escape => self.hide(),
            Key::Other => {}
        }
    }

    fn activate(&mut self, index: usize) {
        let Some(item) = self.items.get(index) else {
            return;
        };
        match (self.on_select)(item) {
            SelectAction::FollowLink => {
                tracing::debug!("Navigating to {}", item.href);
                self.view.navigate(&item.href);
            }
            SelectAction::Handled => {}
        }
    }

    fn is_inside(&self, target: &str) -> bool {
        self.container
            .as_ref()
            .is_some_and(|container| container.contains(target))
    }

    fn present(&mut self, panel: AppResult<Panel>) {
        match panel {
            Ok(panel) => self.display(panel),
            Err(e) => {
                tracing::error!("Failed to render search panel: {}", e);
                self.display(render::fallback_panel());
            }
        }
    }

    fn display(&mut self, panel: Panel) {
        self.view.set_html(&panel.html);
        self.view.show();
        self.visible = true;
        self.items = panel.items;
        self.cursor = None;
        self.state.send_replace(PanelState::Displaying(panel.kind));
    }

    fn hide(&mut self) {
        self.epoch += 1;
        self.visible = false;
        self.view.hide();
        if self.debounce.is_none() {
            self.state.send_replace(PanelState::Idle);
        }
    }

    fn cancel_debounce(&mut self) {
        if let Some(debounce) = self.debounce.take() {
            debounce.task.abort();
        }
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            tracing::debug!("Cancelling search generation {}", in_flight.generation);
            in_flight.task.abort();
        }
    }
}

impl Drop for Autocomplete {
    fn drop(&mut self) {
        self.cancel_debounce();
        self.cancel_in_flight();
    }
}

struct Attached {
    tx: mpsc::UnboundedSender<Msg>,
    state: watch::Receiver<PanelState>,
    task: JoinHandle<()>,
}

/// Subscription to a running controller.
///
/// Dropping the handle stops the event loop along with any pending timer or
/// request.
pub struct AutocompleteHandle {
    inner: Option<Attached>,
}

impl AutocompleteHandle {
    fn inert() -> Self {
        Self { inner: None }
    }

    pub fn is_inert(&self) -> bool {
        self.inner.is_none()
    }

    /// Forward a page event. Ignored by an inert handle.
    pub fn send(&self, event: UiEvent) {
        if let Some(attached) = &self.inner {
            let _ = attached.tx.send(Msg::Ui(event));
        }
    }

    pub fn input(&self, value: impl Into<String>) {
        self.send(UiEvent::Input(value.into()));
    }

    pub fn focus(&self, value: impl Into<String>) {
        self.send(UiEvent::Focus(value.into()));
    }

    pub fn key(&self, key: Key) {
        self.send(UiEvent::Key(key));
    }

    pub fn clear_cache(&self) {
        self.send(UiEvent::ClearCache);
    }

    pub fn state(&self) -> PanelState {
        self.inner
            .as_ref()
            .map_or(PanelState::Idle, |attached| *attached.state.borrow())
    }

    /// Watch panel state transitions
    pub fn subscribe(&self) -> Option<watch::Receiver<PanelState>> {
        self.inner.as_ref().map(|attached| attached.state.clone())
    }
}

impl Drop for AutocompleteHandle {
    fn drop(&mut self) {
        if let Some(attached) = self.inner.take() {
            attached.task.abort();
        }
    }
}
