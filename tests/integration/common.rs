//! Shared fixtures: a stub `/api/search` server and a recording results view

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use catalog_search::autocomplete::{Document, ResultsView, WidgetContainer};
use serde_json::json;

/// Running stub server
pub struct Stub {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl Stub {
    /// Number of requests served by `/api/search`
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub async fn spawn_stub() -> Stub {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/api/search", get(search))
        .route("/broken/search", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage/search", get(|| async { "not json" }))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Stub server has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server failed");
    });

    Stub {
        base_url: format!("http://{}", addr),
        hits,
    }
}

async fn search(
    State(hits): State<Arc<AtomicUsize>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    let q = params.get("q").cloned().unwrap_or_default();

    if q == "slow" {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let body = match q.as_str() {
        "Tol" | "slow" => json!({
            "books": [{
                "id": 1,
                "title": "Tolkien's Ring",
                "author": "J.R.R. Tolkien",
                "category": "Fantasy",
                "available_copies": 2
            }]
        }),
        "many" => {
            let limit: usize = params
                .get("limit")
                .and_then(|l| l.parse().ok())
                .unwrap_or(10);
            let books: Vec<_> = (1..=limit)
                .map(|i| json!({
                    "id": i,
                    "title": format!("Book {}", i),
                    "author": "Anonymous",
                    "category": "General",
                    "available_copies": 0,
                    "cover_image": "default_book.png"
                }))
                .collect();
            json!({ "books": books, "authors": [], "categories": [] })
        }
        _ => json!({
            "categories": [{ "id": 7, "name": q, "book_count": 0 }]
        }),
    };

    Json(body).into_response()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOp {
    Html(String),
    Show,
    Hide,
    Select(usize),
    Navigate(String),
}

#[derive(Default)]
pub struct RecordingView {
    ops: Mutex<Vec<ViewOp>>,
}

impl RecordingView {
    pub fn ops(&self) -> Vec<ViewOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn last_html(&self) -> Option<String> {
        self.ops().into_iter().rev().find_map(|op| match op {
            ViewOp::Html(html) => Some(html),
            _ => None,
        })
    }
}

impl ResultsView for RecordingView {
    fn set_html(&self, html: &str) {
        self.ops.lock().unwrap().push(ViewOp::Html(html.to_string()));
    }

    fn show(&self) {
        self.ops.lock().unwrap().push(ViewOp::Show);
    }

    fn hide(&self) {
        self.ops.lock().unwrap().push(ViewOp::Hide);
    }

    fn select(&self, index: usize) {
        self.ops.lock().unwrap().push(ViewOp::Select(index));
    }

    fn navigate(&self, href: &str) {
        self.ops.lock().unwrap().push(ViewOp::Navigate(href.to_string()));
    }
}

/// A page holding the search box and one results container
pub struct Page {
    pub view: Arc<RecordingView>,
}

impl Page {
    pub fn new() -> Self {
        Self {
            view: Arc::new(RecordingView::default()),
        }
    }
}

impl Document for Page {
    fn has_input(&self, selector: &str) -> bool {
        selector == "#headerSearch"
    }

    fn results(&self, selector: &str) -> Option<Arc<dyn ResultsView>> {
        if selector == "#searchResults" {
            Some(self.view.clone())
        } else {
            None
        }
    }

    fn container(&self, selector: &str) -> Option<Arc<dyn WidgetContainer>> {
        (selector == ".search-container").then(|| Arc::new(SearchBox) as Arc<dyn WidgetContainer>)
    }
}

/// `.search-container` wrapping the input and the results panel
struct SearchBox;

impl WidgetContainer for SearchBox {
    fn contains(&self, target: &str) -> bool {
        matches!(target, ".search-container" | "#headerSearch" | "#searchResults")
    }
}
