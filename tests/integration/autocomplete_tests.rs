//! End-to-end autocomplete tests: controller, HTTP backend and stub server

use std::{sync::Arc, time::Duration};

use catalog_search::{
    autocomplete::{Key, PanelKind, PanelState, UiEvent},
    config::SearchConfig,
    services::HttpSearchBackend,
    Autocomplete, AutocompleteHandle,
};
use reqwest::Client;

use crate::common::{spawn_stub, Page, Stub, ViewOp};

fn attach(stub: &Stub, page: &Page) -> AutocompleteHandle {
    attach_with(stub, page, SearchConfig::default())
}

fn attach_with(stub: &Stub, page: &Page, config: SearchConfig) -> AutocompleteHandle {
    let config = SearchConfig {
        debounce_ms: 20,
        ..config
    };
    let backend = HttpSearchBackend::with_client(
        Client::new(),
        &stub.base_url,
        &config.api_endpoint,
        config.result_limit,
    );
    Autocomplete::attach(config, page, Arc::new(backend), None)
}

async fn wait_for_state(handle: &AutocompleteHandle, expected: PanelState) {
    let mut state = handle.subscribe().expect("Controller is inert");
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == expected))
        .await
        .expect("Timed out waiting for panel state")
        .expect("Controller stopped");
}

#[tokio::test]
async fn test_typing_renders_results() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let handle = attach(&stub, &page);

    handle.input("T");
    handle.input("To");
    handle.input("Tol");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Results)).await;

    let html = page.view.last_html().unwrap();
    assert!(html.contains("<mark>Tol</mark>kien"));
    assert!(html.contains(">Available</span>"));
    assert_eq!(stub.hits(), 1);
}

#[tokio::test]
async fn test_refocus_uses_cache() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let handle = attach(&stub, &page);

    handle.focus("Tol");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Results)).await;
    handle.key(Key::Escape);
    wait_for_state(&handle, PanelState::Idle).await;

    handle.focus("Tol");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Results)).await;

    assert_eq!(stub.hits(), 1);
    assert_eq!(page.view.ops().last(), Some(&ViewOp::Show));
}

#[tokio::test]
async fn test_newer_query_supersedes_slow_one() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let handle = attach(&stub, &page);

    handle.focus("slow");
    wait_for_state(&handle, PanelState::Searching).await;
    handle.focus("Dune");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Results)).await;

    // Give the slow response time to arrive if it were still alive
    tokio::time::sleep(Duration::from_millis(700)).await;

    let html = page.view.last_html().unwrap();
    assert!(html.contains("<mark>Dune</mark>"));
    assert!(!html.contains("Tolkien"));

    // The superseded query was never cached
    handle.focus("slow");
    wait_for_state(&handle, PanelState::Searching).await;
}

#[tokio::test]
async fn test_server_error_shows_message() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let config = SearchConfig {
        api_endpoint: "/broken/search".to_string(),
        ..Default::default()
    };
    let backend = HttpSearchBackend::with_client(Client::new(), &stub.base_url, &config.api_endpoint, None);
    let handle = Autocomplete::attach(config, &page, Arc::new(backend), None);

    handle.focus("Tol");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Error)).await;

    assert!(page.view.last_html().unwrap().contains("Search failed. Please try again."));
}

#[tokio::test]
async fn test_keyboard_selection_navigates() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let handle = attach(&stub, &page);

    handle.focus("Tol");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Results)).await;
    handle.key(Key::ArrowDown);
    handle.key(Key::Enter);
    handle.key(Key::Escape);
    wait_for_state(&handle, PanelState::Idle).await;

    let ops = page.view.ops();
    let tail = &ops[ops.len() - 3..];
    assert_eq!(
        tail,
        &[
            ViewOp::Select(0),
            ViewOp::Navigate("/books/1".to_string()),
            ViewOp::Hide,
        ]
    );
}

#[tokio::test]
async fn test_unknown_results_selector_is_inert() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let config = SearchConfig {
        results_selector: "#missing".to_string(),
        ..Default::default()
    };
    let backend = HttpSearchBackend::with_client(Client::new(), &stub.base_url, "/api/search", None);
    let handle = Autocomplete::attach(config, &page, Arc::new(backend), None);

    assert!(handle.is_inert());
    handle.focus("Tol");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(stub.hits(), 0);
    assert!(page.view.ops().is_empty());
}

#[tokio::test]
async fn test_dropping_handle_stops_pending_search() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let handle = attach(&stub, &page);

    handle.input("Tol");
    drop(handle);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(stub.hits(), 0);
}

fn click(target: &str) -> UiEvent {
    UiEvent::Click {
        target: target.to_string(),
    }
}

fn hides(page: &Page) -> usize {
    page.view.ops().iter().filter(|op| **op == ViewOp::Hide).count()
}

#[tokio::test]
async fn test_click_inside_container_keeps_panel() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let handle = attach(&stub, &page);

    handle.focus("Tol");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Results)).await;
    handle.send(click("#searchResults"));
    handle.send(click(".search-container"));
    handle.key(Key::ArrowDown);
    handle.send(click("body"));
    wait_for_state(&handle, PanelState::Idle).await;

    let ops = page.view.ops();
    assert_eq!(&ops[ops.len() - 2..], &[ViewOp::Select(0), ViewOp::Hide]);
    assert_eq!(hides(&page), 1);
}

#[tokio::test]
async fn test_unresolved_container_closes_on_any_click() {
    let stub = spawn_stub().await;
    let page = Page::new();
    let config = SearchConfig {
        container_selector: "#sidebar".to_string(),
        ..Default::default()
    };
    let handle = attach_with(&stub, &page, config);

    handle.focus("Tol");
    wait_for_state(&handle, PanelState::Displaying(PanelKind::Results)).await;
    handle.send(click("#searchResults"));
    wait_for_state(&handle, PanelState::Idle).await;

    assert_eq!(hides(&page), 1);
}
