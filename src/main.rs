//! Catalog Search console
//!
//! Drives an autocomplete controller from stdin against a running catalog
//! server. Each plain line is the new value of the search box; lines starting
//! with `:` are page events (`:tap <selector>` clicks an element). Panel updates are written to stdout.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use catalog_search::{
    autocomplete::{Document, Key, PanelState, ResultsView, UiEvent, WidgetContainer},
    config::AppConfig,
    services::HttpSearchBackend,
    Autocomplete,
};

/// Results panel printed to stdout
struct ConsoleView;

impl ResultsView for ConsoleView {
    fn set_html(&self, html: &str) {
        println!("{}", html);
    }

    fn show(&self) {
        println!("[panel shown]");
    }

    fn hide(&self) {
        println!("[panel hidden]");
    }

    fn select(&self, index: usize) {
        println!("[selected item {}]", index);
    }

    fn navigate(&self, href: &str) {
        println!("[navigate to {}]", href);
    }
}

/// Container element wrapping the input and the results panel
struct ConsoleContainer {
    members: Vec<String>,
}

impl WidgetContainer for ConsoleContainer {
    fn contains(&self, target: &str) -> bool {
        self.members.iter().any(|member| member == target)
    }
}

/// The console stands in for a page holding the search box
struct ConsoleDocument {
    input: String,
    results: String,
}

impl Document for ConsoleDocument {
    fn has_input(&self, _selector: &str) -> bool {
        true
    }

    fn results(&self, _selector: &str) -> Option<Arc<dyn ResultsView>> {
        Some(Arc::new(ConsoleView))
    }

    fn container(&self, selector: &str) -> Option<Arc<dyn WidgetContainer>> {
        Some(Arc::new(ConsoleContainer {
            members: vec![selector.to_string(), self.input.clone(), self.results.clone()],
        }))
    }
}

/// Click target used by `:outside`
const PAGE_BODY: &str = "body";

enum Command {
    Event(UiEvent),
    Quit,
    Unknown(String),
}

fn parse_line(line: &str, value: &str) -> Command {
    let Some(command) = line.strip_prefix(':') else {
        return Command::Event(UiEvent::Input(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("focus"), None) => Command::Event(UiEvent::Focus(value.to_string())),
        (Some("down"), None) => Command::Event(UiEvent::Key(Key::ArrowDown)),
        (Some("up"), None) => Command::Event(UiEvent::Key(Key::ArrowUp)),
        (Some("enter"), None) => Command::Event(UiEvent::Key(Key::Enter)),
        (Some("esc"), None) => Command::Event(UiEvent::Key(Key::Escape)),
        (Some("outside"), None) => Command::Event(UiEvent::Click {
            target: PAGE_BODY.to_string(),
        }),
        (Some("tap"), Some(target)) => Command::Event(UiEvent::Click {
            target: target.to_string(),
        }),
        (Some("clear"), None) => Command::Event(UiEvent::ClearCache),
        (Some("click"), Some(index)) => match index.parse() {
            Ok(index) => Command::Event(UiEvent::ResultClick(index)),
            Err(_) => Command::Unknown(line.to_string()),
        },
        (Some("quit"), None) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Logs go to stderr, stdout carries the panel
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("catalog_search={}", config.logging.level).into());
    let fmt_layer = if config.logging.format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .init();

    tracing::info!("Starting Catalog Search console v{}", env!("CARGO_PKG_VERSION"));

    let backend = HttpSearchBackend::new(&config.backend, &config.search)?;
    tracing::info!("Suggestions from {}", backend.url());

    let settle_timeout = config.search.debounce() + config.backend.timeout();
    let document = ConsoleDocument {
        input: config.search.input_selector.clone(),
        results: config.search.results_selector.clone(),
    };
    let handle = Autocomplete::attach(
        config.search.clone(),
        &document,
        Arc::new(backend),
        None,
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut value = String::new();

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line, &value) {
            Command::Event(event) => {
                if let UiEvent::Input(input) = &event {
                    value = input.clone();
                }
                handle.send(event);
            }
            Command::Quit => break,
            Command::Unknown(line) => tracing::warn!("Unknown command: {}", line),
        }
    }

    // Let the last search finish before the controller is dropped
    if let Some(mut state) = handle.subscribe() {
        let settled = state.wait_for(|s| !matches!(s, PanelState::Debouncing | PanelState::Searching));
        if tokio::time::timeout(settle_timeout, settled).await.is_err() {
            tracing::warn!("Gave up waiting for the last search");
        }
    }

    Ok(())
}
