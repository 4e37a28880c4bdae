//! HTML rendering of the suggestion panel
//!
//! Rendering is pure: a response and the query go in, the panel markup and
//! the ordered list of selectable items come out. The controller keeps the
//! item list for keyboard navigation and activation.
//!
//! Markup lives in askama templates, which escape every interpolated value.
//! Only highlighted fragments are passed through as safe markup, and those
//! are escaped segment by segment when they are built.

use askama::Html as HtmlEscaper;
use askama::{MarkupDisplay, Template};
use regex::{Regex, RegexBuilder};

use crate::{
    error::AppResult,
    models::{AuthorHit, BookHit, CategoryHit, SearchResponse},
};

pub const MAX_BOOKS: usize = 5;
pub const MAX_AUTHORS: usize = 3;
pub const DEFAULT_COVER: &str = "/static/images/default-book.jpg";
pub const SEARCH_FAILED: &str = "Search failed. Please try again.";

// Compiled size cap for one highlight pattern
const REGEX_SIZE_LIMIT: usize = 1 << 20;

type SafeMarkup = MarkupDisplay<HtmlEscaper, String>;

/// What a displayed panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Results,
    NoResults,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Book,
    SeeAll,
    Author,
    Category,
}

/// One selectable entry of a rendered panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub kind: ItemKind,
    pub href: String,
    pub label: String,
}

/// Rendered panel markup and its selectable items, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub kind: PanelKind,
    pub html: String,
    pub items: Vec<ResultItem>,
}

/// Case-insensitive literal marker for one query
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new(query: &str) -> Self {
        Self::with_size_limit(query, REGEX_SIZE_LIMIT)
    }

    fn with_size_limit(query: &str, size_limit: usize) -> Self {
        if query.is_empty() {
            return Self { pattern: None };
        }

        let pattern = match RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .size_limit(size_limit)
            .build()
        {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("Highlighting disabled for a {}-byte query: {}", query.len(), e);
                None
            }
        };
        Self { pattern }
    }

    pub fn is_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    /// Escape `text` and wrap every match in `<mark>`
    pub fn apply(&self, text: &str) -> SafeMarkup {
        let Some(pattern) = &self.pattern else {
            return MarkupDisplay::new_safe(escape_html(text), HtmlEscaper);
        };

        let mut out = String::with_capacity(text.len() + 16);
        let mut last = 0;
        for m in pattern.find_iter(text) {
            out.push_str(&escape_html(&text[last..m.start()]));
            out.push_str("<mark>");
            out.push_str(&escape_html(m.as_str()));
            out.push_str("</mark>");
            last = m.end();
        }
        out.push_str(&escape_html(&text[last..]));
        MarkupDisplay::new_safe(out, HtmlEscaper)
    }
}

pub fn highlight_match(text: &str, query: &str) -> String {
    Highlighter::new(query).apply(text).to_string()
}

/// Escape text with the same escaper the templates use
pub fn escape_html(text: &str) -> String {
    MarkupDisplay::new_unsafe(text, HtmlEscaper).to_string()
}

pub fn book_href(book: &BookHit) -> String {
    format!("/books/{}", book.id)
}

pub fn full_search_href(query: &str) -> String {
    format!("/search?q={}", urlencoding::encode(query))
}

pub fn author_href(author: &AuthorHit) -> String {
    format!("/search?author={}", urlencoding::encode(&author.name))
}

pub fn category_href(category: &CategoryHit) -> String {
    format!("/books?category={}", category.id)
}

struct BookRow {
    href: String,
    id: i64,
    index: usize,
    cover: String,
    alt: String,
    title: SafeMarkup,
    available: bool,
    author: SafeMarkup,
    category: SafeMarkup,
}

struct SeeAllRow {
    href: String,
    index: usize,
    label: String,
}

struct AuthorRow {
    href: String,
    index: usize,
    name: SafeMarkup,
    book_count: i64,
}

struct CategoryRow {
    href: String,
    index: usize,
    name: String,
    book_count: i64,
}

#[derive(Template)]
#[template(
    source = r#"<div class="search-results">
{%- if !books.is_empty() -%}
<div class="result-section"><h6 class="result-header"><i class="fas fa-book me-2"></i>Books</h6><div class="result-list">
{%- for book in books -%}
<a href="{{ book.href }}" class="result-item book-result" data-id="{{ book.id }}" data-index="{{ book.index }}"><div class="result-content"><div class="result-icon"><img src="{{ book.cover }}" alt="{{ book.alt }}" class="book-thumbnail"></div><div class="result-details"><div class="result-title">{{ book.title|safe }}
{%- if book.available -%}
<span class="badge bg-success ms-2">Available</span>
{%- else -%}
<span class="badge bg-danger ms-2">Not Available</span>
{%- endif -%}
</div><div class="result-meta"><small class="text-muted"><i class="fas fa-user me-1"></i>{{ book.author|safe }}<span class="mx-2">&bull;</span><i class="fas fa-tag me-1"></i>{{ book.category|safe }}</small></div></div></div></a>
{%- endfor -%}
{%- if let Some(more) = see_all -%}
<a href="{{ more.href }}" class="result-item see-all" data-index="{{ more.index }}"><i class="fas fa-arrow-right me-2"></i>{{ more.label }}</a>
{%- endif -%}
</div></div>
{%- endif -%}
{%- if !authors.is_empty() -%}
<div class="result-section"><h6 class="result-header"><i class="fas fa-user me-2"></i>Authors</h6><div class="result-list">
{%- for author in authors -%}
<a href="{{ author.href }}" class="result-item" data-index="{{ author.index }}"><div class="result-content"><div class="result-icon"><i class="fas fa-user-circle fa-2x text-primary"></i></div><div class="result-details"><div class="result-title">{{ author.name|safe }}</div><small class="text-muted">{{ author.book_count }} books</small></div></div></a>
{%- endfor -%}
</div></div>
{%- endif -%}
{%- if !categories.is_empty() -%}
<div class="result-section"><h6 class="result-header"><i class="fas fa-tags me-2"></i>Categories</h6><div class="result-list">
{%- for category in categories -%}
<a href="{{ category.href }}" class="result-item" data-index="{{ category.index }}"><div class="result-content"><div class="result-icon"><i class="fas fa-tag fa-lg text-info"></i></div><div class="result-details"><div class="result-title">{{ category.name }}</div><small class="text-muted">{{ category.book_count }} books</small></div></div></a>
{%- endfor -%}
</div></div>
{%- endif -%}
</div>"#,
    ext = "html"
)]
struct ResultsTemplate {
    books: Vec<BookRow>,
    see_all: Option<SeeAllRow>,
    authors: Vec<AuthorRow>,
    categories: Vec<CategoryRow>,
}

#[derive(Template)]
#[template(
    source = r#"<div class="search-loading"><div class="spinner-border spinner-border-sm me-2" role="status"><span class="visually-hidden">Loading...</span></div>Searching...</div>"#,
    ext = "html"
)]
struct LoadingTemplate;

#[derive(Template)]
#[template(
    source = r#"<div class="search-no-results"><i class="fas fa-search me-2"></i>No results found</div>"#,
    ext = "html"
)]
struct NoResultsTemplate;

#[derive(Template)]
#[template(
    source = r#"<div class="search-error"><i class="fas fa-exclamation-circle me-2"></i>{{ message }}</div>"#,
    ext = "html"
)]
struct ErrorTemplate<'a> {
    message: &'a str,
}

/// Render a response for `query`.
///
/// Up to five books (plus a "see all" link when more exist), up to three
/// authors and every category, each in its own section. Empty sections are
/// omitted; nothing at all gives the no-results panel. Book and author
/// fields carry the query highlighted; category names are shown as-is.
pub fn render_response(response: &SearchResponse, query: &str) -> AppResult<Panel> {
    if response.is_empty() {
        return no_results_panel();
    }

    let marker = Highlighter::new(query);
    let mut items = Vec::new();

    let books = response.books();
    let mut book_rows = Vec::new();
    for book in books.iter().take(MAX_BOOKS) {
        book_rows.push(BookRow {
            href: book_href(book),
            id: book.id,
            index: items.len(),
            cover: book.cover_image.as_deref().unwrap_or(DEFAULT_COVER).to_string(),
            alt: book.title.clone(),
            title: marker.apply(&book.title),
            available: book.is_available(),
            author: marker.apply(&book.author),
            category: marker.apply(&book.category),
        });
        items.push(ResultItem {
            kind: ItemKind::Book,
            href: book_href(book),
            label: book.title.clone(),
        });
    }

    let see_all = (books.len() > MAX_BOOKS).then(|| {
        let row = SeeAllRow {
            href: full_search_href(query),
            index: items.len(),
            label: format!("See all {} books", books.len()),
        };
        items.push(ResultItem {
            kind: ItemKind::SeeAll,
            href: row.href.clone(),
            label: row.label.clone(),
        });
        row
    });

    let mut author_rows = Vec::new();
    for author in response.authors().iter().take(MAX_AUTHORS) {
        author_rows.push(AuthorRow {
            href: author_href(author),
            index: items.len(),
            name: marker.apply(&author.name),
            book_count: author.book_count,
        });
        items.push(ResultItem {
            kind: ItemKind::Author,
            href: author_href(author),
            label: author.name.clone(),
        });
    }

    let mut category_rows = Vec::new();
    for category in response.categories() {
        category_rows.push(CategoryRow {
            href: category_href(category),
            index: items.len(),
            name: category.name.clone(),
            book_count: category.book_count,
        });
        items.push(ResultItem {
            kind: ItemKind::Category,
            href: category_href(category),
            label: category.name.clone(),
        });
    }

    let html = ResultsTemplate {
        books: book_rows,
        see_all,
        authors: author_rows,
        categories: category_rows,
    }
    .render()?;

    Ok(Panel {
        kind: PanelKind::Results,
        html,
        items,
    })
}

pub fn loading_html() -> AppResult<String> {
    Ok(LoadingTemplate.render()?)
}

pub fn no_results_panel() -> AppResult<Panel> {
    Ok(Panel {
        kind: PanelKind::NoResults,
        html: NoResultsTemplate.render()?,
        items: Vec::new(),
    })
}

pub fn error_panel(message: &str) -> AppResult<Panel> {
    Ok(Panel {
        kind: PanelKind::Error,
        html: ErrorTemplate { message }.render()?,
        items: Vec::new(),
    })
}

/// Plain-text error panel for when a template fails to render
pub fn fallback_panel() -> Panel {
    Panel {
        kind: PanelKind::Error,
        html: escape_html(SEARCH_FAILED),
        items: Vec::new(),
    }
}
