//! Host-side seams: the page the widget lives in and its results panel

use std::sync::Arc;

use super::render::ResultItem;

/// The results container of one widget
pub trait ResultsView: Send + Sync {
    /// Replace the panel content
    fn set_html(&self, html: &str);

    fn show(&self);

    fn hide(&self);

    /// Mark item `index` as the only selected item and scroll it into view
    fn select(&self, index: usize);

    /// Follow a result link
    fn navigate(&self, href: &str);
}

/// The element bounding the widget. Clicks outside it close the panel.
pub trait WidgetContainer: Send + Sync {
    /// Whether the clicked element `target` is this container or inside it
    fn contains(&self, target: &str) -> bool;
}

/// Resolves the selectors a controller is configured with
pub trait Document: Send + Sync {
    /// Whether an input element matches `selector`
    fn has_input(&self, selector: &str) -> bool;

    fn results(&self, selector: &str) -> Option<Arc<dyn ResultsView>>;

    fn container(&self, selector: &str) -> Option<Arc<dyn WidgetContainer>>;
}

/// What happens after the selection callback ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAction {
    /// Let the link navigation proceed
    FollowLink,
    /// The callback took care of it
    Handled,
}

pub type OnSelect = Arc<dyn Fn(&ResultItem) -> SelectAction + Send + Sync>;

/// Default callback: plain link navigation
pub fn follow_link() -> OnSelect {
    Arc::new(|_| SelectAction::FollowLink)
}
