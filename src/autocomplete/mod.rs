//! Live search suggestions for the catalog search box

pub mod controller;
pub mod render;
pub mod view;

pub use controller::{Autocomplete, AutocompleteHandle, Key, PanelState, UiEvent};
pub use render::{Panel, PanelKind, ResultItem};
pub use view::{Document, OnSelect, ResultsView, SelectAction, WidgetContainer};
