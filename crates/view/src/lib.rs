//! Chart state kept by whoever draws a pedigree
//!
//! [`TreeView`] holds the loaded tree, the focus person, the fold state and
//! the [`Viewport`], and recomputes the layout whenever one of them changes.
//! [`search_persons`] finds the person to focus on from a typed name.

mod error;
mod search;
mod tree_view;
mod viewport;

pub use error::ViewError;
pub use search::{search_persons, SearchResult, DEFAULT_LIMIT};
pub use tree_view::TreeView;
pub use viewport::{Viewport, FALLBACK_ZOOM, ZOOM_MAX};
