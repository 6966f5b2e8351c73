//! Layered layout of pedigree charts
//!
//! This crate turns a snapshot of persons and their parent and spouse
//! relationships into a deterministic arrangement of boxes around a focus
//! person: ancestors above, descendants below, spouses side by side and
//! children centred under their parents.
//!
//! # Pipeline
//!
//! Every call to [`compute_layout`] rebuilds everything from the snapshot:
//!
//! 1. relationship index over an arena of persons
//! 2. generations, by a breadth-first walk from the focus
//! 3. visible persons, from the focus lineage and the expanded persons
//! 4. family clusters linked into a forest
//! 5. subtree widths
//! 6. initial placement from the cluster forest
//! 7. crossing minimization and four-direction alignment
//! 8. collision resolution and compaction
//! 9. connectors and content bounds
//!
//! # Example
//!
//! ```
//! use lineage_data::{Person, PersonId, RelationshipEdge, TreeSnapshot};
//! use lineage_layout::{compute_layout, LayoutOptions};
//!
//! let tree = TreeSnapshot::new(
//!     vec![Person::new("a"), Person::new("b"), Person::new("c")],
//!     vec![
//!         RelationshipEdge::spouse("a", "b"),
//!         RelationshipEdge::parent("c", "a"),
//!         RelationshipEdge::parent("c", "b"),
//!     ],
//! );
//!
//! let layout = compute_layout(&tree, &"c".into(), &LayoutOptions::default());
//! assert_eq!(layout.nodes[&PersonId::from("a")].layer, -1);
//! assert_eq!(layout.nodes[&PersonId::from("c")].layer, 0);
//! ```

mod alignment;
mod arrangement;
mod cluster;
mod compaction;
mod config;
mod connections;
mod crossings;
mod engine;
mod geometry;
mod index;
mod layering;
mod model;
mod placement;
mod scene;
mod units;
mod visibility;
mod width;

pub use config::{ConfigError, DetailLevel, LayoutConstants, LayoutOptions};
pub use engine::compute_layout;
pub use geometry::{Point, Rect, Vec2};
pub use model::{ConnectionKind, FamilyNode, TreeConnection, TreeLayout, TreeNode};
pub use visibility::focus_lineage;
