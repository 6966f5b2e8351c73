//! Input model of the pedigree layout
//!
//! The tree store owns these types; the layout engine only borrows them for
//! the duration of one layout call. Field names follow the JSON served by
//! the tree API (`firstName`, `subjectId`, `"type": "Parent"`, ...).

mod person;
mod snapshot;

pub use person::{Gender, Person, PersonId};
pub use snapshot::{RelationshipEdge, RelationshipKind, TreeSnapshot};
