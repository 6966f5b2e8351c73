use crate::index::{PersonIx, RelationshipIndex};
use lineage_data::{PersonId, TreeSnapshot};
use petgraph::visit::{VisitMap, Visitable};
use petgraph::Direction;
use std::collections::BTreeSet;
use tracing::debug;

/// Set of persons drawn on the chart
#[derive(Debug, Clone, PartialEq)]
pub struct Visibility {
    visible: Vec<bool>,
}

impl Visibility {
    pub fn is_visible(&self, ix: PersonIx) -> bool {
        self.visible[ix.index()]
    }

    pub fn count(&self) -> usize {
        self.visible.iter().filter(|&&v| v).count()
    }

    /// Whether some of the recorded children of the person are hidden
    pub fn is_collapsed(&self, index: &RelationshipIndex, ix: PersonIx) -> bool {
        index.children(ix).iter().any(|&c| !self.is_visible(c))
    }
}

/// Compute the persons to show
///
/// The focus, its ancestors and its children are always shown, each of them
/// along with their spouses. Children of an expanded person are shown when
/// that person is itself shown, which cascades down expanded descendants.
pub(crate) fn resolve_visibility(
    index: &RelationshipIndex,
    focus: Option<PersonIx>,
    expanded: &BTreeSet<PersonId>,
) -> Visibility {
    let Some(focus) = focus else {
        return Visibility {
            visible: vec![false; index.len()],
        };
    };

    let mut is_expanded = vec![false; index.len()];
    for ix in expanded.iter().filter_map(|id| index.lookup(id)) {
        is_expanded[ix.index()] = true;
    }

    let mut reveal = Reveal {
        index,
        visible: vec![false; index.len()],
        is_expanded,
        pending: Vec::new(),
    };

    reveal.show_with_spouses(focus);
    for ancestor in ancestors(index, focus) {
        reveal.show_with_spouses(ancestor);
    }
    for &child in index.children(focus) {
        reveal.show_with_spouses(child);
    }

    // Every expanded person is queued once, when it becomes visible
    while let Some(ix) = reveal.pending.pop() {
        for &child in index.children(ix) {
            reveal.show_with_spouses(child);
        }
    }

    let visibility = Visibility {
        visible: reveal.visible,
    };
    debug!("{} of {} persons visible", visibility.count(), index.len());
    visibility
}

struct Reveal<'i, 'a> {
    index: &'i RelationshipIndex<'a>,
    visible: Vec<bool>,
    is_expanded: Vec<bool>,
    /// Expanded persons whose children are still to be shown
    pending: Vec<PersonIx>,
}

impl Reveal<'_, '_> {
    fn show(&mut self, ix: PersonIx) {
        if !self.visible[ix.index()] {
            self.visible[ix.index()] = true;
            if self.is_expanded[ix.index()] {
                self.pending.push(ix);
            }
        }
    }

    fn show_with_spouses(&mut self, ix: PersonIx) {
        self.show(ix);
        let index = self.index;
        for &spouse in index.spouses(ix) {
            self.show(spouse);
        }
    }
}

/// All ancestors of `ix`, closest first, each listed once
pub(crate) fn ancestors(index: &RelationshipIndex, ix: PersonIx) -> Vec<PersonIx> {
    walk(index, ix, Direction::Incoming)
}

/// All descendants of `ix`, closest first, each listed once
pub(crate) fn descendants(index: &RelationshipIndex, ix: PersonIx) -> Vec<PersonIx> {
    walk(index, ix, Direction::Outgoing)
}

/// Breadth-first walk along parent edges, never returning `start` even when
/// a loop leads back to it
fn walk(index: &RelationshipIndex, start: PersonIx, direction: Direction) -> Vec<PersonIx> {
    let mut visited = index.graph().visit_map();
    visited.visit(start);

    let mut found = Vec::new();
    let mut cursor = 0;
    let mut frontier = start;
    loop {
        for &ix in index.lineal(frontier, direction) {
            if visited.visit(ix) {
                found.push(ix);
            }
        }
        let Some(&ix) = found.get(cursor) else {
            break;
        };
        frontier = ix;
        cursor += 1;
    }
    found
}

/// Number of distinct persons reachable through child edges
///
/// Loops through co-parents are cut by the walk, a person is never counted as
/// its own descendant.
pub(crate) fn descendant_count(index: &RelationshipIndex, ix: PersonIx) -> usize {
    descendants(index, ix).len()
}

/// Persons on the direct line of the focus: the focus itself, all its
/// ancestors and all its descendants
///
/// Hosts use it to seed the expanded set when a chart is first opened. An
/// unknown focus yields an empty set.
pub fn focus_lineage(tree: &TreeSnapshot, focus: &PersonId) -> BTreeSet<PersonId> {
    let index = RelationshipIndex::new(tree);
    let Some(focus) = index.lookup(focus) else {
        return BTreeSet::new();
    };

    lineage_mask(&index, focus)
        .iter()
        .enumerate()
        .filter(|(_, on_line)| **on_line)
        .map(|(i, _)| index.id(PersonIx::new(i)).clone())
        .collect()
}

/// Flags of the persons on the direct line of `focus`
pub(crate) fn lineage_mask(index: &RelationshipIndex, focus: PersonIx) -> Vec<bool> {
    let mut mask = vec![false; index.len()];
    mask[focus.index()] = true;
    for ix in ancestors(index, focus)
        .into_iter()
        .chain(descendants(index, focus))
    {
        mask[ix.index()] = true;
    }
    mask
}
