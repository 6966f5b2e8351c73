use crate::index::{PersonIx, RelationshipIndex};
use petgraph::visit::{VisitMap, Visitable};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Generation of every person, relative to the focus at 0
#[derive(Debug, Clone, PartialEq)]
pub struct LayerMap {
    layers: Vec<i32>,
}

impl LayerMap {
    pub fn layer(&self, ix: PersonIx) -> i32 {
        self.layers[ix.index()]
    }
}

/// Assign a generation to every person by a breadth-first walk from the focus
///
/// Parents go one layer up, children one layer down, spouses stay on the same
/// layer. The first assignment wins. Persons the walk never reaches are put on
/// layer 0 so that they still get a node.
pub(crate) fn assign_layers(index: &RelationshipIndex, focus: Option<PersonIx>) -> LayerMap {
    let mut layers = vec![0; index.len()];
    let mut visited = index.graph().visit_map();
    let mut queue = VecDeque::new();

    if let Some(focus) = focus {
        queue.push_back((focus, 0));
    }

    while let Some((ix, layer)) = queue.pop_front() {
        if !visited.visit(ix) {
            continue;
        }
        layers[ix.index()] = layer;

        let next = index
            .parents(ix)
            .iter()
            .map(|&p| (p, layer - 1))
            .chain(index.children(ix).iter().map(|&c| (c, layer + 1)))
            .chain(index.spouses(ix).iter().map(|&s| (s, layer)));
        for (other, layer) in next {
            if !visited.is_visited(&other) {
                queue.push_back((other, layer));
            }
        }
    }

    let reached: Vec<bool> = index.indices().map(|ix| visited.is_visited(&ix)).collect();
    debug!(
        "Assigned layers to {} of {} persons",
        reached.iter().filter(|&&r| r).count(),
        index.len()
    );

    // Loops in the relationships leave some links across more than one layer
    let stretched = index
        .indices()
        .filter(|&ix| reached[ix.index()])
        .flat_map(|ix| index.children(ix).iter().map(move |&c| (ix, c)))
        .filter(|&(p, c)| layers[c.index()] != layers[p.index()] + 1)
        .count();
    if stretched > 0 {
        warn!(
            "{} of {} parent links do not span exactly one generation",
            stretched,
            index.parent_edge_count()
        );
    }

    LayerMap { layers }
}
