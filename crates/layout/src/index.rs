use lineage_data::{Person, PersonId, RelationshipKind, TreeSnapshot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Index of a person in the arena of one layout call
pub type PersonIx = NodeIndex;

/// Kind of an edge of the relationship graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kin {
    /// From a parent to one of its children
    Parent,
    /// Between spouses, stored once per couple
    Spouse,
}

/// Adjacency of the persons of a tree
///
/// Persons are borrowed from the snapshot and stored in a petgraph arena,
/// every later stage refers to them through [`PersonIx`]. Adjacency lists keep
/// the order of the relationship list so layouts are reproducible.
#[derive(Debug, Clone)]
pub struct RelationshipIndex<'a> {
    graph: DiGraph<&'a Person, Kin>,
    by_id: HashMap<&'a PersonId, PersonIx>,
    children: Vec<Vec<PersonIx>>,
    parents: Vec<Vec<PersonIx>>,
    spouses: Vec<Vec<PersonIx>>,
}

impl<'a> RelationshipIndex<'a> {
    pub fn new(tree: &'a TreeSnapshot) -> Self {
        let mut graph = DiGraph::with_capacity(tree.persons.len(), tree.relationships.len());
        let mut by_id = HashMap::with_capacity(tree.persons.len());

        for person in &tree.persons {
            if by_id.contains_key(&person.id) {
                warn!("Duplicate person {}, keeping the first one", person.id);
                continue;
            }
            by_id.insert(&person.id, graph.add_node(person));
        }

        for rel in &tree.relationships {
            let (Some(&subject), Some(&relative)) =
                (by_id.get(&rel.subject_id), by_id.get(&rel.relative_id))
            else {
                warn!(
                    "Ignoring {:?} relationship between {} and {}: unknown person",
                    rel.kind, rel.subject_id, rel.relative_id
                );
                continue;
            };

            if subject == relative {
                debug!("Ignoring {:?} relationship of {} with itself", rel.kind, rel.subject_id);
                continue;
            }

            let (from, to, kin) = match rel.kind {
                RelationshipKind::Parent => (relative, subject, Kin::Parent),
                RelationshipKind::Spouse => (subject, relative, Kin::Spouse),
            };

            let duplicate = match kin {
                Kin::Parent => has_edge(&graph, from, to, kin),
                Kin::Spouse => has_edge(&graph, from, to, kin) || has_edge(&graph, to, from, kin),
            };
            if !duplicate {
                graph.add_edge(from, to, kin);
            }
        }

        let mut children = vec![Vec::new(); graph.node_count()];
        let mut parents = vec![Vec::new(); graph.node_count()];
        let mut spouses = vec![Vec::new(); graph.node_count()];

        // Edge indices follow insertion order
        for edge in graph.edge_references() {
            let (from, to) = (edge.source(), edge.target());
            match edge.weight() {
                Kin::Parent => {
                    children[from.index()].push(to);
                    parents[to.index()].push(from);
                }
                Kin::Spouse => {
                    spouses[from.index()].push(to);
                    spouses[to.index()].push(from);
                }
            }
        }

        debug!(
            "Indexed {} persons and {} relationships",
            graph.node_count(),
            graph.edge_count()
        );

        Self {
            graph,
            by_id,
            children,
            parents,
            spouses,
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// All persons, in snapshot order
    pub fn indices(&self) -> impl Iterator<Item = PersonIx> + '_ {
        self.graph.node_indices()
    }

    pub fn lookup(&self, id: &PersonId) -> Option<PersonIx> {
        self.by_id.get(id).copied()
    }

    pub fn id(&self, ix: PersonIx) -> &'a PersonId {
        &self.graph[ix].id
    }

    pub fn children(&self, ix: PersonIx) -> &[PersonIx] {
        &self.children[ix.index()]
    }

    pub fn parents(&self, ix: PersonIx) -> &[PersonIx] {
        &self.parents[ix.index()]
    }

    pub fn spouses(&self, ix: PersonIx) -> &[PersonIx] {
        &self.spouses[ix.index()]
    }

    /// Children for `Outgoing`, parents for `Incoming`
    pub fn lineal(&self, ix: PersonIx, direction: Direction) -> &[PersonIx] {
        match direction {
            Direction::Outgoing => self.children(ix),
            Direction::Incoming => self.parents(ix),
        }
    }

    pub fn are_spouses(&self, a: PersonIx, b: PersonIx) -> bool {
        self.spouses(a).contains(&b)
    }

    /// Number of parent to child edges
    pub fn parent_edge_count(&self) -> usize {
        self.children.iter().map(Vec::len).sum()
    }

    pub fn graph(&self) -> &DiGraph<&'a Person, Kin> {
        &self.graph
    }
}

fn has_edge(graph: &DiGraph<&Person, Kin>, from: PersonIx, to: PersonIx, kin: Kin) -> bool {
    graph.edges_connecting(from, to).any(|e| *e.weight() == kin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_data::RelationshipEdge;
    use test_log::test;

    fn tree() -> TreeSnapshot {
        TreeSnapshot::new(
            ["a", "b", "c", "d"].map(Person::new).to_vec(),
            vec![
                RelationshipEdge::spouse("a", "b"),
                RelationshipEdge::parent("c", "a"),
                RelationshipEdge::parent("c", "b"),
                RelationshipEdge::parent("d", "a"),
                // Duplicates, self edges and dangling references are tolerated
                RelationshipEdge::spouse("b", "a"),
                RelationshipEdge::parent("c", "a"),
                RelationshipEdge::spouse("d", "d"),
                RelationshipEdge::parent("c", "nobody"),
            ],
        )
    }

    #[test]
    fn test_adjacency() {
        let tree = tree();
        let index = RelationshipIndex::new(&tree);
        let ix = |id: &str| index.lookup(&id.into()).unwrap();

        assert_eq!(index.len(), 4);
        assert_eq!(index.children(ix("a")), &[ix("c"), ix("d")]);
        assert_eq!(index.children(ix("b")), &[ix("c")]);
        assert_eq!(index.parents(ix("c")), &[ix("a"), ix("b")]);
        assert_eq!(index.spouses(ix("a")), &[ix("b")]);
        assert_eq!(index.spouses(ix("b")), &[ix("a")]);
        assert!(index.spouses(ix("d")).is_empty());
        assert!(index.are_spouses(ix("b"), ix("a")));
        assert_eq!(index.parent_edge_count(), 3);
        assert_eq!(index.id(ix("d")).as_str(), "d");
    }

    #[test]
    fn test_duplicate_person_keeps_first() {
        let tree = TreeSnapshot::new(
            vec![
                Person::new("a").with_name("First", "A"),
                Person::new("a").with_name("Second", "A"),
            ],
            vec![],
        );
        let index = RelationshipIndex::new(&tree);
        assert_eq!(index.len(), 1);
        let a = index.lookup(&"a".into()).unwrap();
        assert_eq!(index.graph()[a].first_name.as_deref(), Some("First"));
    }
}
