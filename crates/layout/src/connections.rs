use crate::cluster::{Clusters, FamilyCluster, ParentKey};
use crate::config::LayoutConstants;
use crate::index::{PersonIx, RelationshipIndex};
use crate::model::{ConnectionKind, FamilyNode, TreeConnection, TreeNode};
use crate::{Point, Rect, Vec2};
use lineage_data::PersonId;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Family junctions and connectors of a placed tree
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Wiring {
    pub families: BTreeMap<String, FamilyNode>,
    pub connections: Vec<TreeConnection>,
}

/// Build the connectors between placed nodes
///
/// `nodes` is indexed like the arena. With junctions, every family with
/// visible children gets one [`FamilyNode`] and no parent-child connector,
/// otherwise every child gets its own parent-child connector. Partners
/// without a recorded marriage are joined by a co-parent connector, married
/// partners without a visible family by a spouse connector.
pub(crate) fn wire(
    index: &RelationshipIndex,
    clusters: &Clusters,
    nodes: &[TreeNode],
    constants: &LayoutConstants,
    family_junctions: bool,
) -> Wiring {
    let mut wiring = Wiring::default();
    let mut couples_with_family = BTreeSet::new();

    for family in clusters.iter().filter(|f| !f.children.is_empty()) {
        let id = family.id(index);
        if let ParentKey::Couple(a, b) = family.key {
            couples_with_family.insert((a, b));
            if !index.are_spouses(a, b) {
                wiring.connections.push(side_by_side(
                    ConnectionKind::CoParent,
                    &nodes[a.index()],
                    &nodes[b.index()],
                    Some(id.clone()),
                ));
            }
        }

        let (anchor, junction) = junction(family, nodes, constants);
        let mut children: Vec<&TreeNode> = family.children.iter().map(|&c| &nodes[c.index()]).collect();
        children.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));

        if family_junctions {
            wiring.families.insert(
                id.clone(),
                FamilyNode {
                    id,
                    parent_ids: family.parents.iter().map(|&p| index.id(p).clone()).collect(),
                    children_ids: children.iter().map(|c| c.id.clone()).collect(),
                    position: junction,
                    layer: family.layer,
                },
            );
        } else {
            let from = index.id(family.parents[0]).clone();
            for child in children {
                let top = Point::new(child.center().x, child.position.y);
                wiring.connections.push(TreeConnection {
                    kind: ConnectionKind::ParentChild,
                    from: from.clone(),
                    to: child.id.clone(),
                    family_id: Some(id.clone()),
                    points: vec![
                        anchor,
                        junction,
                        Point::new(top.x, junction.y),
                        top,
                    ],
                });
            }
        }
    }

    // Spouses are joined only when they stand next to each other
    let rows = visible_rows(nodes);
    let adjacent = |a: &TreeNode, b: &TreeNode| {
        let Some(xs) = rows.get(&a.layer).filter(|_| a.layer == b.layer) else {
            return false;
        };
        let (lo, hi) = if a.position.x <= b.position.x {
            (a.position.x, b.position.x)
        } else {
            (b.position.x, a.position.x)
        };
        let first = xs.partition_point(|&x| x <= lo);
        xs.get(first).map_or(true, |&x| x >= hi)
    };

    for a in index.indices().filter(|&ix| nodes[ix.index()].is_visible) {
        for &b in index.spouses(a) {
            let pair = (a.min(b), a.max(b));
            if a < b
                && nodes[b.index()].is_visible
                && !couples_with_family.contains(&pair)
                && adjacent(&nodes[a.index()], &nodes[b.index()])
            {
                wiring.connections.push(side_by_side(
                    ConnectionKind::Spouse,
                    &nodes[a.index()],
                    &nodes[b.index()],
                    None,
                ));
            }
        }
    }

    debug!(
        "Wired {} family junctions and {} connectors",
        wiring.families.len(),
        wiring.connections.len()
    );
    wiring
}

/// Sorted left edges of the visible nodes of every layer
fn visible_rows(nodes: &[TreeNode]) -> BTreeMap<i32, Vec<f32>> {
    let mut rows: BTreeMap<i32, Vec<f32>> = BTreeMap::new();
    for node in nodes.iter().filter(|n| n.is_visible) {
        rows.entry(node.layer).or_default().push(node.position.x);
    }
    for xs in rows.values_mut() {
        xs.sort_by(f32::total_cmp);
    }
    rows
}

/// Midpoint under the parents, and the junction halfway down to the next band
fn junction(family: &FamilyCluster, nodes: &[TreeNode], constants: &LayoutConstants) -> (Point, Point) {
    let parents: Vec<&TreeNode> = family.parents.iter().map(|&p| &nodes[p.index()]).collect();
    let x = parents.iter().map(|p| p.center().x).sum::<f32>() / parents.len() as f32;
    let bottom = parents
        .iter()
        .map(|p| p.position.y + p.height)
        .fold(f32::NEG_INFINITY, f32::max);
    (
        Point::new(x, bottom),
        Point::new(x, bottom + constants.generation_gap / 2.0),
    )
}

/// Horizontal connector between the facing sides of two persons, the left
/// one first
fn side_by_side(
    kind: ConnectionKind,
    a: &TreeNode,
    b: &TreeNode,
    family_id: Option<String>,
) -> TreeConnection {
    let (left, right) = if a.position.x <= b.position.x { (a, b) } else { (b, a) };
    TreeConnection {
        kind,
        from: left.id.clone(),
        to: right.id.clone(),
        family_id,
        points: vec![
            Point::new(left.position.x + left.width, left.center().y),
            Point::new(right.position.x, right.center().y),
        ],
    }
}

/// Union of the visible rectangles grown by the padding, a single node sized
/// rectangle at the origin when nothing is visible
pub(crate) fn content_bounds<'n>(
    nodes: impl IntoIterator<Item = &'n TreeNode>,
    constants: &LayoutConstants,
) -> Rect {
    nodes
        .into_iter()
        .filter(|node| node.is_visible)
        .map(TreeNode::rect)
        .reduce(Rect::union)
        .unwrap_or_else(|| {
            Rect::from_min_size(
                Point::new(0.0, 0.0),
                Vec2::new(constants.node_width, constants.node_height),
            )
        })
        .expand(constants.padding)
}

/// Visible persons of every layer, left to right
pub(crate) fn layer_lists(nodes: &[TreeNode]) -> BTreeMap<i32, Vec<PersonId>> {
    let mut layers: BTreeMap<i32, Vec<(f32, PersonIx)>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        if node.is_visible {
            layers
                .entry(node.layer)
                .or_default()
                .push((node.position.x, PersonIx::new(i)));
        }
    }
    layers
        .into_iter()
        .map(|(layer, mut row)| {
            row.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let ids = row.into_iter().map(|(_, ix)| nodes[ix.index()].id.clone()).collect();
            (layer, ids)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::build_clusters;
    use crate::scene::fixture::Fixture;
    use lineage_data::{Person, RelationshipEdge, TreeSnapshot};
    use test_log::test;

    fn node(id: &str, x: f32, visible: bool) -> TreeNode {
        TreeNode {
            id: id.into(),
            position: Point::new(x, 0.0),
            layer: 0,
            parent_ids: Vec::new(),
            children_ids: Vec::new(),
            spouse_ids: Vec::new(),
            width: 160.0,
            height: 80.0,
            is_visible: visible,
            is_collapsed: false,
            descendant_count: 0,
            is_focus_lineage: false,
        }
    }

    #[test]
    fn test_bounds_cover_visible_nodes() {
        let constants = LayoutConstants::default();
        let nodes = [node("a", -100.0, true), node("b", 300.0, true), node("c", 9000.0, false)];
        let bounds = content_bounds(&nodes, &constants);
        assert_eq!(bounds.min, Point::new(-200.0, -100.0));
        assert_eq!(bounds.max, Point::new(560.0, 180.0));
    }

    #[test]
    fn test_empty_bounds() {
        let constants = LayoutConstants::default();
        let bounds = content_bounds(&[node("a", 50.0, false)], &constants);
        assert_eq!(bounds.min, Point::new(-100.0, -100.0));
        assert_eq!(bounds.max, Point::new(260.0, 180.0));
    }

    #[test]
    fn test_layers_left_to_right() {
        let nodes = [node("a", 300.0, true), node("b", -20.0, true), node("c", 0.0, false)];
        let layers = layer_lists(&nodes);
        assert_eq!(layers[&0], vec![PersonId::from("b"), PersonId::from("a")]);
    }

    #[test]
    fn test_spouse_connectors_join_neighbours() {
        // a, b and c all married to each other, d married to e a band lower
        let tree = TreeSnapshot::new(
            ["a", "b", "c", "d", "e"].map(Person::new).to_vec(),
            vec![
                RelationshipEdge::spouse("a", "b"),
                RelationshipEdge::spouse("b", "c"),
                RelationshipEdge::spouse("a", "c"),
                RelationshipEdge::spouse("d", "e"),
            ],
        );
        let fixture = Fixture::new(&tree, "a");
        let clusters = build_clusters(&fixture.scene(), fixture.focus);
        let mut nodes: Vec<TreeNode> = [
            ("a", 0.0),
            ("b", 210.0),
            ("c", 420.0),
            ("d", 1000.0),
            ("e", 1000.0),
        ]
        .into_iter()
        .map(|(id, x)| node(id, x, true))
        .collect();
        nodes[4].layer = 1;

        let wiring = wire(
            &fixture.index,
            &clusters,
            &nodes,
            &LayoutConstants::default(),
            true,
        );
        let pairs: Vec<(&str, &str)> = wiring
            .connections
            .iter()
            .filter(|c| c.kind == ConnectionKind::Spouse)
            .map(|c| (c.from.as_str(), c.to.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("b", "c")]);
    }
}
