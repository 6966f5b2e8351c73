use lineage_data::{Gender, Person, PersonId, RelationshipEdge, TreeSnapshot};
use lineage_layout::{
    compute_layout, focus_lineage, ConnectionKind, DetailLevel, LayoutOptions, TreeLayout,
};
use test_log::test;

const EPS: f32 = 1e-3;

fn id(s: &str) -> PersonId {
    PersonId::from(s)
}

fn center_x(layout: &TreeLayout, s: &str) -> f32 {
    layout.nodes[&id(s)].center().x
}

#[test]
fn test_couple_with_child() {
    let tree = TreeSnapshot::new(
        vec![
            Person::new("A").with_gender(Gender::Male),
            Person::new("B").with_gender(Gender::Female),
            Person::new("C"),
        ],
        vec![
            RelationshipEdge::spouse("A", "B"),
            RelationshipEdge::parent("C", "A"),
            RelationshipEdge::parent("C", "B"),
        ],
    );
    let options = LayoutOptions::default();
    let constants = options.effective_constants();
    let layout = compute_layout(&tree, &id("C"), &options);

    assert_eq!(layout.nodes[&id("A")].layer, -1);
    assert_eq!(layout.nodes[&id("B")].layer, -1);
    assert_eq!(layout.nodes[&id("C")].layer, 0);

    assert_eq!(layout.layers[&-1].len(), 2);
    let gap = (center_x(&layout, "A") - center_x(&layout, "B")).abs();
    assert!((gap - constants.spouse_pitch()).abs() < EPS, "spouses {gap} apart");

    let midpoint = (center_x(&layout, "A") + center_x(&layout, "B")) / 2.0;
    assert!((center_x(&layout, "C") - midpoint).abs() < EPS);
    // The focus is centred on the origin
    assert!(center_x(&layout, "C").abs() < EPS);

    assert_eq!(layout.families.len(), 1);
    assert_eq!(layout.connections_of(ConnectionKind::CoParent).count(), 0);
}

#[test]
fn test_unmarried_parents_share_one_family() {
    let tree = TreeSnapshot::new(
        ["A", "C", "D"].map(Person::new).to_vec(),
        vec![
            RelationshipEdge::parent("C", "A"),
            RelationshipEdge::parent("C", "D"),
        ],
    );
    let layout = compute_layout(&tree, &id("C"), &LayoutOptions::default());

    let co_parents: Vec<_> = layout.connections_of(ConnectionKind::CoParent).collect();
    assert_eq!(co_parents.len(), 1);
    let mut pair = [co_parents[0].from.clone(), co_parents[0].to.clone()];
    pair.sort();
    assert_eq!(pair, [id("A"), id("D")]);
    assert_eq!(layout.connections_of(ConnectionKind::Spouse).count(), 0);

    assert_eq!(layout.families.len(), 1);
    let family = layout.families.values().next().unwrap();
    assert_eq!(family.parent_ids, vec![id("A"), id("D")]);
    assert_eq!(family.children_ids, vec![id("C")]);
    assert_eq!(co_parents[0].family_id.as_deref(), Some(family.id.as_str()));
}

#[test]
fn test_co_parent_cycle_terminates() {
    // A and B are the parents of C, C and D the parents of B
    let tree = TreeSnapshot::new(
        ["A", "B", "C", "D"].map(Person::new).to_vec(),
        vec![
            RelationshipEdge::parent("C", "A"),
            RelationshipEdge::parent("C", "B"),
            RelationshipEdge::parent("B", "C"),
            RelationshipEdge::parent("B", "D"),
        ],
    );

    for focus in ["A", "B", "C", "D"] {
        let layout = compute_layout(&tree, &id(focus), &LayoutOptions::default());
        assert_eq!(layout.nodes.len(), 4);
        assert_eq!(layout.nodes[&id(focus)].layer, 0);

        let b = &layout.nodes[&id("B")];
        let listed: Vec<i32> = layout
            .layers
            .iter()
            .filter(|(_, row)| row.contains(&id("B")))
            .map(|(&layer, _)| layer)
            .collect();
        assert!(listed.len() <= 1);
        if let Some(&layer) = listed.first() {
            assert_eq!(layer, b.layer);
        }
    }
}

#[test]
fn test_expanding_a_child_reveals_grandchildren() {
    let tree = TreeSnapshot::new(
        ["F", "G", "H", "S"].map(Person::new).to_vec(),
        vec![
            RelationshipEdge::parent("G", "F"),
            RelationshipEdge::parent("H", "G"),
            RelationshipEdge::spouse("H", "S"),
        ],
    );

    let folded = compute_layout(&tree, &id("F"), &LayoutOptions::default());
    assert!(folded.nodes[&id("G")].is_visible);
    assert!(folded.nodes[&id("G")].is_collapsed);
    assert!(!folded.nodes[&id("H")].is_visible);
    assert!(!folded.nodes[&id("S")].is_visible);
    assert_eq!(folded.visible_nodes().count(), 2);

    let options = LayoutOptions::default().expand("G");
    let unfolded = compute_layout(&tree, &id("F"), &options);
    assert!(unfolded.nodes[&id("H")].is_visible);
    assert!(unfolded.nodes[&id("S")].is_visible);
    assert!(!unfolded.nodes[&id("G")].is_collapsed);
    assert_eq!(unfolded.nodes[&id("H")].layer, 2);

    for node in folded.visible_nodes() {
        assert_eq!(unfolded.nodes[&node.id].layer, node.layer);
    }
}

#[test]
fn test_detail_levels_rescale() {
    let tree = TreeSnapshot::new(
        ["gp", "gm", "p", "m", "f", "w", "k1", "k2"]
            .map(Person::new)
            .to_vec(),
        vec![
            RelationshipEdge::spouse("gp", "gm"),
            RelationshipEdge::parent("p", "gp"),
            RelationshipEdge::parent("p", "gm"),
            RelationshipEdge::spouse("p", "m"),
            RelationshipEdge::parent("f", "p"),
            RelationshipEdge::parent("f", "m"),
            RelationshipEdge::spouse("f", "w"),
            RelationshipEdge::parent("k1", "f"),
            RelationshipEdge::parent("k2", "f"),
            RelationshipEdge::parent("k2", "w"),
        ],
    );

    let full = compute_layout(&tree, &id("f"), &LayoutOptions::default());
    for detail in [DetailLevel::Summary, DetailLevel::Overview] {
        let options = LayoutOptions::default().with_detail(detail);
        let scaled = compute_layout(&tree, &id("f"), &options);
        let ratio = detail.scale();

        assert_eq!(scaled.nodes.len(), full.nodes.len());
        assert_eq!(scaled.layers, full.layers);
        assert_eq!(scaled.connections.len(), full.connections.len());
        assert_eq!(
            scaled.families.keys().collect::<Vec<_>>(),
            full.families.keys().collect::<Vec<_>>()
        );

        let node = &scaled.nodes[&id("f")];
        assert_eq!(node.width, 160.0 * ratio);
        assert_eq!(node.height, 80.0 * ratio);

        let tolerance = full.bounds.width() * 1e-4;
        assert!((scaled.bounds.width() - full.bounds.width() * ratio).abs() < tolerance);
        assert!((scaled.bounds.height() - full.bounds.height() * ratio).abs() < tolerance);
        for (key, node) in &full.nodes {
            let other = &scaled.nodes[key];
            assert!((other.position.x - node.position.x * ratio).abs() < tolerance);
            assert!((other.position.y - node.position.y * ratio).abs() < tolerance);
        }
    }
}

#[test]
fn test_unknown_focus() {
    let tree = TreeSnapshot::new(
        ["a", "b"].map(Person::new).to_vec(),
        vec![RelationshipEdge::spouse("a", "b")],
    );
    let layout = compute_layout(&tree, &id("nobody"), &LayoutOptions::default());

    assert_eq!(layout.nodes.len(), 2);
    assert_eq!(layout.visible_nodes().count(), 0);
    assert!(layout.connections.is_empty());
    assert!(layout.layers.is_empty());
    assert_eq!(layout.bounds.width(), 160.0 + 200.0);
}

#[test]
fn test_lone_focus() {
    let tree = TreeSnapshot::new(vec![Person::new("solo")], Vec::new());
    let layout = compute_layout(&tree, &id("solo"), &LayoutOptions::default());

    let node = &layout.nodes[&id("solo")];
    assert!(node.is_visible);
    assert_eq!(node.layer, 0);
    assert!(node.center().x.abs() < EPS);
    assert!(layout.bounds.contains_rect(&node.rect()));
}

#[test]
fn test_connectors_per_child_without_junctions() {
    let tree = TreeSnapshot::new(
        ["p", "m", "a", "b"].map(Person::new).to_vec(),
        vec![
            RelationshipEdge::spouse("p", "m"),
            RelationshipEdge::parent("a", "p"),
            RelationshipEdge::parent("a", "m"),
            RelationshipEdge::parent("b", "p"),
            RelationshipEdge::parent("b", "m"),
        ],
    );
    // The sibling b only shows once a parent is unfolded
    let options = LayoutOptions::default()
        .with_family_junctions(false)
        .expand("p");
    let layout = compute_layout(&tree, &id("a"), &options);
    assert!(layout.nodes[&id("b")].is_visible);

    assert!(layout.families.is_empty());
    let links: Vec<_> = layout.connections_of(ConnectionKind::ParentChild).collect();
    assert_eq!(links.len(), 2);
    for link in links {
        let child = &layout.nodes[&link.to];
        let end = link.points.last().unwrap();
        assert!((end.x - child.center().x).abs() < EPS);
        assert!((end.y - child.position.y).abs() < EPS);
    }
}

#[test]
fn test_layout_serializes_to_camel_case() -> anyhow::Result<()> {
    let tree: TreeSnapshot = serde_json::from_str(
        r#"{
            "persons": [
                {"id": "a", "firstName": "Ada", "gender": "Female"},
                {"id": "b", "firstName": "Bob"},
                {"id": "c"}
            ],
            "relationships": [
                {"id": "r1", "type": "Parent", "subjectId": "c", "relativeId": "a"},
                {"id": "r2", "type": "Parent", "subjectId": "c", "relativeId": "b"}
            ]
        }"#,
    )?;
    let layout = compute_layout(&tree, &id("c"), &LayoutOptions::default());
    let json = serde_json::to_value(&layout)?;

    assert_eq!(json["focusId"], "c");
    assert_eq!(json["nodes"]["a"]["isVisible"], true);
    assert_eq!(json["nodes"]["c"]["parentIds"], serde_json::json!(["a", "b"]));
    assert_eq!(json["connections"][0]["kind"], "co-parent");
    Ok(())
}

#[test]
fn test_thousands_of_generations() {
    let n = 5000;
    let ids: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
    let tree = TreeSnapshot::new(
        ids.iter().map(|id| Person::new(id.as_str())).collect(),
        ids.windows(2)
            .map(|w| RelationshipEdge::parent(w[1].as_str(), w[0].as_str()))
            .collect(),
    );
    let mut options = LayoutOptions::default();
    options.expanded = focus_lineage(&tree, &id("p0"));
    let layout = compute_layout(&tree, &id("p0"), &options);

    assert_eq!(layout.visible_nodes().count(), n);
    assert_eq!(layout.layers.len(), n);
    for (i, s) in ids.iter().enumerate() {
        assert_eq!(layout.nodes[&id(s)].layer, i as i32);
        assert!(center_x(&layout, s).abs() < EPS);
    }
}
