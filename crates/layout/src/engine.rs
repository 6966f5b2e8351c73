use crate::cluster::build_clusters;
use crate::compaction::{compact, resolve_collisions};
use crate::connections::{content_bounds, layer_lists, wire};
use crate::crossings::minimize_crossings;
use crate::index::{PersonIx, RelationshipIndex};
use crate::layering::assign_layers;
use crate::model::{TreeLayout, TreeNode};
use crate::placement::place_initial;
use crate::scene::Scene;
use crate::units::group_spouses;
use crate::visibility::{descendant_count, lineage_mask, resolve_visibility};
use crate::width::estimate_widths;
use crate::{LayoutOptions, Point};
use lineage_data::{PersonId, TreeSnapshot};
use tracing::{debug, warn};

/// Lay out `tree` around `focus`
///
/// The computation is pure and never fails: the same inputs always give the
/// same layout, an unknown focus gives a layout where nothing is visible, and
/// loops in the relationships are cut wherever a stage meets them.
pub fn compute_layout(tree: &TreeSnapshot, focus: &PersonId, options: &LayoutOptions) -> TreeLayout {
    let constants = options.effective_constants();
    let index = RelationshipIndex::new(tree);

    let focus_ix = index.lookup(focus);
    if focus_ix.is_none() {
        warn!("Focus {} is not part of the tree", focus);
    }

    let layers = assign_layers(&index, focus_ix);
    let visibility = resolve_visibility(&index, focus_ix, &options.expanded);
    let units = group_spouses(&index, &layers, &visibility);
    let scene = Scene {
        index: &index,
        layers: &layers,
        visibility: &visibility,
        units: &units,
        constants,
    };

    let clusters = build_clusters(&scene, focus_ix);
    let widths = estimate_widths(&scene, &clusters);

    let arrangement = place_initial(&scene, &clusters, &widths);
    let arrangement = minimize_crossings(&arrangement, &scene);

    let xs = arrangement.left_edges(&scene);
    let xs = resolve_collisions(&scene, &xs);
    let xs = compact(&scene, &xs);

    // The focus is centred on x = 0
    let shift = focus_ix
        .and_then(|f| xs[f.index()])
        .map_or(0.0, |x| -(x + constants.node_width / 2.0));

    let on_lineage = match focus_ix {
        Some(f) => lineage_mask(&index, f),
        None => vec![false; index.len()],
    };
    let ids = |ixs: &[PersonIx]| -> Vec<PersonId> {
        ixs.iter().map(|&ix| index.id(ix).clone()).collect()
    };

    let nodes: Vec<TreeNode> = index
        .indices()
        .map(|ix| {
            let layer = layers.layer(ix);
            let x = xs[ix.index()].map_or(0.0, |x| x + shift);
            TreeNode {
                id: index.id(ix).clone(),
                position: Point::new(x, layer as f32 * constants.layer_pitch()),
                layer,
                parent_ids: ids(index.parents(ix)),
                children_ids: ids(index.children(ix)),
                spouse_ids: ids(index.spouses(ix)),
                width: constants.node_width,
                height: constants.node_height,
                is_visible: visibility.is_visible(ix),
                is_collapsed: visibility.is_collapsed(&index, ix),
                descendant_count: descendant_count(&index, ix),
                is_focus_lineage: on_lineage[ix.index()],
            }
        })
        .collect();

    let wiring = wire(&index, &clusters, &nodes, &constants, options.family_junctions);
    let bounds = content_bounds(&nodes, &constants);
    let layers = layer_lists(&nodes);

    debug!(
        "Laid out {} persons, {} visible, {} layers, bounds {}x{}",
        nodes.len(),
        visibility.count(),
        layers.len(),
        bounds.width(),
        bounds.height()
    );

    TreeLayout {
        focus_id: focus.clone(),
        nodes: nodes.into_iter().map(|node| (node.id.clone(), node)).collect(),
        families: wiring.families,
        connections: wiring.connections,
        layers,
        bounds,
    }
}
