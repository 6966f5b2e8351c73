use crate::arrangement::Arrangement;
use crate::cluster::{ClusterIx, Clusters, FamilyCluster};
use crate::index::PersonIx;
use crate::scene::Scene;
use crate::units::UnitIx;
use crate::width::Widths;
use std::collections::VecDeque;
use tracing::debug;

/// Provisional placement from the cluster forest
///
/// Each family gets a slot as wide as its subtree. Children split the slot of
/// their family in proportion to their own subtree and parents are centred over
/// their children. Units no family reaches are appended to their layer, then
/// two passes refine the result: the appended units move under their parents,
/// and every unit with children is re-centred over them, bottom first.
pub(crate) fn place_initial(scene: &Scene, clusters: &Clusters, widths: &Widths) -> Arrangement {
    let mut placer = Placer {
        scene,
        clusters,
        widths,
        centers: vec![None; scene.units.len()],
        placed: vec![false; clusters.len()],
    };

    let constants = &scene.constants;
    let mut cursor = 0.0;
    for &root in clusters.roots() {
        placer.place_family(root, cursor);
        cursor += widths.cluster(root) + constants.sibling_gap + constants.branch_gap;
    }
    let appended = placer.append_remaining();

    let centers = placer.centers.into_iter().map(|c| c.unwrap_or(0.0)).collect();
    let mut arrangement = Arrangement::new(scene, centers);
    for r in 0..arrangement.rows.len() {
        arrangement.settle_row(r, scene);
    }

    let arrangement = align_to_parents(&arrangement, scene, &appended);
    center_over_children(&arrangement, scene)
}

struct Placer<'s, 'i, 'a> {
    scene: &'s Scene<'i, 'a>,
    clusters: &'s Clusters,
    widths: &'s Widths,
    centers: Vec<Option<f32>>,
    placed: Vec<bool>,
}

/// Family whose slot is being filled
struct FamilySlot {
    k: ClusterIx,
    left: f32,
    cursor: f32,
    next_child: usize,
    child_centers: Vec<f32>,
    /// Families founded by the last placed child, with the left of their slot
    founded: VecDeque<(ClusterIx, f32)>,
}

impl Placer<'_, '_, '_> {
    fn person_center(&self, ix: PersonIx) -> Option<f32> {
        let u = self.scene.units.unit_of(ix)?;
        Some(self.centers[u]? + self.scene.relative_center(ix))
    }

    /// Centre the unit of `ix` at `center` unless it is already placed
    fn place_unit_of(&mut self, ix: PersonIx, center: f32) {
        if let Some(u) = self.scene.units.unit_of(ix) {
            if self.centers[u].is_none() {
                self.centers[u] = Some(center);
            }
        }
    }

    /// Place the family in the slot starting at `left`, then the families
    /// founded by its children in their slots
    ///
    /// Children are placed top down and parents once every family below them
    /// is done. The walk keeps its own stack of open families.
    fn place_family(&mut self, root: ClusterIx, left: f32) {
        let Some(first) = self.open(root, left) else {
            return;
        };
        let mut stack = vec![first];

        while let Some(slot) = stack.last_mut() {
            if let Some((next, start)) = slot.founded.pop_front() {
                if let Some(nested) = self.open(next, start) {
                    stack.push(nested);
                }
                continue;
            }
            if slot.next_child < self.clusters.get(slot.k).children.len() {
                self.place_child(slot);
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let clusters = self.clusters;
            let center = match (
                done.child_centers.iter().copied().reduce(f32::min),
                done.child_centers.iter().copied().reduce(f32::max),
            ) {
                (Some(lo), Some(hi)) => (lo + hi) / 2.0,
                _ => done.left + self.widths.cluster(done.k) / 2.0,
            };
            self.place_parents(clusters.get(done.k), center);
        }
    }

    fn open(&mut self, k: ClusterIx, left: f32) -> Option<FamilySlot> {
        if self.placed[k] {
            return None;
        }
        self.placed[k] = true;

        let family = self.clusters.get(k);
        let span = self
            .widths
            .children_span(&family.children, self.scene.constants.sibling_gap);
        Some(FamilySlot {
            k,
            left,
            cursor: left + (self.widths.cluster(k) - span) / 2.0,
            next_child: 0,
            child_centers: Vec::with_capacity(family.children.len()),
            founded: VecDeque::new(),
        })
    }

    /// Centre the next child of the family in its share of the slot
    fn place_child(&mut self, slot: &mut FamilySlot) {
        let clusters = self.clusters;
        let widths = self.widths;
        let family = clusters.get(slot.k);
        let gap = self.scene.constants.sibling_gap;
        let child = family.children[slot.next_child];
        slot.next_child += 1;

        let width = widths.person(child);
        let slot_center = slot.cursor + width / 2.0;
        self.place_unit_of(child, slot_center);
        slot
            .child_centers
            .push(self.person_center(child).unwrap_or(slot_center));

        // Families founded by the child share its slot
        let founded: Vec<ClusterIx> = family
            .child_clusters
            .iter()
            .copied()
            .filter(|&next| clusters.get(next).parents.contains(&child))
            .collect();
        let total = founded.iter().map(|&next| widths.cluster(next)).sum::<f32>()
            + gap * founded.len().saturating_sub(1) as f32;
        let mut start = slot_center - total / 2.0;
        for next in founded {
            slot.founded.push_back((next, start));
            start += widths.cluster(next) + gap;
        }

        slot.cursor += width + gap;
    }

    /// Put the midpoint of the parents at `center`, leaving placed units alone
    fn place_parents(&mut self, family: &FamilyCluster, center: f32) {
        let scene = self.scene;
        let units = scene.units;
        let unit_of = |p: PersonIx| units.unit_of(p);

        match family.parents.as_slice() {
            &[a, b] if unit_of(a) != unit_of(b) => {
                let (Some(ua), Some(ub)) = (unit_of(a), unit_of(b)) else {
                    return;
                };
                match (self.centers[ua], self.centers[ub]) {
                    (None, None) => {
                        let half = scene.constants.sibling_pitch() / 2.0;
                        self.centers[ua] = Some(center - half - scene.relative_center(a));
                        self.centers[ub] = Some(center + half - scene.relative_center(b));
                    }
                    (Some(xa), None) => self.centers[ub] = Some(xa + scene.separation(ua, ub)),
                    (None, Some(xb)) => self.centers[ua] = Some(xb - scene.separation(ua, ub)),
                    (Some(_), Some(_)) => {}
                }
            }
            parents => {
                let Some(u) = parents.first().and_then(|&p| unit_of(p)) else {
                    return;
                };
                if self.centers[u].is_none() {
                    let mid = parents.iter().map(|&p| scene.relative_center(p)).sum::<f32>()
                        / parents.len() as f32;
                    self.centers[u] = Some(center - mid);
                }
            }
        }
    }

    /// Append every unit still without a position to the right end of its
    /// layer, returns the appended units
    fn append_remaining(&mut self) -> Vec<bool> {
        let scene = self.scene;
        let gap = scene.constants.sibling_gap;
        let mut appended = vec![false; self.centers.len()];

        for u in 0..self.centers.len() {
            if self.centers[u].is_some() {
                continue;
            }
            let layer = scene.units.get(u).layer;
            let right_end = (0..self.centers.len())
                .filter(|&v| scene.units.get(v).layer == layer)
                .filter_map(|v| Some(self.centers[v]? + scene.unit_width(v) / 2.0))
                .reduce(f32::max);
            let left = right_end.map_or(0.0, |end| end + gap);
            self.centers[u] = Some(left + scene.unit_width(u) / 2.0);
            appended[u] = true;
        }

        let count = appended.iter().filter(|&&a| a).count();
        if count > 0 {
            debug!("Appended {} units outside of any family", count);
        }
        appended
    }
}

/// Top-down pass moving appended units under their visible parents
fn align_to_parents(arrangement: &Arrangement, scene: &Scene, appended: &[bool]) -> Arrangement {
    let mut next = arrangement.clone();
    for r in 1..next.rows.len() {
        let row = next.rows[r].units.clone();
        for u in row.into_iter().filter(|&u| appended[u]) {
            let mut targets = Vec::new();
            for &m in scene.units.members(u) {
                for p in scene.upper(m) {
                    targets.push(next.person_center(scene, p) - scene.relative_center(m));
                }
            }
            if !targets.is_empty() {
                next.centers[u] = targets.iter().sum::<f32>() / targets.len() as f32;
            }
        }
        next.settle_row(r, scene);
    }
    next
}

/// Bottom-up pass centring the parents of every unit over the extent of
/// their children
fn center_over_children(arrangement: &Arrangement, scene: &Scene) -> Arrangement {
    let mut next = arrangement.clone();
    for r in (0..next.rows.len().saturating_sub(1)).rev() {
        let row = next.rows[r].units.clone();
        for u in row {
            if let Some(center) = center_above(&next, scene, u) {
                next.centers[u] = center;
            }
        }
        next.settle_row(r, scene);
    }
    next
}

/// Unit centre putting the midpoint of its parents over their children
fn center_above(arrangement: &Arrangement, scene: &Scene, u: UnitIx) -> Option<f32> {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    let mut parents = Vec::new();
    for &m in scene.units.members(u) {
        let children = scene.lower(m);
        if children.is_empty() {
            continue;
        }
        parents.push(scene.relative_center(m));
        for c in children {
            let x = arrangement.person_center(scene, c);
            lo = lo.min(x);
            hi = hi.max(x);
        }
    }
    if parents.is_empty() {
        return None;
    }
    let mid = parents.iter().sum::<f32>() / parents.len() as f32;
    Some((lo + hi) / 2.0 - mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::build_clusters;
    use crate::scene::fixture::Fixture;
    use crate::width::estimate_widths;
    use lineage_data::{Person, RelationshipEdge, TreeSnapshot};
    use test_log::test;

    fn place(fixture: &Fixture) -> Arrangement {
        let scene = fixture.scene();
        let clusters = build_clusters(&scene, fixture.focus);
        let widths = estimate_widths(&scene, &clusters);
        place_initial(&scene, &clusters, &widths)
    }

    #[test]
    fn test_child_under_couple() {
        let tree = TreeSnapshot::new(
            ["a", "b", "c"].map(Person::new).to_vec(),
            vec![
                RelationshipEdge::spouse("a", "b"),
                RelationshipEdge::parent("c", "a"),
                RelationshipEdge::parent("c", "b"),
            ],
        );
        let fixture = Fixture::new(&tree, "c");
        let scene = fixture.scene();
        let arrangement = place(&fixture);

        let x = |id: &str| arrangement.person_center(&scene, fixture.ix(id));
        assert_eq!(x("b") - x("a"), 210.0);
        assert_eq!(x("c"), (x("a") + x("b")) / 2.0);
    }

    #[test]
    fn test_siblings_keep_their_distance() {
        let tree = TreeSnapshot::new(
            ["a", "b", "c", "d", "e"].map(Person::new).to_vec(),
            vec![
                RelationshipEdge::spouse("a", "b"),
                RelationshipEdge::parent("c", "a"),
                RelationshipEdge::parent("c", "b"),
                RelationshipEdge::parent("d", "a"),
                RelationshipEdge::parent("d", "b"),
                RelationshipEdge::parent("e", "a"),
                RelationshipEdge::parent("e", "b"),
            ],
        );
        let fixture = Fixture::new(&tree, "a");
        let scene = fixture.scene();
        let arrangement = place(&fixture);

        let x = |id: &str| arrangement.person_center(&scene, fixture.ix(id));
        assert_eq!(x("d") - x("c"), 360.0);
        assert_eq!(x("e") - x("d"), 360.0);
        assert_eq!(x("d"), (x("a") + x("b")) / 2.0);
    }

    #[test]
    fn test_two_grandparent_families_do_not_overlap() {
        let tree = TreeSnapshot::new(
            ["pg", "pm", "mg", "mm", "p", "m", "f"].map(Person::new).to_vec(),
            vec![
                RelationshipEdge::spouse("pg", "pm"),
                RelationshipEdge::spouse("mg", "mm"),
                RelationshipEdge::parent("p", "pg"),
                RelationshipEdge::parent("p", "pm"),
                RelationshipEdge::parent("m", "mg"),
                RelationshipEdge::parent("m", "mm"),
                RelationshipEdge::spouse("p", "m"),
                RelationshipEdge::parent("f", "p"),
                RelationshipEdge::parent("f", "m"),
            ],
        );
        let fixture = Fixture::new(&tree, "f");
        let scene = fixture.scene();
        let arrangement = place(&fixture);

        let top = &arrangement.rows[0];
        assert_eq!(top.layer, -2);
        assert_eq!(top.units.len(), 2);
        let (left, right) = (top.units[0], top.units[1]);
        assert!(
            arrangement.centers[right] - arrangement.centers[left]
                >= scene.separation(left, right) - 1e-3
        );
        // The paternal grandparents stay on the side of the father
        let x = |id: &str| arrangement.person_center(&scene, fixture.ix(id));
        assert!(x("pg") < x("mg"));
        assert!(x("p") < x("m"));
    }

    #[test]
    fn test_long_lineage_stacks_up() {
        let n = 5000;
        let ids: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
        let tree = TreeSnapshot::new(
            ids.iter().map(|id| Person::new(id.as_str())).collect(),
            ids.windows(2)
                .map(|w| RelationshipEdge::parent(w[1].as_str(), w[0].as_str()))
                .collect(),
        );
        let expanded: Vec<&str> = ids.iter().map(String::as_str).collect();
        let fixture = Fixture::with_expanded(&tree, "p0", &expanded);
        let scene = fixture.scene();
        let arrangement = place(&fixture);

        assert_eq!(arrangement.rows.len(), n);
        let x0 = arrangement.person_center(&scene, fixture.ix("p0"));
        assert!(ids
            .iter()
            .all(|id| arrangement.person_center(&scene, fixture.ix(id)) == x0));
    }
}
