use crate::config::LayoutConstants;
use crate::index::{PersonIx, RelationshipIndex};
use crate::layering::LayerMap;
use crate::visibility::Visibility;
use petgraph::unionfind::UnionFind;
use tracing::debug;

pub(crate) type UnitIx = usize;

/// Visible persons of one layer held together by spouse edges
///
/// A unit is moved as a whole by every placement stage, its members keep an
/// exact spouse spacing between them.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Unit {
    /// Left to right
    pub members: Vec<PersonIx>,
    pub layer: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Units {
    units: Vec<Unit>,
    unit_of: Vec<Option<UnitIx>>,
    /// Rank of each person within its unit
    rank: Vec<usize>,
}

impl Units {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn get(&self, u: UnitIx) -> &Unit {
        &self.units[u]
    }

    pub fn members(&self, u: UnitIx) -> &[PersonIx] {
        &self.units[u].members
    }

    /// `None` for hidden persons
    pub fn unit_of(&self, ix: PersonIx) -> Option<UnitIx> {
        self.unit_of[ix.index()]
    }

    pub fn width(&self, u: UnitIx, constants: &LayoutConstants) -> f32 {
        let n = self.units[u].members.len() as f32;
        n * constants.node_width + (n - 1.0) * constants.spouse_gap
    }

    /// Distance from the left edge of the unit to the left edge of the person
    pub fn offset(&self, ix: PersonIx, constants: &LayoutConstants) -> f32 {
        self.rank[ix.index()] as f32 * constants.spouse_pitch()
    }

    /// Signed distance from the centre of the unit to the centre of the person
    pub fn relative_center(&self, ix: PersonIx, constants: &LayoutConstants) -> f32 {
        match self.unit_of(ix) {
            Some(u) => {
                self.offset(ix, constants) + constants.node_width / 2.0
                    - self.width(u, constants) / 2.0
            }
            None => 0.0,
        }
    }
}

/// Group visible same-layer spouses into units
pub(crate) fn group_spouses(
    index: &RelationshipIndex,
    layers: &LayerMap,
    visibility: &Visibility,
) -> Units {
    let visible: Vec<PersonIx> = index
        .indices()
        .filter(|&ix| visibility.is_visible(ix))
        .collect();

    let mut groups = UnionFind::<usize>::new(index.len());
    for &ix in &visible {
        for &spouse in index.spouses(ix) {
            if visibility.is_visible(spouse) && layers.layer(spouse) == layers.layer(ix) {
                groups.union(ix.index(), spouse.index());
            }
        }
    }

    let mut unit_of_root: Vec<Option<UnitIx>> = vec![None; index.len()];
    let mut grouped: Vec<Vec<PersonIx>> = Vec::new();
    for &ix in &visible {
        let root = groups.find(ix.index());
        match unit_of_root[root] {
            Some(u) => grouped[u].push(ix),
            None => {
                unit_of_root[root] = Some(grouped.len());
                grouped.push(vec![ix]);
            }
        }
    }

    let mut unit_of = vec![None; index.len()];
    let mut rank = vec![0; index.len()];
    let units: Vec<Unit> = grouped
        .iter()
        .enumerate()
        .map(|(u, group)| {
            let members = chain_order(index, group);
            for (i, &ix) in members.iter().enumerate() {
                unit_of[ix.index()] = Some(u);
                rank[ix.index()] = i;
            }
            Unit {
                layer: layers.layer(group[0]),
                members,
            }
        })
        .collect();

    debug!(
        "Grouped {} visible persons into {} units",
        visible.len(),
        units.len()
    );

    Units {
        units,
        unit_of,
        rank,
    }
}

/// Order a spouse group so that married persons are next to each other
///
/// The walk starts from a member with at most one spouse in the group, which
/// turns a chain of remarriages into a left to right line.
fn chain_order(index: &RelationshipIndex, group: &[PersonIx]) -> Vec<PersonIx> {
    if group.len() < 3 {
        return group.to_vec();
    }

    let in_group = |ix: &PersonIx| group.contains(ix);
    let degree = |ix: PersonIx| index.spouses(ix).iter().filter(|s| in_group(s)).count();
    let start = group
        .iter()
        .copied()
        .find(|&ix| degree(ix) <= 1)
        .unwrap_or(group[0]);

    let mut order = Vec::with_capacity(group.len());
    let mut stack = vec![start];
    while let Some(ix) = stack.pop() {
        if order.contains(&ix) {
            continue;
        }
        order.push(ix);
        for spouse in index.spouses(ix).iter().rev() {
            if in_group(spouse) && !order.contains(spouse) {
                stack.push(*spouse);
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layering::assign_layers;
    use crate::visibility::resolve_visibility;
    use lineage_data::{Person, RelationshipEdge, TreeSnapshot};
    use std::collections::BTreeSet;
    use test_log::test;

    #[test]
    fn test_remarriage_chain() {
        // b married a then c, d is the child of a and b
        let tree = TreeSnapshot::new(
            ["a", "b", "c", "d"].map(Person::new).to_vec(),
            vec![
                RelationshipEdge::spouse("b", "a"),
                RelationshipEdge::spouse("b", "c"),
                RelationshipEdge::parent("d", "a"),
                RelationshipEdge::parent("d", "b"),
            ],
        );
        let index = RelationshipIndex::new(&tree);
        let ix = |id: &str| index.lookup(&id.into()).unwrap();
        let layers = assign_layers(&index, Some(ix("d")));
        let visibility = resolve_visibility(&index, Some(ix("d")), &BTreeSet::new());
        let units = group_spouses(&index, &layers, &visibility);

        assert_eq!(units.len(), 2);
        let couple = units.unit_of(ix("b")).unwrap();
        assert_eq!(units.members(couple), &[ix("a"), ix("b"), ix("c")]);
        assert_eq!(units.get(couple).layer, -1);

        let constants = LayoutConstants::default();
        assert_eq!(units.width(couple, &constants), 580.0);
        assert_eq!(units.offset(ix("c"), &constants), 420.0);
        assert_eq!(units.relative_center(ix("b"), &constants), 0.0);
        assert_eq!(units.relative_center(ix("a"), &constants), -210.0);
    }

    #[test]
    fn test_spouses_on_other_layers_stay_apart() {
        // b is reached as a parent of c before the spouse edge to c is followed
        let tree = TreeSnapshot::new(
            ["b", "c"].map(Person::new).to_vec(),
            vec![
                RelationshipEdge::parent("c", "b"),
                RelationshipEdge::spouse("c", "b"),
            ],
        );
        let index = RelationshipIndex::new(&tree);
        let ix = |id: &str| index.lookup(&id.into()).unwrap();
        let layers = assign_layers(&index, Some(ix("c")));
        let visibility = resolve_visibility(&index, Some(ix("c")), &BTreeSet::new());
        let units = group_spouses(&index, &layers, &visibility);

        assert_eq!(units.len(), 2);
        assert_ne!(units.unit_of(ix("b")), units.unit_of(ix("c")));
    }
}
