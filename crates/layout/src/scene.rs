use crate::config::LayoutConstants;
use crate::index::{PersonIx, RelationshipIndex};
use crate::layering::LayerMap;
use crate::units::{UnitIx, Units};
use crate::visibility::Visibility;

/// Read-only results of the structural stages, shared by the placement stages
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scene<'i, 'a> {
    pub index: &'i RelationshipIndex<'a>,
    pub layers: &'i LayerMap,
    pub visibility: &'i Visibility,
    pub units: &'i Units,
    pub constants: LayoutConstants,
}

impl Scene<'_, '_> {
    pub fn is_visible(&self, ix: PersonIx) -> bool {
        self.visibility.is_visible(ix)
    }

    pub fn layer(&self, ix: PersonIx) -> i32 {
        self.layers.layer(ix)
    }

    /// Visible children one layer below the person
    pub fn lower(&self, ix: PersonIx) -> Vec<PersonIx> {
        self.adjacent(self.index.children(ix), self.layer(ix) + 1)
    }

    /// Visible parents one layer above the person
    pub fn upper(&self, ix: PersonIx) -> Vec<PersonIx> {
        self.adjacent(self.index.parents(ix), self.layer(ix) - 1)
    }

    fn adjacent(&self, relatives: &[PersonIx], layer: i32) -> Vec<PersonIx> {
        relatives
            .iter()
            .copied()
            .filter(|&r| self.is_visible(r) && self.layer(r) == layer)
            .collect()
    }

    pub fn unit_width(&self, u: UnitIx) -> f32 {
        self.units.width(u, &self.constants)
    }

    /// See [`Units::relative_center`]
    pub fn relative_center(&self, ix: PersonIx) -> f32 {
        self.units.relative_center(ix, &self.constants)
    }

    /// Minimum centre to centre distance of two neighbouring units
    pub fn separation(&self, u: UnitIx, v: UnitIx) -> f32 {
        (self.unit_width(u) + self.unit_width(v)) / 2.0 + self.constants.sibling_gap
    }
}
