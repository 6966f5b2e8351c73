use crate::index::PersonIx;
use crate::scene::Scene;
use crate::units::UnitIx;
use std::collections::BTreeMap;

/// Units of one visible layer, left to right
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Row {
    pub layer: i32,
    pub units: Vec<UnitIx>,
}

/// Horizontal state passed from one placement stage to the next
///
/// Every stage takes an arrangement and returns a new one, rows are ordered
/// top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Arrangement {
    pub rows: Vec<Row>,
    /// Centre of every unit
    pub centers: Vec<f32>,
}

impl Arrangement {
    pub fn new(scene: &Scene, centers: Vec<f32>) -> Self {
        let mut by_layer: BTreeMap<i32, Vec<UnitIx>> = BTreeMap::new();
        for u in 0..scene.units.len() {
            by_layer.entry(scene.units.get(u).layer).or_default().push(u);
        }

        let rows = by_layer
            .into_iter()
            .map(|(layer, mut units)| {
                units.sort_by(|&a, &b| centers[a].total_cmp(&centers[b]));
                Row { layer, units }
            })
            .collect();

        Self { rows, centers }
    }

    /// Centre of a visible person
    pub fn person_center(&self, scene: &Scene, ix: PersonIx) -> f32 {
        match scene.units.unit_of(ix) {
            Some(u) => self.centers[u] + scene.relative_center(ix),
            None => 0.0,
        }
    }

    /// Left edge of every person, `None` for hidden ones
    pub fn left_edges(&self, scene: &Scene) -> Vec<Option<f32>> {
        scene
            .index
            .indices()
            .map(|ix| {
                let u = scene.units.unit_of(ix)?;
                Some(
                    self.centers[u] - scene.unit_width(u) / 2.0
                        + scene.units.offset(ix, &scene.constants),
                )
            })
            .collect()
    }

    /// Sort the row by centre and push overlapping units to the right, then
    /// shift the row back to its former mean centre
    pub fn settle_row(&mut self, r: usize, scene: &Scene) {
        let Self { rows, centers } = self;
        let units = &mut rows[r].units;
        units.sort_by(|&a, &b| centers[a].total_cmp(&centers[b]));
        if units.len() < 2 {
            return;
        }

        let mean = |centers: &[f32]| {
            units.iter().map(|&u| centers[u]).sum::<f32>() / units.len() as f32
        };
        let before = mean(centers);
        for i in 1..units.len() {
            let (u, v) = (units[i - 1], units[i]);
            let min = centers[u] + scene.separation(u, v);
            if centers[v] < min {
                centers[v] = min;
            }
        }
        let shift = before - mean(centers);
        for &u in units.iter() {
            centers[u] += shift;
        }
    }

    /// Exchange the units at `i` and `i + 1` of row `r`
    ///
    /// The pair keeps its outer edges and the gap between them, so doing it
    /// twice restores the arrangement.
    pub fn swap(&mut self, r: usize, i: usize, scene: &Scene) {
        let units = &mut self.rows[r].units;
        let (a, b) = (units[i], units[i + 1]);
        let left = self.centers[a] - scene.unit_width(a) / 2.0;
        let right = self.centers[b] + scene.unit_width(b) / 2.0;
        self.centers[b] = left + scene.unit_width(b) / 2.0;
        self.centers[a] = right - scene.unit_width(a) / 2.0;
        units.swap(i, i + 1);
    }
}
