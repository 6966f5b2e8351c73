use crate::index::PersonIx;
use crate::scene::Scene;
use std::collections::BTreeMap;
use tracing::debug;

/// Pitches wider than this many sibling pitches are collapsed
const SLACK_FACTOR: f32 = 3.0;

/// Visible persons of every layer sorted by left edge
fn rows(scene: &Scene, xs: &[Option<f32>]) -> Vec<Vec<PersonIx>> {
    let mut by_layer: BTreeMap<i32, Vec<PersonIx>> = BTreeMap::new();
    for ix in scene.index.indices() {
        if xs[ix.index()].is_some() {
            by_layer.entry(scene.layer(ix)).or_default().push(ix);
        }
    }
    by_layer
        .into_values()
        .map(|mut row| {
            row.sort_by(|&a, &b| {
                let (xa, xb) = (xs[a.index()].unwrap_or(0.0), xs[b.index()].unwrap_or(0.0));
                xa.total_cmp(&xb).then(a.cmp(&b))
            });
            row
        })
        .collect()
}

/// Smallest left edge to left edge distance between neighbours
fn min_pitch(scene: &Scene, a: PersonIx, b: PersonIx) -> f32 {
    let same_unit = scene.units.unit_of(a) == scene.units.unit_of(b);
    if same_unit && scene.index.are_spouses(a, b) {
        scene.constants.spouse_pitch()
    } else {
        scene.constants.sibling_pitch()
    }
}

/// Push every person too close to its left neighbour to the right, along with
/// everything on its right
pub(crate) fn resolve_collisions(scene: &Scene, xs: &[Option<f32>]) -> Vec<Option<f32>> {
    let mut next = xs.to_vec();
    let mut pushed = 0;

    for row in rows(scene, xs) {
        let mut shift = 0.0;
        for i in 1..row.len() {
            let (prev, cur) = (row[i - 1], row[i]);
            let (Some(left), Some(x)) = (next[prev.index()], next[cur.index()]) else {
                continue;
            };
            let mut x = x + shift;
            let min = left + min_pitch(scene, prev, cur);
            if x < min {
                shift += min - x;
                x = min;
                pushed += 1;
            }
            next[cur.index()] = Some(x);
        }
    }

    if pushed > 0 {
        debug!("Resolved {} collisions", pushed);
    }
    next
}

/// Collapse excessive gaps between neighbours down to the sibling pitch,
/// shifting everything on their right along
pub(crate) fn compact(scene: &Scene, xs: &[Option<f32>]) -> Vec<Option<f32>> {
    let mut next = xs.to_vec();
    let limit = SLACK_FACTOR * scene.constants.sibling_pitch();
    let mut collapsed = 0;

    for row in rows(scene, xs) {
        let mut shift = 0.0;
        for i in 1..row.len() {
            let (prev, cur) = (row[i - 1], row[i]);
            let (Some(left), Some(x)) = (next[prev.index()], next[cur.index()]) else {
                continue;
            };
            let mut x = x - shift;
            if x - left > limit {
                let target = left + min_pitch(scene, prev, cur);
                shift += x - target;
                x = target;
                collapsed += 1;
            }
            next[cur.index()] = Some(x);
        }
    }

    if collapsed > 0 {
        debug!("Collapsed {} wide gaps", collapsed);
    }
    next
}
