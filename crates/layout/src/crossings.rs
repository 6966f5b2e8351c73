use crate::alignment::align_blocks;
use crate::arrangement::Arrangement;
use crate::scene::Scene;
use tracing::{debug, trace};

/// Upper bound of the sweep budget
pub(crate) const MAX_SWEEPS: usize = 30;
/// Sweeps without improvement before giving up
const MAX_STALLED: usize = 3;
/// Rounds of the final swap pass
const MAX_SWAP_ROUNDS: usize = 10;

/// Reduce parent-child crossings of an arrangement
///
/// Alternating median and barycenter sweeps run first, the best arrangement
/// they reach is then aligned in four directions, and a greedy pass swaps
/// neighbouring units while that strictly removes crossings. No step is kept
/// when it adds crossings, so the result never has more crossings than the
/// input.
pub(crate) fn minimize_crossings(initial: &Arrangement, scene: &Scene) -> Arrangement {
    let edges = edge_count(initial, scene);
    let start = count_crossings(initial, scene);

    let mut best = initial.clone();
    let mut best_crossings = start;

    if start > 0 {
        let budget = sweep_budget(start, edges);
        let mut current = initial.clone();
        let mut stalled = 0;

        for iteration in 1..=budget {
            let rule = if iteration % 2 == 1 {
                Rule::Median
            } else {
                Rule::Barycenter
            };
            current = sweep(&current, scene, Sweep::Down, rule);
            current = sweep(&current, scene, Sweep::Up, rule);

            let crossings = count_crossings(&current, scene);
            trace!("Sweep {}/{} ({:?}): {} crossings", iteration, budget, rule, crossings);
            if crossings < best_crossings {
                best = current.clone();
                best_crossings = crossings;
                stalled = 0;
            } else {
                stalled += 1;
            }
            if best_crossings == 0 || stalled >= MAX_STALLED {
                break;
            }
        }
    }

    let aligned = align_blocks(&best, scene);
    let aligned_crossings = count_crossings(&aligned, scene);
    if aligned_crossings <= best_crossings {
        best = aligned;
        best_crossings = aligned_crossings;
    } else {
        debug!(
            "Discarding alignment: {} crossings instead of {}",
            aligned_crossings, best_crossings
        );
    }

    let (best, best_crossings) = swap_neighbours(best, scene, best_crossings);
    debug!(
        "Crossings: {} before, {} after, over {} parent-child edges",
        start, best_crossings, edges
    );
    best
}

/// Number of sweeps, growing with the initial crossing density
pub(crate) fn sweep_budget(crossings: usize, edges: usize) -> usize {
    if edges == 0 {
        return 0;
    }
    // 4 + ceil(20 * crossings / edges)
    (4 + (20 * crossings).div_ceil(edges)).min(MAX_SWEEPS)
}

/// Parent-child edges between adjacent layers, as (upper anchor, child) x pairs
///
/// The upper end of an edge is the midpoint of the visible parents of the
/// child, which is where its family connector leaves the parents.
fn edges_into(arrangement: &Arrangement, scene: &Scene, r: usize) -> Vec<(f32, f32)> {
    let mut edges = Vec::new();
    if r == 0 || r >= arrangement.rows.len() {
        return edges;
    }
    for &u in &arrangement.rows[r].units {
        for &child in scene.units.members(u) {
            let parents = scene.upper(child);
            if parents.is_empty() {
                continue;
            }
            let anchor = parents
                .iter()
                .map(|&p| arrangement.person_center(scene, p))
                .sum::<f32>()
                / parents.len() as f32;
            edges.push((anchor, arrangement.person_center(scene, child)));
        }
    }
    edges
}

fn edge_count(arrangement: &Arrangement, scene: &Scene) -> usize {
    (1..arrangement.rows.len())
        .map(|r| edges_into(arrangement, scene, r).len())
        .sum()
}

/// Crossings between row `r - 1` and row `r`
fn count_between(arrangement: &Arrangement, scene: &Scene, r: usize) -> usize {
    let edges = edges_into(arrangement, scene, r);
    let mut crossings = 0;
    for (i, &(a1, c1)) in edges.iter().enumerate() {
        for &(a2, c2) in &edges[i + 1..] {
            if (a1 < a2 && c1 > c2) || (a1 > a2 && c1 < c2) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Total number of crossing parent-child edges
pub(crate) fn count_crossings(arrangement: &Arrangement, scene: &Scene) -> usize {
    (1..arrangement.rows.len())
        .map(|r| count_between(arrangement, scene, r))
        .sum()
}

/// Crossings on both sides of row `r`
fn count_around(arrangement: &Arrangement, scene: &Scene, r: usize) -> usize {
    count_between(arrangement, scene, r) + count_between(arrangement, scene, r + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Median,
    Barycenter,
}

impl Rule {
    fn apply(self, mut samples: Vec<f32>) -> Option<f32> {
        if samples.is_empty() {
            return None;
        }
        match self {
            Rule::Median => {
                samples.sort_by(f32::total_cmp);
                let mid = samples.len() / 2;
                if samples.len() % 2 == 1 {
                    Some(samples[mid])
                } else {
                    Some((samples[mid - 1] + samples[mid]) / 2.0)
                }
            }
            Rule::Barycenter => Some(samples.iter().sum::<f32>() / samples.len() as f32),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    /// Each row follows the row above it
    Down,
    /// Each row follows the row below it
    Up,
}

/// Move every unit towards its neighbours in the previous row of the sweep,
/// then settle the row
fn sweep(arrangement: &Arrangement, scene: &Scene, direction: Sweep, rule: Rule) -> Arrangement {
    let mut next = arrangement.clone();
    let rows = next.rows.len();
    if rows < 2 {
        return next;
    }

    let order: Vec<usize> = match direction {
        Sweep::Down => (1..rows).collect(),
        Sweep::Up => (0..rows - 1).rev().collect(),
    };

    for r in order {
        let units = next.rows[r].units.clone();
        let keys: Vec<Option<f32>> = units
            .iter()
            .map(|&u| {
                let mut samples = Vec::new();
                for &m in scene.units.members(u) {
                    let neighbours = match direction {
                        Sweep::Down => scene.upper(m),
                        Sweep::Up => scene.lower(m),
                    };
                    for n in neighbours {
                        samples.push(next.person_center(scene, n) - scene.relative_center(m));
                    }
                }
                rule.apply(samples)
            })
            .collect();

        for (&u, key) in units.iter().zip(keys) {
            if let Some(key) = key {
                next.centers[u] = key;
            }
        }
        next.settle_row(r, scene);
    }
    next
}

/// Greedy pass over neighbouring units, keeping a swap only when it strictly
/// reduces the crossings next to the swapped row
fn swap_neighbours(
    mut arrangement: Arrangement,
    scene: &Scene,
    mut crossings: usize,
) -> (Arrangement, usize) {
    for _ in 0..MAX_SWAP_ROUNDS {
        if crossings == 0 {
            break;
        }
        let mut improved = false;

        for r in 0..arrangement.rows.len() {
            for i in 0..arrangement.rows[r].units.len().saturating_sub(1) {
                let before = count_around(&arrangement, scene, r);
                arrangement.swap(r, i, scene);
                let after = count_around(&arrangement, scene, r);

                if after < before {
                    crossings = crossings + after - before;
                    improved = true;
                } else {
                    // Swap back
                    arrangement.swap(r, i, scene);
                }
            }
        }

        if !improved {
            break;
        }
    }
    (arrangement, crossings)
}
