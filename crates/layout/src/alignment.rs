use crate::arrangement::Arrangement;
use crate::scene::Scene;
use crate::units::UnitIx;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vertical {
    /// Align with parents, top row first
    Up,
    /// Align with children, bottom row first
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Horizontal {
    Left,
    Right,
}

/// Four-direction block alignment in the manner of Brandes and Köpf
///
/// For each combination of vertical and horizontal direction, units are
/// chained with a median neighbour into blocks, the blocks are compacted
/// against each other, and the four results are aligned on the narrowest one.
/// Every unit then takes the average of its two middle coordinates. The order
/// of every row is kept and so are the minimum distances between units.
pub(crate) fn align_blocks(arrangement: &Arrangement, scene: &Scene) -> Arrangement {
    let n = arrangement.centers.len();
    if n == 0 {
        return arrangement.clone();
    }

    let upper = unit_neighbours(arrangement, scene, Vertical::Up);
    let lower = unit_neighbours(arrangement, scene, Vertical::Down);

    let mut xss: Vec<(Horizontal, Vec<f32>)> = Vec::with_capacity(4);
    for vertical in [Vertical::Up, Vertical::Down] {
        for horizontal in [Horizontal::Left, Horizontal::Right] {
            let mut rows: Vec<Vec<UnitIx>> = arrangement
                .rows
                .iter()
                .map(|row| row.units.clone())
                .collect();
            if vertical == Vertical::Down {
                rows.reverse();
            }
            if horizontal == Horizontal::Right {
                for row in &mut rows {
                    row.reverse();
                }
            }

            let neighbours = match vertical {
                Vertical::Up => &upper,
                Vertical::Down => &lower,
            };
            let root = vertical_alignment(&rows, neighbours, n);
            let Some(mut xs) = horizontal_compaction(&rows, &root, scene) else {
                debug!("Block graph has a cycle, keeping the current coordinates");
                return arrangement.clone();
            };
            if horizontal == Horizontal::Right {
                for x in &mut xs {
                    *x = -*x;
                }
            }
            xss.push((horizontal, xs));
        }
    }

    let Some(smallest) = smallest_width(&xss, scene) else {
        return arrangement.clone();
    };
    let (lo, hi) = extent(&xss[smallest].1);
    for (horizontal, xs) in &mut xss {
        let (xs_lo, xs_hi) = extent(xs);
        let delta = match horizontal {
            Horizontal::Left => lo - xs_lo,
            Horizontal::Right => hi - xs_hi,
        };
        for x in xs.iter_mut() {
            *x += delta;
        }
    }

    let centers = (0..n)
        .map(|u| {
            let mut values: Vec<f32> = xss.iter().map(|(_, xs)| xs[u]).collect();
            values.sort_by(f32::total_cmp);
            (values[1] + values[2]) / 2.0
        })
        .collect();

    Arrangement {
        rows: arrangement.rows.clone(),
        centers,
    }
}

/// Units of the adjacent row holding a parent (`Up`) or a child (`Down`) of
/// one of the members
fn unit_neighbours(arrangement: &Arrangement, scene: &Scene, vertical: Vertical) -> Vec<Vec<UnitIx>> {
    let mut neighbours = vec![Vec::new(); arrangement.centers.len()];
    for (u, found) in neighbours.iter_mut().enumerate() {
        for &m in scene.units.members(u) {
            let relatives = match vertical {
                Vertical::Up => scene.upper(m),
                Vertical::Down => scene.lower(m),
            };
            for v in relatives.into_iter().filter_map(|r| scene.units.unit_of(r)) {
                if !found.contains(&v) {
                    found.push(v);
                }
            }
        }
    }
    neighbours
}

/// Chain every unit with one of its median neighbours in the previous row,
/// returns the root of the block of every unit
fn vertical_alignment(rows: &[Vec<UnitIx>], neighbours: &[Vec<UnitIx>], n: usize) -> Vec<UnitIx> {
    let mut root: Vec<UnitIx> = (0..n).collect();
    let mut align: Vec<UnitIx> = (0..n).collect();
    let mut pos = vec![0; n];
    for row in rows {
        for (i, &u) in row.iter().enumerate() {
            pos[u] = i;
        }
    }

    for row in rows {
        let mut last: Option<usize> = None;
        for &v in row {
            let mut ws = neighbours[v].clone();
            if ws.is_empty() {
                continue;
            }
            ws.sort_by_key(|&w| pos[w]);

            let (i0, i1) = ((ws.len() - 1) / 2, ws.len() / 2);
            for &w in &ws[i0..=i1] {
                if align[v] == v && last.map_or(true, |l| l < pos[w]) {
                    align[w] = v;
                    root[v] = root[w];
                    align[v] = root[v];
                    last = Some(pos[w]);
                }
            }
        }
    }
    root
}

/// Pack the blocks as far left as their separations allow, then pull each
/// block right towards its successors
fn horizontal_compaction(rows: &[Vec<UnitIx>], root: &[UnitIx], scene: &Scene) -> Option<Vec<f32>> {
    let mut blocks: DiGraphMap<UnitIx, f32> = DiGraphMap::new();
    for row in rows {
        let mut prev: Option<UnitIx> = None;
        for &v in row {
            blocks.add_node(root[v]);
            if let Some(u) = prev {
                let (ru, rv) = (root[u], root[v]);
                if ru != rv {
                    let sep = scene.separation(u, v);
                    let weight = blocks.edge_weight(ru, rv).map_or(sep, |&w| w.max(sep));
                    blocks.add_edge(ru, rv, weight);
                }
            }
            prev = Some(v);
        }
    }

    let order = toposort(&blocks, None).ok()?;
    let mut xs = vec![0.0f32; root.len()];

    for &b in &order {
        xs[b] = blocks
            .neighbors_directed(b, Direction::Incoming)
            .filter_map(|a| Some(xs[a] + *blocks.edge_weight(a, b)?))
            .fold(0.0, f32::max);
    }
    for &b in order.iter().rev() {
        let pull = blocks
            .neighbors_directed(b, Direction::Outgoing)
            .filter_map(|c| Some(xs[c] - *blocks.edge_weight(b, c)?))
            .reduce(f32::min);
        if let Some(pull) = pull {
            xs[b] = xs[b].max(pull);
        }
    }

    Some(root.iter().map(|&r| xs[r]).collect())
}

/// Index of the alignment with the narrowest total width, the first one on ties
fn smallest_width(xss: &[(Horizontal, Vec<f32>)], scene: &Scene) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, (_, xs)) in xss.iter().enumerate() {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for (u, &x) in xs.iter().enumerate() {
            let half = scene.unit_width(u) / 2.0;
            lo = lo.min(x - half);
            hi = hi.max(x + half);
        }
        let width = hi - lo;
        if best.map_or(true, |(_, w)| width < w) {
            best = Some((i, width));
        }
    }
    best.map(|(i, _)| i)
}

fn extent(xs: &[f32]) -> (f32, f32) {
    xs.iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        })
}
