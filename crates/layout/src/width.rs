use crate::cluster::{ClusterIx, Clusters, FamilyCluster};
use crate::index::PersonIx;
use crate::scene::Scene;
use tracing::debug;

/// Horizontal room needed by every subtree
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Widths {
    person: Vec<f32>,
    cluster: Vec<f32>,
}

impl Widths {
    /// Room of the person, its spouses and its visible descendants
    pub fn person(&self, ix: PersonIx) -> f32 {
        self.person[ix.index()]
    }

    pub fn cluster(&self, k: ClusterIx) -> f32 {
        self.cluster[k]
    }

    /// Room of the children of a family laid side by side
    pub fn children_span(&self, children: &[PersonIx], gap: f32) -> f32 {
        let sum: f32 = children.iter().map(|&c| self.person(c)).sum();
        sum + gap * children.len().saturating_sub(1) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done(f32),
}

pub(crate) fn estimate_widths(scene: &Scene, clusters: &Clusters) -> Widths {
    let mut estimator = Estimator {
        scene,
        marks: vec![Mark::Unvisited; scene.index.len()],
    };

    let person: Vec<f32> = scene
        .index
        .indices()
        .map(|ix| {
            if scene.is_visible(ix) {
                estimator.width(ix)
            } else {
                0.0
            }
        })
        .collect();

    let widths = Widths {
        person,
        cluster: Vec::new(),
    };
    let cluster = clusters
        .iter()
        .map(|family| family_width(scene, &widths, family))
        .collect();

    Widths { cluster, ..widths }
}

/// Widest of the parents side by side and their children side by side
fn family_width(scene: &Scene, widths: &Widths, family: &FamilyCluster) -> f32 {
    let gap = scene.constants.sibling_gap;
    let mut parent_units = Vec::with_capacity(2);
    for &p in &family.parents {
        if let Some(u) = scene.units.unit_of(p) {
            if !parent_units.contains(&u) {
                parent_units.push(u);
            }
        }
    }
    let parents: f32 = parent_units.iter().map(|&u| scene.unit_width(u)).sum::<f32>()
        + gap * parent_units.len().saturating_sub(1) as f32;

    parents.max(widths.children_span(&family.children, gap))
}

/// Memoized post-order walk over visible children
///
/// The walk keeps its own stack so that long lineages cannot exhaust the
/// call stack. A person met again while its own subtree is being measured
/// closes a loop through co-parents. The loop is cut there and the person
/// counts for its own box only.
struct Estimator<'s, 'i, 'a> {
    scene: &'s Scene<'i, 'a>,
    marks: Vec<Mark>,
}

/// Person whose subtree is being measured
struct Frame {
    ix: PersonIx,
    children: Vec<PersonIx>,
    next: usize,
    sum: f32,
}

impl Estimator<'_, '_, '_> {
    fn own(&self, ix: PersonIx) -> f32 {
        match self.scene.units.unit_of(ix) {
            Some(u) => self.scene.unit_width(u),
            None => self.scene.constants.node_width,
        }
    }

    /// Width already known, or `None` when the subtree is still to measure
    fn settled(&self, ix: PersonIx) -> Option<f32> {
        match self.marks[ix.index()] {
            Mark::Done(width) => Some(width),
            Mark::InProgress => {
                debug!(
                    "{} is its own descendant, truncating its width",
                    self.scene.index.id(ix)
                );
                Some(self.own(ix))
            }
            Mark::Unvisited => None,
        }
    }

    fn open(&mut self, ix: PersonIx) -> Frame {
        self.marks[ix.index()] = Mark::InProgress;
        let scene = self.scene;
        let children = scene
            .index
            .children(ix)
            .iter()
            .copied()
            .filter(|&c| scene.is_visible(c))
            .collect();
        Frame {
            ix,
            children,
            next: 0,
            sum: 0.0,
        }
    }

    fn close(&mut self, frame: &Frame) -> f32 {
        let own = self.own(frame.ix);
        let width = if frame.children.is_empty() {
            own
        } else {
            let gap = self.scene.constants.sibling_gap * (frame.children.len() - 1) as f32;
            own.max(frame.sum + gap)
        };
        self.marks[frame.ix.index()] = Mark::Done(width);
        width
    }

    fn width(&mut self, root: PersonIx) -> f32 {
        if let Some(width) = self.settled(root) {
            return width;
        }

        let mut stack = vec![self.open(root)];
        while let Some(frame) = stack.last_mut() {
            if let Some(&child) = frame.children.get(frame.next) {
                frame.next += 1;
                match self.settled(child) {
                    Some(width) => frame.sum += width,
                    None => {
                        let next = self.open(child);
                        stack.push(next);
                    }
                }
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let width = self.close(&done);
            match stack.last_mut() {
                Some(parent) => parent.sum += width,
                None => return width,
            }
        }
        self.own(root)
    }
}
