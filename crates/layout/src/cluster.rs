use crate::index::{PersonIx, RelationshipIndex};
use crate::scene::Scene;
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) type ClusterIx = usize;

/// Canonical parent set of a family, the smaller index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum ParentKey {
    Single(PersonIx),
    Couple(PersonIx, PersonIx),
}

impl ParentKey {
    fn new(parent: PersonIx, other: Option<PersonIx>) -> Self {
        match other {
            Some(other) => ParentKey::Couple(parent.min(other), parent.max(other)),
            None => ParentKey::Single(parent),
        }
    }

    pub fn parents(self) -> Vec<PersonIx> {
        match self {
            ParentKey::Single(p) => vec![p],
            ParentKey::Couple(a, b) => vec![a, b],
        }
    }
}

/// One or two parents with the visible children they share
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FamilyCluster {
    pub key: ParentKey,
    pub parents: Vec<PersonIx>,
    pub children: Vec<PersonIx>,
    pub layer: i32,
    /// Families founded by the children, as links of the cluster forest
    pub child_clusters: Vec<ClusterIx>,
}

impl FamilyCluster {
    /// Stable identifier made of the parent ids, e.g. `family:a+b`
    pub fn id(&self, index: &RelationshipIndex) -> String {
        let ids: Vec<&str> = self.parents.iter().map(|&p| index.id(p).as_str()).collect();
        format!("family:{}", ids.join("+"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clusters {
    clusters: Vec<FamilyCluster>,
    roots: Vec<ClusterIx>,
}

impl Clusters {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn get(&self, k: ClusterIx) -> &FamilyCluster {
        &self.clusters[k]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FamilyCluster> {
        self.clusters.iter()
    }

    /// Clusters the placement starts from, left to right
    pub fn roots(&self) -> &[ClusterIx] {
        &self.roots
    }
}

/// Group visible children by their pair of visible parents and link the
/// resulting families into a forest
///
/// Parents are visited by layer, top first, then in arena order, and the first
/// family claiming a child keeps it. When nothing has visible children, a
/// childless family made of the focus alone anchors the placement.
pub(crate) fn build_clusters(scene: &Scene, focus: Option<PersonIx>) -> Clusters {
    let index = scene.index;
    let mut parents_in_order: Vec<PersonIx> = index
        .indices()
        .filter(|&ix| scene.is_visible(ix))
        .collect();
    parents_in_order.sort_by_key(|&ix| (scene.layer(ix), ix));

    let mut by_key: BTreeMap<ParentKey, ClusterIx> = BTreeMap::new();
    let mut clusters: Vec<FamilyCluster> = Vec::new();
    let mut claimed = vec![false; index.len()];

    for &parent in &parents_in_order {
        for &child in index.children(parent) {
            if !scene.is_visible(child) || claimed[child.index()] {
                continue;
            }
            claimed[child.index()] = true;

            let other = index
                .parents(child)
                .iter()
                .copied()
                .find(|&p| p != parent && scene.is_visible(p));
            let key = ParentKey::new(parent, other);
            let k = *by_key.entry(key).or_insert_with(|| {
                clusters.push(FamilyCluster {
                    key,
                    parents: key.parents(),
                    children: Vec::new(),
                    layer: scene.layer(parent),
                    child_clusters: Vec::new(),
                });
                clusters.len() - 1
            });
            clusters[k].children.push(child);
        }
    }

    if clusters.is_empty() {
        if let Some(focus) = focus.filter(|&f| scene.is_visible(f)) {
            debug!("No family with visible children, anchoring on the focus");
            clusters.push(FamilyCluster {
                key: ParentKey::Single(focus),
                parents: vec![focus],
                children: Vec::new(),
                layer: scene.layer(focus),
                child_clusters: Vec::new(),
            });
        }
    }

    let links = link_families(index, &clusters);
    let (forest, roots) = Forest::grow(&clusters, &links);
    for (cluster, child_clusters) in clusters.iter_mut().zip(forest) {
        cluster.child_clusters = child_clusters;
    }

    debug!("Built {} families, {} roots", clusters.len(), roots.len());
    Clusters { clusters, roots }
}

/// For every family, the families where one of its children is a parent
fn link_families(index: &RelationshipIndex, clusters: &[FamilyCluster]) -> Vec<Vec<ClusterIx>> {
    let mut families_of = vec![Vec::new(); index.len()];
    for (k, cluster) in clusters.iter().enumerate() {
        for &p in &cluster.parents {
            families_of[p.index()].push(k);
        }
    }

    clusters
        .iter()
        .enumerate()
        .map(|(k, cluster)| {
            let mut links: Vec<ClusterIx> = Vec::new();
            for &child in &cluster.children {
                for &family in &families_of[child.index()] {
                    if family != k && !links.contains(&family) {
                        links.push(family);
                    }
                }
            }
            links
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first growth of the cluster forest
///
/// Each family hangs under the first family that reaches it. A link back to a
/// family still being grown closes a cycle and is dropped.
struct Forest<'c> {
    links: &'c [Vec<ClusterIx>],
    marks: Vec<Mark>,
    children: Vec<Vec<ClusterIx>>,
}

impl<'c> Forest<'c> {
    fn grow(
        clusters: &[FamilyCluster],
        links: &'c [Vec<ClusterIx>],
    ) -> (Vec<Vec<ClusterIx>>, Vec<ClusterIx>) {
        let mut incoming = vec![0usize; clusters.len()];
        for &k in links.iter().flatten() {
            incoming[k] += 1;
        }

        let mut forest = Forest {
            links,
            marks: vec![Mark::Unvisited; clusters.len()],
            children: vec![Vec::new(); clusters.len()],
        };

        let mut roots: Vec<ClusterIx> = (0..clusters.len()).filter(|&k| incoming[k] == 0).collect();
        for &root in &roots {
            forest.attach(root);
        }

        // Families only reachable through a cycle
        let mut stranded: Vec<ClusterIx> = (0..clusters.len())
            .filter(|&k| forest.marks[k] == Mark::Unvisited)
            .collect();
        stranded.sort_by_key(|&k| (clusters[k].layer, k));
        for k in stranded {
            if forest.marks[k] == Mark::Unvisited {
                debug!("Promoting family {} to a root", k);
                roots.push(k);
                forest.attach(k);
            }
        }

        (forest.children, roots)
    }

    /// Pre-order walk from `root`, with an explicit stack of (family, next link)
    fn attach(&mut self, root: ClusterIx) {
        let links = self.links;
        self.marks[root] = Mark::InProgress;
        let mut stack = vec![(root, 0usize)];

        while let Some(top) = stack.last_mut() {
            let k = top.0;
            let Some(&next) = links[k].get(top.1) else {
                self.marks[k] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;

            match self.marks[next] {
                Mark::Unvisited => {
                    self.children[k].push(next);
                    self.marks[next] = Mark::InProgress;
                    stack.push((next, 0));
                }
                Mark::InProgress => debug!("Family {} closes a cycle, dropping its link", next),
                Mark::Done => {}
            }
        }
    }
}
