use crate::{Point, Rect, Vec2};
use derive_more::Display;
use lineage_data::PersonId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placement and descriptors of one person
///
/// Every person of the tree gets a node, hidden ones included. Hidden nodes
/// sit at x = 0 on the band of their layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: PersonId,
    /// Top-left corner
    pub position: Point,
    pub layer: i32,
    pub parent_ids: Vec<PersonId>,
    pub children_ids: Vec<PersonId>,
    pub spouse_ids: Vec<PersonId>,
    pub width: f32,
    pub height: f32,
    pub is_visible: bool,
    /// At least one recorded child is hidden
    pub is_collapsed: bool,
    pub descendant_count: usize,
    /// The focus, one of its ancestors or one of its descendants
    pub is_focus_lineage: bool,
}

impl TreeNode {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, Vec2::new(self.width, self.height))
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }
}

/// Junction of the connector shared by the children of one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyNode {
    pub id: String,
    pub parent_ids: Vec<PersonId>,
    /// Visible children, left to right
    pub children_ids: Vec<PersonId>,
    /// Below the midpoint of the parents, halfway to the children band
    pub position: Point,
    /// Layer of the parents
    pub layer: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionKind {
    #[display("parent-child")]
    ParentChild,
    #[display("spouse")]
    Spouse,
    /// Two persons sharing a child without a recorded marriage, drawn dashed
    #[display("co-parent")]
    CoParent,
}

/// Connector to draw between two persons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConnection {
    pub kind: ConnectionKind,
    /// Parent, or left partner
    pub from: PersonId,
    /// Child, or right partner
    pub to: PersonId,
    /// Family the connector belongs to, if any
    pub family_id: Option<String>,
    /// Polyline from `from` to `to`
    pub points: Vec<Point>,
}

/// Result of one layout call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeLayout {
    pub focus_id: PersonId,
    pub nodes: BTreeMap<PersonId, TreeNode>,
    pub families: BTreeMap<String, FamilyNode>,
    pub connections: Vec<TreeConnection>,
    /// Visible persons of every layer, left to right
    pub layers: BTreeMap<i32, Vec<PersonId>>,
    /// Visible content grown by the padding
    pub bounds: Rect,
}

impl TreeLayout {
    pub fn node(&self, id: &PersonId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values().filter(|node| node.is_visible)
    }

    pub fn connections_of(&self, kind: ConnectionKind) -> impl Iterator<Item = &TreeConnection> {
        self.connections.iter().filter(move |c| c.kind == kind)
    }
}
