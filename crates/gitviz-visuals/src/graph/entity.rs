use bevy::math::Vec2;
use gitviz_core::{CommitId, RefId};
use serde::Serialize;
use std::fmt;

use crate::graph::color::Hsb;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    Node(CommitId),
    Edge { tail: CommitId, head: CommitId },
    Ref(RefId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "{id}"),
            Self::Edge { tail, head } => write!(f, "e{tail}{head}"),
            Self::Ref(id) => write!(f, "ref:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeAttrs {
    pub center: Vec2,
    pub radius: f32,
    pub fill: Hsb,
    pub opacity: f32,
}

/// Cubic path: start, two control points, end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeAttrs {
    pub path: [Vec2; 4],
    pub stroke: Hsb,
    pub stroke_width: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefAttrs {
    pub label: String,
    pub anchor: Vec2,
    pub fill: Hsb,
    pub stack_index: usize,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityAttrs {
    Node(NodeAttrs),
    Edge(EdgeAttrs),
    Ref(RefAttrs),
}

#[derive(Debug, Clone)]
pub struct VisNode {
    pub id: CommitId,
    /// Normalized layout position in [0, 1] x [0, 1].
    pub pos: Vec2,
    pub max_width: u32,
    pub depth: u32,
    pub drawn: Option<NodeAttrs>,
}

impl VisNode {
    pub fn new(id: CommitId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            max_width: 1,
            depth: 0,
            drawn: None,
        }
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::Node(self.id.clone())
    }
}

/// Parent link drawn from the child (`tail`) to the parent (`head`).
#[derive(Debug, Clone)]
pub struct VisEdge {
    pub tail: CommitId,
    pub head: CommitId,
    pub drawn: Option<EdgeAttrs>,
}

impl VisEdge {
    pub fn entity_id(&self) -> EntityId {
        EntityId::Edge {
            tail: self.tail.clone(),
            head: self.head.clone(),
        }
    }

    pub fn touches(&self, id: &CommitId) -> bool {
        &self.tail == id || &self.head == id
    }
}

#[derive(Debug, Clone)]
pub struct VisRef {
    pub id: RefId,
    pub drawn: Option<RefAttrs>,
}

impl VisRef {
    pub fn entity_id(&self) -> EntityId {
        EntityId::Ref(self.id.clone())
    }
}
