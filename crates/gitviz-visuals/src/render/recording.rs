use bevy::math::Vec2;
use serde::Serialize;
use std::time::Duration;

use crate::graph::entity::{EntityAttrs, EntityId};
use crate::render::{Canvas, Layer};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CanvasOp {
    Create {
        id: EntityId,
        attrs: EntityAttrs,
    },
    Animate {
        id: EntityId,
        from: EntityAttrs,
        to: EntityAttrs,
        speed_ms: u64,
    },
    Raise {
        id: EntityId,
        layer: Layer,
    },
    Place {
        id: EntityId,
        position: Vec2,
    },
    Remove {
        id: EntityId,
    },
}

/// Canvas that only remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<CanvasOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn animations(&self) -> impl Iterator<Item = (&EntityId, &EntityAttrs, &EntityAttrs)> {
        self.ops.iter().filter_map(|op| match op {
            CanvasOp::Animate { id, from, to, .. } => Some((id, from, to)),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&CanvasOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for op in &self.ops {
            out.push_str(&serde_json::to_string(op)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Canvas for RecordingCanvas {
    fn create(&mut self, id: &EntityId, attrs: &EntityAttrs) {
        self.ops.push(CanvasOp::Create {
            id: id.clone(),
            attrs: attrs.clone(),
        });
    }

    fn animate(&mut self, id: &EntityId, from: &EntityAttrs, to: &EntityAttrs, speed: Duration) {
        self.ops.push(CanvasOp::Animate {
            id: id.clone(),
            from: from.clone(),
            to: to.clone(),
            speed_ms: speed.as_millis() as u64,
        });
    }

    fn raise(&mut self, id: &EntityId, layer: Layer) {
        self.ops.push(CanvasOp::Raise {
            id: id.clone(),
            layer,
        });
    }

    fn place(&mut self, id: &EntityId, position: Vec2) {
        self.ops.push(CanvasOp::Place {
            id: id.clone(),
            position,
        });
    }

    fn remove(&mut self, id: &EntityId) {
        self.ops.push(CanvasOp::Remove { id: id.clone() });
    }
}
