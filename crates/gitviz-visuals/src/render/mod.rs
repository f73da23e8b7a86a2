pub mod recording;

use bevy::math::Vec2;
use serde::Serialize;
use std::time::Duration;

use crate::graph::entity::{EntityAttrs, EntityId};

pub use recording::{CanvasOp, RecordingCanvas};

/// Z-order band used when bringing entities to the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Body,
    Label,
}

/// The paint backend. Interpolations are fire-and-forget; a later call for the
/// same entity supersedes an earlier one.
pub trait Canvas {
    fn create(&mut self, id: &EntityId, attrs: &EntityAttrs);
    fn animate(&mut self, id: &EntityId, from: &EntityAttrs, to: &EntityAttrs, speed: Duration);
    fn raise(&mut self, id: &EntityId, layer: Layer);
    /// Immediate move in screen space, used by explode steps.
    fn place(&mut self, id: &EntityId, position: Vec2);
    fn remove(&mut self, id: &EntityId);
}
