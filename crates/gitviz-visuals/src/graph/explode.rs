use bevy::math::Vec2;
use bevy::time::{Timer, TimerMode};
use gitviz_core::{CommitId, GraphModel};
use std::f32::consts::PI;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::graph::entity::EntityId;
use crate::graph::state::GitVisuals;
use crate::render::Canvas;
use crate::util::ids::stable_unit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    pub position: Vec2,
    pub done: bool,
}

/// One entity's incremental displacement, advanced once per explode tick.
pub trait ExplodeStep {
    fn step(&mut self) -> StepResult;
}

impl<F> ExplodeStep for F
where
    F: FnMut() -> StepResult,
{
    fn step(&mut self) -> StepResult {
        self()
    }
}

const LAUNCH_SPEED: f32 = 20.0;
const GRAVITY: f32 = 0.2;
const DRAG: f32 = 0.01;
const ELASTICITY: f32 = 0.8;
const MAX_STEPS: u32 = 4_000;

/// Ballistic flight inside the canvas: launched upward, bounces off the walls
/// and settles on the floor.
#[derive(Debug, Clone)]
pub struct NodeExplosion {
    pos: Vec2,
    vel: Vec2,
    bounds: Vec2,
    steps: u32,
}

impl NodeExplosion {
    /// `spread` in [0, 1) picks the launch angle across the upper half-plane.
    pub fn new(start: Vec2, bounds: Vec2, spread: f32) -> Self {
        let angle = PI + spread * PI;
        Self {
            pos: start,
            vel: Vec2::new(angle.cos(), angle.sin()) * LAUNCH_SPEED,
            bounds,
            steps: 0,
        }
    }
}

impl ExplodeStep for NodeExplosion {
    fn step(&mut self) -> StepResult {
        self.steps += 1;
        self.vel.y += GRAVITY - DRAG * self.vel.y;
        self.vel.x -= DRAG * self.vel.x;
        self.pos += self.vel;

        if self.pos.x < 0.0 || self.pos.x > self.bounds.x {
            self.vel.x = -ELASTICITY * self.vel.x;
            self.pos.x = self.pos.x.clamp(0.0, self.bounds.x);
        }
        if self.pos.y < 0.0 || self.pos.y > self.bounds.y {
            self.vel.y = -ELASTICITY * self.vel.y;
            self.pos.y = self.pos.y.clamp(0.0, self.bounds.y);
        }

        let resting = self.vel.length_squared() < 0.01 && self.pos.y == self.bounds.y;
        StepResult {
            position: self.pos,
            done: resting || self.steps >= MAX_STEPS,
        }
    }
}

/// Active step tasks plus the repeating timer that paces them.
pub struct ExplodeSet {
    tasks: Vec<(EntityId, Box<dyn ExplodeStep>)>,
    timer: Timer,
}

impl std::fmt::Debug for ExplodeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplodeSet")
            .field("tasks", &self.tasks.len())
            .field("timer", &self.timer)
            .finish()
    }
}

impl ExplodeSet {
    pub fn new(tick: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            timer: Timer::new(tick, TimerMode::Repeating),
        }
    }

    pub fn push(&mut self, id: EntityId, task: Box<dyn ExplodeStep>) {
        self.tasks.push((id, task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs one step of every live task; finished tasks are dropped.
    pub fn step_all<C: Canvas>(&mut self, canvas: &mut C) {
        self.tasks.retain_mut(|(id, task)| {
            let result = task.step();
            canvas.place(id, result.position);
            !result.done
        });
    }

    /// Advances the timer by `dt`, stepping once per elapsed tick. True once
    /// no task is left.
    pub fn advance<C: Canvas>(&mut self, dt: Duration, canvas: &mut C) -> bool {
        self.timer.tick(dt);
        for _ in 0..self.timer.times_finished_this_tick() {
            if self.tasks.is_empty() {
                break;
            }
            self.step_all(canvas);
        }
        self.tasks.is_empty()
    }
}

impl<M: GraphModel, C: Canvas> GitVisuals<M, C> {
    pub fn is_exploding(&self) -> bool {
        self.explode.is_some()
    }

    /// Starts the explode-then-clear teardown with the built-in physics.
    pub fn explode_nodes(&mut self) -> Result<()> {
        let bounds = self.viewport.ok_or(Error::ViewportUnknown)?;
        self.explode_nodes_with(|id, start| {
            Box::new(NodeExplosion::new(start, bounds, stable_unit(&id.0)))
        })
    }

    /// Starts the teardown with caller-supplied step tasks, one per drawn node.
    /// No-op while a run is already in flight.
    pub fn explode_nodes_with<F>(&mut self, mut factory: F) -> Result<()>
    where
        F: FnMut(&CommitId, Vec2) -> Box<dyn ExplodeStep>,
    {
        if self.explode.is_some() {
            tracing::debug!("explosion already in flight");
            return Ok(());
        }
        let mut set = ExplodeSet::new(self.cfg.explode_tick());
        for node in self.nodes.values() {
            let Some(drawn) = &node.drawn else {
                continue;
            };
            set.push(node.entity_id(), factory(&node.id, drawn.center));
        }
        tracing::debug!(tasks = set.len(), "explosion started");
        self.explode = Some(set);
        Ok(())
    }

    /// Steps the explosion; when the last task settles the graph is torn down.
    pub(crate) fn tick_explode(&mut self, dt: Duration) -> bool {
        let Some(set) = self.explode.as_mut() else {
            return false;
        };
        if !set.advance(dt, &mut self.canvas) {
            return false;
        }

        tracing::debug!("explosion settled, clearing graph");
        self.reset_all();
        true
    }
}
