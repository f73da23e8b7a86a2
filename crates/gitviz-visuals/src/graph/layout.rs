use gitviz_core::{Commit, CommitId, GraphModel};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::graph::stack::{compute_branch_stacks, UpstreamSets, UpstreamStatus};
use crate::graph::state::GitVisuals;
use crate::render::Canvas;

/// Horizontal slice of the normalized [0, 1] span handed to a subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const FULL: Span = Span { min: 0.0, max: 1.0 };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    pub fn center(&self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    pub max_width: HashMap<CommitId, u32>,
    pub depth: HashMap<CommitId, u32>,
    pub spans: HashMap<CommitId, Span>,
    pub max_depth: u32,
}

impl TreeLayout {
    pub fn x(&self, id: &CommitId) -> Option<f32> {
        self.spans.get(id).map(Span::center)
    }
}

/// Runs depth, width and bounds passes from `root`. `flex_scale` multiplies a
/// child's max width when its parent's span is divided.
pub fn compute_tree_layout<M, F>(model: &M, root: &CommitId, flex_scale: F) -> Result<TreeLayout>
where
    M: GraphModel,
    F: Fn(&CommitId) -> f32,
{
    let mut layout = TreeLayout::default();
    layout.max_depth = compute_depth(model, root, 0, &mut layout.depth)?;
    compute_subtree_width(model, root, &mut layout.max_width)?;
    assign_bounds(
        model,
        root,
        Span::FULL,
        &layout.max_width,
        &flex_scale,
        &mut layout.spans,
    )?;
    Ok(layout)
}

pub fn depth_increment(max_depth: u32, min_layers: u32) -> f32 {
    1.0 / max_depth.max(min_layers).max(1) as f32
}

fn lookup<'m, M: GraphModel>(model: &'m M, id: &CommitId) -> Result<&'m Commit> {
    model
        .commit(id)
        .ok_or_else(|| Error::UnknownCommit(id.clone()))
}

/// Whether `child` hangs under `parent` for width purposes.
fn is_layout_child(child: &Commit, parent: &CommitId) -> Result<bool> {
    match &child.main_parent {
        Some(main) if !child.parents.contains(main) => Err(Error::ForeignMainParent {
            commit: child.id.clone(),
            main_parent: main.clone(),
        }),
        None if child.is_merge() => Err(Error::AmbiguousMainParent(child.id.clone())),
        _ => Ok(child.is_main_parent(parent)),
    }
}

/// Pre-order depth assignment. A commit reached along several paths keeps its
/// deepest value; returns the deepest depth seen below `id`.
pub fn compute_depth<M: GraphModel>(
    model: &M,
    id: &CommitId,
    depth: u32,
    depths: &mut HashMap<CommitId, u32>,
) -> Result<u32> {
    let commit = lookup(model, id)?;
    if depths.get(id).is_some_and(|seen| *seen >= depth) {
        return Ok(depth);
    }
    depths.insert(id.clone(), depth);

    let mut max_depth = depth;
    for child in &commit.children {
        max_depth = max_depth.max(compute_depth(model, child, depth + 1, depths)?);
    }
    Ok(max_depth)
}

/// Post-order subtree weight: the sum over main-parent children, never below 1.
pub fn compute_subtree_width<M: GraphModel>(
    model: &M,
    id: &CommitId,
    widths: &mut HashMap<CommitId, u32>,
) -> Result<u32> {
    let commit = lookup(model, id)?;
    let mut children_total = 0;
    for child_id in &commit.children {
        let child = lookup(model, child_id)?;
        if is_layout_child(child, id)? {
            children_total += compute_subtree_width(model, child_id, widths)?;
        }
    }

    let width = children_total.max(1);
    widths.insert(id.clone(), width);
    Ok(width)
}

fn assign_bounds<M, F>(
    model: &M,
    id: &CommitId,
    span: Span,
    widths: &HashMap<CommitId, u32>,
    flex_scale: &F,
    spans: &mut HashMap<CommitId, Span>,
) -> Result<()>
where
    M: GraphModel,
    F: Fn(&CommitId) -> f32,
{
    spans.insert(id.clone(), span);
    let commit = lookup(model, id)?;

    let mut flexes: Vec<(&CommitId, f32)> = Vec::new();
    let mut total_flex = 0.0;
    for child_id in &commit.children {
        let child = lookup(model, child_id)?;
        if !is_layout_child(child, id)? {
            continue;
        }
        let flex = widths.get(child_id).copied().unwrap_or(1) as f32 * flex_scale(child_id);
        total_flex += flex;
        flexes.push((child_id, flex));
    }
    if total_flex <= 0.0 {
        return Ok(());
    }

    let mut prev_bound = span.min;
    for (child_id, flex) in flexes {
        let portion = flex / total_flex * span.width();
        let child_span = Span::new(prev_bound, prev_bound + portion);
        assign_bounds(model, child_id, child_span, widths, flex_scale, spans)?;
        prev_bound = child_span.max;
    }
    Ok(())
}

impl<M: GraphModel, C: Canvas> GitVisuals<M, C> {
    /// Upstream sets, branch stacks, then depth and width over the registered root.
    pub fn calc_tree_coords(&mut self) -> Result<()> {
        let root = self.root.clone().ok_or(Error::NoRootCommit)?;

        let upstream = UpstreamSets::from_model(&self.model);
        self.stacks = Some(compute_branch_stacks(
            self.model.branches(),
            &self.cfg.primary_branch,
        ));

        let scale = self.cfg.flex_scale;
        let layout = compute_tree_layout(&self.model, &root, |id| match upstream.status(id) {
            UpstreamStatus::Branch => scale.branch,
            UpstreamStatus::Head => scale.head,
            UpstreamStatus::None => scale.none,
        });
        self.upstream = Some(upstream);
        let layout = layout?;

        if layout.max_depth > self.cfg.depth_warning_layers {
            tracing::warn!(
                max_depth = layout.max_depth,
                limit = self.cfg.depth_warning_layers,
                "graphics are degrading from too many layers"
            );
        }

        let increment = depth_increment(layout.max_depth, self.cfg.min_depth_layers);
        for (id, node) in self.nodes.iter_mut() {
            if let Some(width) = layout.max_width.get(id) {
                node.max_width = *width;
            }
            if let Some(depth) = layout.depth.get(id) {
                node.depth = *depth;
                node.pos.y = *depth as f32 * increment;
            }
            if let Some(x) = layout.x(id) {
                node.pos.x = x;
            }
        }

        self.last_layout = Some(layout);
        Ok(())
    }
}
