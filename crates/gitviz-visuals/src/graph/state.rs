use bevy::math::Vec2;
use crossbeam_channel::Receiver;
use gitviz_core::{
    Branch, BranchEvent, BranchId, Commit, CommitId, GraphModel, HeadTarget, RefId,
};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::graph::color::{blend_hues, Hsb};
use crate::graph::debounce::Debounce;
use crate::graph::deferred::{DeferredAction, DeferredQueue};
use crate::graph::entity::{EdgeAttrs, EntityAttrs, NodeAttrs, RefAttrs, VisEdge, VisNode, VisRef};
use crate::graph::explode::ExplodeSet;
use crate::graph::layout::TreeLayout;
use crate::graph::stack::{BranchStackMap, UpstreamSets, UpstreamStatus};
use crate::render::Canvas;
use crate::util::config::VisualsConfig;

/// Receives branch add/remove notifications from the graph model.
pub trait BranchObserver {
    fn on_branch_added(&mut self, branch: &Branch);
    fn on_branch_removed(&mut self, id: &BranchId);
}

/// Layout and animation state for one visualization.
pub struct GitVisuals<M: GraphModel, C: Canvas> {
    pub(crate) model: M,
    pub(crate) canvas: C,
    pub(crate) cfg: VisualsConfig,
    events: Receiver<BranchEvent>,

    pub(crate) nodes: BTreeMap<CommitId, VisNode>,
    pub(crate) edges: Vec<VisEdge>,
    pub(crate) refs: Vec<VisRef>,
    pub(crate) root: Option<CommitId>,

    pub(crate) stacks: Option<BranchStackMap>,
    pub(crate) upstream: Option<UpstreamSets>,
    pub(crate) last_layout: Option<TreeLayout>,

    pub(crate) deferred: DeferredQueue<DeferredAction>,
    pub(crate) viewport: Option<Vec2>,
    pub(crate) resize: Debounce,
    pub(crate) explode: Option<ExplodeSet>,
    /// Resize refresh held back by an explosion or a missing graph.
    pub(crate) refresh_pending: bool,

    head_fill: Hsb,
    detached_fill: Hsb,
}

impl<M: GraphModel, C: Canvas> GitVisuals<M, C> {
    /// Subscribes to the model and queues refs for HEAD and every existing
    /// branch; they are drawn once the engine becomes render-ready.
    pub fn new(mut model: M, canvas: C, cfg: VisualsConfig) -> Result<Self> {
        let events = model.subscribe();
        let head_fill = Hsb::parse(&cfg.head_fill)?;
        let detached_fill = Hsb::parse(&cfg.detached_fill)?;
        let resize = Debounce::new(cfg.resize_debounce());

        let mut visuals = Self {
            model,
            canvas,
            cfg,
            events,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            refs: Vec::new(),
            root: None,
            stacks: None,
            upstream: None,
            last_layout: None,
            deferred: DeferredQueue::new(),
            viewport: None,
            resize,
            explode: None,
            refresh_pending: false,
            head_fill,
            detached_fill,
        };
        visuals.seed_refs();
        Ok(visuals)
    }

    // ----- Accessors -----
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutations made here reach the engine through `pump_model_events`.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn config(&self) -> &VisualsConfig {
        &self.cfg
    }

    pub fn root(&self) -> Option<&CommitId> {
        self.root.as_ref()
    }

    pub fn node(&self, id: &CommitId) -> Option<&VisNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &VisNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[VisEdge] {
        &self.edges
    }

    pub fn refs(&self) -> &[VisRef] {
        &self.refs
    }

    pub fn branch_stacks(&self) -> Option<&BranchStackMap> {
        self.stacks.as_ref()
    }

    pub fn last_layout(&self) -> Option<&TreeLayout> {
        self.last_layout.as_ref()
    }

    pub fn viewport(&self) -> Option<Vec2> {
        self.viewport
    }

    pub fn pending_actions(&self) -> usize {
        self.deferred.len()
    }

    pub fn is_ready(&self) -> bool {
        self.deferred.is_ready()
    }

    // ----- Model events -----
    /// Dispatches every queued model notification; returns how many were handled.
    pub fn pump_model_events(&mut self) -> usize {
        let events: Vec<BranchEvent> = self.events.try_iter().collect();
        let handled = events.len();
        for event in events {
            match event {
                BranchEvent::Added(branch) => self.on_branch_added(&branch),
                BranchEvent::Removed(id) => self.on_branch_removed(&id),
            }
        }
        handled
    }

    fn submit(&mut self, action: DeferredAction) {
        match self.deferred.submit(action) {
            Some(action) => self.apply_action(action),
            None => tracing::debug!(pending = self.deferred.len(), "deferred ref action"),
        }
    }

    /// Queues a ref for HEAD and every model branch that has neither a ref
    /// nor a pending add.
    fn seed_refs(&mut self) {
        let ids: Vec<RefId> = std::iter::once(RefId::Head)
            .chain(
                self.model
                    .branches()
                    .iter()
                    .map(|b| RefId::Branch(b.id.clone())),
            )
            .collect();
        for id in ids {
            if self.refs.iter().any(|r| r.id == id) {
                continue;
            }
            let action = DeferredAction::AddRef(id);
            if self.deferred.contains(&action) {
                continue;
            }
            self.submit(action);
        }
    }

    fn apply_action(&mut self, action: DeferredAction) {
        match action {
            DeferredAction::AddRef(id) => self.add_ref(id),
            DeferredAction::RemoveRef(id) => self.remove_ref(&id),
        }
    }

    fn add_ref(&mut self, id: RefId) {
        if self.refs.iter().any(|r| r.id == id) {
            return;
        }
        self.refs.push(VisRef { id, drawn: None });
        if self.is_ready() {
            let idx = self.refs.len() - 1;
            self.try_draw_ref(idx);
        }
    }

    fn remove_ref(&mut self, id: &RefId) {
        let Some(pos) = self.refs.iter().position(|r| &r.id == id) else {
            return;
        };
        let vis = self.refs.remove(pos);
        if vis.drawn.is_some() {
            self.canvas.remove(&vis.entity_id());
        }
    }

    // ----- Readiness -----
    /// Replays deferred actions in arrival order, then lays out and draws
    /// everything that is not on the canvas yet.
    pub fn enter_render_ready_state(&mut self) -> Result<()> {
        let drained = self.deferred.enter_ready();
        tracing::debug!(actions = drained.len(), "flushing deferred actions");
        for action in drained {
            self.apply_action(action);
        }

        if self.root.is_none() {
            return Ok(());
        }
        self.full_calc()?;
        self.gen_graphics_all()?;
        self.z_index_reflow();
        Ok(())
    }

    pub fn exit_render_ready_state(&mut self) {
        self.deferred.exit_ready();
    }

    // ----- Registry -----
    pub fn register_commit(&mut self, commit: &Commit) {
        if self.nodes.contains_key(&commit.id) {
            tracing::debug!(commit = %commit.id, "commit already registered");
            return;
        }
        if commit.root {
            self.root = Some(commit.id.clone());
        }
        // new commits grow out of their parent
        let start = commit
            .main_parent()
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.pos)
            .unwrap_or(Vec2::new(0.5, 0.0));
        self.nodes
            .insert(commit.id.clone(), VisNode::new(commit.id.clone(), start));

        if self.is_ready() {
            self.try_draw_node(&commit.id);
        }
    }

    /// Links child `tail` to parent `head`; both must already be registered.
    pub fn register_edge(&mut self, tail: &CommitId, head: &CommitId) -> Result<()> {
        if !self.nodes.contains_key(tail) || !self.nodes.contains_key(head) {
            return Err(Error::MissingEndpoint {
                tail: tail.clone(),
                head: head.clone(),
            });
        }
        if self.edges.iter().any(|e| &e.tail == tail && &e.head == head) {
            return Ok(());
        }
        self.edges.push(VisEdge {
            tail: tail.clone(),
            head: head.clone(),
            drawn: None,
        });
        if self.is_ready() {
            let idx = self.edges.len() - 1;
            self.try_draw_edge(idx);
        }
        Ok(())
    }

    /// Drops the node and every edge touching it.
    pub fn remove_commit(&mut self, id: &CommitId) {
        let (gone, kept): (Vec<VisEdge>, Vec<VisEdge>) =
            std::mem::take(&mut self.edges)
                .into_iter()
                .partition(|e| e.touches(id));
        self.edges = kept;
        for edge in gone {
            if edge.drawn.is_some() {
                self.canvas.remove(&edge.entity_id());
            }
        }

        if let Some(node) = self.nodes.remove(id) {
            if node.drawn.is_some() {
                self.canvas.remove(&node.entity_id());
            }
        }
        if self.root.as_ref() == Some(id) {
            self.root = None;
        }
    }

    /// Registers every model commit, parent link and ref the engine does not
    /// know yet.
    pub fn sync_from_model(&mut self) -> Result<()> {
        let commits: Vec<Commit> = self.model.commits().into_iter().cloned().collect();
        for commit in &commits {
            self.register_commit(commit);
        }
        for commit in &commits {
            for parent in &commit.parents {
                self.register_edge(&commit.id, parent)?;
            }
        }
        self.seed_refs();
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for edge in self.edges.drain(..) {
            if edge.drawn.is_some() {
                self.canvas.remove(&edge.entity_id());
            }
        }
        for vis in self.refs.drain(..) {
            if vis.drawn.is_some() {
                self.canvas.remove(&vis.entity_id());
            }
        }
        for node in std::mem::take(&mut self.nodes).into_values() {
            if node.drawn.is_some() {
                self.canvas.remove(&node.entity_id());
            }
        }
        self.root = None;
        self.stacks = None;
        self.upstream = None;
        self.last_layout = None;
        self.explode = None;
    }

    // ----- Refresh -----
    /// Layout pass; graphics attributes are derived from it on demand.
    pub fn full_calc(&mut self) -> Result<()> {
        self.calc_tree_coords()
    }

    /// Eased relayout; ignored until the engine is render-ready.
    pub fn refresh(&mut self, speed: Duration) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        self.full_calc()?;
        self.animate_all(speed)
    }

    pub fn refresh_immediate(&mut self) -> Result<()> {
        self.full_calc()?;
        self.animate_all(Duration::ZERO)
    }

    // ----- Resize / ticks -----
    pub fn on_canvas_resize(&mut self, width: f32, height: f32) {
        self.viewport = Some(Vec2::new(width, height));
        self.resize.trigger();
    }

    /// Advances the resize debounce and any explosion by `dt`. A resize
    /// refresh that cannot run yet stays pending until the explosion is over
    /// and a ready graph with a root exists again.
    pub fn tick(&mut self, dt: Duration) -> Result<()> {
        if self.resize.tick(dt) {
            self.refresh_pending = true;
        }
        self.tick_explode(dt);

        let can_refresh = self.explode.is_none() && self.root.is_some() && self.is_ready();
        if self.refresh_pending && can_refresh {
            self.refresh_pending = false;
            self.refresh(self.cfg.default_speed())?;
        }
        Ok(())
    }

    // ----- Screen mapping -----
    pub fn to_screen_coords(&self, pos: Vec2) -> Result<Vec2> {
        let size = self.viewport.ok_or(Error::ViewportUnknown)?;
        let pad = self.cfg.screen_padding();
        let shrink = |frac: f32, total: f32| pad + frac * (total - pad * 2.0);
        Ok(Vec2::new(shrink(pos.x, size.x), shrink(pos.y, size.y)))
    }

    // ----- Upstream / colors -----
    pub fn commit_upstream_status(&self, id: &CommitId) -> Result<UpstreamStatus> {
        let sets = self.upstream.as_ref().ok_or(Error::UpstreamNotComputed)?;
        Ok(sets.status(id))
    }

    /// Branches pointing at `id`, in label order. Empty before the first pass.
    pub fn branch_stack(&self, id: &CommitId) -> &[BranchId] {
        self.stacks.as_ref().map(|s| s.get(id)).unwrap_or(&[])
    }

    pub fn blended_color_for_commit(&self, id: &CommitId) -> Result<Hsb> {
        let sets = self.upstream.as_ref().ok_or(Error::UpstreamNotComputed)?;
        let branches = sets
            .branches_for(id)
            .ok_or_else(|| Error::NoUpstreamBranches(id.clone()))?;
        let colors = branches
            .iter()
            .map(|b| self.branch_fill(b))
            .collect::<Result<Vec<_>>>()?;
        blend_hues(&colors).ok_or_else(|| Error::NoUpstreamBranches(id.clone()))
    }

    pub fn branch_fill(&self, id: &BranchId) -> Result<Hsb> {
        match self.model.branch(id).and_then(|b| b.fill.as_deref()) {
            Some(fill) => Hsb::parse(fill),
            None => Ok(Hsb::fallback_for(&id.0)),
        }
    }

    fn node_fill(&self, id: &CommitId) -> Result<Hsb> {
        match self.commit_upstream_status(id)? {
            UpstreamStatus::Branch => self.blended_color_for_commit(id),
            UpstreamStatus::Head => Ok(self.head_fill),
            UpstreamStatus::None => Ok(self.detached_fill),
        }
    }

    // ----- Graphics attributes -----
    pub(crate) fn node_attrs(&self, node: &VisNode) -> Result<NodeAttrs> {
        Ok(NodeAttrs {
            center: self.to_screen_coords(node.pos)?,
            radius: self.cfg.node_radius,
            fill: self.node_fill(&node.id)?,
            opacity: 1.0,
        })
    }

    pub(crate) fn edge_attrs(&self, edge: &VisEdge) -> Result<EdgeAttrs> {
        let missing = || Error::MissingEndpoint {
            tail: edge.tail.clone(),
            head: edge.head.clone(),
        };
        let tail = self.nodes.get(&edge.tail).ok_or_else(missing)?;
        let head = self.nodes.get(&edge.head).ok_or_else(missing)?;

        let start = self.to_screen_coords(tail.pos)?;
        let end = self.to_screen_coords(head.pos)?;
        let bend = Vec2::new(0.0, (end.y - start.y) * self.cfg.edge_curve);
        Ok(EdgeAttrs {
            path: [start, start + bend, end - bend, end],
            stroke: self.node_fill(&tail.id)?,
            stroke_width: (self.cfg.node_radius / 6.0).max(1.0),
            opacity: 1.0,
        })
    }

    pub(crate) fn ref_attrs(&self, vis: &VisRef) -> Result<RefAttrs> {
        let stacks = self.stacks.as_ref().ok_or(Error::UpstreamNotComputed)?;
        let head = &self.model.head().target;

        let (target, label, fill) = match &vis.id {
            RefId::Head => (self.model.head_commit(), "HEAD".to_string(), self.head_fill),
            RefId::Branch(b) => {
                let mut label = b.0.clone();
                if matches!(head, HeadTarget::Branch(h) if h == b) {
                    label.push('*');
                }
                let target = self.model.branch(b).map(|br| br.target.clone());
                (target, label, self.branch_fill(b)?)
            }
        };

        let placed = target.as_ref().and_then(|t| self.nodes.get(t));
        let Some(node) = placed else {
            // pointer at a commit we are not showing
            return Ok(RefAttrs {
                label,
                anchor: self.to_screen_coords(Vec2::splat(0.5))?,
                fill,
                stack_index: 0,
                opacity: 0.0,
            });
        };

        let stack_index = match &vis.id {
            RefId::Head => stacks.get(&node.id).len(),
            RefId::Branch(b) => stacks.index_of(&node.id, b).unwrap_or(0),
        };
        let center = self.to_screen_coords(node.pos)?;
        let anchor = center
            + Vec2::new(
                self.cfg.node_radius * 1.5,
                stack_index as f32 * self.cfg.label_spacing,
            );
        Ok(RefAttrs {
            label,
            anchor,
            fill,
            stack_index,
            opacity: 1.0,
        })
    }

    // Single-entity drawing while ready. Missing layout or viewport leaves the
    // entity undrawn; the next refresh creates it.
    fn try_draw_node(&mut self, id: &CommitId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match self.node_attrs(node) {
            Ok(attrs) => {
                let entity = node.entity_id();
                self.canvas
                    .create(&entity, &EntityAttrs::Node(attrs.clone()));
                if let Some(node) = self.nodes.get_mut(id) {
                    node.drawn = Some(attrs);
                }
            }
            Err(err) => tracing::debug!(commit = %id, %err, "node graphics postponed"),
        }
    }

    fn try_draw_edge(&mut self, idx: usize) {
        match self.edge_attrs(&self.edges[idx]) {
            Ok(attrs) => {
                let entity = self.edges[idx].entity_id();
                self.canvas
                    .create(&entity, &EntityAttrs::Edge(attrs.clone()));
                self.edges[idx].drawn = Some(attrs);
            }
            Err(err) => tracing::debug!(%err, "edge graphics postponed"),
        }
    }

    fn try_draw_ref(&mut self, idx: usize) {
        match self.ref_attrs(&self.refs[idx]) {
            Ok(attrs) => {
                let entity = self.refs[idx].entity_id();
                self.canvas
                    .create(&entity, &EntityAttrs::Ref(attrs.clone()));
                self.refs[idx].drawn = Some(attrs);
            }
            Err(err) => tracing::debug!(%err, "ref graphics postponed"),
        }
    }
}

impl<M: GraphModel, C: Canvas> BranchObserver for GitVisuals<M, C> {
    fn on_branch_added(&mut self, branch: &Branch) {
        self.submit(DeferredAction::AddRef(RefId::Branch(branch.id.clone())));
    }

    fn on_branch_removed(&mut self, id: &BranchId) {
        self.submit(DeferredAction::RemoveRef(RefId::Branch(id.clone())));
    }
}
