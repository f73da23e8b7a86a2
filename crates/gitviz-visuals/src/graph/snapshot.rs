use gitviz_core::GraphModel;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;
use crate::graph::entity::{EntityAttrs, EntityId};
use crate::graph::state::GitVisuals;
use crate::render::{Canvas, Layer};

/// Attribute sets of every live entity at one moment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    attrs: HashMap<EntityId, EntityAttrs>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId, attrs: EntityAttrs) {
        self.attrs.insert(id, attrs);
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityAttrs> {
        self.attrs.get(id)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl<M: GraphModel, C: Canvas> GitVisuals<M, C> {
    /// Every registered entity id: edges, nodes, then refs.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.edges
            .iter()
            .map(|e| e.entity_id())
            .chain(self.nodes.values().map(|n| n.entity_id()))
            .chain(self.refs.iter().map(|r| r.entity_id()))
            .collect()
    }

    /// Layout pass, then capture.
    pub fn take_snapshot(&mut self) -> Result<Snapshot> {
        self.full_calc()?;
        self.capture_snapshot()
    }

    /// Attributes derived from the current layout, without recomputing it.
    pub fn capture_snapshot(&self) -> Result<Snapshot> {
        let mut snap = Snapshot::new();
        for edge in &self.edges {
            snap.insert(edge.entity_id(), EntityAttrs::Edge(self.edge_attrs(edge)?));
        }
        for node in self.nodes.values() {
            snap.insert(node.entity_id(), EntityAttrs::Node(self.node_attrs(node)?));
        }
        for vis in &self.refs {
            snap.insert(vis.entity_id(), EntityAttrs::Ref(self.ref_attrs(vis)?));
        }
        Ok(snap)
    }

    /// Interpolates every live entity present in both snapshots and not
    /// omitted. Returns how many animations were issued.
    pub fn animate_between_snapshots(
        &mut self,
        before: &Snapshot,
        after: &Snapshot,
        ids_to_omit: &[EntityId],
        speed: Duration,
    ) -> usize {
        let mut issued = 0;
        for id in self.entity_ids() {
            if ids_to_omit.contains(&id) {
                continue;
            }
            let (Some(from), Some(to)) = (before.get(&id), after.get(&id)) else {
                continue;
            };
            self.canvas.animate(&id, from, to, speed);
            self.store_drawn(&id, to.clone());
            issued += 1;
        }
        issued
    }

    /// Eases every entity to its freshly computed attributes; undrawn ones
    /// are created in place.
    pub fn animate_all(&mut self, speed: Duration) -> Result<()> {
        self.z_index_reflow();

        let snap = self.capture_snapshot()?;
        for id in self.entity_ids() {
            let Some(to) = snap.get(&id) else {
                continue;
            };
            match self.drawn_attrs(&id) {
                Some(from) => self.canvas.animate(&id, &from, to, speed),
                None => self.canvas.create(&id, to),
            }
            self.set_drawn(&id, to.clone());
        }
        Ok(())
    }

    /// Creates graphics for every entity not yet on the canvas.
    pub fn gen_graphics_all(&mut self) -> Result<()> {
        let snap = self.capture_snapshot()?;
        for id in self.entity_ids() {
            if self.drawn_attrs(&id).is_some() {
                continue;
            }
            let Some(attrs) = snap.get(&id) else {
                continue;
            };
            self.canvas.create(&id, attrs);
            self.set_drawn(&id, attrs.clone());
        }
        Ok(())
    }

    /// Nodes to the front, then ref bodies, then ref labels above everything.
    pub fn z_index_reflow(&mut self) {
        for node in self.nodes.values() {
            if node.drawn.is_some() {
                self.canvas.raise(&node.entity_id(), Layer::Body);
            }
        }
        for vis in &self.refs {
            if vis.drawn.is_some() {
                self.canvas.raise(&vis.entity_id(), Layer::Body);
            }
        }
        for vis in &self.refs {
            if vis.drawn.is_some() {
                self.canvas.raise(&vis.entity_id(), Layer::Label);
            }
        }
    }

    fn drawn_attrs(&self, id: &EntityId) -> Option<EntityAttrs> {
        match id {
            EntityId::Node(c) => self
                .nodes
                .get(c)
                .and_then(|n| n.drawn.clone())
                .map(EntityAttrs::Node),
            EntityId::Edge { tail, head } => self
                .edges
                .iter()
                .find(|e| &e.tail == tail && &e.head == head)
                .and_then(|e| e.drawn.clone())
                .map(EntityAttrs::Edge),
            EntityId::Ref(r) => self
                .refs
                .iter()
                .find(|v| &v.id == r)
                .and_then(|v| v.drawn.clone())
                .map(EntityAttrs::Ref),
        }
    }

    // only entities already on the canvas track the new attributes
    fn store_drawn(&mut self, id: &EntityId, attrs: EntityAttrs) {
        if self.drawn_attrs(id).is_some() {
            self.set_drawn(id, attrs);
        }
    }

    fn set_drawn(&mut self, id: &EntityId, attrs: EntityAttrs) {
        match (id, attrs) {
            (EntityId::Node(c), EntityAttrs::Node(a)) => {
                if let Some(node) = self.nodes.get_mut(c) {
                    node.drawn = Some(a);
                }
            }
            (EntityId::Edge { tail, head }, EntityAttrs::Edge(a)) => {
                if let Some(edge) = self
                    .edges
                    .iter_mut()
                    .find(|e| &e.tail == tail && &e.head == head)
                {
                    edge.drawn = Some(a);
                }
            }
            (EntityId::Ref(r), EntityAttrs::Ref(a)) => {
                if let Some(vis) = self.refs.iter_mut().find(|v| &v.id == r) {
                    vis.drawn = Some(a);
                }
            }
            (id, _) => tracing::debug!(%id, "attribute kind does not match entity"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::color::Hsb;
    use crate::graph::entity::NodeAttrs;
    use crate::render::{CanvasOp, RecordingCanvas};
    use crate::util::config::VisualsConfig;
    use bevy::math::Vec2;
    use gitviz_core::{Branch, BranchId, Commit, CommitId, Head, HeadTarget, MemoryModel};

    fn node_at(x: f32) -> EntityAttrs {
        EntityAttrs::Node(NodeAttrs {
            center: Vec2::new(x, 0.0),
            radius: 1.0,
            fill: Hsb::new(0.0, 0.0, 1.0),
            opacity: 1.0,
        })
    }

    fn engine() -> GitVisuals<MemoryModel, RecordingCanvas> {
        let mut model = MemoryModel::new(Head {
            target: HeadTarget::Branch(BranchId::new("main")),
        });
        model.add_commit(Commit::new("c1", &[])).expect("c1");
        model.add_commit(Commit::new("c2", &["c1"])).expect("c2");
        model
            .add_branch(Branch {
                id: BranchId::new("main"),
                target: CommitId::new("c2"),
                fill: None,
            })
            .expect("main");
        let mut vis = GitVisuals::new(model, RecordingCanvas::new(), VisualsConfig::default())
            .expect("engine");
        vis.sync_from_model().expect("sync");
        vis
    }

    #[test]
    fn only_entities_in_both_snapshots_animate() {
        let mut vis = engine();
        let c1 = EntityId::Node(CommitId::new("c1"));
        let c2 = EntityId::Node(CommitId::new("c2"));

        let mut before = Snapshot::new();
        before.insert(c1.clone(), node_at(0.2));
        let mut after = Snapshot::new();
        after.insert(c1.clone(), node_at(0.8));
        after.insert(c2, node_at(0.1));

        let issued = vis.animate_between_snapshots(&before, &after, &[], Duration::from_millis(300));
        assert_eq!(issued, 1);

        let anims: Vec<_> = vis.canvas().animations().collect();
        assert_eq!(anims.len(), 1);
        assert_eq!(anims[0].0, &c1);
        assert_eq!(anims[0].1, &node_at(0.2));
        assert_eq!(anims[0].2, &node_at(0.8));
    }

    #[test]
    fn omitted_ids_are_skipped() {
        let mut vis = engine();
        let c1 = EntityId::Node(CommitId::new("c1"));
        let mut snap = Snapshot::new();
        snap.insert(c1.clone(), node_at(0.5));

        let issued = vis.animate_between_snapshots(&snap, &snap, &[c1], Duration::ZERO);
        assert_eq!(issued, 0);
        assert!(vis.canvas().ops().is_empty());
    }

    #[test]
    fn unregistered_ids_are_ignored() {
        let mut vis = engine();
        let ghost = EntityId::Node(CommitId::new("ghost"));
        let mut snap = Snapshot::new();
        snap.insert(ghost, node_at(0.5));

        assert_eq!(vis.animate_between_snapshots(&snap, &snap, &[], Duration::ZERO), 0);
    }

    #[test]
    fn snapshot_covers_every_entity() {
        let mut vis = engine();
        vis.on_canvas_resize(800.0, 600.0);
        vis.enter_render_ready_state().expect("ready");

        let snap = vis.take_snapshot().expect("snapshot");
        // two nodes, one edge, HEAD and main
        assert_eq!(snap.len(), 5);
        assert!(snap
            .get(&EntityId::Edge {
                tail: CommitId::new("c2"),
                head: CommitId::new("c1"),
            })
            .is_some());
    }

    #[test]
    fn snapshot_needs_a_viewport() {
        let mut vis = engine();
        assert!(vis.take_snapshot().is_err());
    }

    #[test]
    fn animate_all_creates_then_interpolates() {
        let mut vis = engine();
        vis.on_canvas_resize(800.0, 600.0);
        vis.enter_render_ready_state().expect("ready");
        let created = vis.canvas().count(|op| matches!(op, CanvasOp::Create { .. }));
        assert_eq!(created, 5);

        vis.canvas_mut().take_ops();
        vis.refresh(Duration::from_millis(600)).expect("refresh");
        assert_eq!(vis.canvas().animations().count(), 5);
        assert_eq!(vis.canvas().count(|op| matches!(op, CanvasOp::Create { .. })), 0);
    }

    #[test]
    fn reflow_puts_ref_labels_last() {
        let mut vis = engine();
        vis.on_canvas_resize(800.0, 600.0);
        vis.enter_render_ready_state().expect("ready");
        vis.canvas_mut().take_ops();

        vis.z_index_reflow();
        let layers: Vec<Layer> = vis
            .canvas()
            .ops()
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Raise { layer, .. } => Some(*layer),
                _ => None,
            })
            .collect();
        // two nodes, two ref bodies, two ref labels
        assert_eq!(layers.len(), 6);
        assert!(layers[4..].iter().all(|l| *l == Layer::Label));
    }
}
