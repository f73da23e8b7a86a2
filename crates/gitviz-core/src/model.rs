use crossbeam_channel::{Receiver, Sender};
use std::collections::{HashMap, HashSet};

use crate::{Branch, BranchEvent, BranchId, Commit, CommitId, Head, HeadTarget, Scene};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("commit {0} already exists")]
    DuplicateCommit(CommitId),
    #[error("commit {child} names unknown parent {parent}")]
    UnknownParent { child: CommitId, parent: CommitId },
    #[error("commit {0} does not exist")]
    UnknownCommit(CommitId),
    #[error("branch {0} does not exist")]
    UnknownBranch(BranchId),
    #[error("a root commit is already present ({0})")]
    SecondRoot(CommitId),
    #[error("commit {child} designates {main_parent} as main parent, which is not one of its parents")]
    ForeignMainParent {
        child: CommitId,
        main_parent: CommitId,
    },
}

/// What the visuals engine reads from the commit store.
pub trait GraphModel {
    fn commit(&self, id: &CommitId) -> Option<&Commit>;
    fn commits(&self) -> Vec<&Commit>;
    fn branches(&self) -> Vec<&Branch>;
    fn branch(&self, id: &BranchId) -> Option<&Branch>;
    fn head(&self) -> &Head;

    /// commit id -> branches whose history contains the commit.
    fn upstream_branch_set(&self) -> HashMap<CommitId, Vec<BranchId>>;
    /// Commits in the history of HEAD.
    fn upstream_head_set(&self) -> HashSet<CommitId>;

    /// Branch add/remove notifications, delivered in emission order.
    fn subscribe(&mut self) -> Receiver<BranchEvent>;

    fn children(&self, id: &CommitId) -> &[CommitId] {
        self.commit(id).map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    fn head_commit(&self) -> Option<CommitId> {
        match &self.head().target {
            HeadTarget::Detached(id) => Some(id.clone()),
            HeadTarget::Branch(b) => self.branch(b).map(|b| b.target.clone()),
        }
    }
}

/// In-memory commit store, used by the CLI and tests.
#[derive(Debug)]
pub struct MemoryModel {
    commits: HashMap<CommitId, Commit>,
    order: Vec<CommitId>,
    branches: Vec<Branch>,
    head: Head,
    subscribers: Vec<Sender<BranchEvent>>,
}

impl MemoryModel {
    pub fn new(head: Head) -> Self {
        Self {
            commits: HashMap::new(),
            order: Vec::new(),
            branches: Vec::new(),
            head,
            subscribers: Vec::new(),
        }
    }

    pub fn from_scene(scene: Scene) -> Result<Self, ModelError> {
        let mut model = Self::new(scene.head);
        for commit in scene.commits {
            model.add_commit(commit)?;
        }
        for branch in scene.branches {
            model.add_branch(branch)?;
        }
        Ok(model)
    }

    /// Inserts a commit whose parents already exist and appends it to their children.
    pub fn add_commit(&mut self, mut commit: Commit) -> Result<(), ModelError> {
        if self.commits.contains_key(&commit.id) {
            return Err(ModelError::DuplicateCommit(commit.id));
        }
        for parent in &commit.parents {
            if !self.commits.contains_key(parent) {
                return Err(ModelError::UnknownParent {
                    child: commit.id.clone(),
                    parent: parent.clone(),
                });
            }
        }
        if let Some(main) = &commit.main_parent {
            if !commit.parents.contains(main) {
                return Err(ModelError::ForeignMainParent {
                    child: commit.id.clone(),
                    main_parent: main.clone(),
                });
            }
        }
        commit.root = commit.parents.is_empty();
        if commit.root {
            if let Some(existing) = self.commits.values().find(|c| c.root) {
                return Err(ModelError::SecondRoot(existing.id.clone()));
            }
        }
        commit.children.clear();

        for parent in &commit.parents {
            if let Some(p) = self.commits.get_mut(parent) {
                p.children.push(commit.id.clone());
            }
        }
        self.order.push(commit.id.clone());
        self.commits.insert(commit.id.clone(), commit);
        Ok(())
    }

    pub fn add_branch(&mut self, branch: Branch) -> Result<(), ModelError> {
        if !self.commits.contains_key(&branch.target) {
            return Err(ModelError::UnknownCommit(branch.target));
        }
        self.branches.retain(|b| b.id != branch.id);
        self.branches.push(branch.clone());
        self.emit(BranchEvent::Added(branch));
        Ok(())
    }

    pub fn remove_branch(&mut self, id: &BranchId) -> Result<Branch, ModelError> {
        let Some(pos) = self.branches.iter().position(|b| &b.id == id) else {
            return Err(ModelError::UnknownBranch(id.clone()));
        };
        let removed = self.branches.remove(pos);
        self.emit(BranchEvent::Removed(id.clone()));
        Ok(removed)
    }

    /// Moves an existing branch; no event is emitted since the branch set is unchanged.
    pub fn move_branch(&mut self, id: &BranchId, target: CommitId) -> Result<(), ModelError> {
        if !self.commits.contains_key(&target) {
            return Err(ModelError::UnknownCommit(target));
        }
        let Some(branch) = self.branches.iter_mut().find(|b| &b.id == id) else {
            return Err(ModelError::UnknownBranch(id.clone()));
        };
        branch.target = target;
        Ok(())
    }

    pub fn checkout(&mut self, target: HeadTarget) -> Result<(), ModelError> {
        match &target {
            HeadTarget::Branch(b) if self.branch(b).is_none() => {
                return Err(ModelError::UnknownBranch(b.clone()));
            }
            HeadTarget::Detached(c) if !self.commits.contains_key(c) => {
                return Err(ModelError::UnknownCommit(c.clone()));
            }
            _ => {}
        }
        self.head.target = target;
        Ok(())
    }

    fn emit(&mut self, event: BranchEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn ancestors(&self, start: &CommitId) -> HashSet<CommitId> {
        let mut seen = HashSet::new();
        let mut stack = vec![start.clone()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if let Some(c) = self.commits.get(&id) {
                stack.extend(c.parents.iter().cloned());
            }
        }
        seen
    }
}

impl GraphModel for MemoryModel {
    fn commit(&self, id: &CommitId) -> Option<&Commit> {
        self.commits.get(id)
    }

    fn commits(&self) -> Vec<&Commit> {
        self.order
            .iter()
            .filter_map(|id| self.commits.get(id))
            .collect()
    }

    fn branches(&self) -> Vec<&Branch> {
        self.branches.iter().collect()
    }

    fn branch(&self, id: &BranchId) -> Option<&Branch> {
        self.branches.iter().find(|b| &b.id == id)
    }

    fn head(&self) -> &Head {
        &self.head
    }

    fn upstream_branch_set(&self) -> HashMap<CommitId, Vec<BranchId>> {
        let mut out: HashMap<CommitId, Vec<BranchId>> = HashMap::new();
        for branch in &self.branches {
            for id in self.ancestors(&branch.target) {
                out.entry(id).or_default().push(branch.id.clone());
            }
        }
        out
    }

    fn upstream_head_set(&self) -> HashSet<CommitId> {
        self.head_commit()
            .map(|id| self.ancestors(&id))
            .unwrap_or_default()
    }

    fn subscribe(&mut self) -> Receiver<BranchEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryModel {
        let mut m = MemoryModel::new(Head {
            target: HeadTarget::Branch(BranchId::new("main")),
        });
        m.add_commit(Commit::new("c0", &[])).expect("root");
        m.add_commit(Commit::new("c1", &["c0"])).expect("c1");
        m.add_commit(Commit::new("c2", &["c0"])).expect("c2");
        m.add_branch(Branch {
            id: BranchId::new("main"),
            target: CommitId::new("c1"),
            fill: None,
        })
        .expect("main");
        m
    }

    #[test]
    fn children_follow_insertion_order() {
        let m = sample();
        let kids: Vec<&str> = m
            .children(&CommitId::new("c0"))
            .iter()
            .map(|c| c.0.as_str())
            .collect();
        assert_eq!(kids, vec!["c1", "c2"]);
    }

    #[test]
    fn rejects_unknown_parent_and_second_root() {
        let mut m = sample();
        assert!(matches!(
            m.add_commit(Commit::new("x", &["nope"])),
            Err(ModelError::UnknownParent { .. })
        ));
        assert!(matches!(
            m.add_commit(Commit::new("r2", &[])),
            Err(ModelError::SecondRoot(_))
        ));
    }

    #[test]
    fn rejects_main_parent_outside_parents() {
        let mut m = sample();
        let mut stray = Commit::new("x", &["c1"]);
        stray.main_parent = Some(CommitId::new("c0"));
        assert!(matches!(
            m.add_commit(stray),
            Err(ModelError::ForeignMainParent { ref child, ref main_parent })
                if child.0 == "x" && main_parent.0 == "c0"
        ));
        assert!(m.commit(&CommitId::new("x")).is_none());
        assert_eq!(m.children(&CommitId::new("c1")).len(), 0);
    }

    #[test]
    fn upstream_sets_walk_all_parents() {
        let mut m = sample();
        let mut merge = Commit::new("c3", &["c1", "c2"]);
        merge.main_parent = Some(CommitId::new("c1"));
        m.add_commit(merge).expect("merge");
        m.add_branch(Branch {
            id: BranchId::new("topic"),
            target: CommitId::new("c3"),
            fill: None,
        })
        .expect("topic");

        let up = m.upstream_branch_set();
        assert_eq!(up[&CommitId::new("c2")], vec![BranchId::new("topic")]);
        assert_eq!(up[&CommitId::new("c0")].len(), 2);

        let head = m.upstream_head_set();
        assert!(head.contains(&CommitId::new("c1")));
        assert!(!head.contains(&CommitId::new("c2")));
    }

    #[test]
    fn subscribers_see_add_then_remove() {
        let mut m = sample();
        let rx = m.subscribe();
        m.add_branch(Branch {
            id: BranchId::new("topic"),
            target: CommitId::new("c2"),
            fill: None,
        })
        .expect("add");
        m.remove_branch(&BranchId::new("topic")).expect("remove");

        let events: Vec<BranchEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], BranchEvent::Added(b) if b.id.0 == "topic"));
        assert_eq!(events[1], BranchEvent::Removed(BranchId::new("topic")));
    }

    #[test]
    fn detached_head_resolves_to_commit() {
        let mut m = sample();
        m.checkout(HeadTarget::Detached(CommitId::new("c2")))
            .expect("checkout");
        assert_eq!(m.head_commit(), Some(CommitId::new("c2")));
    }
}
