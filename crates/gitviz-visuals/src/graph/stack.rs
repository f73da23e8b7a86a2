use gitviz_core::{Branch, BranchId, CommitId, GraphModel};
use serde::Serialize;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub type BranchStack = SmallVec<[BranchId; 4]>;

/// Branches grouped by the commit they point at, in label stacking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchStackMap {
    stacks: HashMap<CommitId, BranchStack>,
}

impl BranchStackMap {
    pub fn get(&self, commit: &CommitId) -> &[BranchId] {
        self.stacks.get(commit).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn index_of(&self, commit: &CommitId, branch: &BranchId) -> Option<usize> {
        self.get(commit).iter().position(|b| b == branch)
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

/// The primary branch always leads; everything else is lexicographic.
pub fn stack_order(a: &BranchId, b: &BranchId, primary: &str) -> Ordering {
    match (a.0 == primary, b.0 == primary) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.0.cmp(&b.0),
    }
}

pub fn compute_branch_stacks<'a, I>(branches: I, primary: &str) -> BranchStackMap
where
    I: IntoIterator<Item = &'a Branch>,
{
    let mut stacks: HashMap<CommitId, BranchStack> = HashMap::new();
    for branch in branches {
        stacks
            .entry(branch.target.clone())
            .or_default()
            .push(branch.id.clone());
    }
    for stack in stacks.values_mut() {
        stack.sort_by(|a, b| stack_order(a, b, primary));
    }
    BranchStackMap { stacks }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStatus {
    Branch,
    Head,
    None,
}

#[derive(Debug, Clone, Default)]
pub struct UpstreamSets {
    pub branch: HashMap<CommitId, Vec<BranchId>>,
    pub head: HashSet<CommitId>,
}

impl UpstreamSets {
    pub fn from_model<M: GraphModel>(model: &M) -> Self {
        Self {
            branch: model.upstream_branch_set(),
            head: model.upstream_head_set(),
        }
    }

    pub fn status(&self, commit: &CommitId) -> UpstreamStatus {
        if self.branch.contains_key(commit) {
            UpstreamStatus::Branch
        } else if self.head.contains(commit) {
            UpstreamStatus::Head
        } else {
            UpstreamStatus::None
        }
    }

    pub fn branches_for(&self, commit: &CommitId) -> Option<&[BranchId]> {
        self.branch.get(commit).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(id: &str, target: &str) -> Branch {
        Branch {
            id: BranchId::new(id),
            target: CommitId::new(target),
            fill: None,
        }
    }

    fn names(stack: &[BranchId]) -> Vec<&str> {
        stack.iter().map(|b| b.0.as_str()).collect()
    }

    #[test]
    fn primary_leads_then_lexicographic() {
        let branches = vec![
            branch("zeta", "c1"),
            branch("alpha", "c1"),
            branch("main", "c1"),
            branch("beta", "c2"),
        ];
        let map = compute_branch_stacks(&branches, "main");

        assert_eq!(names(map.get(&CommitId::new("c1"))), vec!["main", "alpha", "zeta"]);
        assert_eq!(names(map.get(&CommitId::new("c2"))), vec!["beta"]);
        assert!(map.get(&CommitId::new("c3")).is_empty());
        assert_eq!(
            map.index_of(&CommitId::new("c1"), &BranchId::new("zeta")),
            Some(2)
        );
    }

    #[test]
    fn ordering_ignores_input_order() {
        let forward = vec![branch("b", "c"), branch("a", "c"), branch("main", "c")];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            compute_branch_stacks(&forward, "main"),
            compute_branch_stacks(&reversed, "main")
        );
    }

    #[test]
    fn upstream_status_prefers_branch_over_head() {
        let mut sets = UpstreamSets::default();
        let c1 = CommitId::new("c1");
        let c2 = CommitId::new("c2");
        sets.branch.insert(c1.clone(), vec![BranchId::new("main")]);
        sets.head.insert(c1.clone());
        sets.head.insert(c2.clone());

        assert_eq!(sets.status(&c1), UpstreamStatus::Branch);
        assert_eq!(sets.status(&c2), UpstreamStatus::Head);
        assert_eq!(sets.status(&CommitId::new("c3")), UpstreamStatus::None);
    }
}
