use serde::{Deserialize, Serialize};
use std::fmt;

pub mod model;

pub use model::{GraphModel, MemoryModel, ModelError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl BranchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a visual ref: a named branch or the HEAD pseudo-branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "type", content = "id")]
pub enum RefId {
    Head,
    Branch(BranchId),
}

impl fmt::Display for RefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("HEAD"),
            Self::Branch(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Commit {
    pub id: CommitId,
    #[serde(default)]
    pub parents: Vec<CommitId>,
    /// Required when `parents` has more than one entry.
    #[serde(default)]
    pub main_parent: Option<CommitId>,
    #[serde(default)]
    pub root: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CommitId>,
}

impl Commit {
    pub fn new(id: impl Into<String>, parents: &[&str]) -> Self {
        Self {
            id: CommitId::new(id),
            parents: parents.iter().map(|p| CommitId::new(*p)).collect(),
            main_parent: None,
            root: parents.is_empty(),
            children: Vec::new(),
        }
    }

    /// The parent whose subtree this commit belongs to for layout purposes.
    /// `None` for the root, and for merges that carry no designation.
    pub fn main_parent(&self) -> Option<&CommitId> {
        match (&self.main_parent, self.parents.as_slice()) {
            (Some(main), _) => Some(main),
            (None, [only]) => Some(only),
            _ => None,
        }
    }

    pub fn is_main_parent(&self, parent: &CommitId) -> bool {
        self.main_parent() == Some(parent)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    pub id: BranchId,
    pub target: CommitId,
    /// `hsb(h,s,b)` or `#rrggbb`; a stable hue is derived from the id when absent.
    #[serde(default)]
    pub fill: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "id")]
pub enum HeadTarget {
    Branch(BranchId),
    Detached(CommitId),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Head {
    pub target: HeadTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BranchEvent {
    Added(Branch),
    Removed(BranchId),
}

/// Serialized form of a whole graph, commits listed parents-first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scene {
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    pub head: Head,
}

impl Scene {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}
