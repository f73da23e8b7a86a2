use gitviz_core::CommitId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no root commit has been registered")]
    NoRootCommit,
    #[error("upstream sets are not computed yet; run a layout pass first")]
    UpstreamNotComputed,
    #[error("commit {0} has no upstream branches to blend")]
    NoUpstreamBranches(CommitId),
    #[error("canvas has not reported its dimensions yet")]
    ViewportUnknown,
    #[error("edge ({tail}, {head}) names a node that does not exist")]
    MissingEndpoint { tail: CommitId, head: CommitId },
    #[error("commit {0} is not known to the graph model")]
    UnknownCommit(CommitId),
    #[error("merge commit {0} has several parents but no designated main parent")]
    AmbiguousMainParent(CommitId),
    #[error("commit {commit} designates {main_parent} as main parent, which is not one of its parents")]
    ForeignMainParent {
        commit: CommitId,
        main_parent: CommitId,
    },
    #[error("unrecognized color {0:?}")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, Error>;
