pub mod color;
pub mod debounce;
pub mod deferred;
pub mod entity;
pub mod explode;
pub mod layout;
pub mod snapshot;
pub mod stack;
pub mod state;

pub use color::{blend_hues, Hsb};
pub use deferred::{DeferredAction, DeferredQueue};
pub use entity::{EdgeAttrs, EntityAttrs, EntityId, NodeAttrs, RefAttrs};
pub use explode::{ExplodeStep, NodeExplosion, StepResult};
pub use layout::{compute_tree_layout, Span, TreeLayout};
pub use snapshot::Snapshot;
pub use stack::{compute_branch_stacks, BranchStackMap, UpstreamSets, UpstreamStatus};
pub use state::{BranchObserver, GitVisuals};
