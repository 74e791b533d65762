//! Core abstractions for workspace resolution.
//!
//! - **Traits** - the detector and glob engine the resolver delegates to
//! - **Types** - workspace descriptions and glob options

pub mod traits;
pub mod types;

pub use traits::{GlobEngine, TopologyDetector};
pub use types::{DetectedTopology, GlobOptions, WorkspaceDescription, WorkspaceRoot, WorkspaceTool};
