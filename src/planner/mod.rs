//! Motion planner.
//!
//! Converts targets into [`Block`]s, queues them in a fixed-capacity ring
//! shared with the step interrupt, and keeps every queued block's entry speed
//! consistent with its neighbours.

mod block;
mod engine;
mod leveling;
mod lookahead;
mod queue;

pub use block::Block;
pub use engine::Planner;
pub use leveling::{BedMesh, MAX_MESH_POINTS};
pub use lookahead::recalculate;
pub use queue::{BlockQueue, Consumer, CriticalSection, Producer, QueuedBlock};

#[cfg(feature = "std")]
pub use queue::StdCriticalSection;
