//! Multi-core dispatch.
//!
//! The output columns are split into disjoint ranges and each range is one
//! parallel work item on the engine's rayon pool. Workers share A and W
//! read-only and never write outside their own columns, so the pool's join
//! is the only synchronization.
//!
//! - `partition`: column ranges per worker or per tile
//! - `dispatch`: output-partition and reduction-blocked schedules

pub mod dispatch;
pub mod partition;
