//! # Voxlead Dispatch
//!
//! The delayed follow-up dispatch job: find due, unsent lead records,
//! send one follow-up email per record, stamp each confirmed send.
//!
//! One invocation is one bounded, stateless run — no in-memory state
//! survives between runs. Per-record failure isolation is the key
//! contract: partial failure is normal for this job, never fatal.

pub mod job;

pub use job::{DispatchJob, RunPhase, spawn_dispatch_loop};
