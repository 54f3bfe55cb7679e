//! Score storage and conflict resolution.
//!
//! This module owns every score entry:
//!
//! - **Score store**: per-tournament books of entries, one per (match, team),
//!   with placement uniqueness enforced inside a single write critical section
//! - **Conflict resolver**: the only write path; validates references and
//!   identity, applies explicit overrides, then notifies live subscribers
//! - **Snapshots**: JSON files written atomically so a crash never leaves a
//!   half-written store on disk
//! - **Directory lock**: an exclusive lock file that serializes writers from
//!   separate processes sharing one data directory

mod file;
mod lock;
mod resolver;
mod store;

pub use file::*;
pub use lock::*;
pub use resolver::*;
pub use store::*;
