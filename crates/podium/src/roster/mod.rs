//! Tournament, team and match records owned by outside collaborators.
//!
//! The engine never creates or edits these records. It only looks them up
//! through the [`Directory`] trait to validate score references, list a
//! tournament's teams and fetch its scoring table. [`Roster`] is an
//! in-memory directory loadable from JSON, used by the CLI and tests.
//!
//! Acting identity travels with every mutating call as a [`RequestContext`].

mod context;
mod directory;

pub use context::*;
pub use directory::*;
