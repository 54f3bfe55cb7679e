//! Live standings notifications.
//!
//! Subscribers receive a bare "standings changed" signal per tournament and
//! re-pull the leaderboard themselves; events never carry standings data.
//! Publishing is fire-and-forget: a send that reaches nobody is logged and
//! dropped, and a lagging subscriber is told to re-pull rather than replay.

mod publisher;

pub use publisher::*;
