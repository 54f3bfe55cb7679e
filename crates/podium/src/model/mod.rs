//! Core records shared across the engine.
//!
//! - **Identifiers**: typed ids for tournaments, matches, teams, themes and users
//! - **Score entries**: one per (match, team), owned by the score store
//! - **Standings**: derived rows produced by the ranking engine, never persisted

mod ids;
mod score;
mod standing;

pub use ids::*;
pub use score::*;
pub use standing::*;
