//! Points aggregation.
//!
//! - **Scoring table**: organiser-defined placement/kill points, parsed once
//!   into typed keys and validated (malformed or overlapping ranges rejected)
//! - **Ranking**: pure aggregation of score entries into ordered standings

mod ranking;
mod table;

pub use ranking::*;
pub use table::*;
