//! Leaderboard image export.
//!
//! - **Layout**: pagination and absolute field placement, shared by the
//!   editor preview and the renderer
//! - **Assets**: where backgrounds, fonts and logos come from
//! - **Canvas**: compositing a page onto its background
//! - **Export**: parallel page rendering, archives and cancellation

mod assets;
mod canvas;
mod export;
mod layout;

pub use assets::*;
pub use canvas::*;
pub use export::*;
pub use layout::*;
