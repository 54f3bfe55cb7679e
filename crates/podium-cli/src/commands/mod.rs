//! CLI command implementations.

pub mod calibrate;
pub mod export;
pub mod score;
pub mod standings;
pub mod theme;
pub mod watch;
