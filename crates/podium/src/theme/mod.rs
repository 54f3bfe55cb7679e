//! Export themes.
//!
//! A theme is a background template plus the coordinates at which each
//! leaderboard column is drawn:
//!
//! - **Types**: [`Theme`], [`Layout`] and the [`ColumnKey`] set; absent
//!   column keys are hidden, not drawn at offset 0
//! - **Store**: versioned themes per tournament, validated on every write
//! - **Calibration**: display-to-native click mapping shared with the preview

mod calibration;
mod store;
mod types;

pub use calibration::*;
pub use store::*;
pub use types::*;
