//! Coordinate calibration for theme editing.

use anyhow::Result;
use podium::{Point, Size, calibrate, to_display};

pub fn run(x: i64, y: i64, display: Size, native: Size, inverse: bool) -> Result<()> {
    let point = Point::new(x, y);
    let mapped = if inverse {
        to_display(point, display, native)?
    } else {
        calibrate(point, display, native)?
    };
    println!("{} {}", mapped.x, mapped.y);
    Ok(())
}
