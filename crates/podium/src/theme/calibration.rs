//! Mapping between editor display coordinates and template pixels.
//!
//! The editor shows the background scaled to fit the screen. Clicks are
//! converted to native template pixels before they are stored in a layout,
//! and stored coordinates are converted back for the live preview.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn ensure_visible(&self, what: &str) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Validation(format!(
                "{} size must be non-zero, got {}x{}",
                what, self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Round half away from zero.
fn scale(value: i64, to: u32, from: u32) -> i64 {
    (value as f64 * to as f64 / from as f64).round() as i64
}

/// Map a click on the displayed image to native template pixels.
pub fn calibrate(click: Point, displayed: Size, native: Size) -> Result<Point> {
    displayed.ensure_visible("display")?;
    Ok(Point {
        x: scale(click.x, native.width, displayed.width),
        y: scale(click.y, native.height, displayed.height),
    })
}

/// Map native template pixels to the displayed image.
pub fn to_display(point: Point, displayed: Size, native: Size) -> Result<Point> {
    native.ensure_visible("template")?;
    Ok(Point {
        x: scale(point.x, displayed.width, native.width),
        y: scale(point.y, displayed.height, native.height),
    })
}
