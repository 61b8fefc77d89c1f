//! Geometry for scan zones and detected bounding boxes
//!
//! Coordinates are `f64` with a top-left origin. Containment uses closed
//! intervals, so a box touching the zone edge is still inside.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions finite and strictly positive
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Axis-aligned rectangle, origin + size
///
/// Negative sizes are allowed and treated like their standardized form
/// when computing extents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.x.min(self.x + self.width)
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.y.min(self.y + self.height)
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x.max(self.x + self.width)
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y.max(self.y + self.height)
    }

    #[inline]
    pub fn top_left(&self) -> Point {
        Point::new(self.min_x(), self.min_y())
    }

    #[inline]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.max_x(), self.max_y())
    }

    /// Closed-interval point test. NaN coordinates are never contained.
    #[inline]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    /// Full containment: both corners of `other` inside `self`
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.contains_point(other.top_left()) && self.contains_point(other.bottom_right())
    }
}

/// Rectangular region of the preview where a barcode must lie to be accepted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanZone {
    pub center: Point,
    pub size: Size,
}

impl ScanZone {
    #[inline]
    pub const fn new(center: Point, size: Size) -> Self {
        Self { center, size }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.center.x - self.size.width / 2.0,
            self.center.y - self.size.height / 2.0,
            self.size.width,
            self.size.height,
        )
    }

    #[inline]
    pub fn contains(&self, bounding_box: &Rect) -> bool {
        self.rect().contains_rect(bounding_box)
    }
}

/// Where the detector puts the origin of its normalized coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizedOrigin {
    #[default]
    TopLeft,
    BottomLeft,
}

/// Maps detector boxes normalized to `[0,1]` over the captured frame into
/// preview coordinates, with aspect-fill gravity (frame scaled to cover the
/// view, centered, overflow cropped).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewMapping {
    view: Size,
    frame: Option<Size>,
    origin: NormalizedOrigin,
}

impl PreviewMapping {
    pub fn new(view: Size, frame: Option<Size>, origin: NormalizedOrigin) -> Self {
        Self { view, frame, origin }
    }

    /// Displayed frame rect in view coordinates
    fn displayed_frame(&self) -> Rect {
        let Some(frame) = self.frame.filter(Size::is_positive) else {
            return Rect::new(0.0, 0.0, self.view.width, self.view.height);
        };

        let scale = (self.view.width / frame.width).max(self.view.height / frame.height);
        let width = frame.width * scale;
        let height = frame.height * scale;
        Rect::new(
            (self.view.width - width) / 2.0,
            (self.view.height - height) / 2.0,
            width,
            height,
        )
    }

    pub fn to_view(&self, normalized: &Rect) -> Rect {
        let shown = self.displayed_frame();
        let top = match self.origin {
            NormalizedOrigin::TopLeft => normalized.y,
            NormalizedOrigin::BottomLeft => 1.0 - normalized.y - normalized.height,
        };

        Rect::new(
            shown.x + normalized.x * shown.width,
            shown.y + top * shown.height,
            normalized.width * shown.width,
            normalized.height * shown.height,
        )
    }
}
