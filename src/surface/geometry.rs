//! Mapping between venue space (meters, origin bottom-left) and screen space
//! (pixels, origin top-left).
//!
//! The hall is drawn with a uniform scale on both axes and centered inside the viewport
//! after removing a margin on every side, so distances measured on screen stay
//! proportional to distances in the venue.

use crate::surface::errors::GeometryError;

/// A point in either venue or screen space; the caller knows which.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the floor-plan viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned screen-space rectangle with non-negative width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    /// Builds the rectangle spanned by two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Edge-inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        (self.left()..=self.right()).contains(&p.x) && (self.top()..=self.bottom()).contains(&p.y)
    }
}

/// Uniform-scale transform between hall meters and viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    hall_width: f64,
    hall_height: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl CoordinateMapper {
    /// Fits a `hall_width` × `hall_height` meter hall into `viewport`.
    ///
    /// The margin is `viewport.width * margin_ratio` on every side. The hall is scaled by
    /// `min(available_width / hall_width, available_height / hall_height)` and centered in
    /// the remaining area.
    ///
    /// # Errors
    ///
    /// - [`GeometryError::InvalidHall`] if a hall dimension is not a positive finite number
    /// - [`GeometryError::DegenerateViewport`] if the margins leave no drawable area
    pub fn new(
        hall_width: f64,
        hall_height: f64,
        viewport: Viewport,
        margin_ratio: f64,
    ) -> Result<Self, GeometryError> {
        if !(hall_width.is_finite() && hall_height.is_finite())
            || hall_width <= 0.0
            || hall_height <= 0.0
        {
            return Err(GeometryError::InvalidHall {
                width: hall_width,
                height: hall_height,
            });
        }

        let margin = viewport.width * margin_ratio;
        let available_width = viewport.width - 2.0 * margin;
        let available_height = viewport.height - 2.0 * margin;

        let scale = (available_width / hall_width).min(available_height / hall_height);
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GeometryError::DegenerateViewport {
                width: viewport.width,
                height: viewport.height,
                margin_ratio,
            });
        }

        Ok(Self {
            hall_width,
            hall_height,
            scale,
            offset_x: margin + (available_width - hall_width * scale) / 2.0,
            offset_y: margin + (available_height - hall_height * scale) / 2.0,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    pub fn hall_size(&self) -> (f64, f64) {
        (self.hall_width, self.hall_height)
    }

    /// Screen-space rectangle covered by the hall outline.
    pub fn hall_rect(&self) -> ScreenRect {
        ScreenRect {
            x: self.offset_x,
            y: self.offset_y,
            width: self.hall_width * self.scale,
            height: self.hall_height * self.scale,
        }
    }

    pub fn hall_to_screen(&self, p: Point) -> Point {
        Point::new(
            self.offset_x + p.x * self.scale,
            self.offset_y + (self.hall_height - p.y) * self.scale,
        )
    }

    pub fn screen_to_hall(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.scale,
            self.hall_height - (p.y - self.offset_y) / self.scale,
        )
    }

    /// Clamps a venue-space point onto the hall rectangle.
    pub fn clamp_to_hall(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(0.0, self.hall_width),
            p.y.clamp(0.0, self.hall_height),
        )
    }
}
