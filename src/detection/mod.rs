//! Detection records emitted each tick.

use nalgebra::Matrix3;

pub mod nms;

/// Axis-aligned box in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl BoundingBox {
    /// Returns the box area.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection-over-union against another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);

        let inter = (x1 - x0).max(0.0) * (y1 - y0).max(0.0);
        inter / (self.area() + other.area() - inter + 1e-6)
    }
}

/// Detection geometry: a box from correlation matching, or a projected
/// quadrilateral from homography validation.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box.
    Box(BoundingBox),
    /// Four ordered corners in frame space.
    Quad([[f32; 2]; 4]),
}

impl Geometry {
    /// Returns the tight axis-aligned bounds of the geometry.
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Geometry::Box(b) => *b,
            Geometry::Quad(quad) => {
                let mut min_x = f32::INFINITY;
                let mut min_y = f32::INFINITY;
                let mut max_x = f32::NEG_INFINITY;
                let mut max_y = f32::NEG_INFINITY;
                for p in quad {
                    min_x = min_x.min(p[0]);
                    min_y = min_y.min(p[1]);
                    max_x = max_x.max(p[0]);
                    max_y = max_y.max(p[1]);
                }
                BoundingBox {
                    x: min_x,
                    y: min_y,
                    width: max_x - min_x,
                    height: max_y - min_y,
                }
            }
        }
    }
}

/// How a detection was produced.
#[derive(Clone, Debug)]
pub enum Provenance {
    /// Index into the configured correlation scale list.
    Scale(usize),
    /// Estimated template-to-frame homography.
    Homography(Matrix3<f64>),
}

/// One confidence-scored, localized template detection.
#[derive(Clone, Debug)]
pub struct Detection {
    /// Name of the matched template.
    pub template: String,
    /// Match confidence in [0, 1], monotone in the underlying statistic.
    pub confidence: f32,
    /// Location of the match in frame coordinates.
    pub geometry: Geometry,
    /// The scale or homography that produced this detection.
    pub provenance: Provenance,
}
