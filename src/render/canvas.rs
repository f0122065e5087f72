use super::RenderFrame;
use ndarray::{Array3, Axis};

/// An RGB colour.
pub type Rgb = [u8; 3];

pub const WHITE: Rgb = [255, 255, 255];
pub const BLACK: Rgb = [0, 0, 0];

/// An RGB pixel canvas with a y-up coordinate system.
///
/// The point `(x, y)` lies in pixel column `floor(x)` and
/// pixel row `height - 1 - floor(y)`, so `y = 0` is the bottom row of the image.
/// Shapes are rasterized by testing pixel centres.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pixels: Array3<u8>,
}

impl Canvas {
    /// Create a canvas filled with a background colour.
    pub fn new(width: usize, height: usize, background: Rgb) -> Self {
        let mut pixels = Array3::zeros((height, width, 3));
        for (channel, value) in background.iter().enumerate() {
            pixels.index_axis_mut(Axis(2), channel).fill(*value);
        }
        Self { pixels }
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    /// Colour of the pixel containing `(x, y)`, if on the canvas.
    pub fn get(&self, x: f64, y: f64) -> Option<Rgb> {
        let (row, col) = self.pixel_index(x, y)?;
        Some([
            self.pixels[(row, col, 0)],
            self.pixels[(row, col, 1)],
            self.pixels[(row, col, 2)],
        ])
    }

    /// Set the pixel containing `(x, y)`. Points off the canvas are ignored.
    pub fn set(&mut self, x: f64, y: f64, color: Rgb) {
        if let Some((row, col)) = self.pixel_index(x, y) {
            for (channel, value) in color.iter().enumerate() {
                self.pixels[(row, col, channel)] = *value;
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn pixel_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (x, y) = (x.floor(), y.floor());
        if x < 0.0 || y < 0.0 || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let (col, y) = (x as usize, y as usize);
        if col >= self.width() || y >= self.height() {
            return None;
        }
        Some((self.height() - 1 - y, col))
    }

    /// Fill the interior of a polygon (even-odd rule).
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: Rgb) {
        if points.len() < 3 {
            return;
        }
        let (min_x, max_x, min_y, max_y) = bounds(points);
        let col_start = min_x.floor().max(0.0) as usize;
        let col_end = (max_x.ceil().max(0.0) as usize).min(self.width());
        let y_start = min_y.floor().max(0.0) as usize;
        let y_end = (max_y.ceil().max(0.0) as usize).min(self.height());
        for y in y_start..y_end {
            let cy = y as f64 + 0.5;
            for col in col_start..col_end {
                let cx = col as f64 + 0.5;
                if polygon_contains(points, cx, cy) {
                    self.set(cx, cy, color);
                }
            }
        }
    }

    /// Fill a circle.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fill_circle(&mut self, center: (f64, f64), radius: f64, color: Rgb) {
        let (x0, y0) = center;
        let col_start = (x0 - radius).floor().max(0.0) as usize;
        let col_end = ((x0 + radius).ceil().max(0.0) as usize).min(self.width());
        let y_start = (y0 - radius).floor().max(0.0) as usize;
        let y_end = ((y0 + radius).ceil().max(0.0) as usize).min(self.height());
        let radius_squared = radius * radius;
        for y in y_start..y_end {
            let cy = y as f64 + 0.5;
            for col in col_start..col_end {
                let cx = col as f64 + 0.5;
                let (dx, dy) = (cx - x0, cy - y0);
                if dx * dx + dy * dy <= radius_squared {
                    self.set(cx, cy, color);
                }
            }
        }
    }

    /// Draw a one pixel wide line segment.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), color: Rgb) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let num_steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for i in 0..=num_steps {
            let t = i as f64 / num_steps as f64;
            self.set(from.0 + t * dx, from.1 + t * dy, color);
        }
    }

    /// Draw line segments connecting consecutive points.
    pub fn polyline(&mut self, points: &[(f64, f64)], color: Rgb) {
        for segment in points.windows(2) {
            self.line(segment[0], segment[1], color);
        }
    }

    pub fn into_pixels(self) -> Array3<u8> {
        self.pixels
    }
}

impl From<Canvas> for RenderFrame {
    fn from(canvas: Canvas) -> Self {
        Self::Rgb(canvas.into_pixels())
    }
}

fn bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), &(x, y)| {
            (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
        },
    )
}

/// Even-odd point in polygon test.
fn polygon_contains(points: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for (i, &(xi, yi)) in points.iter().enumerate() {
        let (xj, yj) = points[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Rotate a point counter-clockwise about the origin.
pub fn rotate((x, y): (f64, f64), angle: f64) -> (f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}
