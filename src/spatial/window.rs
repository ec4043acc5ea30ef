//! Observation windows with the geometric queries needed for edge correction
//!
//! Rectangles answer every query in closed form. Polygons answer membership and
//! boundary distance exactly and approximate eroded areas and set covariance on
//! lazily built pixel masks, which are cached for the lifetime of the window.

use crate::io::configuration::{
    COVARIANCE_MASK_RESOLUTION, ISOTROPIC_ANGLE_SAMPLES, POLYGON_MASK_RESOLUTION,
};
use crate::io::error::{Result, computation_error, invalid_parameter};
use crate::spatial::point::Point;
use ndarray::Array2;
use rand::Rng;
use std::f64::consts::{FRAC_PI_4, TAU};
use std::sync::OnceLock;

// Rejection sampling gives up after this many misses (polygon area ratio ~1e-5)
const MAX_REJECTION_ATTEMPTS: usize = 100_000;

/// Axis-aligned rectangle, boundary inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    /// Minimum horizontal coordinate
    pub x_min: f64,
    /// Maximum horizontal coordinate
    pub x_max: f64,
    /// Minimum vertical coordinate
    pub y_min: f64,
    /// Maximum vertical coordinate
    pub y_max: f64,
}

impl Rectangle {
    /// Create a rectangle from its extent
    ///
    /// Degenerate (zero-width or zero-height) rectangles are allowed; they have
    /// zero area and cannot hold a pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if a coordinate is not finite or a maximum lies below its minimum
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        for (name, value) in [
            ("x_min", x_min),
            ("x_max", x_max),
            ("y_min", y_min),
            ("y_max", y_max),
        ] {
            if !value.is_finite() {
                return Err(invalid_parameter(name, &value, &"must be finite"));
            }
        }
        if x_max < x_min {
            return Err(invalid_parameter("x_max", &x_max, &"must not be below x_min"));
        }
        if y_max < y_min {
            return Err(invalid_parameter("y_max", &y_max, &"must not be below y_min"));
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Smallest rectangle containing every point
    ///
    /// # Errors
    ///
    /// Returns an error if there are no points or a coordinate is not finite
    pub fn enclosing(points: &[Point]) -> Result<Self> {
        let first = points
            .first()
            .ok_or_else(|| invalid_parameter("points", &0, &"need at least one point"))?;
        let (mut x_min, mut x_max, mut y_min, mut y_max) = (first.x, first.x, first.y, first.y);
        for point in points {
            x_min = x_min.min(point.x);
            x_max = x_max.max(point.x);
            y_min = y_min.min(point.y);
            y_max = y_max.max(point.y);
        }
        Self::new(x_min, x_max, y_min, y_max)
    }

    /// Horizontal extent
    pub const fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Vertical extent
    pub const fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Enclosed area
    pub const fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check if a point lies within the rectangle (boundary inclusive)
    pub const fn contains(&self, point: &Point) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    /// Distance from an interior point to the nearest edge
    pub fn boundary_distance(&self, point: &Point) -> f64 {
        (point.x - self.x_min)
            .min(self.x_max - point.x)
            .min(point.y - self.y_min)
            .min(self.y_max - point.y)
            .max(0.0)
    }

    /// Area of the rectangle shrunk by `r` on every side
    pub fn eroded_area(&self, r: f64) -> f64 {
        (self.width() - 2.0 * r).max(0.0) * (self.height() - 2.0 * r).max(0.0)
    }

    /// Area of the intersection of the rectangle with its translate by `(dx, dy)`
    pub fn set_covariance(&self, dx: f64, dy: f64) -> f64 {
        (self.width() - dx.abs()).max(0.0) * (self.height() - dy.abs()).max(0.0)
    }

    /// Fraction of the circle of radius `r` around `point` lying inside the rectangle
    ///
    /// Each edge closer than `r` removes an arc of half-angle `acos(d / r)` on
    /// both sides of its normal, truncated at the direction of the adjacent
    /// corner so that arcs cut by two edges are counted once.
    pub fn isotropic_fraction(&self, point: &Point, r: f64) -> f64 {
        if r <= 0.0 {
            return 1.0;
        }
        let left = (point.x - self.x_min).max(0.0);
        let right = (self.x_max - point.x).max(0.0);
        let down = (point.y - self.y_min).max(0.0);
        let up = (self.y_max - point.y).max(0.0);

        let arc = |d: f64| if d < r { (d / r).acos() } else { 0.0 };
        let corner = |across: f64, along: f64| {
            if across == 0.0 && along == 0.0 {
                FRAC_PI_4
            } else {
                across.atan2(along)
            }
        };

        let (a_left, a_right, a_down, a_up) = (arc(left), arc(right), arc(down), arc(up));
        let excluded = a_left.min(corner(up, left))
            + a_left.min(corner(down, left))
            + a_right.min(corner(up, right))
            + a_right.min(corner(down, right))
            + a_down.min(corner(left, down))
            + a_down.min(corner(right, down))
            + a_up.min(corner(left, up))
            + a_up.min(corner(right, up));

        (1.0 - excluded / TAU).clamp(0.0, 1.0)
    }
}

/// Boolean pixel approximation of a polygon over its bounding rectangle
#[derive(Debug, Clone)]
struct PixelMask {
    inside: Array2<bool>,
    pixel_width: f64,
    pixel_height: f64,
}

impl PixelMask {
    fn build(vertices: &[Point], bounds: &Rectangle, resolution: usize) -> Self {
        let pixel_width = bounds.width() / resolution as f64;
        let pixel_height = bounds.height() / resolution as f64;
        let inside = Array2::from_shape_fn((resolution, resolution), |(row, col)| {
            let centre = Point::new(
                (col as f64 + 0.5).mul_add(pixel_width, bounds.x_min),
                (row as f64 + 0.5).mul_add(pixel_height, bounds.y_min),
            );
            polygon_contains(vertices, &centre)
        });
        Self {
            inside,
            pixel_width,
            pixel_height,
        }
    }

    fn is_inside(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        self.inside
            .get((row as usize, col as usize))
            .copied()
            .unwrap_or(false)
    }
}

/// Set covariance of a polygon tabulated on the pixel lattice of offsets
#[derive(Debug, Clone)]
struct CovarianceLattice {
    /// Overlap counts indexed by (row offset, column offset) shifted by `resolution - 1`
    counts: Array2<f64>,
    resolution: usize,
    pixel_width: f64,
    pixel_height: f64,
    area_per_count: f64,
}

impl CovarianceLattice {
    fn build(mask: &PixelMask, area: f64) -> Self {
        let (resolution, _) = mask.inside.dim();
        let span = 2 * resolution - 1;
        let shift = resolution as isize - 1;
        let size = resolution as isize;

        let counts = Array2::from_shape_fn((span, span), |(a, b)| {
            let row_offset = a as isize - shift;
            let col_offset = b as isize - shift;
            let mut overlap = 0_usize;
            for row in row_offset.max(0)..(size + row_offset).min(size) {
                for col in col_offset.max(0)..(size + col_offset).min(size) {
                    if mask.is_inside(row, col) && mask.is_inside(row - row_offset, col - col_offset)
                    {
                        overlap += 1;
                    }
                }
            }
            overlap as f64
        });

        let full = counts
            .get((shift as usize, shift as usize))
            .copied()
            .unwrap_or(0.0);
        let area_per_count = if full > 0.0 { area / full } else { 0.0 };

        Self {
            counts,
            resolution,
            pixel_width: mask.pixel_width,
            pixel_height: mask.pixel_height,
            area_per_count,
        }
    }

    fn count_at(&self, row_offset: isize, col_offset: isize) -> f64 {
        let shift = self.resolution as isize - 1;
        let (a, b) = (row_offset + shift, col_offset + shift);
        if a < 0 || b < 0 {
            return 0.0;
        }
        self.counts
            .get((a as usize, b as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Bilinear interpolation between the four lattice offsets around `(dx, dy)`
    fn evaluate(&self, dx: f64, dy: f64) -> f64 {
        if self.pixel_width <= 0.0 || self.pixel_height <= 0.0 {
            return 0.0;
        }
        let u = dx / self.pixel_width;
        let v = dy / self.pixel_height;
        let (u0, v0) = (u.floor(), v.floor());
        let (fu, fv) = (u - u0, v - v0);
        let (col, row) = (u0 as isize, v0 as isize);

        let value = (1.0 - fv) * (1.0 - fu) * self.count_at(row, col)
            + (1.0 - fv) * fu * self.count_at(row, col + 1)
            + fv * (1.0 - fu) * self.count_at(row + 1, col)
            + fv * fu * self.count_at(row + 1, col + 1);

        value * self.area_per_count
    }
}

/// Simple polygon given by its vertices in order (either orientation)
#[derive(Debug, Clone)]
pub struct Polygon {
    vertices: Vec<Point>,
    area: f64,
    bounds: Rectangle,
    /// Boundary distances of interior mask pixels, ascending
    eroded_distances: OnceLock<Vec<f64>>,
    covariance: OnceLock<CovarianceLattice>,
}

impl Polygon {
    /// Create a polygon from at least three vertices
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than three vertices are given or a vertex is not finite
    pub fn new(vertices: Vec<Point>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(invalid_parameter(
                "vertices",
                &vertices.len(),
                &"a polygon needs at least three vertices",
            ));
        }
        if let Some(bad) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(invalid_parameter(
                "vertices",
                &format!("({}, {})", bad.x, bad.y),
                &"vertex coordinates must be finite",
            ));
        }

        let twice_area: f64 = edges(&vertices)
            .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
            .sum();
        let bounds = Rectangle::enclosing(&vertices)?;

        Ok(Self {
            vertices,
            area: 0.5 * twice_area.abs(),
            bounds,
            eroded_distances: OnceLock::new(),
            covariance: OnceLock::new(),
        })
    }

    /// Polygon vertices in the order supplied
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Enclosed area
    pub const fn area(&self) -> f64 {
        self.area
    }

    /// Bounding rectangle
    pub const fn bounds(&self) -> &Rectangle {
        &self.bounds
    }

    /// Check if a point lies within the polygon (boundary inclusive)
    pub fn contains(&self, point: &Point) -> bool {
        self.bounds.contains(point) && polygon_contains(&self.vertices, point)
    }

    /// Distance from a point to the nearest polygon edge
    pub fn boundary_distance(&self, point: &Point) -> f64 {
        edges(&self.vertices)
            .map(|(a, b)| segment_distance(point, a, b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Area of the set of interior points at least `r` from the boundary
    pub fn eroded_area(&self, r: f64) -> f64 {
        let distances = self.eroded_distances.get_or_init(|| {
            let mask = PixelMask::build(&self.vertices, &self.bounds, POLYGON_MASK_RESOLUTION);
            let mut distances: Vec<f64> = mask
                .inside
                .indexed_iter()
                .filter(|&(_, &inside)| inside)
                .map(|((row, col), _)| {
                    let centre = Point::new(
                        (col as f64 + 0.5).mul_add(mask.pixel_width, self.bounds.x_min),
                        (row as f64 + 0.5).mul_add(mask.pixel_height, self.bounds.y_min),
                    );
                    self.boundary_distance(&centre)
                })
                .collect();
            distances.sort_by(f64::total_cmp);
            distances
        });

        if distances.is_empty() {
            return 0.0;
        }
        let below = distances.partition_point(|&d| d < r);
        self.area * (distances.len() - below) as f64 / distances.len() as f64
    }

    /// Area of the intersection of the polygon with its translate by `(dx, dy)`
    pub fn set_covariance(&self, dx: f64, dy: f64) -> f64 {
        self.covariance
            .get_or_init(|| {
                let mask =
                    PixelMask::build(&self.vertices, &self.bounds, COVARIANCE_MASK_RESOLUTION);
                CovarianceLattice::build(&mask, self.area)
            })
            .evaluate(dx, dy)
    }

    /// Fraction of the circle of radius `r` around `point` lying inside the polygon
    pub fn isotropic_fraction(&self, point: &Point, r: f64) -> f64 {
        if r <= 0.0 {
            return 1.0;
        }
        let inside = (0..ISOTROPIC_ANGLE_SAMPLES)
            .filter(|&k| {
                let angle = TAU * k as f64 / ISOTROPIC_ANGLE_SAMPLES as f64;
                let sample = Point::new(
                    r.mul_add(angle.cos(), point.x),
                    r.mul_add(angle.sin(), point.y),
                );
                self.contains(&sample)
            })
            .count();
        inside as f64 / ISOTROPIC_ANGLE_SAMPLES as f64
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
    }
}

/// Observation window of a point pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Window {
    /// Axis-aligned rectangle
    Rectangle(Rectangle),
    /// Simple polygon
    Polygon(Polygon),
}

impl Window {
    /// Rectangular window from its extent
    ///
    /// # Errors
    ///
    /// Returns an error if the extent is not finite or inverted
    pub fn rectangle(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self> {
        Rectangle::new(x_min, x_max, y_min, y_max).map(Self::Rectangle)
    }

    /// The unit square `[0, 1] x [0, 1]`
    pub const fn unit_square() -> Self {
        Self::Rectangle(Rectangle {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        })
    }

    /// Polygonal window from its vertices
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than three vertices are given or a vertex is not finite
    pub fn polygon(vertices: Vec<Point>) -> Result<Self> {
        Polygon::new(vertices).map(Self::Polygon)
    }

    /// Enclosed area
    pub const fn area(&self) -> f64 {
        match self {
            Self::Rectangle(rect) => rect.area(),
            Self::Polygon(polygon) => polygon.area(),
        }
    }

    /// Bounding rectangle
    pub const fn bounds(&self) -> &Rectangle {
        match self {
            Self::Rectangle(rect) => rect,
            Self::Polygon(polygon) => polygon.bounds(),
        }
    }

    /// Shorter side of the bounding rectangle
    pub fn short_side(&self) -> f64 {
        let bounds = self.bounds();
        bounds.width().min(bounds.height())
    }

    /// Check if a point lies within the window (boundary inclusive)
    pub fn contains(&self, point: &Point) -> bool {
        match self {
            Self::Rectangle(rect) => rect.contains(point),
            Self::Polygon(polygon) => polygon.contains(point),
        }
    }

    /// Distance from a point to the window boundary
    pub fn boundary_distance(&self, point: &Point) -> f64 {
        match self {
            Self::Rectangle(rect) => rect.boundary_distance(point),
            Self::Polygon(polygon) => polygon.boundary_distance(point),
        }
    }

    /// Area of the window eroded by distance `r`
    pub fn eroded_area(&self, r: f64) -> f64 {
        match self {
            Self::Rectangle(rect) => rect.eroded_area(r),
            Self::Polygon(polygon) => polygon.eroded_area(r),
        }
    }

    /// Area of the window intersected with its translate by `(dx, dy)`
    pub fn set_covariance(&self, dx: f64, dy: f64) -> f64 {
        match self {
            Self::Rectangle(rect) => rect.set_covariance(dx, dy),
            Self::Polygon(polygon) => polygon.set_covariance(dx, dy),
        }
    }

    /// Fraction of the circle of radius `r` around `point` inside the window
    pub fn isotropic_fraction(&self, point: &Point, r: f64) -> f64 {
        match self {
            Self::Rectangle(rect) => rect.isotropic_fraction(point, r),
            Self::Polygon(polygon) => polygon.isotropic_fraction(point, r),
        }
    }

    /// Draw a point uniformly at random from the window
    ///
    /// # Errors
    ///
    /// Returns an error if rejection sampling inside a polygon keeps missing,
    /// which only happens for windows of (near) zero area
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Point> {
        let bounds = self.bounds();
        let mut draw = || {
            Point::new(
                rng.random::<f64>().mul_add(bounds.width(), bounds.x_min),
                rng.random::<f64>().mul_add(bounds.height(), bounds.y_min),
            )
        };

        match self {
            Self::Rectangle(_) => Ok(draw()),
            Self::Polygon(polygon) => {
                for _ in 0..MAX_REJECTION_ATTEMPTS {
                    let candidate = draw();
                    if polygon.contains(&candidate) {
                        return Ok(candidate);
                    }
                }
                Err(computation_error(
                    "uniform window sampling",
                    &format!("no point inside the polygon after {MAX_REJECTION_ATTEMPTS} draws"),
                ))
            }
        }
    }
}

/// Consecutive vertex pairs, closing the ring
fn edges(vertices: &[Point]) -> impl Iterator<Item = (&Point, &Point)> {
    vertices
        .iter()
        .zip(vertices.iter().skip(1).chain(vertices.first()))
}

fn segment_distance(point: &Point, a: &Point, b: &Point) -> f64 {
    let (ex, ey) = a.offset_to(b);
    let length_sq = ex.mul_add(ex, ey * ey);
    if length_sq <= 0.0 {
        return point.distance(a);
    }
    let (px, py) = a.offset_to(point);
    let t = (px.mul_add(ex, py * ey) / length_sq).clamp(0.0, 1.0);
    let nearest = Point::new(t.mul_add(ex, a.x), t.mul_add(ey, a.y));
    point.distance(&nearest)
}

/// Even-odd membership test with points on an edge counted as inside
fn polygon_contains(vertices: &[Point], point: &Point) -> bool {
    let scale = vertices
        .iter()
        .map(|v| v.x.abs().max(v.y.abs()))
        .fold(1.0_f64, f64::max);
    let tolerance = scale * 1e-12;

    let mut inside = false;
    for (a, b) in edges(vertices) {
        if segment_distance(point, a, b) <= tolerance {
            return true;
        }
        if (a.y > point.y) != (b.y > point.y) {
            let crossing = (b.x - a.x).mul_add((point.y - a.y) / (b.y - a.y), a.x);
            if point.x < crossing {
                inside = !inside;
            }
        }
    }
    inside
}
