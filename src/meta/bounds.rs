
//! Integer rectangles in the infinite 2D pixel space.

use crate::error::{Error, UnitResult};
use crate::math::Vec2;


/// A rectangular section anywhere in 2D integer space.
/// Valid from minimum coordinate (including) `-1,073,741,822`
/// to maximum coordinate (including) `1,073,741,822`, the value of (`i32::MAX/2 -1`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Hash)]
pub struct IntegerBounds {

    /// The lower left corner of this rectangle.
    /// The rectangle includes this pixel if the size is not zero.
    pub position: Vec2<i32>,

    /// How many pixels to include in this rectangle.
    /// Does not include the actual boundary, just like `Vec::len()`.
    pub size: Vec2<usize>,
}

impl IntegerBounds {

    /// Create a box with no size located at (0,0).
    pub fn zero() -> Self {
        Self::from_dimensions(Vec2(0, 0))
    }

    /// Create a box with a size starting at zero.
    pub fn from_dimensions(size: impl Into<Vec2<usize>>) -> Self {
        Self::new(Vec2(0,0), size)
    }

    /// Create a box with a size and an origin point.
    pub fn new(start: impl Into<Vec2<i32>>, size: impl Into<Vec2<usize>>) -> Self {
        Self { position: start.into(), size: size.into() }
    }

    /// Create a box from its inclusive minimum and exclusive end coordinate.
    /// An end smaller than the start results in an empty box.
    pub fn from_min_end(min: Vec2<i32>, end: Vec2<i32>) -> Self {
        let size = Vec2(
            (i64::from(end.x()) - i64::from(min.x())).max(0) as usize,
            (i64::from(end.y()) - i64::from(min.y())).max(0) as usize,
        );

        Self { position: min, size }
    }

    /// The smallest integer box that contains both float corners,
    /// flooring the lower and ceiling the upper coordinates.
    pub fn rounded_out(corner: (f64, f64), other_corner: (f64, f64)) -> Self {
        let min = Vec2(corner.0.min(other_corner.0).floor(), corner.1.min(other_corner.1).floor());
        let end = Vec2(corner.0.max(other_corner.0).ceil(), corner.1.max(other_corner.1).ceil());
        Self::from_min_end(min.map(saturate_to_i32), end.map(saturate_to_i32))
    }

    /// Returns the top-right coordinate of the rectangle.
    /// The row and column described by this vector are not included in the rectangle,
    /// just like `Vec::len()`.
    pub fn end(self) -> Vec2<i32> {
        self.position + self.size.map(|size| size as i32)
    }

    /// Returns the maximum coordinate that a value in this rectangle may have.
    pub fn max(self) -> Vec2<i32> {
        self.end() - Vec2(1,1)
    }

    /// Whether this box contains no pixels.
    pub fn is_empty(self) -> bool {
        self.size.width() == 0 || self.size.height() == 0
    }

    /// Number of pixels inside this box.
    pub fn area(self) -> usize {
        self.size.area()
    }

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        let max_box_size_as_i64 = (i32::MAX / 2) as i64; // as defined by the openexr library

        let min = self.position.map(i64::from);
        let end = min + self.size.map(|size| size as i64);

        if     end.x() >=  max_box_size_as_i64
            || end.y() >=  max_box_size_as_i64
            || min.x() <= -max_box_size_as_i64
            || min.y() <= -max_box_size_as_i64
        {
            return Err(Error::invalid("bounds exceeding integer maximum"));
        }

        Ok(())
    }

    /// Create a new rectangle which is offset by the specified origin.
    pub fn with_origin(self, origin: Vec2<i32>) -> Self {
        IntegerBounds { position: self.position + origin, .. self }
    }

    /// Returns whether the specified rectangle is equal to or inside this rectangle.
    pub fn contains(self, subset: Self) -> bool {
           subset.position.x() >= self.position.x()
        && subset.position.y() >= self.position.y()
        && subset.end().x() <= self.end().x()
        && subset.end().y() <= self.end().y()
    }

    /// Returns whether the pixel lies inside this rectangle.
    pub fn contains_position(self, position: Vec2<i32>) -> bool {
           position.x() >= self.position.x()
        && position.y() >= self.position.y()
        && position.x() < self.end().x()
        && position.y() < self.end().y()
    }

    /// Row-major index of the pixel inside this rectangle, if it lies inside.
    pub fn index_of(self, position: Vec2<i32>) -> Option<usize> {
        if !self.contains_position(position) { return None; }

        let local = position - self.position;
        Some(local.y() as usize * self.size.width() + local.x() as usize)
    }

    /// The smallest rectangle containing both rectangles.
    /// Empty rectangles do not contribute.
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() { return other; }
        if other.is_empty() { return self; }

        let min = Vec2(self.position.x().min(other.position.x()), self.position.y().min(other.position.y()));
        let end = Vec2(self.end().x().max(other.end().x()), self.end().y().max(other.end().y()));
        Self::from_min_end(min, end)
    }

    /// The overlapping part of both rectangles, possibly empty.
    pub fn intersect(self, other: Self) -> Self {
        let min = Vec2(self.position.x().max(other.position.x()), self.position.y().max(other.position.y()));
        let end = Vec2(self.end().x().min(other.end().x()), self.end().y().min(other.end().y()));
        Self::from_min_end(min, end)
    }

    /// Grow the rectangle by the specified amount of pixels on every side.
    /// Negative amounts shrink the rectangle, down to an empty rectangle.
    pub fn dilate(self, amount: Vec2<i32>) -> Self {
        Self::from_min_end(self.position - amount, self.end() + amount)
    }

    /// Iterate all pixel positions in scan order: rows from bottom to top,
    /// and inside each row from left to right.
    pub fn positions(self) -> impl Iterator<Item = Vec2<i32>> {
        let Vec2(x_min, y_min) = self.position;
        let Vec2(x_end, y_end) = self.end();
        let x_end = if self.is_empty() { x_min } else { x_end };

        (y_min .. y_end).flat_map(move |y| (x_min .. x_end).map(move |x| Vec2(x, y)))
    }
}

fn saturate_to_i32(value: f64) -> i32 {
    let limit = f64::from(i32::MAX / 2);
    if value.is_nan() { 0 } else { value.clamp(-limit, limit) as i32 }
}
