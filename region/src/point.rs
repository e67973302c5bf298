use crate::{common::*, Transform};

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> Point<T>
where
    T: Copy + Num,
{
    pub fn transform(&self, transform: &Transform<T>) -> Self {
        Point {
            x: self.x * transform.sx + transform.tx,
            y: self.y * transform.sy + transform.ty,
        }
    }
}

impl<T> Point<T>
where
    T: Float,
{
    /// Rotate about `center` by `angle` radians.
    ///
    /// Positive angles turn clockwise in the usual y-down pixel
    /// coordinate convention.
    pub fn rotate_about(&self, center: Point<T>, angle: T) -> Self {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point {
            x: dx * cos - dy * sin + center.x,
            y: dx * sin + dy * cos + center.y,
        }
    }

    pub fn distance_to(&self, other: &Point<T>) -> T {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl<T> Add for Point<T>
where
    T: Copy + Num,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T> Sub for Point<T>
where
    T: Copy + Num,
{
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl<T> Mul<T> for Point<T>
where
    T: Copy + Num,
{
    type Output = Self;

    fn mul(self, rhs: T) -> Self::Output {
        Point {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}
