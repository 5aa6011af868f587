use std::ops::{Add, Mul, Sub};

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T> Rect<T> {
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_pos_size(pos: Pos<T>, size: Size<T>) -> Self {
        Rect {
            x: pos.x,
            y: pos.y,
            width: size.width,
            height: size.height,
        }
    }
}

impl<T: Copy + Add<Output = T>> Rect<T> {
    pub fn pos(&self) -> Pos<T> {
        Pos {
            x: self.x,
            y: self.y,
        }
    }

    pub fn size(&self) -> Size<T> {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn right(&self) -> T {
        self.x + self.width
    }

    pub fn bottom(&self) -> T {
        self.y + self.height
    }
}

impl<T: Copy + PartialOrd + Add<Output = T>> Rect<T> {
    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect<T>) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Whether the two rectangles share any area.
    pub fn intersects(&self, other: &Rect<T>) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

impl Rect<f32> {
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn from_min_extent(min: Vec2, extent: Vec2) -> Self {
        Rect::new(min.x, min.y, extent.x, extent.y)
    }
}

impl From<Rect<u32>> for Rect<f32> {
    fn from(r: Rect<u32>) -> Self {
        Rect::new(r.x as f32, r.y as f32, r.width as f32, r.height as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size<T> {
    pub width: T,
    pub height: T,
}

impl<T> Size<T> {
    pub const fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    pub fn cast<U: From<T>>(self) -> Size<U> {
        Size {
            width: U::from(self.width),
            height: U::from(self.height),
        }
    }
}

impl<T: Mul + Copy> Mul<T> for Size<T> {
    type Output = Size<<T as Mul>::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Size {
            width: self.width * rhs,
            height: self.height * rhs,
        }
    }
}

impl From<Size<f32>> for Vec2 {
    fn from(s: Size<f32>) -> Self {
        Vec2::new(s.width, s.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos<T> {
    pub x: T,
    pub y: T,
}

impl<T> Pos<T> {
    pub const fn new(x: T, y: T) -> Self {
        Pos { x, y }
    }
}

impl<T: Add<Output = T>> Add for Pos<T> {
    type Output = Pos<T>;

    fn add(self, rhs: Self) -> Self::Output {
        Pos {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T: Sub<Output = T>> Sub for Pos<T> {
    type Output = Pos<T>;

    fn sub(self, rhs: Self) -> Self::Output {
        Pos {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl From<Pos<f32>> for Vec2 {
    fn from(p: Pos<f32>) -> Self {
        Vec2::new(p.x, p.y)
    }
}

impl From<Vec2> for Pos<f32> {
    fn from(v: Vec2) -> Self {
        Pos::new(v.x, v.y)
    }
}

impl<T> From<mint::Point2<T>> for Pos<T> {
    fn from(p: mint::Point2<T>) -> Self {
        Pos { x: p.x, y: p.y }
    }
}

impl<T> From<Pos<T>> for mint::Point2<T> {
    fn from(p: Pos<T>) -> Self {
        mint::Point2 { x: p.x, y: p.y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10u32, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
    }

    #[test]
    fn test_rect_contains_and_intersects() {
        let outer = Rect::new(0u32, 0, 64, 64);
        assert!(outer.contains_rect(&Rect::new(8, 8, 56, 56)));
        assert!(!outer.contains_rect(&Rect::new(8, 8, 57, 56)));
        assert!(outer.intersects(&Rect::new(63, 63, 4, 4)));
        assert!(!outer.intersects(&Rect::new(64, 0, 4, 4)));
    }

    #[test]
    fn test_size_mul() {
        assert_eq!(Size::new(2.0f32, 3.0) * 2.0, Size::new(4.0, 6.0));
    }
}
