/// An axis-aligned rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> i32 { self.x + self.width as i32 }

    #[inline]
    pub fn bottom(&self) -> i32 { self.y + self.height as i32 }

    pub fn contains_x(&self, x: i32) -> bool { x >= self.x && x < self.right() }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self { Self { width, height } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_uses_half_open_edges() {
        let outer = Rect::new(0, 0, 300, 20);
        assert!(outer.contains(&Rect::new(200, 0, 100, 20)));
        assert!(!outer.contains(&Rect::new(201, 0, 100, 20)));
        assert!(outer.contains_x(299));
        assert!(!outer.contains_x(300));
    }
}
