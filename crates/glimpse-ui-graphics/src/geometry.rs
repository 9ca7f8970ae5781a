//! Geometric primitives: Size, Rect, EdgeInsets

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Axis-aligned rectangle in page coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn area(&self) -> f32 {
        self.size().area()
    }

    /// Overlap of the two rectangles.
    ///
    /// Touching edges produce a zero-area rectangle; disjoint rectangles
    /// produce `None`.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grows the rectangle by `insets` on each side; negative insets shrink it.
    /// Width and height never go below zero.
    pub fn outset(&self, insets: EdgeInsets) -> Rect {
        let x = self.x - insets.left;
        let y = self.y - insets.top;
        let width = (self.width + insets.horizontal_sum()).max(0.0);
        let height = (self.height + insets.vertical_sum()).max(0.0);
        Rect::new(x, y, width, height)
    }
}

/// Offsets for each edge of a rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EdgeInsets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl EdgeInsets {
    pub fn uniform(all: f32) -> Self {
        Self {
            left: all,
            top: all,
            right: all,
            bottom: all,
        }
    }

    pub fn from_components(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn horizontal_sum(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical_sum(&self) -> f32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_overlapping() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 80.0, 100.0, 100.0);
        assert_eq!(a.intersect(&b), Some(Rect::new(50.0, 80.0, 50.0, 20.0)));
    }

    #[test]
    fn intersect_touching_edges_is_empty_not_none() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(0.0, 100.0, 100.0, 50.0);
        let overlap = a.intersect(&b).expect("edge-adjacent");
        assert_eq!(overlap.area(), 0.0);
    }

    #[test]
    fn intersect_disjoint() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(0.0, 20.0, 10.0, 10.0);
        assert_eq!(a.intersect(&b), None);
    }

    #[test]
    fn outset_grows_and_clamps() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(
            rect.outset(EdgeInsets::from_components(5.0, 10.0, 5.0, 10.0)),
            Rect::new(5.0, 0.0, 110.0, 70.0)
        );
        assert_eq!(rect.outset(EdgeInsets::uniform(-60.0)).size(), Size::new(0.0, 0.0));
    }
}
