//! Axis-aligned rectangle geometry
//!
//! Screen space: X grows to the right, Y grows downward, so `up` is the
//! smaller Y coordinate and `down` the larger one.

use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Rectangle edge, used by pistons to pick which side extends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Right,
    Up,
    Down,
}

impl FromStr for Edge {
    /// The unrecognized name
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Edge::Left),
            "right" => Ok(Edge::Right),
            "up" | "top" => Ok(Edge::Up),
            "down" | "bottom" => Ok(Edge::Down),
            _ => Err(s.to_string()),
        }
    }
}

/// An axis-aligned rectangle stored by its four edges
///
/// Invariant: `left <= right` and `up <= down`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    left: f32,
    right: f32,
    up: f32,
    down: f32,
}

impl Rect {
    /// Build from a top-left position and a size; negative sizes are flipped
    pub fn new(position: Vec2, size: Vec2) -> Self {
        let (left, right) = min_max(position.x, position.x + size.x);
        let (up, down) = min_max(position.y, position.y + size.y);
        Self { left, right, up, down }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.left
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.right
    }

    #[inline]
    pub fn up(&self) -> f32 {
        self.up
    }

    #[inline]
    pub fn down(&self) -> f32 {
        self.down
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.down - self.up
    }

    /// Top-left corner
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.left, self.up)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn edge(&self, edge: Edge) -> f32 {
        match edge {
            Edge::Left => self.left,
            Edge::Right => self.right,
            Edge::Up => self.up,
            Edge::Down => self.down,
        }
    }

    /// Move one edge. If it crosses the opposite edge, the opposite edge
    /// collapses onto it so the rectangle never inverts.
    pub fn set_edge(&mut self, edge: Edge, value: f32) {
        match edge {
            Edge::Left => {
                self.left = value;
                self.right = self.right.max(value);
            }
            Edge::Right => {
                self.right = value;
                self.left = self.left.min(value);
            }
            Edge::Up => {
                self.up = value;
                self.down = self.down.max(value);
            }
            Edge::Down => {
                self.down = value;
                self.up = self.up.min(value);
            }
        }
    }

    /// Strict overlap on both axes; shared edges do not intersect
    pub fn intersects_with(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.up < other.down
            && other.up < self.down
    }

    /// Closed containment test for a point
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.up && point.y <= self.down
    }

    /// True if `other` lies entirely inside this rectangle (edges may touch)
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.up >= self.up
            && other.down <= self.down
    }
}

#[inline]
fn min_max(a: f32, b: f32) -> (f32, f32) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_negative_size_is_normalized() {
        let r = rect(10.0, 10.0, -4.0, -6.0);
        assert_eq!(r.left(), 6.0);
        assert_eq!(r.right(), 10.0);
        assert_eq!(r.up(), 4.0);
        assert_eq!(r.down(), 10.0);
        assert_eq!(r.size(), Vec2::new(4.0, 6.0));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 10.0);
        let c = rect(0.0, 10.0, 10.0, 10.0);
        assert!(!a.intersects_with(&b));
        assert!(!a.intersects_with(&c));
        assert!(a.intersects_with(&rect(9.0, 9.0, 5.0, 5.0)));
    }

    #[test]
    fn test_set_edge_collapses_opposite() {
        let mut r = rect(0.0, 0.0, 10.0, 10.0);
        r.set_edge(Edge::Right, 20.0);
        assert_eq!(r.width(), 20.0);
        assert_eq!(r.left(), 0.0);

        r.set_edge(Edge::Right, -5.0);
        assert_eq!(r.left(), -5.0);
        assert_eq!(r.right(), -5.0);

        let mut r = rect(0.0, 0.0, 10.0, 10.0);
        r.set_edge(Edge::Up, 15.0);
        assert_eq!(r.up(), 15.0);
        assert_eq!(r.down(), 15.0);
    }

    #[test]
    fn test_containment() {
        let outer = rect(0.0, 0.0, 100.0, 50.0);
        assert!(outer.contains(&rect(10.0, 10.0, 20.0, 20.0)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&rect(90.0, 10.0, 20.0, 20.0)));
        assert!(outer.contains_point(Vec2::new(100.0, 50.0)));
        assert!(!outer.contains_point(Vec2::new(100.1, 50.0)));
    }

    #[test]
    fn test_edge_names() {
        assert_eq!("Left".parse::<Edge>(), Ok(Edge::Left));
        assert_eq!(" down ".parse::<Edge>(), Ok(Edge::Down));
        assert_eq!("sideways".parse::<Edge>(), Err("sideways".to_string()));
    }

    proptest! {
        #[test]
        fn prop_edges_ordered(x in -1e4f32..1e4, y in -1e4f32..1e4, w in -1e3f32..1e3, h in -1e3f32..1e3) {
            let r = rect(x, y, w, h);
            prop_assert!(r.left() <= r.right());
            prop_assert!(r.up() <= r.down());
        }

        #[test]
        fn prop_overlap_symmetric(
            ax in -100f32..100.0, ay in -100f32..100.0, aw in 0f32..50.0, ah in 0f32..50.0,
            bx in -100f32..100.0, by in -100f32..100.0, bw in 0f32..50.0, bh in 0f32..50.0,
        ) {
            let a = rect(ax, ay, aw, ah);
            let b = rect(bx, by, bw, bh);
            prop_assert_eq!(a.intersects_with(&b), b.intersects_with(&a));
        }

        #[test]
        fn prop_adjacent_never_overlap(x in -100f32..100.0, y in -100f32..100.0, w in 1f32..50.0, h in 1f32..50.0) {
            let a = rect(x, y, w, h);
            let right = Rect::new(Vec2::new(a.right(), y), Vec2::new(w, h));
            let below = Rect::new(Vec2::new(x, a.down()), Vec2::new(w, h));
            prop_assert!(!a.intersects_with(&right));
            prop_assert!(!a.intersects_with(&below));
        }
    }
}
