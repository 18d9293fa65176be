//! Push-out collision response for axis-aligned rectangles
//!
//! Not a continuous solver: an overlapping pair is separated along whichever
//! of four candidate shifts is shortest. Candidates are always tried in the
//! order right, up, left, down and the first minimum wins, so equal
//! overlaps resolve the same way every frame.

use glam::Vec2;

use super::objects::{Body, Motion};
use super::rect::Rect;

/// Direction `self` gets pushed to separate from the other rectangle
///
/// `Up` means self was pushed upward, i.e. it landed on top of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Up,
    Left,
    Down,
}

impl Direction {
    /// Fixed tie-break order
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Right | Direction::Left)
    }
}

/// The chosen separating displacement for `a`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Push {
    pub direction: Direction,
    pub shift: Vec2,
}

/// Candidate displacements of `a`, in [`Direction::ALL`] order
pub fn separation_shifts(a: &Rect, b: &Rect) -> [Vec2; 4] {
    [
        Vec2::new(b.right() - a.left(), 0.0),
        Vec2::new(0.0, b.up() - a.down()),
        Vec2::new(b.left() - a.right(), 0.0),
        Vec2::new(0.0, b.down() - a.up()),
    ]
}

/// Shortest separating shift; earlier directions win ties
pub fn minimum_push(a: &Rect, b: &Rect) -> Push {
    let shifts = separation_shifts(a, b);
    let mut best = 0;
    for index in 1..shifts.len() {
        if shifts[index].length() < shifts[best].length() {
            best = index;
        }
    }
    Push {
        direction: Direction::ALL[best],
        shift: shifts[best],
    }
}

/// Dominant contact direction without moving anything
pub fn collision_direction(a: &Rect, b: &Rect) -> Direction {
    minimum_push(a, b).direction
}

/// Full one-sided push-out of `body` away from `other`. Zeroes the
/// velocity component along the resolved axis.
pub fn bump(body: &mut Body, motion: &mut Motion, other: &Rect) -> Direction {
    let push = minimum_push(body.rect(), other);
    body.translate(push.shift);
    if push.direction.is_horizontal() {
        motion.speed.x = 0.0;
    } else {
        motion.speed.y = 0.0;
    }
    push.direction
}

/// Two-sided push-out between equally heavy movables.
///
/// Landing on top of the other (`Up`) is resolved as a full bump of self
/// only; `Down` is left to the other object's own resolution. Otherwise each
/// side moves half the shift and both take the mean velocity on that axis.
pub fn half_bump(
    body: &mut Body,
    motion: &mut Motion,
    other_body: &mut Body,
    other_motion: &mut Motion,
) -> Direction {
    let push = minimum_push(body.rect(), other_body.rect());
    match push.direction {
        Direction::Up => {
            bump(body, motion, other_body.rect());
        }
        Direction::Down => {}
        Direction::Left | Direction::Right => {
            body.translate(push.shift * 0.5);
            other_body.translate(push.shift * -0.5);
            let mean = (motion.speed.x + other_motion.speed.x) / 2.0;
            motion.speed.x = mean;
            other_motion.speed.x = mean;
        }
    }
    push.direction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(x: f32, y: f32, w: f32, h: f32) -> Body {
        Body::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    fn moving(speed: Vec2) -> Motion {
        Motion {
            speed,
            ..Motion::default()
        }
    }

    #[test]
    fn test_bump_picks_shortest_axis() {
        let mut character = body(0.0, 0.0, 10.0, 10.0);
        let wall = body(9.0, 0.0, 10.0, 10.0);
        let mut motion = moving(Vec2::new(50.0, 30.0));

        let dir = bump(&mut character, &mut motion, wall.rect());
        assert_eq!(dir, Direction::Left);
        assert_eq!(character.position(), Vec2::new(-1.0, 0.0));
        assert_eq!(motion.speed, Vec2::new(0.0, 30.0));
        assert!(!character.rect().intersects_with(wall.rect()));
    }

    #[test]
    fn test_landing_resolves_up() {
        let mut falling = body(0.0, 0.0, 10.0, 10.0);
        let floor = body(-20.0, 8.0, 50.0, 10.0);
        let mut motion = moving(Vec2::new(5.0, 100.0));

        assert_eq!(collision_direction(falling.rect(), floor.rect()), Direction::Up);
        bump(&mut falling, &mut motion, floor.rect());
        assert_eq!(falling.rect().down(), 8.0);
        assert_eq!(motion.speed, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_tie_break_order() {
        // Equal overlap on every side: right is tried first
        let a = body(0.0, 0.0, 10.0, 10.0);
        let b = body(0.0, 0.0, 10.0, 10.0);
        assert_eq!(collision_direction(a.rect(), b.rect()), Direction::Right);

        // Right and up tie at 5; right still wins
        let a = body(0.0, 0.0, 10.0, 10.0);
        let b = body(-5.0, 5.0, 10.0, 10.0);
        let shifts = separation_shifts(a.rect(), b.rect());
        assert_eq!(shifts[0].length(), 5.0);
        assert_eq!(shifts[1].length(), 5.0);
        assert_eq!(collision_direction(a.rect(), b.rect()), Direction::Right);
    }

    #[test]
    fn test_half_bump_is_symmetric() {
        let mut a = body(0.0, 0.0, 10.0, 10.0);
        let mut b = body(8.0, 0.0, 10.0, 10.0);
        let mut ma = moving(Vec2::new(10.0, 3.0));
        let mut mb = moving(Vec2::new(-10.0, 7.0));

        let dir = half_bump(&mut a, &mut ma, &mut b, &mut mb);
        assert_eq!(dir, Direction::Left);
        assert_eq!(ma.speed.x, 0.0);
        assert_eq!(mb.speed.x, 0.0);
        // Vertical velocity untouched
        assert_eq!(ma.speed.y, 3.0);
        assert_eq!(mb.speed.y, 7.0);

        let da = a.position().x - 0.0;
        let db = b.position().x - 8.0;
        assert_eq!(da, -1.0);
        assert_eq!(db, 1.0);
        assert_eq!(da, -db);
        assert!(!a.rect().intersects_with(b.rect()));
    }

    #[test]
    fn test_half_bump_from_above_moves_only_self() {
        let mut top = body(0.0, 0.0, 10.0, 10.0);
        let mut bottom = body(0.0, 9.0, 10.0, 10.0);
        let mut mt = moving(Vec2::new(0.0, 40.0));
        let mut mbm = moving(Vec2::new(0.0, 0.0));

        assert_eq!(half_bump(&mut top, &mut mt, &mut bottom, &mut mbm), Direction::Up);
        assert_eq!(top.rect().down(), 9.0);
        assert_eq!(bottom.position(), Vec2::new(0.0, 9.0));
        assert_eq!(mt.speed.y, 0.0);

        // From below nothing happens on this side
        let mut top = body(0.0, 0.0, 10.0, 10.0);
        let mut bottom = body(0.0, 9.0, 10.0, 10.0);
        assert_eq!(
            half_bump(&mut bottom, &mut mbm, &mut top, &mut mt),
            Direction::Down
        );
        assert_eq!(bottom.position(), Vec2::new(0.0, 9.0));
        assert_eq!(top.position(), Vec2::ZERO);
    }
}
