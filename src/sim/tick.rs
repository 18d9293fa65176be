//! Per-frame world update
//!
//! Order is load-bearing: every object moves first, then the brute-force
//! pair pass resolves contacts on the moved rectangles, then the status is
//! latched.

use super::network::NetworkError;
use super::objects::GameObject;
use super::state::World;
use crate::input::MovementIntent;

/// A frame can only fail through a miswired network
pub type SimError = NetworkError;

impl World {
    /// Advance the world by `dt` seconds.
    ///
    /// An error means the level's network is miswired; the frame is left
    /// partially applied and the caller should skip it.
    pub fn update(&mut self, dt: f32, intent: &dyn MovementIntent) -> Result<(), SimError> {
        self.frame += 1;

        for index in 0..self.objects.len() {
            let object = &mut self.objects[index];
            object.update(dt, intent, &mut self.network, &mut self.signals)?;
            let fell = object.body.position().y > self.height;
            if let Some(character) = object.as_character_mut() {
                if fell && !character.dead {
                    log::debug!("Character fell out of the level");
                    character.die();
                }
            }
            self.dispatch_signals();
        }

        self.check_collisions()?;
        self.update_status();
        Ok(())
    }

    /// Every unordered pair once, in insertion order; both sides of an
    /// overlapping pair get to respond
    fn check_collisions(&mut self) -> Result<(), NetworkError> {
        let count = self.objects.len();
        for a in 0..count {
            if !self.objects[a].object_type().collides() {
                continue;
            }
            for b in (a + 1)..count {
                let (first, second) = pair_mut(&mut self.objects, a, b);
                if !second.object_type().collides() || !first.rect().intersects_with(second.rect()) {
                    continue;
                }
                first.collide(second, &mut self.network, &mut self.signals)?;
                second.collide(first, &mut self.network, &mut self.signals)?;
                self.dispatch_signals();
            }
        }
        Ok(())
    }
}

/// Two distinct mutable elements, `a < b`
fn pair_mut(objects: &mut [GameObject], a: usize, b: usize) -> (&mut GameObject, &mut GameObject) {
    debug_assert!(a < b);
    let (head, tail) = objects.split_at_mut(b);
    (&mut head[a], &mut tail[0])
}
