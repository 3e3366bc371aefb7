use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::core::probe::HandKey;

/// Who controls a body this frame. Anything other than `Free` pins the body:
/// it contributes zero inverse mass to collisions and is skipped by gravity,
/// probe forces, and the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Hold {
    #[default]
    Free,
    /// Carried by the grip of this hand.
    Held(HandKey),
    /// Pinned by an external UI selection.
    Selected,
}

/// A simulated sphere. All bodies share the radius configured on the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub position: DVec2,
    /// Position at the top of the previous substep; input to continuous
    /// collision detection.
    pub previous_position: DVec2,
    pub velocity: DVec2,
    mass: f64,
    restitution: f64,
    pub hold: Hold,
    /// Feedback-only counter of registered hits; never read by the solver.
    pub contact_count: u32,
}

impl Default for Body {
    fn default() -> Self {
        Self::new(DVec2::ZERO)
    }
}

impl Body {
    pub fn new(position: DVec2) -> Self {
        Self {
            position,
            previous_position: position,
            velocity: DVec2::ZERO,
            mass: 1.0,
            restitution: 0.8,
            hold: Hold::Free,
            contact_count: 0,
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Sets the mass, clamped to `[0.2, 5.0]`.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass.clamp(0.2, 5.0);
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    /// Sets the restitution, clamped to `[0.0, 1.0]`.
    pub fn set_restitution(&mut self, restitution: f64) {
        self.restitution = restitution.clamp(0.0, 1.0);
    }

    pub fn is_pinned(&self) -> bool {
        self.hold != Hold::Free
    }

    /// Zero while pinned, so the solver's correction weights come out of a
    /// single lookup.
    pub fn inverse_mass(&self) -> f64 {
        if self.is_pinned() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_and_restitution_are_clamped() {
        let mut body = Body::default();
        body.set_mass(0.01);
        assert_eq!(body.mass(), 0.2);
        body.set_mass(50.0);
        assert_eq!(body.mass(), 5.0);
        body.set_restitution(-0.5);
        assert_eq!(body.restitution(), 0.0);
        body.set_restitution(1.5);
        assert_eq!(body.restitution(), 1.0);
    }

    #[test]
    fn pinned_bodies_have_zero_inverse_mass() {
        let mut body = Body::default();
        body.set_mass(2.0);
        assert_eq!(body.inverse_mass(), 0.5);
        body.hold = Hold::Held(0);
        assert_eq!(body.inverse_mass(), 0.0);
        body.hold = Hold::Selected;
        assert_eq!(body.inverse_mass(), 0.0);
    }
}
