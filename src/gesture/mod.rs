pub mod classifier;
pub mod grip;
pub mod landmarks;

use glam::DVec2;

use crate::gesture::landmarks::Landmark;

/// Projection collaborator: maps a normalized landmark onto the simulation
/// plane. A `None` means "probe unavailable this frame", never an error.
pub trait PlaneProjector {
    fn project(&self, landmark: Landmark) -> Option<DVec2>;
}
