//! Orbgrip – a real-time 2D sphere physics and gesture-interaction engine.
//!
//! The crate simulates a small set of equal-radius spheres with substep
//! integration, discrete and continuous pairwise collision resolution, and
//! configurable boundary behaviour, and lets an external hand tracker grip,
//! carry, and throw those spheres through a hysteresis-based grip state
//! machine.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod gesture;
pub mod utils;
pub mod world;

pub use glam::DVec2;

pub use crate::collision::{boundary, solver};
pub use crate::config::{BoundaryMode, SimulationConfig};
pub use crate::core::{
    body::{Body, Hold},
    probe::{HandKey, InteractionProbe, ProbeKey, ProbeKind, ProbeRole},
};
pub use crate::dynamics::{contact_force::ContactKey, integrator::Integrator};
pub use crate::gesture::{
    classifier::{classify, GripSignal},
    grip::{GripObservation, GripSet, GripState},
    landmarks::{HandFrame, Landmark},
    PlaneProjector,
};
pub use crate::utils::allocator::{Arena, BodyId};
pub use crate::world::PhysicsWorld;

/// High-level convenience wrapper that owns a [`PhysicsWorld`].
pub struct GestureEngine {
    world: PhysicsWorld,
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl GestureEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            world: PhysicsWorld::new(config),
        }
    }

    /// Spawns a default sphere at `position`, if capacity remains.
    pub fn spawn_sphere(&mut self, position: DVec2) -> Option<BodyId> {
        self.world.add_body(Body::new(position))
    }

    /// Advances one frame with hand input.
    pub fn update(
        &mut self,
        dt: f64,
        hands: &[Option<HandFrame>],
        projector: &dyn PlaneProjector,
    ) {
        self.world.update(dt, hands, projector);
    }

    /// Advances one frame with no hands in view.
    pub fn step(&mut self, dt: f64) {
        self.world.update(dt, &[], &NullProjector);
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }
}

/// Projector that never produces a world point; used when no camera is bound.
struct NullProjector;

impl PlaneProjector for NullProjector {
    fn project(&self, _landmark: Landmark) -> Option<DVec2> {
        None
    }
}
