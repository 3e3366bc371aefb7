//! Substep integration: gravity, position advance, boundary, drag, then the
//! split position/velocity contact resolution.

use crate::collision::{boundary, solver};
use crate::config::{SimulationConfig, GRAVITY_ACCEL, POSITION_ITERATIONS};
use crate::core::body::Body;
use crate::utils::allocator::Arena;

/// Steps bodies forward in time. The position-only solver iterations run
/// first so penetration converges to near zero before the single velocity
/// pass; correcting deep overlaps through impulses alone injects energy.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator;

impl Integrator {
    pub fn new() -> Self {
        Self
    }

    /// Advances the body set by `dt`, split into the configured substeps.
    /// Returns the number of velocity-resolved body contacts.
    pub fn step(&self, dt: f64, bodies: &mut Arena<Body>, config: &SimulationConfig) -> u32 {
        let substeps = config.substeps();
        let sub_dt = dt / substeps as f64;
        let mut contacts = 0;

        for _ in 0..substeps {
            for body in bodies.iter_mut() {
                self.integrate_body(body, sub_dt, config);
            }

            for _ in 0..POSITION_ITERATIONS {
                solver::resolve_pairs(bodies, false, config);
                boundary::constrain_all(bodies, config);
            }
            if config.constrain_to_axis {
                boundary::stabilize_stack(bodies, config);
            }

            contacts += solver::resolve_pairs(bodies, true, config);
            boundary::constrain_all(bodies, config);
            if config.constrain_to_axis {
                boundary::stabilize_stack(bodies, config);
            }
        }

        contacts
    }

    fn integrate_body(&self, body: &mut Body, sub_dt: f64, config: &SimulationConfig) {
        body.previous_position = body.position;
        if body.is_pinned() {
            return;
        }

        // The constrained mode has no gravity along its axis.
        if !config.constrain_to_axis {
            body.velocity.y -= config.gravity_coefficient * GRAVITY_ACCEL * sub_dt;
        }
        body.position += body.velocity * sub_dt;
        boundary::constrain(body, config);
        body.velocity *= (-config.air_drag * sub_dt).exp();
    }
}
