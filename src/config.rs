//! Global configuration for the Orbgrip engine: runtime knobs with documented
//! ranges plus the tuned constants the interaction model is calibrated around.

use serde::{Deserialize, Serialize};

/// Baseline gravitational acceleration; scaled by [`SimulationConfig::gravity_coefficient`].
pub const GRAVITY_ACCEL: f64 = 9.8;

/// Substep count for the unconstrained 2D mode.
pub const SUBSTEPS_2D: u32 = 3;

/// Substep count for the constrained 1D mode. The ordered-stack solver needs
/// the finer resolution to converge.
pub const SUBSTEPS_1D: u32 = 6;

/// Position-only solver iterations per substep, each followed by a boundary
/// re-clamp.
pub const POSITION_ITERATIONS: u32 = 4;

/// Forward/backward sweep count for the 1D ordered-stack stabilizer.
pub const STACK_SWEEPS: u32 = 4;

/// Contact slack as a fraction of body radius: `ε = CONTACT_SLACK_FACTOR · R`.
pub const CONTACT_SLACK_FACTOR: f64 = 0.004;

/// Hands the probe buffer is sized for.
pub const MAX_HANDS: usize = 2;

/// Probe roles sourced per hand (five fingertips plus the palm).
pub const PROBES_PER_HAND: usize = 6;

/// Fixed probe-buffer capacity; the buffer is never reallocated.
pub const PROBE_CAPACITY: usize = MAX_HANDS * PROBES_PER_HAND;

/// Probe samples further apart than this are treated as a track break and the
/// velocity estimate restarts from zero.
pub const PROBE_SAMPLE_GAP_MAX: f64 = 0.12;

/// EMA weight toward the newest finite-difference velocity sample.
pub const PROBE_VELOCITY_SMOOTHING: f64 = 0.35;

// Grip capture/release hysteresis. Frame counts, not seconds: the state
// machine advances once per tracker frame.

/// Consecutive decisively-closed frames required before capture.
pub const CAPTURE_CLOSED_FRAMES: u32 = 1;

/// Consecutive mostly-open frames required before release.
pub const RELEASE_OPEN_FRAMES: u32 = 2;

/// Frames a grip survives without tracking before it silently drops.
pub const MEMORY_HOLD_FRAMES: u32 = 6;

/// A body faster than this is not kept artificially still through a tracking
/// dropout.
pub const MEMORY_HOLD_MAX_SPEED: f64 = 3.0;

/// Per-frame damping applied to the carried velocity while predicting through
/// a dropout.
pub const MEMORY_HOLD_DAMPING: f64 = 0.82;

/// Capture radius around the palm anchor, in body radii.
pub const CAPTURE_RADIUS_FACTOR: f64 = 1.6;

/// Radius around a candidate body inside which fingertips count as near, in
/// body radii.
pub const FINGER_NEAR_RADIUS_FACTOR: f64 = 2.2;

/// Fingertips that must be near the candidate body for capture.
pub const MIN_FINGERS_NEAR: u32 = 2;

/// Relaxed radius for the precapture signal, in body radii.
pub const PRECAPTURE_RADIUS_FACTOR: f64 = 2.4;

/// Relaxed closed-finger count for the precapture signal.
pub const PRECAPTURE_MIN_CLOSED: u32 = 2;

/// Low-pass weight folding palm velocity into the carried throw velocity.
pub const CARRY_SMOOTHING: f64 = 0.4;

/// Release speeds below this become a plain drop.
pub const THROW_DEADZONE_SPEED: f64 = 0.25;

/// Release speeds are clamped to this.
pub const THROW_MAX_SPEED: f64 = 9.0;

// Contact force model. These values encode interaction feel and were tuned by
// hand, not derived.

/// Core contact radius for fingertip probes, in body radii.
pub const FINGERTIP_RADIUS_FACTOR: f64 = 1.25;

/// Core contact radius for palm probes, in body radii.
pub const PALM_RADIUS_FACTOR: f64 = 1.9;

/// Lookahead horizon converting probe speed into extra contact radius.
pub const LOOKAHEAD_TIME: f64 = 0.08;

/// Cap on the lookahead radius boost, in body radii.
pub const LOOKAHEAD_BOOST_CAP_FACTOR: f64 = 0.6;

/// Spring stiffness of the probe push; scaled by sensitivity.
pub const PUSH_SPRING: f64 = 140.0;

/// Damping on the inward normal speed of the probe push.
pub const PUSH_DAMPING: f64 = 9.0;

/// Acceleration cap on the probe push.
pub const MAX_PUSH_ACCEL: f64 = 70.0;

/// Fraction of the push applied as a direct position nudge.
pub const PUSH_POSITION_FACTOR: f64 = 0.35;

/// Push scale floor for contacts inside only the lookahead shell.
pub const SHELL_FLOOR: f64 = 0.35;

/// Minimum probe approach speed for the one-shot hit impulse.
pub const HIT_MIN_APPROACH_SPEED: f64 = 0.6;

/// Fraction of approach speed transferred by the one-shot impulse.
pub const VELOCITY_TRANSFER: f64 = 0.85;

/// One-shot impulse multiplier for palm probes.
pub const PALM_IMPULSE_BOOST: f64 = 1.35;

/// One-shot impulse multiplier for shell-only contacts.
pub const SHELL_IMPULSE_BOOST: f64 = 1.15;

/// Cap on the one-shot impulse magnitude.
pub const MAX_HIT_IMPULSE: f64 = 7.5;

/// Seconds after a release during which probe influence stays at zero.
pub const SUPPRESSION_HOLD: f64 = 0.18;

/// Seconds over which probe influence ramps back to full after the hold.
pub const SUPPRESSION_RAMP: f64 = 0.25;

/// Domain boundary behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoundaryMode {
    /// Reflective walls at `±(half_extent − R)`.
    #[default]
    Walls,
    /// Toroidal wrap into `±(half_extent + R)`.
    Wrap,
}

/// Runtime knobs exposed to the hosting UI. Constructed values are always
/// clamped into their documented ranges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub boundary: BoundaryMode,
    /// Constrain motion to the x axis (ordered 1D stacking mode).
    pub constrain_to_axis: bool,
    /// Scales push stiffness and effective contact radius. Range `[0.6, 2.0]`.
    pub sensitivity: f64,
    /// Gravity strength. Range `[0.0, 2.0]`.
    pub gravity_coefficient: f64,
    /// Exponential air drag. Range `[0.0, 1.0]`.
    pub air_drag: f64,
    /// Restitution of the domain walls. Range `[0.0, 1.0]`.
    pub wall_restitution: f64,
    /// Shared radius of every simulated sphere.
    pub body_radius: f64,
    /// Half width/height of the square simulation domain.
    pub half_extent: f64,
    /// Bodies beyond this count are rejected as a no-op.
    pub max_bodies: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            boundary: BoundaryMode::Walls,
            constrain_to_axis: false,
            sensitivity: 1.0,
            gravity_coefficient: 1.0,
            air_drag: 0.12,
            wall_restitution: 0.85,
            body_radius: 0.5,
            half_extent: 4.0,
            max_bodies: 3,
        }
    }
}

impl SimulationConfig {
    /// Returns the configuration with every knob clamped into its range.
    pub fn clamped(mut self) -> Self {
        self.sensitivity = self.sensitivity.clamp(0.6, 2.0);
        self.gravity_coefficient = self.gravity_coefficient.clamp(0.0, 2.0);
        self.air_drag = self.air_drag.clamp(0.0, 1.0);
        self.wall_restitution = self.wall_restitution.clamp(0.0, 1.0);
        self.body_radius = self.body_radius.max(1e-3);
        self.half_extent = self.half_extent.max(self.body_radius * 2.0);
        self
    }

    /// Contact slack `ε` for the configured radius.
    pub fn contact_slack(&self) -> f64 {
        CONTACT_SLACK_FACTOR * self.body_radius
    }

    /// Substeps per frame for the active dimensionality.
    pub fn substeps(&self) -> u32 {
        if self.constrain_to_axis {
            SUBSTEPS_1D
        } else {
            SUBSTEPS_2D
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_clamps_into_documented_ranges() {
        let config = SimulationConfig {
            sensitivity: 5.0,
            gravity_coefficient: -1.0,
            air_drag: 2.0,
            wall_restitution: 1.5,
            ..Default::default()
        }
        .clamped();

        assert_eq!(config.sensitivity, 2.0);
        assert_eq!(config.gravity_coefficient, 0.0);
        assert_eq!(config.air_drag, 1.0);
        assert_eq!(config.wall_restitution, 1.0);
    }

    #[test]
    fn substeps_follow_dimensionality() {
        let mut config = SimulationConfig::default();
        assert_eq!(config.substeps(), SUBSTEPS_2D);
        config.constrain_to_axis = true;
        assert_eq!(config.substeps(), SUBSTEPS_1D);
    }
}
