//! Per-hand grip state machines: capture, carry, release with throw velocity,
//! and memory hold through tracking dropouts.

use glam::DVec2;
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{
    SimulationConfig, CAPTURE_CLOSED_FRAMES, CAPTURE_RADIUS_FACTOR, CARRY_SMOOTHING,
    FINGER_NEAR_RADIUS_FACTOR, MAX_HANDS, MEMORY_HOLD_DAMPING, MEMORY_HOLD_FRAMES,
    MEMORY_HOLD_MAX_SPEED, MIN_FINGERS_NEAR, PRECAPTURE_MIN_CLOSED, PRECAPTURE_RADIUS_FACTOR,
    RELEASE_OPEN_FRAMES, THROW_DEADZONE_SPEED, THROW_MAX_SPEED,
};
use crate::core::body::{Body, Hold};
use crate::core::probe::HandKey;
use crate::gesture::classifier::GripSignal;
use crate::utils::allocator::{Arena, BodyId};

/// What one hand contributed this frame. `signal` or `anchor` being absent
/// means the hand is untracked (or its projection failed) and the grip falls
/// back to memory-hold logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct GripObservation {
    pub signal: Option<GripSignal>,
    /// Projected palm reference point on the simulation plane.
    pub anchor: Option<DVec2>,
    /// Tracked palm velocity.
    pub anchor_velocity: DVec2,
}

/// Hysteresis counters and carry state for one hand.
#[derive(Debug, Clone, Default)]
pub struct GripState {
    held: Option<BodyId>,
    closed_frames: u32,
    open_frames: u32,
    lost_frames: u32,
    hold_point: DVec2,
    carry_velocity: DVec2,
}

impl GripState {
    fn clear_hold(&mut self) {
        self.held = None;
        self.closed_frames = 0;
        self.open_frames = 0;
        self.lost_frames = 0;
    }

    pub fn held(&self) -> Option<BodyId> {
        self.held
    }

    pub fn carry_velocity(&self) -> DVec2 {
        self.carry_velocity
    }
}

/// All grip state, keyed by hand. Owned by the world aggregate; a `BTreeMap`
/// keeps hand update order stable.
#[derive(Default)]
pub struct GripSet {
    states: BTreeMap<HandKey, GripState>,
}

impl GripSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held_body(&self, hand: HandKey) -> Option<BodyId> {
        self.states.get(&hand).and_then(|state| state.held)
    }

    pub fn state(&self, hand: HandKey) -> Option<&GripState> {
        self.states.get(&hand)
    }

    /// Advances one hand's grip for this frame. Mutates held bodies directly
    /// (position, velocity, hold flag) and collects the precapture set.
    #[allow(clippy::too_many_arguments)]
    pub fn update_hand(
        &mut self,
        hand: HandKey,
        observation: &GripObservation,
        fingertips: &[DVec2],
        bodies: &mut Arena<Body>,
        suppressions: &mut BTreeMap<BodyId, f64>,
        precaptured: &mut BTreeSet<BodyId>,
        config: &SimulationConfig,
        dt: f64,
    ) {
        let state = self.states.entry(hand).or_default();

        // Reassignment safety: the held body may have been removed, selected,
        // or claimed by an earlier hand this frame. The hold flag is the
        // single source of truth.
        if let Some(id) = state.held {
            let still_ours = bodies
                .get(id)
                .map(|body| body.hold == Hold::Held(hand))
                .unwrap_or(false);
            if !still_ours {
                debug!("grip {hand}: held body reassigned or gone, clearing");
                state.clear_hold();
            }
        }

        let (signal, anchor) = match (observation.signal, observation.anchor) {
            (Some(signal), Some(anchor)) => (signal, anchor),
            _ => {
                Self::track_lost(hand, state, bodies, dt);
                return;
            }
        };

        // Precapture is a relaxed, capture-independent signal: it only has to
        // suppress push forces one frame ahead of a real capture.
        if signal.closed_fingers >= PRECAPTURE_MIN_CLOSED {
            let radius = PRECAPTURE_RADIUS_FACTOR * config.body_radius;
            let ids: Vec<BodyId> = bodies.ids().collect();
            for id in ids {
                if let Some(body) = bodies.get(id) {
                    if body.hold == Hold::Free && body.position.distance(anchor) <= radius {
                        precaptured.insert(id);
                    }
                }
            }
        }

        if state.held.is_some() {
            Self::carry(hand, state, signal, anchor, observation.anchor_velocity, bodies, suppressions);
        } else {
            Self::try_capture(hand, state, signal, anchor, observation.anchor_velocity, fingertips, bodies, config);
        }
    }

    /// Removes idle grips for hands that were not observed this frame. Grips
    /// still holding a body survive; memory hold decides their fate.
    pub fn prune(&mut self, observed: &[bool; MAX_HANDS]) {
        self.states.retain(|hand, state| {
            state.held.is_some() || observed.get(*hand as usize).copied().unwrap_or(false)
        });
    }

    fn try_capture(
        hand: HandKey,
        state: &mut GripState,
        signal: GripSignal,
        anchor: DVec2,
        anchor_velocity: DVec2,
        fingertips: &[DVec2],
        bodies: &mut Arena<Body>,
        config: &SimulationConfig,
    ) {
        state.lost_frames = 0;
        state.open_frames = 0;
        if signal.is_mostly_closed {
            state.closed_frames += 1;
        } else {
            state.closed_frames = 0;
        }
        if state.closed_frames < CAPTURE_CLOSED_FRAMES {
            return;
        }

        let capture_radius = CAPTURE_RADIUS_FACTOR * config.body_radius;
        let ids: Vec<BodyId> = bodies.ids().collect();
        let mut candidate: Option<(BodyId, f64)> = None;
        for id in ids {
            let Some(body) = bodies.get(id) else { continue };
            if body.hold != Hold::Free {
                continue;
            }
            let distance = body.position.distance(anchor);
            if distance > capture_radius {
                continue;
            }
            // Strict `<` keeps the lowest-index body on ties.
            if candidate.map(|(_, best)| distance < best).unwrap_or(true) {
                candidate = Some((id, distance));
            }
        }

        let Some((id, _)) = candidate else { return };
        let near_radius = FINGER_NEAR_RADIUS_FACTOR * config.body_radius;
        let Some(body) = bodies.get_mut(id) else { return };
        let near = fingertips
            .iter()
            .filter(|tip| tip.distance(body.position) <= near_radius)
            .count() as u32;
        if near < MIN_FINGERS_NEAR {
            return;
        }

        body.hold = Hold::Held(hand);
        state.held = Some(id);
        state.hold_point = anchor;
        state.carry_velocity = anchor_velocity;
        debug!("grip {hand}: captured body {id:?}");
    }

    fn carry(
        hand: HandKey,
        state: &mut GripState,
        signal: GripSignal,
        anchor: DVec2,
        anchor_velocity: DVec2,
        bodies: &mut Arena<Body>,
        suppressions: &mut BTreeMap<BodyId, f64>,
    ) {
        let Some(id) = state.held else { return };

        state.lost_frames = 0;
        state.carry_velocity = state.carry_velocity.lerp(anchor_velocity, CARRY_SMOOTHING);
        state.hold_point = anchor;

        if let Some(body) = bodies.get_mut(id) {
            body.previous_position = body.position;
            body.position = anchor;
            body.velocity = state.carry_velocity;
        }

        if signal.is_mostly_open {
            state.open_frames += 1;
        } else {
            state.open_frames = 0;
        }
        if state.open_frames < RELEASE_OPEN_FRAMES {
            return;
        }

        // Releasing: carry velocity becomes the throw, with deadzone and cap.
        let mut velocity = state.carry_velocity;
        let speed = velocity.length();
        if speed < THROW_DEADZONE_SPEED {
            velocity = DVec2::ZERO;
        } else if speed > THROW_MAX_SPEED {
            velocity *= THROW_MAX_SPEED / speed;
        }

        if let Some(body) = bodies.get_mut(id) {
            body.hold = Hold::Free;
            body.velocity = velocity;
        }
        suppressions.insert(id, 0.0);
        debug!("grip {hand}: released body {id:?} at speed {:.3}", velocity.length());
        state.clear_hold();
    }

    /// Tracking dropped (hand invisible or classifier degenerate). A held
    /// body coasts along the damped carry velocity for a bounded grace
    /// period; anything longer, or a body moving too fast to plausibly still
    /// be in the hand, drops silently with no throw and no suppression.
    fn track_lost(hand: HandKey, state: &mut GripState, bodies: &mut Arena<Body>, dt: f64) {
        let Some(id) = state.held else {
            state.closed_frames = 0;
            state.open_frames = 0;
            return;
        };

        state.lost_frames += 1;
        let over_grace = state.lost_frames > MEMORY_HOLD_FRAMES;
        let too_fast = state.carry_velocity.length() > MEMORY_HOLD_MAX_SPEED;
        if over_grace || too_fast {
            if let Some(body) = bodies.get_mut(id) {
                if body.hold == Hold::Held(hand) {
                    body.hold = Hold::Free;
                }
            }
            debug!(
                "grip {hand}: memory hold expired (grace {}, fast {}), dropping",
                over_grace, too_fast
            );
            state.clear_hold();
            return;
        }

        state.carry_velocity *= MEMORY_HOLD_DAMPING;
        state.hold_point += state.carry_velocity * dt;
        if let Some(body) = bodies.get_mut(id) {
            body.previous_position = body.position;
            body.position = state.hold_point;
            body.velocity = state.carry_velocity;
        }
    }
}
