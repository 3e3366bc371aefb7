//! Probe-to-body interaction for bodies nobody is gripping: a spring-damper
//! push inside a speed-widened contact radius, plus a one-shot momentum
//! impulse on the first frame of each (probe, body) encounter.

use glam::DVec2;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{
    SimulationConfig, FINGERTIP_RADIUS_FACTOR, HIT_MIN_APPROACH_SPEED, LOOKAHEAD_BOOST_CAP_FACTOR,
    LOOKAHEAD_TIME, MAX_HIT_IMPULSE, MAX_PUSH_ACCEL, PALM_IMPULSE_BOOST, PALM_RADIUS_FACTOR,
    PUSH_DAMPING, PUSH_POSITION_FACTOR, PUSH_SPRING, SHELL_FLOOR, SHELL_IMPULSE_BOOST,
    SUPPRESSION_HOLD, SUPPRESSION_RAMP, VELOCITY_TRANSFER,
};
use crate::core::body::{Body, Hold};
use crate::core::probe::{InteractionProbe, ProbeKey, ProbeKind};
use crate::utils::allocator::{Arena, BodyId};

/// Identity of one probe/body encounter, tracked across frames to tell first
/// contact from sustained contact.
pub type ContactKey = (ProbeKey, BodyId);

/// Probe influence on a just-released body: zero through the hold window,
/// then a linear ramp back to one.
pub fn suppression_influence(elapsed: f64) -> f64 {
    if elapsed < SUPPRESSION_HOLD {
        0.0
    } else {
        ((elapsed - SUPPRESSION_HOLD) / SUPPRESSION_RAMP).min(1.0)
    }
}

/// Applies every probe to every eligible body. Fills `seen_now` with the
/// contact keys active this frame; `seen_last` is the previous frame's set.
/// Returns the number of one-shot hits delivered.
#[allow(clippy::too_many_arguments)]
pub fn apply(
    probes: &[InteractionProbe],
    bodies: &mut Arena<Body>,
    precaptured: &BTreeSet<BodyId>,
    suppressions: &BTreeMap<BodyId, f64>,
    seen_last: &BTreeSet<ContactKey>,
    seen_now: &mut BTreeSet<ContactKey>,
    config: &SimulationConfig,
    dt: f64,
) -> u32 {
    let mut hits = 0;
    let ids: Vec<BodyId> = bodies.ids().collect();

    for probe in probes {
        for &id in &ids {
            let Some(body) = bodies.get_mut(id) else { continue };
            if body.hold != Hold::Free || precaptured.contains(&id) {
                continue;
            }

            let influence = suppressions
                .get(&id)
                .map(|&elapsed| suppression_influence(elapsed))
                .unwrap_or(1.0);
            if influence <= 0.0 {
                continue;
            }

            if probe_body_contact(probe, body, id, influence, seen_last, seen_now, config, dt) {
                hits += 1;
            }
        }
    }

    hits
}

#[allow(clippy::too_many_arguments)]
fn probe_body_contact(
    probe: &InteractionProbe,
    body: &mut Body,
    id: BodyId,
    influence: f64,
    seen_last: &BTreeSet<ContactKey>,
    seen_now: &mut BTreeSet<ContactKey>,
    config: &SimulationConfig,
    dt: f64,
) -> bool {
    let radius_factor = match probe.kind() {
        ProbeKind::Palm => PALM_RADIUS_FACTOR,
        ProbeKind::Fingertip => FINGERTIP_RADIUS_FACTOR,
    };
    let core_radius = radius_factor * config.body_radius * config.sensitivity;
    let boost = (probe.speed() * LOOKAHEAD_TIME)
        .min(LOOKAHEAD_BOOST_CAP_FACTOR * config.body_radius);
    let reach = core_radius + boost;

    let offset = probe.position - body.position;
    let distance = offset.length();
    if distance >= reach {
        return false;
    }

    let key = (probe.key, id);
    seen_now.insert(key);
    let first_contact = !seen_last.contains(&key);
    let shell_only = distance > core_radius;

    // Normal points from the body toward the probe; pushes act opposite it.
    // A probe sitting exactly on the center reads as having struck along its
    // own direction of motion.
    let normal = if distance > 1e-9 {
        offset / distance
    } else {
        let speed_sq = probe.velocity.length_squared();
        if speed_sq > 1e-18 {
            -probe.velocity / speed_sq.sqrt()
        } else {
            DVec2::X
        }
    };
    let away = -normal;

    let shell_scale = if shell_only {
        // Decays linearly from 1 at the core edge toward the floor at full
        // reach; a soft response for contacts registered only by lookahead.
        let through = (distance - core_radius) / boost.max(1e-9);
        1.0 - (1.0 - SHELL_FLOOR) * through.clamp(0.0, 1.0)
    } else {
        1.0
    };

    // Spring-damper push. The damping term bleeds force off as the body
    // accelerates away from the probe.
    let penetration = reach - distance;
    let receding = (body.velocity - probe.velocity).dot(away);
    let force = PUSH_SPRING * config.sensitivity * penetration - PUSH_DAMPING * receding;
    if force > 0.0 {
        let accel = (force / body.mass()).min(MAX_PUSH_ACCEL) * shell_scale * influence;
        body.velocity += away * accel * dt;
        body.position += away * accel * dt * dt * PUSH_POSITION_FACTOR;
    }

    // One-shot momentum transfer, gated to the first frame of the encounter
    // and to full (non-suppressed) influence.
    if first_contact && influence >= 1.0 {
        let approach = (probe.velocity - body.velocity).dot(-normal);
        if approach > HIT_MIN_APPROACH_SPEED {
            let mut impulse = approach * VELOCITY_TRANSFER;
            if probe.kind() == ProbeKind::Palm {
                impulse *= PALM_IMPULSE_BOOST;
            }
            if shell_only {
                impulse *= SHELL_IMPULSE_BOOST;
            }
            let impulse = impulse.min(MAX_HIT_IMPULSE);
            body.velocity += away * impulse;
            body.contact_count += 1;
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn influence_holds_then_ramps() {
        assert_eq!(suppression_influence(0.0), 0.0);
        assert_eq!(suppression_influence(SUPPRESSION_HOLD * 0.99), 0.0);
        let mid = suppression_influence(SUPPRESSION_HOLD + SUPPRESSION_RAMP * 0.5);
        assert_relative_eq!(mid, 0.5, epsilon = 1e-12);
        assert_eq!(suppression_influence(SUPPRESSION_HOLD + SUPPRESSION_RAMP), 1.0);
        assert_eq!(suppression_influence(10.0), 1.0);
    }
}
