//! Pairwise narrow-phase collision detection and resolution for equal-radius
//! circles. Two code paths share one contract: the 2D path does full
//! quadratic time-of-impact continuous detection, the 1D path substitutes a
//! cheaper sign-crossing test for the constrained axis.

use glam::DVec2;

use crate::config::SimulationConfig;
use crate::core::body::Body;
use crate::utils::allocator::{Arena, BodyId};
use crate::utils::math::{pair_fallback_normal, swept_circle_toi};

/// Detection guard for the velocity pass. The position pass parks touching
/// pairs at exactly `2R + ε`; the margin keeps that separation inside the
/// impulse test under floating-point rounding.
const DETECT_MARGIN: f64 = 1e-9;

/// Resolves every unordered body pair, in ascending slot order. Position
/// correction always runs on true overlap; velocity impulses only when
/// `apply_velocity` is set. Returns the number of velocity-resolved contacts.
pub fn resolve_pairs(
    bodies: &mut Arena<Body>,
    apply_velocity: bool,
    config: &SimulationConfig,
) -> u32 {
    let ids: Vec<BodyId> = bodies.ids().collect();
    let mut resolved = 0;

    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let Some((body_a, body_b)) = bodies.get2_mut(ids[i], ids[j]) else {
                continue;
            };
            if body_a.is_pinned() && body_b.is_pinned() {
                continue;
            }

            let pair = PairIndices {
                a: ids[i].index(),
                b: ids[j].index(),
            };
            let hit = if config.constrain_to_axis {
                resolve_pair_1d(body_a, body_b, apply_velocity, config)
            } else {
                resolve_pair_2d(body_a, body_b, pair, apply_velocity, config)
            };
            if hit {
                resolved += 1;
            }
        }
    }

    resolved
}

struct PairIndices {
    a: usize,
    b: usize,
}

fn resolve_pair_2d(
    body_a: &mut Body,
    body_b: &mut Body,
    pair: PairIndices,
    apply_velocity: bool,
    config: &SimulationConfig,
) -> bool {
    let diameter = 2.0 * config.body_radius;
    let slack = config.contact_slack();
    let detect = if apply_velocity {
        diameter + slack + DETECT_MARGIN
    } else {
        diameter
    };

    let rel = body_b.position - body_a.position;
    let dist_sq = rel.length_squared();

    let normal;
    let penetration;

    if dist_sq < detect * detect {
        let dist = dist_sq.sqrt();
        if dist > 1e-9 {
            normal = rel / dist;
            penetration = diameter - dist;
        } else {
            // Coincident centers: prefer the relative velocity direction
            // (opposing the approach, so the impulse still registers), then
            // the deterministic pair-hash angle.
            let rel_vel = body_b.velocity - body_a.velocity;
            normal = if rel_vel.length_squared() > 1e-18 {
                -rel_vel.normalize()
            } else {
                pair_fallback_normal(pair.a, pair.b)
            };
            penetration = diameter;
        }
    } else {
        // Continuous check: previous substep was separated and the gap is
        // shrinking, so the surfaces may have met inside the substep.
        let prev_rel = body_b.previous_position - body_a.previous_position;
        let delta = rel - prev_rel;
        let was_separated = prev_rel.length_squared() >= diameter * diameter;
        if !was_separated || delta.dot(prev_rel) >= 0.0 {
            return false;
        }
        let Some(toi) = swept_circle_toi(prev_rel, delta, diameter) else {
            return false;
        };
        let impact_rel = prev_rel + delta * toi;
        let impact_len = impact_rel.length();
        normal = if impact_len > 1e-9 {
            impact_rel / impact_len
        } else {
            pair_fallback_normal(pair.a, pair.b)
        };
        // The pair may already have passed through; measure separation along
        // the impact normal, where it can be negative.
        penetration = diameter - rel.dot(normal);
    }

    apply_correction(body_a, body_b, normal, penetration, slack, apply_velocity)
}

fn resolve_pair_1d(
    body_a: &mut Body,
    body_b: &mut Body,
    apply_velocity: bool,
    config: &SimulationConfig,
) -> bool {
    let diameter = 2.0 * config.body_radius;
    let slack = config.contact_slack();
    let detect = if apply_velocity {
        diameter + slack + DETECT_MARGIN
    } else {
        diameter
    };

    let rel_x = body_b.position.x - body_a.position.x;
    let prev_rel_x = body_b.previous_position.x - body_a.previous_position.x;

    // Normal sign from the previous substep (stable under coincident
    // centers), then current separation, then relative velocity, then +x.
    let sign = if prev_rel_x.abs() > 1e-9 {
        prev_rel_x.signum()
    } else if rel_x.abs() > 1e-9 {
        rel_x.signum()
    } else {
        let dv = body_b.velocity.x - body_a.velocity.x;
        if dv.abs() > 1e-9 {
            dv.signum()
        } else {
            1.0
        }
    };
    let normal = DVec2::new(sign, 0.0);

    let crossed = prev_rel_x * rel_x < 0.0;
    let overlapping = rel_x.abs() < detect;
    if !crossed && !overlapping {
        return false;
    }

    let inv_a = body_a.inverse_mass();
    let inv_b = body_b.inverse_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return false;
    }

    if crossed {
        // The pair swapped sides inside the substep. Re-establish minimum
        // separation along the resolved normal, then let the impulse run;
        // this stands in for quadratic TOI on the constrained axis.
        let min_separation = diameter + slack;
        let error = sign * min_separation - rel_x;
        body_a.position.x -= error * inv_a / inv_sum;
        body_b.position.x += error * inv_b / inv_sum;
    } else {
        let separation = rel_x * sign;
        let penetration = diameter - separation;
        if penetration > 0.0 {
            let push = (penetration + slack) / inv_sum;
            body_a.position.x -= sign * push * inv_a;
            body_b.position.x += sign * push * inv_b;
        }
    }

    if !apply_velocity {
        return false;
    }
    resolve_velocity(body_a, body_b, normal, inv_a, inv_b)
}

fn apply_correction(
    body_a: &mut Body,
    body_b: &mut Body,
    normal: DVec2,
    penetration: f64,
    slack: f64,
    apply_velocity: bool,
) -> bool {
    let inv_a = body_a.inverse_mass();
    let inv_b = body_b.inverse_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return false;
    }

    if penetration > 0.0 {
        let push = (penetration + slack) / inv_sum;
        body_a.position -= normal * push * inv_a;
        body_b.position += normal * push * inv_b;
    }

    if !apply_velocity {
        return false;
    }
    resolve_velocity(body_a, body_b, normal, inv_a, inv_b)
}

/// Standard inverse-mass impulse with the pair's restitution taken as the
/// minimum of the two bodies'. Only approaching pairs receive an impulse.
fn resolve_velocity(
    body_a: &mut Body,
    body_b: &mut Body,
    normal: DVec2,
    inv_a: f64,
    inv_b: f64,
) -> bool {
    let rel_vel = body_b.velocity - body_a.velocity;
    let along_normal = rel_vel.dot(normal);
    if along_normal >= 0.0 {
        return false;
    }

    let restitution = body_a.restitution().min(body_b.restitution());
    let impulse = -(1.0 + restitution) * along_normal / (inv_a + inv_b);

    body_a.velocity -= normal * impulse * inv_a;
    body_b.velocity += normal * impulse * inv_b;
    body_a.contact_count += 1;
    body_b.contact_count += 1;
    true
}
