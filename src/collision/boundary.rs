//! Domain boundary handling: reflective walls, toroidal wrap, and the 1D
//! ordered-stack stabilizer.

use glam::DVec2;
use log::warn;

use crate::config::{BoundaryMode, SimulationConfig, STACK_SWEEPS};
use crate::core::body::Body;
use crate::utils::allocator::{Arena, BodyId};

/// Applies the configured boundary to one free body. Pinned bodies follow
/// their controller and are left alone.
pub fn constrain(body: &mut Body, config: &SimulationConfig) {
    if body.is_pinned() {
        return;
    }
    match config.boundary {
        BoundaryMode::Walls => reflect_walls(body, config),
        BoundaryMode::Wrap => wrap(body, config),
    }
}

pub fn constrain_all(bodies: &mut Arena<Body>, config: &SimulationConfig) {
    for body in bodies.iter_mut() {
        constrain(body, config);
    }
}

fn reflect_walls(body: &mut Body, config: &SimulationConfig) {
    let limit = config.half_extent - config.body_radius;
    let bounce = config.wall_restitution * body.restitution();

    if body.position.x < -limit {
        body.position.x = -limit;
        if body.velocity.x < 0.0 {
            body.velocity.x = -body.velocity.x * bounce;
        }
    } else if body.position.x > limit {
        body.position.x = limit;
        if body.velocity.x > 0.0 {
            body.velocity.x = -body.velocity.x * bounce;
        }
    }

    if body.position.y < -limit {
        body.position.y = -limit;
        if body.velocity.y < 0.0 {
            body.velocity.y = -body.velocity.y * bounce;
        }
    } else if body.position.y > limit {
        body.position.y = limit;
        if body.velocity.y > 0.0 {
            body.velocity.y = -body.velocity.y * bounce;
        }
    }
}

/// Toroidal wrap into `±(half_extent + R)`. The ceiling-based form folds an
/// arbitrarily large overshoot back in one step instead of assuming the body
/// crossed at most once.
fn wrap(body: &mut Body, config: &SimulationConfig) {
    if !body.position.is_finite() {
        warn!("non-finite position {:?}, resetting body to origin", body.position);
        body.position = DVec2::ZERO;
        body.previous_position = DVec2::ZERO;
        body.velocity = DVec2::ZERO;
        return;
    }

    let range = config.half_extent + config.body_radius;
    let span = 2.0 * range;
    for axis in 0..2 {
        let p = body.position[axis];
        if p > range {
            body.position[axis] = p - span * ((p - range) / span).ceil();
        } else if p < -range {
            body.position[axis] = p + span * ((-range - p) / span).ceil();
        }
    }
}

/// Ordered 1D stacking stabilizer. Runs only when a true violation exists
/// (an out-of-bounds body or an under-separated adjacent pair in x-sorted
/// order) and produces a billiard-rack resting arrangement by sweeping each
/// body into the feasible interval left by its neighbors. Pinned bodies act
/// as fixed anchors.
pub fn stabilize_stack(bodies: &mut Arena<Body>, config: &SimulationConfig) {
    let limit = config.half_extent - config.body_radius;
    let min_separation = 2.0 * config.body_radius + config.contact_slack();

    let mut entries: Vec<(BodyId, f64, bool)> = bodies
        .ids()
        .filter_map(|id| {
            bodies
                .get(id)
                .map(|body| (id, body.position.x, body.is_pinned()))
        })
        .collect();
    if entries.is_empty() {
        return;
    }
    entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let out_of_bounds = entries
        .iter()
        .any(|&(_, x, pinned)| !pinned && (x < -limit || x > limit));
    let under_separated = entries
        .windows(2)
        .any(|pair| pair[1].1 - pair[0].1 < min_separation - 1e-9);
    if !out_of_bounds && !under_separated {
        return;
    }

    let count = entries.len();
    let width = 2.0 * limit;
    if (count as f64 - 1.0) * min_separation > width {
        // Strict separation cannot fit; spread the rack evenly instead.
        for (k, (_, x, pinned)) in entries.iter_mut().enumerate() {
            if *pinned {
                continue;
            }
            *x = if count == 1 {
                0.0
            } else {
                -limit + width * k as f64 / (count as f64 - 1.0)
            };
        }
    } else {
        for _ in 0..STACK_SWEEPS {
            for k in 0..count {
                let low = if k == 0 {
                    -limit
                } else {
                    entries[k - 1].1 + min_separation
                };
                if !entries[k].2 {
                    entries[k].1 = entries[k].1.max(low).min(limit);
                }
            }
            for k in (0..count).rev() {
                let high = if k == count - 1 {
                    limit
                } else {
                    entries[k + 1].1 - min_separation
                };
                if !entries[k].2 {
                    entries[k].1 = entries[k].1.min(high).max(-limit);
                }
            }
        }
    }

    for (id, x, pinned) in entries {
        if pinned {
            continue;
        }
        if let Some(body) = bodies.get_mut(id) {
            body.position.x = x;
        }
    }
}
