//! Additional 2D math helpers layered on top of `glam`.

use glam::DVec2;
use std::f64::consts::TAU;

/// Earliest time of impact in `[0, 1]` for two circles in relative motion.
///
/// `rel_start` is the relative center offset at the start of the substep,
/// `rel_delta` the change of that offset over the substep, `distance` the
/// touching distance (sum of radii). Solves
/// `|rel_start + t · rel_delta|² = distance²`.
pub fn swept_circle_toi(rel_start: DVec2, rel_delta: DVec2, distance: f64) -> Option<f64> {
    let a = rel_delta.length_squared();
    if a < 1e-18 {
        return None;
    }

    let b = 2.0 * rel_start.dot(rel_delta);
    let c = rel_start.length_squared() - distance * distance;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    // The smaller root is the moment surfaces first touch.
    let t0 = (-b - sqrt_d) / (2.0 * a);
    let t1 = (-b + sqrt_d) / (2.0 * a);

    for t in [t0, t1] {
        if (0.0..=1.0).contains(&t) {
            return Some(t);
        }
    }
    None
}

/// Deterministic unit normal for a pair of coincident bodies.
///
/// Both the discrete and continuous checks can come up empty when centers
/// coincide exactly; separation then happens along a pseudo-random angle
/// derived from a hash of the pair's slot indices, so repeated runs resolve
/// identically: `h = (i · 0x9E3779B1) ⊕ (j · 0x85EBCA77)`,
/// `angle = TAU · h / 2³²`.
pub fn pair_fallback_normal(index_a: usize, index_b: usize) -> DVec2 {
    let ha = (index_a as u32).wrapping_mul(0x9E37_79B1);
    let hb = (index_b as u32).wrapping_mul(0x85EB_CA77);
    let hash = ha ^ hb;
    let angle = TAU * (hash as f64 / 4_294_967_296.0);
    DVec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn head_on_toi_is_found_at_touch_time() {
        // Circles of touching distance 1, starting 3 apart, closing by 4 over
        // the substep: surfaces touch after half the remaining 2 gap, t = 0.5.
        let toi = swept_circle_toi(DVec2::new(3.0, 0.0), DVec2::new(-4.0, 0.0), 1.0)
            .expect("approaching circles must report impact");
        assert_relative_eq!(toi, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn separating_circles_report_no_impact() {
        assert!(swept_circle_toi(DVec2::new(3.0, 0.0), DVec2::new(2.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn fallback_normal_is_deterministic_and_unit_length() {
        let n1 = pair_fallback_normal(0, 1);
        let n2 = pair_fallback_normal(0, 1);
        assert_eq!(n1, n2);
        assert_relative_eq!(n1.length(), 1.0, epsilon = 1e-12);
        assert_ne!(pair_fallback_normal(0, 1), pair_fallback_normal(0, 2));
    }
}
