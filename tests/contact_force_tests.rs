use orbgrip::dynamics::contact_force::{self, suppression_influence};
use orbgrip::*;
use std::collections::{BTreeMap, BTreeSet};

const DT: f64 = 1.0 / 60.0;

fn probe(role: ProbeRole, position: DVec2, velocity: DVec2) -> InteractionProbe {
    InteractionProbe {
        key: ProbeKey { hand: 0, role },
        position,
        velocity,
    }
}

struct Rig {
    bodies: Arena<Body>,
    precaptured: BTreeSet<BodyId>,
    suppressions: BTreeMap<BodyId, f64>,
    seen_last: BTreeSet<ContactKey>,
    config: SimulationConfig,
}

impl Rig {
    fn new() -> (Self, BodyId) {
        let mut bodies = Arena::new();
        let id = bodies.insert(Body::new(DVec2::ZERO));
        (
            Self {
                bodies,
                precaptured: BTreeSet::new(),
                suppressions: BTreeMap::new(),
                seen_last: BTreeSet::new(),
                config: SimulationConfig::default(),
            },
            id,
        )
    }

    fn apply(&mut self, probes: &[InteractionProbe]) -> (u32, BTreeSet<ContactKey>) {
        let mut seen_now = BTreeSet::new();
        let hits = contact_force::apply(
            probes,
            &mut self.bodies,
            &self.precaptured,
            &self.suppressions,
            &self.seen_last,
            &mut seen_now,
            &self.config,
            DT,
        );
        (hits, seen_now)
    }
}

#[test]
fn overlapping_probe_pushes_the_body_away() {
    let (mut rig, id) = Rig::new();
    // Fingertip core radius is 1.25 · R = 0.625; the probe overlaps.
    let probes = [probe(ProbeRole::IndexTip, DVec2::new(0.4, 0.0), DVec2::ZERO)];

    let (hits, seen) = rig.apply(&probes);

    let body = rig.bodies.get(id).unwrap();
    assert!(body.velocity.x < 0.0, "push must point away from the probe");
    assert!(body.position.x < 0.0, "push includes a position nudge");
    assert_eq!(hits, 0, "a resting probe is not a hit");
    assert_eq!(seen.len(), 1);
}

#[test]
fn first_contact_delivers_a_one_shot_impulse() {
    let (mut rig, id) = Rig::new();
    let probes = [probe(
        ProbeRole::IndexTip,
        DVec2::new(-0.5, 0.0),
        DVec2::new(5.0, 0.0),
    )];

    let (hits, seen) = rig.apply(&probes);
    assert_eq!(hits, 1);
    assert_eq!(rig.bodies.get(id).unwrap().contact_count, 1);
    let after_hit = rig.bodies.get(id).unwrap().velocity.x;
    assert!(after_hit > 3.0, "impulse transfers most of the approach speed");

    // Sustained contact: same key seen last frame, no second impulse.
    rig.seen_last = seen;
    let (hits, _) = rig.apply(&probes);
    assert_eq!(hits, 0);
    assert_eq!(rig.bodies.get(id).unwrap().contact_count, 1);
}

#[test]
fn suppressed_body_is_skipped_entirely() {
    let (mut rig, id) = Rig::new();
    rig.suppressions.insert(id, 0.0);
    let probes = [probe(
        ProbeRole::IndexTip,
        DVec2::new(-0.5, 0.0),
        DVec2::new(5.0, 0.0),
    )];

    let (hits, seen) = rig.apply(&probes);

    assert_eq!(hits, 0);
    assert!(seen.is_empty(), "zero influence records no contact");
    assert_eq!(rig.bodies.get(id).unwrap().velocity, DVec2::ZERO);
}

#[test]
fn ramping_influence_pushes_but_withholds_the_impulse() {
    let (mut rig, id) = Rig::new();
    // Halfway through the ramp: influence in (0, 1).
    let elapsed = 0.18 + 0.25 * 0.5;
    assert!(suppression_influence(elapsed) > 0.0 && suppression_influence(elapsed) < 1.0);
    rig.suppressions.insert(id, elapsed);
    let probes = [probe(
        ProbeRole::IndexTip,
        DVec2::new(-0.5, 0.0),
        DVec2::new(5.0, 0.0),
    )];

    let (hits, seen) = rig.apply(&probes);

    assert_eq!(hits, 0, "one-shot impulse requires full influence");
    assert_eq!(seen.len(), 1, "the contact key is still recorded");
    let body = rig.bodies.get(id).unwrap();
    assert!(body.velocity.x > 0.0, "the scaled push still applies");
}

#[test]
fn palm_probes_reach_farther_than_fingertips() {
    let (mut rig, _id) = Rig::new();
    let position = DVec2::new(0.8, 0.0);

    let (_, seen) = rig.apply(&[probe(ProbeRole::IndexTip, position, DVec2::ZERO)]);
    assert!(seen.is_empty(), "0.8 is outside the fingertip core radius");

    let (_, seen) = rig.apply(&[probe(ProbeRole::Palm, position, DVec2::ZERO)]);
    assert_eq!(seen.len(), 1, "0.8 is inside the palm core radius (0.95)");
}

#[test]
fn probe_speed_widens_the_contact_radius() {
    let (mut rig, _id) = Rig::new();
    let position = DVec2::new(0.8, 0.0);

    // A fast fingertip gains up to 0.3 of lookahead reach: 0.625 + 0.3 > 0.8.
    let (_, seen) = rig.apply(&[probe(
        ProbeRole::IndexTip,
        position,
        DVec2::new(-6.0, 0.0),
    )]);
    assert_eq!(seen.len(), 1);
}

#[test]
fn pinned_and_precaptured_bodies_are_untouched() {
    let (mut rig, id) = Rig::new();
    let probes = [probe(
        ProbeRole::IndexTip,
        DVec2::new(-0.5, 0.0),
        DVec2::new(5.0, 0.0),
    )];

    rig.bodies.get_mut(id).unwrap().hold = Hold::Held(0);
    let (hits, seen) = rig.apply(&probes);
    assert_eq!((hits, seen.len()), (0, 0));

    rig.bodies.get_mut(id).unwrap().hold = Hold::Free;
    rig.precaptured.insert(id);
    let (hits, seen) = rig.apply(&probes);
    assert_eq!((hits, seen.len()), (0, 0));
    assert_eq!(rig.bodies.get(id).unwrap().velocity, DVec2::ZERO);
}
