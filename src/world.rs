//! Central simulation container: owns the body set and every piece of
//! cross-frame interaction state, and drives the strict per-frame phase
//! ordering.

use glam::DVec2;
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    collision::boundary,
    config::{SimulationConfig, MAX_HANDS, SUPPRESSION_HOLD, SUPPRESSION_RAMP},
    core::{
        body::{Body, Hold},
        probe::{HandKey, InteractionProbe, ProbeBuffer, ProbeKey, ProbeKind, ProbeRole, ProbeTracker},
    },
    dynamics::{
        contact_force::{self, ContactKey},
        integrator::Integrator,
    },
    gesture::{
        classifier,
        grip::{GripObservation, GripSet},
        landmarks::{HandFrame, FINGERTIP_SOURCES},
        PlaneProjector,
    },
    utils::{
        allocator::{Arena, BodyId},
        logging::ScopedTimer,
    },
};

/// The engine aggregate. All transient interaction registries live here as
/// explicit state with deterministic iteration order; nothing is global.
pub struct PhysicsWorld {
    bodies: Arena<Body>,
    grips: GripSet,
    probes: ProbeBuffer,
    probe_tracker: ProbeTracker,
    contacts_seen: BTreeSet<ContactKey>,
    suppressions: BTreeMap<BodyId, f64>,
    integrator: Integrator,
    config: SimulationConfig,
    selected: Option<BodyId>,
    clock: f64,
    contact_events: u32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            bodies: Arena::new(),
            grips: GripSet::new(),
            probes: ProbeBuffer::new(),
            probe_tracker: ProbeTracker::new(),
            contacts_seen: BTreeSet::new(),
            suppressions: BTreeMap::new(),
            integrator: Integrator::new(),
            config: config.clamped(),
            selected: None,
            clock: 0.0,
            contact_events: 0,
        }
    }

    /// Adds a body. A world already at its configured capacity rejects the
    /// insert as a no-op.
    pub fn add_body(&mut self, body: Body) -> Option<BodyId> {
        if self.bodies.len() >= self.config.max_bodies {
            return None;
        }
        Some(self.bodies.insert(body))
    }

    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.suppressions.remove(&id);
        self.bodies.remove(id)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    /// Live bodies in slot order, for the renderer.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.ids()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Marks a body as externally selected (pinned to the UI). Passing `None`
    /// clears the selection. A grip holding the newly selected body gives it
    /// up on the next update.
    pub fn set_selected(&mut self, id: Option<BodyId>) {
        if let Some(previous) = self.selected {
            if let Some(body) = self.bodies.get_mut(previous) {
                if body.hold == Hold::Selected {
                    body.hold = Hold::Free;
                }
            }
        }
        self.selected = None;
        if let Some(id) = id {
            if let Some(body) = self.bodies.get_mut(id) {
                body.hold = Hold::Selected;
                self.selected = Some(id);
            }
        }
    }

    pub fn selected(&self) -> Option<BodyId> {
        self.selected
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SimulationConfig) {
        self.config = config.clamped();
    }

    /// Velocity-resolved contacts plus one-shot probe hits during the last
    /// update.
    pub fn contact_events(&self) -> u32 {
        self.contact_events
    }

    pub fn grips(&self) -> &GripSet {
        &self.grips
    }

    /// Probes rebuilt during the last update, for diagnostics overlays.
    pub fn probes(&self) -> &[InteractionProbe] {
        self.probes.as_slice()
    }

    /// Advances the simulation one frame. Phase order is load-bearing:
    /// probes, grips, probe forces, integration, pruning.
    pub fn update(
        &mut self,
        dt: f64,
        hands: &[Option<HandFrame>],
        projector: &dyn PlaneProjector,
    ) {
        if dt <= 0.0 {
            return;
        }
        self.clock += dt;
        self.contact_events = 0;

        self.refresh_probes(hands, projector);
        let precaptured = self.update_grips(hands, dt);
        self.apply_probe_forces(&precaptured, dt);
        {
            let _timer = ScopedTimer::new("integrator");
            self.contact_events += self.integrator.step(dt, &mut self.bodies, &self.config);
        }
        self.prune(dt);
    }

    fn refresh_probes(&mut self, hands: &[Option<HandFrame>], projector: &dyn PlaneProjector) {
        let _timer = ScopedTimer::new("probes::refresh");
        self.probes.clear();

        for (hand, frame) in hands.iter().take(MAX_HANDS).enumerate() {
            let Some(frame) = frame else { continue };
            let hand = hand as HandKey;

            for (role, landmark) in FINGERTIP_SOURCES {
                let Some(position) = projector.project(frame.landmarks[landmark]) else {
                    continue;
                };
                let key = ProbeKey { hand, role };
                let velocity = self.probe_tracker.observe(key, position, self.clock);
                self.probes.push(InteractionProbe {
                    key,
                    position,
                    velocity,
                });
            }

            if let Some(position) = projector.project(frame.palm_center()) {
                let key = ProbeKey {
                    hand,
                    role: ProbeRole::Palm,
                };
                let velocity = self.probe_tracker.observe(key, position, self.clock);
                self.probes.push(InteractionProbe {
                    key,
                    position,
                    velocity,
                });
            }
        }
    }

    fn update_grips(&mut self, hands: &[Option<HandFrame>], dt: f64) -> BTreeSet<BodyId> {
        let _timer = ScopedTimer::new("grips::update");
        let mut precaptured = BTreeSet::new();
        let mut observed = [false; MAX_HANDS];

        for hand in 0..MAX_HANDS {
            let frame = hands.get(hand).and_then(|frame| frame.as_ref());
            let key = hand as HandKey;

            let palm_key = ProbeKey {
                hand: key,
                role: ProbeRole::Palm,
            };
            let anchor = self.probes.get(palm_key).map(|probe| probe.position);
            let anchor_velocity = self
                .probes
                .get(palm_key)
                .map(|probe| probe.velocity)
                .unwrap_or(DVec2::ZERO);
            let signal = frame.and_then(classifier::classify);
            observed[hand] = frame.is_some();

            let mut fingertips = [DVec2::ZERO; FINGERTIP_SOURCES.len()];
            let mut fingertip_count = 0;
            for probe in self.probes.as_slice() {
                if probe.key.hand == key && probe.kind() == ProbeKind::Fingertip {
                    fingertips[fingertip_count] = probe.position;
                    fingertip_count += 1;
                }
            }

            let observation = GripObservation {
                signal,
                anchor,
                anchor_velocity,
            };
            self.grips.update_hand(
                key,
                &observation,
                &fingertips[..fingertip_count],
                &mut self.bodies,
                &mut self.suppressions,
                &mut precaptured,
                &self.config,
                dt,
            );
        }

        self.grips.prune(&observed);
        precaptured
    }

    fn apply_probe_forces(&mut self, precaptured: &BTreeSet<BodyId>, dt: f64) {
        let _timer = ScopedTimer::new("probes::forces");
        let mut seen_now = BTreeSet::new();
        self.contact_events += contact_force::apply(
            self.probes.as_slice(),
            &mut self.bodies,
            precaptured,
            &self.suppressions,
            &self.contacts_seen,
            &mut seen_now,
            &self.config,
            dt,
        );
        self.contacts_seen = seen_now;
    }

    fn prune(&mut self, dt: f64) {
        let _timer = ScopedTimer::new("prune");
        self.probe_tracker.prune(self.clock);
        for elapsed in self.suppressions.values_mut() {
            *elapsed += dt;
        }
        self.suppressions
            .retain(|_, elapsed| *elapsed <= SUPPRESSION_HOLD + SUPPRESSION_RAMP);
    }

    /// Steps only the physics (no hands), for headless use and tests.
    pub fn step_physics(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        self.clock += dt;
        self.contact_events = self.integrator.step(dt, &mut self.bodies, &self.config);
    }

    /// Re-applies the boundary to every body without advancing time.
    pub fn clamp_to_boundary(&mut self) {
        boundary::constrain_all(&mut self.bodies, &self.config);
    }
}
