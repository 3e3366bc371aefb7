use glam::DVec2;
use std::collections::BTreeMap;

use crate::config::{PROBE_CAPACITY, PROBE_SAMPLE_GAP_MAX, PROBE_VELOCITY_SMOOTHING};

/// Index of a tracked hand.
pub type HandKey = u8;

/// Which landmark a probe was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProbeRole {
    ThumbTip,
    IndexTip,
    MiddleTip,
    RingTip,
    PinkyTip,
    Palm,
}

/// Contact behaviour class of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Fingertip,
    Palm,
}

impl ProbeRole {
    pub fn kind(&self) -> ProbeKind {
        match self {
            ProbeRole::Palm => ProbeKind::Palm,
            _ => ProbeKind::Fingertip,
        }
    }
}

/// Stable identity of a probe across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProbeKey {
    pub hand: HandKey,
    pub role: ProbeRole,
}

/// One tracked pointer sample, rebuilt every frame.
#[derive(Debug, Clone, Copy)]
pub struct InteractionProbe {
    pub key: ProbeKey,
    /// World-plane position.
    pub position: DVec2,
    /// Smoothed velocity estimate; zero right after a track break.
    pub velocity: DVec2,
}

impl InteractionProbe {
    pub fn kind(&self) -> ProbeKind {
        self.key.role.kind()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

impl Default for InteractionProbe {
    fn default() -> Self {
        Self {
            key: ProbeKey {
                hand: 0,
                role: ProbeRole::Palm,
            },
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
        }
    }
}

/// Fixed-capacity per-frame probe storage. Slots are preallocated for the
/// maximum landmark count; `clear` resets the length counter only.
pub struct ProbeBuffer {
    slots: [InteractionProbe; PROBE_CAPACITY],
    len: usize,
}

impl Default for ProbeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeBuffer {
    pub fn new() -> Self {
        Self {
            slots: [InteractionProbe::default(); PROBE_CAPACITY],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Stores a probe; silently ignored once the buffer is full.
    pub fn push(&mut self, probe: InteractionProbe) {
        if self.len < PROBE_CAPACITY {
            self.slots[self.len] = probe;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[InteractionProbe] {
        &self.slots[..self.len]
    }

    pub fn get(&self, key: ProbeKey) -> Option<&InteractionProbe> {
        self.as_slice().iter().find(|probe| probe.key == key)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct ProbeHistory {
    position: DVec2,
    timestamp: f64,
    velocity: DVec2,
}

/// Per-key velocity estimation across frames. A `BTreeMap` keeps iteration
/// and pruning order stable across runs.
#[derive(Default)]
pub struct ProbeTracker {
    history: BTreeMap<ProbeKey, ProbeHistory>,
}

impl ProbeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one sample and returns the updated velocity estimate: an
    /// exponential moving average of finite differences, valid only while
    /// consecutive samples arrive closer than [`PROBE_SAMPLE_GAP_MAX`].
    pub fn observe(&mut self, key: ProbeKey, position: DVec2, timestamp: f64) -> DVec2 {
        let velocity = match self.history.get(&key) {
            Some(prev) => {
                let dt = timestamp - prev.timestamp;
                if dt > 0.0 && dt < PROBE_SAMPLE_GAP_MAX {
                    let instantaneous = (position - prev.position) / dt;
                    prev.velocity.lerp(instantaneous, PROBE_VELOCITY_SMOOTHING)
                } else {
                    DVec2::ZERO
                }
            }
            None => DVec2::ZERO,
        };

        self.history.insert(
            key,
            ProbeHistory {
                position,
                timestamp,
                velocity,
            },
        );
        velocity
    }

    /// Drops histories too old to ever contribute a valid estimate again.
    pub fn prune(&mut self, now: f64) {
        self.history
            .retain(|_, entry| now - entry.timestamp <= PROBE_SAMPLE_GAP_MAX);
    }

    pub fn velocity(&self, key: ProbeKey) -> DVec2 {
        self.history
            .get(&key)
            .map(|entry| entry.velocity)
            .unwrap_or(DVec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const KEY: ProbeKey = ProbeKey {
        hand: 0,
        role: ProbeRole::IndexTip,
    };

    #[test]
    fn velocity_estimate_smooths_finite_differences() {
        let mut tracker = ProbeTracker::new();
        assert_eq!(tracker.observe(KEY, DVec2::ZERO, 0.0), DVec2::ZERO);

        // Steady 1 unit/s along x; the EMA approaches it from zero.
        let v1 = tracker.observe(KEY, DVec2::new(0.05, 0.0), 0.05);
        assert_relative_eq!(v1.x, PROBE_VELOCITY_SMOOTHING, epsilon = 1e-12);
        let v2 = tracker.observe(KEY, DVec2::new(0.10, 0.0), 0.10);
        assert!(v2.x > v1.x && v2.x < 1.0);
    }

    #[test]
    fn long_sample_gap_resets_velocity() {
        let mut tracker = ProbeTracker::new();
        tracker.observe(KEY, DVec2::ZERO, 0.0);
        tracker.observe(KEY, DVec2::new(0.05, 0.0), 0.05);
        let after_gap = tracker.observe(KEY, DVec2::new(1.0, 0.0), 0.5);
        assert_eq!(after_gap, DVec2::ZERO);
    }

    #[test]
    fn buffer_is_bounded_and_resettable() {
        let mut buffer = ProbeBuffer::new();
        for _ in 0..PROBE_CAPACITY + 4 {
            buffer.push(InteractionProbe::default());
        }
        assert_eq!(buffer.len(), PROBE_CAPACITY);
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
