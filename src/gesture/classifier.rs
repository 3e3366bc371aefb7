//! Open/closed grip heuristic over raw landmark geometry. This is deliberate
//! rule-based classification, not inference: per-finger distance ratios
//! against the palm span, with separate thresholds for the thumb.

use crate::gesture::landmarks::{
    HandFrame, INDEX_TIP, MIDDLE_TIP, PINKY_TIP, RING_TIP, THUMB_TIP,
};

/// Palm spans below this are treated as degenerate tracking output.
const PALM_SCALE_MIN: f64 = 0.01;

/// A fingertip farther than `ratio · palm_scale` from the palm center counts
/// as open. The thumb sits closer to the palm even when extended.
const OPEN_RATIO: f64 = 1.45;
const OPEN_RATIO_THUMB: f64 = 1.25;

/// A fingertip closer than `ratio · palm_scale` counts as curled.
const CLOSED_RATIO: f64 = 0.95;
const CLOSED_RATIO_THUMB: f64 = 1.1;

const OPEN_FINGERS_MIN: u32 = 3;
const CLOSED_FINGERS_MIN: u32 = 4;

const FINGERTIPS: [(usize, bool); 5] = [
    (THUMB_TIP, true),
    (INDEX_TIP, false),
    (MIDDLE_TIP, false),
    (RING_TIP, false),
    (PINKY_TIP, false),
];

/// Gesture summary for one hand and one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GripSignal {
    pub is_mostly_open: bool,
    pub is_mostly_closed: bool,
    pub open_fingers: u32,
    pub closed_fingers: u32,
    pub palm_scale: f64,
}

/// Classifies one hand frame, or `None` when the landmarks cannot support a
/// decision (degenerate palm scale, non-finite coordinates). The caller falls
/// back to memory-hold logic on `None`.
pub fn classify(frame: &HandFrame) -> Option<GripSignal> {
    if frame.landmarks.iter().any(|landmark| !landmark.is_finite()) {
        return None;
    }

    let palm_scale = frame.palm_scale();
    if palm_scale < PALM_SCALE_MIN {
        return None;
    }

    let palm_center = frame.palm_center();
    let mut open_fingers = 0;
    let mut closed_fingers = 0;

    for (tip, is_thumb) in FINGERTIPS {
        let ratio = frame.landmarks[tip].distance_2d(&palm_center) / palm_scale;
        let (open_threshold, closed_threshold) = if is_thumb {
            (OPEN_RATIO_THUMB, CLOSED_RATIO_THUMB)
        } else {
            (OPEN_RATIO, CLOSED_RATIO)
        };
        if ratio > open_threshold {
            open_fingers += 1;
        }
        if ratio < closed_threshold {
            closed_fingers += 1;
        }
    }

    Some(GripSignal {
        is_mostly_open: open_fingers >= OPEN_FINGERS_MIN,
        is_mostly_closed: closed_fingers >= CLOSED_FINGERS_MIN,
        open_fingers,
        closed_fingers,
        palm_scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::{
        Landmark, INDEX_MCP, PINKY_MCP, WRIST,
    };

    fn base_frame() -> HandFrame {
        let mut frame = HandFrame::default();
        frame.landmarks[WRIST] = Landmark::new(0.5, 0.6, 0.0);
        frame.landmarks[INDEX_MCP] = Landmark::new(0.45, 0.5, 0.0);
        frame.landmarks[PINKY_MCP] = Landmark::new(0.55, 0.5, 0.0);
        frame
    }

    fn place_tips(frame: &mut HandFrame, distance: f64) {
        let center = frame.palm_center();
        for (i, (tip, _)) in FINGERTIPS.iter().enumerate() {
            // Fan the tips out so they do not coincide.
            let angle = 1.2 + 0.2 * i as f64;
            frame.landmarks[*tip] = Landmark::new(
                center.x + distance * angle.cos(),
                center.y - distance * angle.sin(),
                0.0,
            );
        }
    }

    #[test]
    fn spread_fingers_classify_as_open() {
        let mut frame = base_frame();
        place_tips(&mut frame, 0.2);
        let signal = classify(&frame).expect("valid frame");
        assert!(signal.is_mostly_open);
        assert!(!signal.is_mostly_closed);
    }

    #[test]
    fn curled_fingers_classify_as_closed() {
        let mut frame = base_frame();
        place_tips(&mut frame, 0.05);
        let signal = classify(&frame).expect("valid frame");
        assert!(signal.is_mostly_closed);
        assert!(!signal.is_mostly_open);
    }

    #[test]
    fn degenerate_palm_scale_yields_none() {
        let mut frame = base_frame();
        frame.landmarks[PINKY_MCP] = frame.landmarks[INDEX_MCP];
        assert!(classify(&frame).is_none());
    }

    #[test]
    fn non_finite_landmarks_yield_none() {
        let mut frame = base_frame();
        place_tips(&mut frame, 0.2);
        frame.landmarks[WRIST].x = f64::NAN;
        assert!(classify(&frame).is_none());
    }
}
