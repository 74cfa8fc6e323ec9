//! Turns per-frame hand landmarks into a steering direction and a boost flag.
//!
//! The tracked landmark is averaged over a short history and compared against
//! a reference origin. An axis counts once its offset passes the sensitivity
//! threshold. When both axes pass, the larger one wins and an exact tie
//! resolves to no direction.

use std::collections::VecDeque;

use crate::game::Direction;

use super::config::{GestureConfig, ReferenceOrigin};
use super::landmarks::{HandLandmarks, Landmark};

/// Result of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub direction: Option<Direction>,
    pub boosting: bool,
    pub hand_detected: bool,
    pub confidence: f32,
}

pub struct GestureClassifier {
    config: GestureConfig,
    history: VecDeque<(f32, f32)>,
    anchor: Option<(f32, f32)>,
    current: Option<Direction>,
    cooldown: u32,
    missing_frames: u32,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len),
            config,
            anchor: None,
            current: None,
            cooldown: 0,
            missing_frames: 0,
        }
    }

    /// Feed one frame's detection result
    pub fn observe(&mut self, hand: Option<&HandLandmarks>) -> Classification {
        // The cooldown counts frames, whether or not a hand is seen
        let cooling = self.cooldown > 0;
        self.cooldown = self.cooldown.saturating_sub(1);

        let tracked = hand.and_then(|h| {
            h.tracked(self.config.tracked_landmark)
                .map(|point| (h, point))
        });

        match tracked {
            Some((hand, point)) => self.observe_hand(hand, point, cooling),
            None => self.observe_missing(),
        }
    }

    pub fn current_direction(&self) -> Option<Direction> {
        self.current
    }

    /// Forget all history, as if the hand had been gone for a while
    pub fn reset(&mut self) {
        self.history.clear();
        self.anchor = None;
        self.current = None;
        self.cooldown = 0;
        self.missing_frames = 0;
    }

    fn observe_hand(
        &mut self,
        hand: &HandLandmarks,
        point: Landmark,
        cooling: bool,
    ) -> Classification {
        self.missing_frames = 0;

        if self.history.len() == self.config.history_len {
            self.history.pop_front();
        }
        self.history.push_back((point.x, point.y));
        let smoothed = self.smoothed();

        let origin = match self.config.origin {
            ReferenceOrigin::FrameCenter => Some((0.5, 0.5)),
            ReferenceOrigin::FirstStable => {
                if self.anchor.is_none() && self.history.len() == self.config.history_len {
                    self.anchor = Some(smoothed);
                }
                self.anchor
            }
        };

        let resolved = origin.and_then(|(ox, oy)| {
            resolve_direction(smoothed.0 - ox, smoothed.1 - oy, self.config.sensitivity)
        });
        self.commit(resolved, cooling);

        let boosting = hand
            .pinch_distance()
            .is_some_and(|d| d < self.config.pinch_threshold);

        Classification {
            direction: self.current,
            boosting,
            hand_detected: true,
            confidence: hand.confidence,
        }
    }

    fn observe_missing(&mut self) -> Classification {
        self.missing_frames += 1;
        if self.missing_frames > self.config.grace_frames {
            self.reset();
        }

        Classification {
            direction: self.current,
            boosting: false,
            hand_detected: false,
            confidence: 0.0,
        }
    }

    fn commit(&mut self, resolved: Option<Direction>, cooling: bool) {
        match resolved {
            None => self.current = None,
            Some(direction) if self.current == Some(direction) => {}
            Some(direction) if !cooling => {
                self.current = Some(direction);
                self.cooldown = self.config.cooldown_frames;
            }
            Some(_) => {}
        }
    }

    fn smoothed(&self) -> (f32, f32) {
        let n = self.history.len() as f32;
        let (sx, sy) = self
            .history
            .iter()
            .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
        (sx / n, sy / n)
    }
}

/// Map an offset from the origin to a direction. Image y grows downwards.
pub fn resolve_direction(dx: f32, dy: f32, threshold: f32) -> Option<Direction> {
    let horizontal = if dx > 0.0 {
        Direction::Right
    } else {
        Direction::Left
    };
    let vertical = if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    };

    match (dx.abs() > threshold, dy.abs() > threshold) {
        (false, false) => None,
        (true, false) => Some(horizontal),
        (false, true) => Some(vertical),
        (true, true) if dx.abs() > dy.abs() => Some(horizontal),
        (true, true) if dy.abs() > dx.abs() => Some(vertical),
        (true, true) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::fixtures::hand_at;

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(GestureConfig::default())
    }

    /// No smoothing or cooldown, so each frame resolves on its own
    fn immediate() -> GestureClassifier {
        GestureClassifier::new(GestureConfig {
            history_len: 1,
            cooldown_frames: 0,
            ..Default::default()
        })
    }

    #[test]
    fn test_resolve_direction() {
        assert_eq!(resolve_direction(0.0, 0.0, 0.1), None);
        assert_eq!(resolve_direction(0.2, 0.0, 0.1), Some(Direction::Right));
        assert_eq!(resolve_direction(-0.2, 0.05, 0.1), Some(Direction::Left));
        assert_eq!(resolve_direction(0.0, 0.2, 0.1), Some(Direction::Down));
        assert_eq!(resolve_direction(0.05, -0.2, 0.1), Some(Direction::Up));
        assert_eq!(resolve_direction(0.3, -0.2, 0.1), Some(Direction::Right));
        assert_eq!(resolve_direction(0.2, 0.3, 0.1), Some(Direction::Down));
    }

    #[test]
    fn test_diagonal_tie_is_no_direction() {
        assert_eq!(resolve_direction(0.25, 0.25, 0.1), None);
        assert_eq!(resolve_direction(-0.25, 0.25, 0.1), None);
    }

    #[test]
    fn test_hand_right_of_center() {
        let mut classifier = classifier();
        let result = classifier.observe(Some(&hand_at(0.8, 0.5, 0.2)));

        assert_eq!(result.direction, Some(Direction::Right));
        assert!(result.hand_detected);
        assert!(!result.boosting);
    }

    #[test]
    fn test_jitter_below_threshold_stays_none() {
        let mut classifier = classifier();
        let sensitivity = GestureConfig::default().sensitivity;

        for i in 0..60 {
            let wobble = if i % 2 == 0 { 0.9 } else { -0.9 } * sensitivity;
            let vertical = if i % 3 == 0 { 0.5 } else { -0.5 } * sensitivity;
            let result = classifier.observe(Some(&hand_at(0.5 + wobble, 0.5 + vertical, 0.2)));
            assert_eq!(result.direction, None, "frame {i}");
        }
    }

    #[test]
    fn test_single_frame_spike_is_smoothed() {
        let mut classifier = classifier();
        for _ in 0..6 {
            classifier.observe(Some(&hand_at(0.5, 0.5, 0.2)));
        }

        // One frame far to the right only moves the average by 0.3 / 6
        let result = classifier.observe(Some(&hand_at(0.8, 0.5, 0.2)));
        assert_eq!(result.direction, None);
    }

    #[test]
    fn test_pinch_sets_boost() {
        let mut classifier = classifier();
        let pinch = GestureConfig::default().pinch_threshold;

        let closed = classifier.observe(Some(&hand_at(0.5, 0.5, pinch * 0.5)));
        assert!(closed.boosting);

        let open = classifier.observe(Some(&hand_at(0.5, 0.5, pinch * 2.0)));
        assert!(!open.boosting);
    }

    #[test]
    fn test_grace_period_holds_direction() {
        let mut classifier = immediate();
        classifier.observe(Some(&hand_at(0.2, 0.5, 0.2)));
        assert_eq!(classifier.current_direction(), Some(Direction::Left));

        let grace = GestureConfig::default().grace_frames;
        for _ in 0..grace {
            let result = classifier.observe(None);
            assert_eq!(result.direction, Some(Direction::Left));
            assert!(!result.hand_detected);
            assert!(!result.boosting);
        }

        let result = classifier.observe(None);
        assert_eq!(result.direction, None);
    }

    #[test]
    fn test_hand_returning_resets_missing_count() {
        let mut classifier = immediate();
        classifier.observe(Some(&hand_at(0.5, 0.2, 0.2)));

        for _ in 0..10 {
            classifier.observe(None);
        }
        classifier.observe(Some(&hand_at(0.5, 0.2, 0.2)));
        for _ in 0..10 {
            classifier.observe(None);
        }

        assert_eq!(classifier.current_direction(), Some(Direction::Up));
    }

    #[test]
    fn test_cooldown_delays_direction_change() {
        let mut classifier = GestureClassifier::new(GestureConfig {
            history_len: 1,
            cooldown_frames: 3,
            ..Default::default()
        });

        assert_eq!(
            classifier.observe(Some(&hand_at(0.8, 0.5, 0.2))).direction,
            Some(Direction::Right)
        );
        for _ in 0..3 {
            assert_eq!(
                classifier.observe(Some(&hand_at(0.5, 0.8, 0.2))).direction,
                Some(Direction::Right)
            );
        }
        assert_eq!(
            classifier.observe(Some(&hand_at(0.5, 0.8, 0.2))).direction,
            Some(Direction::Down)
        );
    }

    #[test]
    fn test_cooldown_runs_out_while_hand_is_missing() {
        let mut classifier = GestureClassifier::new(GestureConfig {
            history_len: 1,
            cooldown_frames: 3,
            ..Default::default()
        });

        classifier.observe(Some(&hand_at(0.8, 0.5, 0.2)));
        for _ in 0..3 {
            assert_eq!(classifier.observe(None).direction, Some(Direction::Right));
        }

        assert_eq!(
            classifier.observe(Some(&hand_at(0.5, 0.8, 0.2))).direction,
            Some(Direction::Down)
        );
    }

    #[test]
    fn test_return_to_center_is_not_delayed() {
        let mut classifier = GestureClassifier::new(GestureConfig {
            history_len: 1,
            cooldown_frames: 10,
            ..Default::default()
        });

        classifier.observe(Some(&hand_at(0.8, 0.5, 0.2)));
        let result = classifier.observe(Some(&hand_at(0.5, 0.5, 0.2)));
        assert_eq!(result.direction, None);
    }

    #[test]
    fn test_first_stable_origin() {
        let mut classifier = GestureClassifier::new(GestureConfig {
            origin: ReferenceOrigin::FirstStable,
            history_len: 3,
            cooldown_frames: 0,
            ..Default::default()
        });

        // Hand rests off-centre; that becomes the origin
        for _ in 0..3 {
            let result = classifier.observe(Some(&hand_at(0.3, 0.3, 0.2)));
            assert_eq!(result.direction, None);
        }

        for _ in 0..3 {
            classifier.observe(Some(&hand_at(0.3, 0.6, 0.2)));
        }
        assert_eq!(classifier.current_direction(), Some(Direction::Down));
    }

    #[test]
    fn test_hand_without_tracked_point_counts_as_missing() {
        let mut classifier = classifier();
        let empty = HandLandmarks::new(Vec::new(), 0.9);
        let result = classifier.observe(Some(&empty));
        assert!(!result.hand_detected);
    }
}
