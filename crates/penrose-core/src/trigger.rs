//! Distance-based auto-trigger for corner transitions

use tracing::{debug, warn};

use crate::error::IllusionError;

/// Whether walked distance counts up or down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionSign {
    #[default]
    Forward,
    Reverse,
}

impl DirectionSign {
    pub fn flipped(self) -> Self {
        match self {
            DirectionSign::Forward => DirectionSign::Reverse,
            DirectionSign::Reverse => DirectionSign::Forward,
        }
    }
}

/// Auto-trigger policy state
#[derive(Debug, Clone)]
pub struct AutoTrigger {
    walked_distance: f32,
    threshold: f32,
    direction: DirectionSign,
    armed: bool,
    armed_at: f32,
    started: bool,
    grace_secs: f32,
    enabled: bool,
}

impl AutoTrigger {
    pub fn new(threshold: f32, grace_secs: f32) -> Self {
        Self {
            walked_distance: 0.0,
            threshold,
            direction: DirectionSign::Forward,
            armed: false,
            armed_at: 0.0,
            started: false,
            grace_secs,
            enabled: true,
        }
    }

    /// Disable distance-based arming; manual requests still work
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn walked_distance(&self) -> f32 {
        self.walked_distance
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn direction(&self) -> DirectionSign {
        self.direction
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Armed and not yet picked up by the corner engine
    pub fn is_pending(&self) -> bool {
        self.armed && !self.started
    }

    /// Feed one locomotion step. Returns true when this step armed a corner.
    pub fn on_step(&mut self, delta: f32, now: f32) -> bool {
        if !self.enabled || !delta.is_finite() {
            return false;
        }
        match self.direction {
            DirectionSign::Forward => {
                self.walked_distance = (self.walked_distance + delta).max(0.0);
                if self.walked_distance > self.threshold {
                    self.walked_distance = 0.0;
                    return self.arm(now);
                }
            }
            DirectionSign::Reverse => {
                self.walked_distance = (self.walked_distance - delta).max(0.0);
                if self.walked_distance <= 0.0 {
                    self.walked_distance = self.threshold;
                    return self.arm(now);
                }
            }
        }
        false
    }

    /// Arm a corner on request. Returns false if one is already armed.
    pub fn request(&mut self, now: f32) -> bool {
        self.arm(now)
    }

    /// Mark the armed corner as picked up by the corner engine
    pub fn mark_started(&mut self) {
        self.started = true;
    }

    /// Called when a corner completes: disarm and flip direction.
    ///
    /// Progress is mirrored so the next leg covers the same distance.
    pub fn complete(&mut self) {
        self.armed = false;
        self.started = false;
        self.direction = self.direction.flipped();
        self.walked_distance = (self.threshold - self.walked_distance).clamp(0.0, self.threshold);
        debug!(
            direction = ?self.direction,
            walked = self.walked_distance,
            "Corner complete, trigger direction flipped"
        );
    }

    /// Release an armed corner that never started within the grace window
    pub fn expire(&mut self, now: f32) -> Option<IllusionError> {
        if !self.is_pending() {
            return None;
        }
        let waited = now - self.armed_at;
        if waited <= self.grace_secs {
            return None;
        }
        self.armed = false;
        warn!(waited, "Armed corner transition never started, releasing");
        Some(IllusionError::StuckArmedTransition { waited })
    }

    fn arm(&mut self, now: f32) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        self.started = false;
        self.armed_at = now;
        debug!(at = now, direction = ?self.direction, "Corner transition armed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_below_threshold_accumulate() {
        let mut trigger = AutoTrigger::new(9.0, 0.5);
        let steps = [0.25, 1.0, 2.5, 0.75, 4.0];
        for step in steps {
            assert!(!trigger.on_step(step, 0.0));
        }
        assert_eq!(trigger.walked_distance(), 8.5);
        assert!(!trigger.is_armed());
    }

    #[test]
    fn test_forward_arms_on_tick_nineteen() {
        let mut trigger = AutoTrigger::new(9.0, 0.5);
        let mut armed_ticks = Vec::new();
        for tick in 1..=19 {
            if trigger.on_step(0.5, tick as f32 / 60.0) {
                armed_ticks.push(tick);
            }
        }
        assert_eq!(armed_ticks, vec![19]);
        assert_eq!(trigger.walked_distance(), 0.0);
        assert!(trigger.is_armed());
    }

    #[test]
    fn test_reverse_arms_at_zero() {
        let mut trigger = AutoTrigger::new(2.0, 0.5);
        trigger.request(0.0);
        trigger.mark_started();
        trigger.complete();
        assert_eq!(trigger.direction(), DirectionSign::Reverse);
        assert_eq!(trigger.walked_distance(), 2.0);

        assert!(!trigger.on_step(1.5, 1.0));
        assert_eq!(trigger.walked_distance(), 0.5);
        assert!(trigger.on_step(0.5, 1.1));
        assert_eq!(trigger.walked_distance(), 2.0);
        assert!(trigger.is_armed());
    }

    #[test]
    fn test_negative_steps_clamp_at_zero() {
        let mut trigger = AutoTrigger::new(9.0, 0.5);
        trigger.on_step(1.0, 0.0);
        trigger.on_step(-5.0, 0.0);
        assert_eq!(trigger.walked_distance(), 0.0);
    }

    #[test]
    fn test_grace_window_release() {
        let mut trigger = AutoTrigger::new(1.0, 0.5);
        assert!(trigger.on_step(1.5, 2.0));
        assert!(trigger.expire(2.4).is_none());
        assert!(trigger.is_armed());

        let err = trigger.expire(2.6);
        assert!(matches!(err, Some(IllusionError::StuckArmedTransition { .. })));
        assert!(!trigger.is_armed());
    }

    #[test]
    fn test_started_corner_never_expires() {
        let mut trigger = AutoTrigger::new(1.0, 0.5);
        trigger.request(0.0);
        trigger.mark_started();
        assert!(trigger.expire(10.0).is_none());
        assert!(trigger.is_armed());
    }

    #[test]
    fn test_disabled_trigger_only_arms_on_request() {
        let mut trigger = AutoTrigger::new(1.0, 0.5).with_enabled(false);
        assert!(!trigger.on_step(5.0, 0.0));
        assert_eq!(trigger.walked_distance(), 0.0);
        assert!(trigger.request(0.0));
        assert!(!trigger.request(0.1));
    }
}
