//! Animation clip selection handed to the animation player

use std::fmt;
use tracing::debug;

/// Named clips the core asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clip {
    Idle,
    Walk,
    Turn,
}

impl Clip {
    pub const ALL: [Clip; 3] = [Clip::Idle, Clip::Walk, Clip::Turn];

    /// Clip name as stored in the character asset
    pub fn name(self) -> &'static str {
        match self {
            Clip::Idle => "Idle",
            Clip::Walk => "Walk",
            Clip::Turn => "Turn",
        }
    }

    /// Turn plays once, the rest loop
    pub fn is_one_shot(self) -> bool {
        matches!(self, Clip::Turn)
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request sent to the animation player
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRequest {
    pub clip: Clip,
    /// Crossfade duration; zero means an immediate cut
    pub blend_secs: f32,
    pub looping: bool,
    pub one_shot: bool,
}

/// Which clips have finished loading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipAvailability {
    pub idle: bool,
    pub walk: bool,
    pub turn: bool,
}

impl ClipAvailability {
    pub const ALL: ClipAvailability = ClipAvailability {
        idle: true,
        walk: true,
        turn: true,
    };

    pub fn has(&self, clip: Clip) -> bool {
        match clip {
            Clip::Idle => self.idle,
            Clip::Walk => self.walk,
            Clip::Turn => self.turn,
        }
    }
}

/// Playback state of the one-shot turn clip, polled once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipFeedback {
    /// Normalized playback time of the turn clip, when it is playing
    pub turn_fraction: Option<f32>,
    /// The turn clip reached its end since the last tick
    pub turn_finished: bool,
}

/// Tracks the playing clip and issues crossfade requests on change
#[derive(Debug, Clone)]
pub struct AnimationDirector {
    current: Option<Clip>,
    blend_secs: f32,
}

impl AnimationDirector {
    pub fn new(blend_secs: f32) -> Self {
        Self {
            current: None,
            blend_secs: blend_secs.max(0.0),
        }
    }

    pub fn current(&self) -> Option<Clip> {
        self.current
    }

    /// Ask for `desired`. Returns a request only when the playing clip changes.
    ///
    /// The first activation is an immediate cut, every later change crossfades.
    /// Clips that have not loaded yet are skipped until they have.
    pub fn select(&mut self, desired: Clip, available: &ClipAvailability) -> Option<ClipRequest> {
        if self.current == Some(desired) || !available.has(desired) {
            return None;
        }
        let blend_secs = if self.current.is_none() {
            0.0
        } else {
            self.blend_secs
        };
        debug!(from = ?self.current, to = %desired, blend_secs, "Switching clip");
        self.current = Some(desired);
        Some(ClipRequest {
            clip: desired,
            blend_secs,
            looping: !desired.is_one_shot(),
            one_shot: desired.is_one_shot(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_activation_is_a_cut() {
        let mut director = AnimationDirector::new(0.3);
        let request = director.select(Clip::Idle, &ClipAvailability::ALL).unwrap();
        assert_eq!(request.blend_secs, 0.0);
        assert!(request.looping);

        let request = director.select(Clip::Walk, &ClipAvailability::ALL).unwrap();
        assert_eq!(request.blend_secs, 0.3);
        assert_eq!(director.current(), Some(Clip::Walk));
    }

    #[test]
    fn test_unchanged_clip_issues_nothing() {
        let mut director = AnimationDirector::new(0.3);
        director.select(Clip::Idle, &ClipAvailability::ALL);
        assert!(director.select(Clip::Idle, &ClipAvailability::ALL).is_none());
    }

    #[test]
    fn test_turn_is_one_shot_crossfade() {
        let mut director = AnimationDirector::new(0.25);
        director.select(Clip::Walk, &ClipAvailability::ALL);
        let request = director.select(Clip::Turn, &ClipAvailability::ALL).unwrap();
        assert!(request.one_shot);
        assert!(!request.looping);
        assert_eq!(request.blend_secs, 0.25);
    }

    #[test]
    fn test_missing_clip_waits() {
        let mut director = AnimationDirector::new(0.3);
        let only_idle = ClipAvailability {
            idle: true,
            ..Default::default()
        };
        assert!(director.select(Clip::Walk, &only_idle).is_none());
        assert_eq!(director.current(), None);
        assert!(director.select(Clip::Idle, &only_idle).is_some());
    }
}
