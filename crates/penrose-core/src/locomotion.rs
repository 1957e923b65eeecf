//! Locomotion state machine: idle, walking, turning in place and the
//! hand-off to corner transitions

use glam::Quat;
use std::f32::consts::PI;
use tracing::debug;

use crate::actor::ActorState;
use crate::animation::Clip;
use crate::error::{IllusionError, Precondition, Result};

/// Current gait. Turning and transitioning are exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gait {
    #[default]
    Idle,
    Walking,
    TurningInPlace,
    Transitioning,
}

/// In-place 180° turn progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnInPlace {
    pub start_orientation: Quat,
    /// Normalized progress in `[0, 1]`
    pub fraction: f32,
    /// Whether the turn clip has reported playback time yet
    clip_driven: bool,
}

impl TurnInPlace {
    fn new(start_orientation: Quat) -> Self {
        Self {
            start_orientation,
            fraction: 0.0,
            clip_driven: false,
        }
    }

    /// Orientation at the current fraction
    pub fn orientation(&self) -> Quat {
        (self.start_orientation * Quat::from_rotation_y(PI * self.fraction)).normalize()
    }
}

#[derive(Debug, Clone)]
pub struct Locomotion {
    gait: Gait,
    move_held: bool,
    turn: Option<TurnInPlace>,
    walk_speed: f32,
    /// Turn duration used only until the turn clip reports progress
    fallback_turn_secs: f32,
}

impl Locomotion {
    pub fn new(walk_speed: f32, fallback_turn_secs: f32) -> Self {
        Self {
            gait: Gait::Idle,
            move_held: false,
            turn: None,
            walk_speed,
            fallback_turn_secs: fallback_turn_secs.max(f32::EPSILON),
        }
    }

    pub fn gait(&self) -> Gait {
        self.gait
    }

    pub fn move_held(&self) -> bool {
        self.move_held
    }

    pub fn walk_speed(&self) -> f32 {
        self.walk_speed
    }

    pub fn turn(&self) -> Option<&TurnInPlace> {
        self.turn.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.gait == Gait::Transitioning
    }

    pub fn is_turning(&self) -> bool {
        self.gait == Gait::TurningInPlace
    }

    /// Walking, or being carried around a corner
    pub fn is_moving(&self) -> bool {
        matches!(self.gait, Gait::Walking | Gait::Transitioning)
    }

    pub fn press_move(&mut self) {
        self.move_held = true;
        if self.gait == Gait::Idle {
            self.gait = Gait::Walking;
        }
    }

    pub fn release_move(&mut self) {
        self.move_held = false;
        if self.gait == Gait::Walking {
            self.gait = Gait::Idle;
        }
    }

    /// Start a 180° turn. Refused while a corner is armed or running.
    pub fn request_turn(&mut self, actor: &ActorState, corner_armed: bool) -> Result<()> {
        match self.gait {
            Gait::Transitioning => {
                return Err(IllusionError::InvalidPrecondition(
                    Precondition::TransitionActive,
                ))
            }
            Gait::TurningInPlace => {
                return Err(IllusionError::InvalidPrecondition(
                    Precondition::AlreadyTurning,
                ))
            }
            Gait::Idle | Gait::Walking => {}
        }
        if corner_armed {
            return Err(IllusionError::InvalidPrecondition(
                Precondition::TransitionArmed,
            ));
        }
        self.turn = Some(TurnInPlace::new(actor.orientation));
        self.gait = Gait::TurningInPlace;
        debug!("Turn in place started");
        Ok(())
    }

    /// Advance an in-place turn from clip feedback. Returns true when it ends.
    pub fn advance_turn(
        &mut self,
        actor: &mut ActorState,
        dt: f32,
        clip_fraction: Option<f32>,
        clip_finished: bool,
    ) -> bool {
        let Some(turn) = self.turn.as_mut() else {
            return false;
        };
        if let Some(fraction) = clip_fraction.filter(|f| f.is_finite()) {
            turn.clip_driven = true;
            turn.fraction = turn.fraction.max(fraction.clamp(0.0, 1.0));
        } else if !turn.clip_driven {
            turn.fraction = (turn.fraction + dt / self.fallback_turn_secs).min(1.0);
        }
        if clip_finished {
            turn.fraction = 1.0;
        }
        actor.orientation = turn.orientation();

        if turn.fraction < 1.0 {
            return false;
        }
        actor.orientation = (turn.start_orientation * Quat::from_rotation_y(PI)).normalize();
        self.turn = None;
        self.gait = self.resting_gait();
        debug!(gait = ?self.gait, "Turn in place complete");
        true
    }

    /// Per-tick forward advance. Returns the distance stepped.
    pub fn step(&self, actor: &mut ActorState, dt: f32) -> f32 {
        if self.gait != Gait::Walking || !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        let distance = self.walk_speed * actor.scale * dt;
        actor.position += actor.axes().forward * distance;
        distance
    }

    /// Hand control to the corner engine. Only valid while walking.
    pub fn enter_transition(&mut self) -> Result<()> {
        if self.gait != Gait::Walking {
            return Err(IllusionError::InvalidPrecondition(Precondition::NotWalking));
        }
        self.gait = Gait::Transitioning;
        Ok(())
    }

    /// Corner finished: back to walking or idle depending on held input
    pub fn leave_transition(&mut self) {
        if self.gait == Gait::Transitioning {
            self.gait = self.resting_gait();
        }
    }

    /// Clip the animation player should be showing
    pub fn desired_clip(&self) -> Clip {
        if self.is_turning() {
            Clip::Turn
        } else if self.is_moving() {
            Clip::Walk
        } else {
            Clip::Idle
        }
    }

    fn resting_gait(&self) -> Gait {
        if self.move_held {
            Gait::Walking
        } else {
            Gait::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn actor() -> ActorState {
        ActorState::standing_at(Vec3::ZERO, Quat::IDENTITY, 0.0, 1.0)
    }

    #[test]
    fn test_move_press_and_release() {
        let mut loco = Locomotion::new(1.5, 1.0);
        assert_eq!(loco.gait(), Gait::Idle);
        loco.press_move();
        assert_eq!(loco.gait(), Gait::Walking);
        assert_eq!(loco.desired_clip(), Clip::Walk);
        loco.release_move();
        assert_eq!(loco.gait(), Gait::Idle);
        assert_eq!(loco.desired_clip(), Clip::Idle);
    }

    #[test]
    fn test_step_uses_speed_scale_and_dt() {
        let mut loco = Locomotion::new(2.0, 1.0);
        let mut actor = actor();
        actor.scale = 0.5;
        assert_eq!(loco.step(&mut actor, 0.1), 0.0);

        loco.press_move();
        let distance = loco.step(&mut actor, 0.25);
        assert_eq!(distance, 0.25);
        assert!(actor.position.abs_diff_eq(Vec3::new(0.0, 0.0, 0.25), 1e-6));
    }

    #[test]
    fn test_turn_refused_while_corner_busy() {
        let mut loco = Locomotion::new(1.5, 1.0);
        let actor = actor();
        loco.press_move();
        assert_eq!(
            loco.request_turn(&actor, true),
            Err(IllusionError::InvalidPrecondition(Precondition::TransitionArmed))
        );
        loco.enter_transition().unwrap();
        assert_eq!(
            loco.request_turn(&actor, false),
            Err(IllusionError::InvalidPrecondition(Precondition::TransitionActive))
        );
    }

    #[test]
    fn test_turn_follows_clip_fraction_and_restores_walk() {
        let mut loco = Locomotion::new(1.5, 1.0);
        let mut actor = actor();
        loco.press_move();
        loco.request_turn(&actor, false).unwrap();
        assert_eq!(loco.desired_clip(), Clip::Turn);
        assert_eq!(loco.step(&mut actor, 1.0), 0.0);

        assert!(!loco.advance_turn(&mut actor, 0.016, Some(0.5), false));
        assert!(actor.axes().forward.abs_diff_eq(Vec3::X, 1e-5));

        assert!(loco.advance_turn(&mut actor, 0.016, Some(0.97), true));
        assert!(actor.axes().forward.abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert_eq!(loco.gait(), Gait::Walking);
    }

    #[test]
    fn test_turn_restores_idle_when_released() {
        let mut loco = Locomotion::new(1.5, 1.0);
        let mut actor = actor();
        loco.press_move();
        loco.request_turn(&actor, false).unwrap();
        loco.release_move();
        assert_eq!(loco.gait(), Gait::TurningInPlace);
        assert!(loco.advance_turn(&mut actor, 0.0, None, true));
        assert_eq!(loco.gait(), Gait::Idle);
    }

    #[test]
    fn test_turn_falls_back_to_duration_without_clip_time() {
        let mut loco = Locomotion::new(1.5, 0.5);
        let mut actor = actor();
        loco.request_turn(&actor, false).unwrap();
        assert!(!loco.advance_turn(&mut actor, 0.25, None, false));
        assert!(loco.advance_turn(&mut actor, 0.25, None, false));
        assert_eq!(
            loco.request_turn(&actor, false).map(|_| loco.gait()),
            Ok(Gait::TurningInPlace)
        );
    }

    #[test]
    fn test_transition_only_from_walking() {
        let mut loco = Locomotion::new(1.5, 1.0);
        assert!(loco.enter_transition().is_err());
        loco.press_move();
        loco.enter_transition().unwrap();
        assert_eq!(loco.desired_clip(), Clip::Walk);
        loco.release_move();
        assert_eq!(loco.gait(), Gait::Transitioning);
        loco.leave_transition();
        assert_eq!(loco.gait(), Gait::Idle);
    }
}
