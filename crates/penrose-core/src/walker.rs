//! Per-tick orchestration of locomotion, the auto-trigger, the corner engine
//! and clip selection.
//!
//! Each tick runs in a fixed order: a running corner owns the actor; otherwise
//! an in-place turn advances; otherwise the actor walks and the step feeds the
//! trigger. An armed corner starts as soon as the actor is walking, and an
//! armed corner that never starts is released after the grace window.
//!
//! With a [`GroundQuery`] the actor is also kept on the map: its feet are
//! settled onto the surface below every tick outside a corner, and a step
//! with no ground under it is taken back.

use glam::{Quat, Vec3};
use tracing::{debug, info, trace, warn};

use crate::actor::{ActorState, Bounds};
use crate::animation::{AnimationDirector, ClipAvailability, ClipFeedback, ClipRequest};
use crate::config::{LocomotionSettings, Settings};
use crate::corner::{CornerEngine, CornerVariant};
use crate::error::{AssetKind, IllusionError, Precondition, Result};
use crate::ground::{settle, GroundQuery};
use crate::locomotion::{Gait, Locomotion};
use crate::trigger::AutoTrigger;

/// Discrete user intents from the input mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    MovePressed,
    MoveReleased,
    TurnRequested,
    CornerRequested,
    /// Handled by the camera controller, ignored here
    ViewToggleRequested,
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WalkerEvent {
    CornerArmed,
    CornerStarted(CornerVariant),
    CornerFinished(CornerVariant),
    TurnFinished,
    /// An armed corner was dropped after waiting this long
    ArmReleased { waited: f32 },
    /// A step ran off the map and was taken back
    EdgeReached { turning: bool },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Clip change for the animation player, if any
    pub clip_request: Option<ClipRequest>,
    /// Distance walked this tick
    pub stepped: f32,
    pub events: Vec<WalkerEvent>,
}

#[derive(Debug, Clone)]
pub struct Walker {
    actor: Option<ActorState>,
    locomotion: Locomotion,
    corner: CornerEngine,
    trigger: AutoTrigger,
    director: AnimationDirector,
    clips: ClipAvailability,
    settings: LocomotionSettings,
    /// Last step was refused for lack of ground
    at_edge: bool,
    /// Accumulated simulation time
    clock: f32,
}

impl Walker {
    pub fn new(settings: &Settings) -> Self {
        let loco = &settings.locomotion;
        let corner = &settings.corner;
        Self {
            actor: None,
            locomotion: Locomotion::new(loco.walk_speed, loco.fallback_turn_secs),
            corner: CornerEngine::new(corner.params(), corner.first_variant),
            trigger: AutoTrigger::new(corner.trigger_distance, corner.arm_grace_secs)
                .with_enabled(corner.auto_trigger),
            director: AnimationDirector::new(loco.blend_secs),
            clips: ClipAvailability::default(),
            settings: loco.clone(),
            at_edge: false,
            clock: 0.0,
        }
    }

    pub fn actor(&self) -> Option<&ActorState> {
        self.actor.as_ref()
    }

    pub fn gait(&self) -> Gait {
        self.locomotion.gait()
    }

    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    pub fn corner(&self) -> &CornerEngine {
        &self.corner
    }

    pub fn trigger(&self) -> &AutoTrigger {
        &self.trigger
    }

    pub fn clips(&self) -> ClipAvailability {
        self.clips
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Standing at the map edge after a refused step
    pub fn at_edge(&self) -> bool {
        self.at_edge
    }

    /// Character asset finished loading.
    ///
    /// Places the actor at the spawn point on first load and returns the
    /// local offset that moves the model's bottom-center onto its pivot.
    pub fn attach_actor(&mut self, bounds: &Bounds) -> Vec3 {
        let model_offset = -bounds.ground_contact();
        if self.actor.is_none() {
            let actor = ActorState::standing_at(
                Vec3::from_array(self.settings.spawn),
                Quat::IDENTITY,
                self.settings.ground_offset,
                self.settings.scale,
            );
            info!(
                position = ?actor.position,
                size = ?bounds.size(),
                "Character attached"
            );
            self.actor = Some(actor);
        } else {
            debug!("Character reloaded, keeping actor state");
        }
        model_offset
    }

    /// Record which clips have finished loading
    pub fn set_clips(&mut self, clips: ClipAvailability) {
        if clips != self.clips {
            debug!(?clips, "Clip availability changed");
            self.clips = clips;
        }
    }

    /// Apply one input event. Rejected requests leave all state untouched.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::MovePressed => self.locomotion.press_move(),
            InputEvent::MoveReleased => self.locomotion.release_move(),
            InputEvent::TurnRequested => self.request_turn()?,
            InputEvent::CornerRequested => {
                if self.corner.is_active() {
                    return Err(IllusionError::InvalidPrecondition(
                        Precondition::TransitionActive,
                    ));
                }
                if !self.trigger.request(self.clock) {
                    return Err(IllusionError::InvalidPrecondition(
                        Precondition::TransitionArmed,
                    ));
                }
            }
            InputEvent::ViewToggleRequested => {}
        }
        Ok(())
    }

    /// Move the actor's foot contact to `foot`. Refused mid-corner.
    pub fn teleport(&mut self, foot: Vec3) -> Result<()> {
        if self.corner.is_active() {
            return Err(IllusionError::InvalidPrecondition(
                Precondition::TransitionActive,
            ));
        }
        let actor = self
            .actor
            .as_mut()
            .ok_or(IllusionError::MissingAsset(AssetKind::Character))?;
        actor.place_foot_at(foot);
        self.at_edge = false;
        debug!(?foot, "Actor teleported");
        Ok(())
    }

    fn request_turn(&mut self) -> Result<()> {
        let actor = self
            .actor
            .as_ref()
            .ok_or(IllusionError::MissingAsset(AssetKind::Character))?;
        if !self.clips.turn {
            return Err(IllusionError::MissingAsset(AssetKind::TurnClip));
        }
        let corner_busy = self.trigger.is_armed() || self.corner.is_active();
        self.locomotion.request_turn(actor, corner_busy)
    }

    /// Advance one simulation tick with no map to stay on.
    ///
    /// Without an actor nothing happens and `MissingAsset` is returned; the
    /// caller retries next frame.
    pub fn tick(&mut self, dt: f32, feedback: &ClipFeedback) -> Result<TickReport> {
        self.tick_on_ground(dt, feedback, None)
    }

    /// Advance one simulation tick, keeping the actor on the map that
    /// `ground` reports. `snap_to_map = false` ignores the map.
    pub fn tick_on_ground(
        &mut self,
        dt: f32,
        feedback: &ClipFeedback,
        ground: Option<&mut dyn GroundQuery>,
    ) -> Result<TickReport> {
        let mut ground = ground.filter(|_| self.settings.snap_to_map);
        let ray_height = self.settings.ray_height;
        let Some(actor) = self.actor.as_mut() else {
            trace!("Tick skipped, character not loaded");
            return Err(IllusionError::MissingAsset(AssetKind::Character));
        };
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock += dt;
        let mut report = TickReport::default();
        let mut edge_reached = false;

        if !self.corner.is_active() {
            if let Some(query) = ground.as_deref_mut() {
                settle(actor, query, ray_height);
            }
        }

        if self.corner.is_active() {
            if let Some(variant) = self.corner.update(actor, dt) {
                self.trigger.complete();
                self.locomotion.leave_transition();
                report.events.push(WalkerEvent::CornerFinished(variant));
            }
        } else if self.locomotion.is_turning() {
            if self.locomotion.advance_turn(
                actor,
                dt,
                feedback.turn_fraction,
                feedback.turn_finished,
            ) {
                report.events.push(WalkerEvent::TurnFinished);
            }
        } else {
            let before = actor.position;
            report.stepped = self.locomotion.step(actor, dt);
            if report.stepped > 0.0 {
                if let Some(query) = ground.as_deref_mut() {
                    if settle(actor, query, ray_height) {
                        self.at_edge = false;
                    } else {
                        actor.position = before;
                        report.stepped = 0.0;
                        edge_reached = !self.at_edge;
                        self.at_edge = true;
                    }
                }
            }
            if report.stepped > 0.0 && self.trigger.on_step(report.stepped, self.clock) {
                report.events.push(WalkerEvent::CornerArmed);
            }
        }

        if !self.corner.is_active()
            && self.trigger.is_pending()
            && self.locomotion.gait() == Gait::Walking
        {
            self.locomotion.enter_transition()?;
            self.trigger.mark_started();
            let variant = self.corner.start(actor).variant();
            report.events.push(WalkerEvent::CornerStarted(variant));
        }

        if let Some(IllusionError::StuckArmedTransition { waited }) = self.trigger.expire(self.clock)
        {
            report.events.push(WalkerEvent::ArmReleased { waited });
        }

        if edge_reached {
            let turning = self.settings.auto_turn_on_edge && self.turn_at_edge();
            report.events.push(WalkerEvent::EdgeReached { turning });
        }

        report.clip_request = self
            .director
            .select(self.locomotion.desired_clip(), &self.clips);
        Ok(report)
    }

    fn turn_at_edge(&mut self) -> bool {
        match self.request_turn() {
            Ok(()) => {
                info!("Map edge reached, turning around");
                true
            }
            Err(err) => {
                debug!(%err, "Map edge reached, cannot turn");
                false
            }
        }
    }

    /// Force a running corner to its terminal frame
    pub fn finish_corner(&mut self) -> Option<CornerVariant> {
        let actor = self.actor.as_mut()?;
        let variant = self.corner.finish_now(actor)?;
        self.trigger.complete();
        self.locomotion.leave_transition();
        warn!(?variant, "Corner transition forced to completion");
        Some(variant)
    }
}
