//! Corner transitions: rotate the actor onto an adjacent face while its feet
//! follow a quarter-circle around the edge.
//!
//! Orientation and foot position are both driven by the same elapsed angle.

use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, info};

use crate::actor::ActorState;
use crate::basis::{axes_of, from_basis, slerp, FrameAxes};

/// Angular budget of one corner
pub const QUARTER_TURN: f32 = FRAC_PI_2;

/// Elapsed angles this close to the budget count as complete
pub const ANGLE_EPSILON: f32 = 1e-4;

/// Handedness of a corner. Alternates after every completed corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerVariant {
    /// Composed rotation: quarter turn about right, then about the new forward
    #[default]
    Left,
    /// Direct basis: new up = -old right, new forward = -old up
    Right,
}

impl CornerVariant {
    /// Sign of the lateral foot offset along the start right axis
    pub fn lateral_sign(self) -> f32 {
        match self {
            CornerVariant::Left => 1.0,
            CornerVariant::Right => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            CornerVariant::Left => CornerVariant::Right,
            CornerVariant::Right => CornerVariant::Left,
        }
    }
}

/// Tunables of the corner geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerParams {
    /// Radius of the foot arc
    pub distance: f32,
    /// Distance from the actor's feet to the face edge
    pub half_face_size: f32,
    /// Angular speed in radians per second
    pub turn_speed: f32,
}

impl Default for CornerParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            half_face_size: 0.5,
            turn_speed: 60f32.to_radians(),
        }
    }
}

/// Ephemeral record of a running corner transition
#[derive(Debug, Clone)]
pub struct CornerTransition {
    variant: CornerVariant,
    start_position: Vec3,
    start_orientation: Quat,
    start_axes: FrameAxes,
    pivot: Vec3,
    end_orientation: Quat,
    /// Start foot contact relative to the pivot
    start_offset: Vec3,
    /// Target foot contact relative to the pivot
    target_offset: Vec3,
    distance: f32,
    elapsed: f32,
}

impl CornerTransition {
    /// Capture the actor's frame and precompute pivot, end orientation and
    /// target foot contact
    pub fn begin(actor: &ActorState, variant: CornerVariant, params: &CornerParams) -> Self {
        let start_orientation = actor.orientation;
        let axes = axes_of(start_orientation);
        let foot = actor.foot_contact();
        let pivot = foot + axes.forward * params.half_face_size;
        let d = params.distance;

        let end_orientation = match variant {
            CornerVariant::Left => composed_rotation(start_orientation, QUARTER_TURN),
            CornerVariant::Right => {
                let up = -axes.right;
                let forward = -axes.up;
                from_basis(up.cross(forward), up, forward)
            }
        };

        let target = foot + axes.right * (variant.lateral_sign() * d) - axes.up * d
            + axes.forward * d;

        Self {
            variant,
            start_position: actor.position,
            start_orientation,
            start_axes: axes,
            pivot,
            end_orientation,
            start_offset: foot - pivot,
            target_offset: target - pivot,
            distance: d,
            elapsed: 0.0,
        }
    }

    pub fn variant(&self) -> CornerVariant {
        self.variant
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    pub fn start_position(&self) -> Vec3 {
        self.start_position
    }

    pub fn start_orientation(&self) -> Quat {
        self.start_orientation
    }

    pub fn end_orientation(&self) -> Quat {
        self.end_orientation
    }

    pub fn start_sole(&self) -> Vec3 {
        self.pivot + self.start_offset
    }

    /// Precomputed foot contact at the end of the corner
    pub fn target_sole(&self) -> Vec3 {
        self.pivot + self.target_offset
    }

    /// Elapsed angle in radians
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Normalized progress in `[0, 1]`
    pub fn alpha(&self) -> f32 {
        self.elapsed / QUARTER_TURN
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= QUARTER_TURN
    }

    /// Orientation after sweeping `angle` radians of the corner
    pub fn orientation_at(&self, angle: f32) -> Quat {
        let angle = angle.clamp(0.0, QUARTER_TURN);
        match self.variant {
            CornerVariant::Left => composed_rotation(self.start_orientation, angle),
            CornerVariant::Right => slerp(
                self.start_orientation,
                self.end_orientation,
                angle / QUARTER_TURN,
            ),
        }
    }

    /// Foot contact after sweeping `angle` radians of the corner
    pub fn foot_at(&self, angle: f32) -> Vec3 {
        if angle >= QUARTER_TURN {
            return self.target_sole();
        }
        let angle = angle.max(0.0);
        let (sin, cos) = angle.sin_cos();
        let d = self.distance;
        let axes = &self.start_axes;
        let arc = axes.forward * (d * sin) - axes.up * (d * (1.0 - cos))
            + axes.right * (self.variant.lateral_sign() * d * sin);
        self.pivot + self.start_offset + arc
    }

    /// Advance by `turn_speed * dt` and move the actor. Returns true once
    /// the quarter turn is complete.
    pub fn advance(&mut self, actor: &mut ActorState, dt: f32, turn_speed: f32) -> bool {
        let step = (turn_speed * dt).max(0.0);
        self.set_elapsed(self.elapsed + step);
        self.apply(actor);
        self.is_complete()
    }

    /// Jump straight to the terminal angle
    pub fn finish_now(&mut self, actor: &mut ActorState) {
        self.set_elapsed(QUARTER_TURN);
        self.apply(actor);
    }

    fn set_elapsed(&mut self, angle: f32) {
        let angle = if angle.is_finite() { angle } else { QUARTER_TURN };
        self.elapsed = if QUARTER_TURN - angle <= ANGLE_EPSILON {
            QUARTER_TURN
        } else {
            angle.max(0.0)
        };
    }

    /// Set the orientation for the current angle, then shift the actor by the
    /// gap between desired and current foot contact.
    fn apply(&self, actor: &mut ActorState) {
        actor.orientation = if self.is_complete() {
            self.end_orientation
        } else {
            self.orientation_at(self.elapsed)
        };
        let desired = self.foot_at(self.elapsed);
        actor.position += desired - actor.foot_contact();
    }
}

/// Quarter-turn composition swept to `angle`: about the own right axis, then
/// about the resulting forward axis
fn composed_rotation(start: Quat, angle: f32) -> Quat {
    (start * Quat::from_rotation_x(angle) * Quat::from_rotation_z(angle)).normalize()
}

/// Owns the running transition and the alternating handedness
#[derive(Debug, Clone)]
pub struct CornerEngine {
    params: CornerParams,
    next_variant: CornerVariant,
    active: Option<CornerTransition>,
}

impl CornerEngine {
    pub fn new(params: CornerParams, first_variant: CornerVariant) -> Self {
        Self {
            params,
            next_variant: first_variant,
            active: None,
        }
    }

    pub fn params(&self) -> &CornerParams {
        &self.params
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&CornerTransition> {
        self.active.as_ref()
    }

    /// Variant the next corner will use
    pub fn next_variant(&self) -> CornerVariant {
        self.next_variant
    }

    /// Begin a corner from the actor's current frame
    pub fn start(&mut self, actor: &ActorState) -> &CornerTransition {
        let transition = CornerTransition::begin(actor, self.next_variant, &self.params);
        info!(
            variant = ?transition.variant(),
            pivot = ?transition.pivot(),
            target = ?transition.target_sole(),
            "Corner transition started"
        );
        self.active.insert(transition)
    }

    /// Advance the running corner. Returns the finished variant on completion.
    pub fn update(&mut self, actor: &mut ActorState, dt: f32) -> Option<CornerVariant> {
        let turn_speed = self.params.turn_speed;
        let transition = self.active.as_mut()?;
        if transition.advance(actor, dt, turn_speed) {
            return self.finish();
        }
        None
    }

    /// Force the running corner to its terminal angle and complete it
    pub fn finish_now(&mut self, actor: &mut ActorState) -> Option<CornerVariant> {
        let transition = self.active.as_mut()?;
        transition.finish_now(actor);
        self.finish()
    }

    fn finish(&mut self) -> Option<CornerVariant> {
        let done = self.active.take()?;
        self.next_variant = done.variant().flipped();
        debug!(variant = ?done.variant(), next = ?self.next_variant, "Corner transition complete");
        Some(done.variant())
    }
}
