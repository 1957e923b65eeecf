//! Actor state: where the walking character is and how it is oriented

use glam::{Quat, Vec3};

use crate::basis::{axes_of, renormalize, FrameAxes};

/// Axis-aligned bounds reported by the asset loader, in local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
}

impl Bounds {
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            min,
            max,
            center: (min + max) * 0.5,
        }
    }

    /// Grow to include a point
    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
        self.center = (self.min + self.max) * 0.5;
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Bottom-center point, where the feet of an upright model touch the ground
    pub fn ground_contact(&self) -> Vec3 {
        Vec3::new(self.center.x, self.min.y, self.center.z)
    }
}

/// Position and frame of the walking character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    /// Actor pivot in world space (before the drag-pan world offset)
    pub position: Vec3,
    pub orientation: Quat,
    /// Height of the pivot above the sole, along the actor's up axis
    pub ground_height: f32,
    pub scale: f32,
}

impl ActorState {
    /// Place an actor so its foot-contact point sits on `foot`
    pub fn standing_at(foot: Vec3, orientation: Quat, ground_height: f32, scale: f32) -> Self {
        let mut actor = Self {
            position: Vec3::ZERO,
            orientation: renormalize(orientation),
            ground_height,
            scale,
        };
        actor.place_foot_at(foot);
        actor
    }

    pub fn axes(&self) -> FrameAxes {
        axes_of(self.orientation)
    }

    /// World point directly below the pivot, on the walking surface
    pub fn foot_contact(&self) -> Vec3 {
        self.position - self.axes().up * self.ground_height
    }

    /// Move the pivot so the foot contact lands on `foot`
    pub fn place_foot_at(&mut self, foot: Vec3) {
        self.position += foot - self.foot_contact();
    }
}
