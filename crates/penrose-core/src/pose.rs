//! Fixed camera pose: a camera position and look target handled as one unit

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::basis::{look_rotation, LOCAL_UP};

/// Closest the camera may get to its target
pub const MIN_POSE_DISTANCE: f32 = 1e-3;

/// World transform of a camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl CameraTransform {
    /// Direction the camera looks along
    pub fn look_direction(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Camera position + target pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub camera_position: Vec3,
    pub target: Vec3,
}

impl Pose {
    /// Create a pose. A camera sitting on its target is pushed back along +Z.
    pub fn new(camera_position: Vec3, target: Vec3) -> Self {
        let mut pose = Self {
            camera_position,
            target,
        };
        pose.enforce_min_distance(Vec3::Z);
        pose
    }

    /// Camera-to-target offset, from target to camera
    pub fn offset(&self) -> Vec3 {
        self.camera_position - self.target
    }

    pub fn distance(&self) -> f32 {
        self.offset().length()
    }

    /// Unit direction from camera to target
    pub fn look_direction(&self) -> Vec3 {
        (self.target - self.camera_position).normalize_or(Vec3::NEG_Z)
    }

    /// Translate camera and target together so the target lands on `new_target`
    pub fn recenter_to(&mut self, new_target: Vec3) {
        let shift = new_target - self.target;
        self.camera_position += shift;
        self.target = new_target;
    }

    /// Scale the camera-to-target offset around the target.
    ///
    /// Factors above 1 move the camera away. Non-finite or non-positive
    /// factors are ignored.
    pub fn push_back(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            debug!(factor, "Ignoring invalid pose pushback factor");
            return;
        }
        if factor == 1.0 {
            return;
        }
        let direction = self.offset();
        self.camera_position = self.target + direction * factor;
        self.enforce_min_distance(direction);
    }

    /// Write this pose into a camera transform
    pub fn apply_to(&self, camera: &mut CameraTransform) {
        camera.translation = self.camera_position;
        camera.rotation = look_rotation(self.target - self.camera_position, LOCAL_UP);
    }

    /// Camera transform for this pose
    pub fn transform(&self) -> CameraTransform {
        let mut camera = CameraTransform::default();
        self.apply_to(&mut camera);
        camera
    }

    fn enforce_min_distance(&mut self, fallback_direction: Vec3) {
        let offset = self.offset();
        if offset.length() >= MIN_POSE_DISTANCE {
            return;
        }
        let direction = offset
            .try_normalize()
            .or_else(|| fallback_direction.try_normalize())
            .unwrap_or(Vec3::Z);
        debug!(
            distance = offset.length(),
            "Pose distance collapsed, clamping to minimum"
        );
        self.camera_position = self.target + direction * MIN_POSE_DISTANCE;
    }
}
