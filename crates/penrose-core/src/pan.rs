//! Drag-pan world offset for the overview camera.
//!
//! The overview camera never moves while panning; the whole world is shifted
//! under it instead, so the fixed pose stays valid.

use glam::{Vec2, Vec3};

use crate::camera::CameraMode;
use crate::pose::CameraTransform;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldOffset {
    offset: Vec3,
}

impl WorldOffset {
    /// Accumulated offset, regardless of mode
    pub fn raw(&self) -> Vec3 {
        self.offset
    }

    /// Shift the world by a pointer drag in screen pixels (y grows downward).
    ///
    /// `units_per_pixel` converts screen distance to world distance in the
    /// camera plane. Drags outside overview mode are ignored.
    pub fn drag(
        &mut self,
        mode: CameraMode,
        delta_px: Vec2,
        camera: &CameraTransform,
        units_per_pixel: f32,
    ) {
        if mode != CameraMode::Overview || !units_per_pixel.is_finite() {
            return;
        }
        let shift = camera.right() * (delta_px.x * units_per_pixel)
            - camera.up() * (delta_px.y * units_per_pixel);
        if shift.is_finite() {
            self.offset += shift;
        }
    }

    /// Offset the renderer should apply to the world root in `mode`.
    ///
    /// The walkthrough always sees the unshifted world; the overview offset
    /// is kept for the next overview visit.
    pub fn world_offset(&self, mode: CameraMode) -> Vec3 {
        match mode {
            CameraMode::Overview => self.offset,
            CameraMode::Walkthrough => Vec3::ZERO,
        }
    }

    pub fn reset(&mut self) {
        self.offset = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_drag_moves_world_with_pointer() {
        let camera = CameraTransform {
            translation: Vec3::new(0.0, 0.0, 10.0),
            rotation: Quat::IDENTITY,
        };
        let mut offset = WorldOffset::default();
        offset.drag(CameraMode::Overview, Vec2::new(10.0, 20.0), &camera, 0.5);
        assert!(offset.raw().abs_diff_eq(Vec3::new(5.0, -10.0, 0.0), 1e-6));
        // the camera itself is untouched
        assert_eq!(camera.translation, Vec3::new(0.0, 0.0, 10.0));
    }

    #[test]
    fn test_walkthrough_ignores_drag_and_sees_no_offset() {
        let camera = CameraTransform::default();
        let mut offset = WorldOffset::default();
        offset.drag(CameraMode::Overview, Vec2::new(4.0, 0.0), &camera, 1.0);
        offset.drag(CameraMode::Walkthrough, Vec2::new(100.0, 0.0), &camera, 1.0);

        assert_eq!(offset.world_offset(CameraMode::Overview), Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(offset.world_offset(CameraMode::Walkthrough), Vec3::ZERO);

        offset.reset();
        assert_eq!(offset.raw(), Vec3::ZERO);
    }
}
