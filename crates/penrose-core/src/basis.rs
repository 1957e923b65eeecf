//! Frame basis math: local axes of an orientation, axis rotations and
//! spherical interpolation.
//!
//! Local frame convention (actor space):
//! - forward = (0, 0, 1)
//! - up      = (0, 1, 0)
//! - right   = (1, 0, 0)
//!
//! Cameras follow the usual render convention instead and look down -Z,
//! see [`look_rotation`].

use glam::{Mat3, Quat, Vec3};

/// Local forward axis
pub const LOCAL_FORWARD: Vec3 = Vec3::Z;
/// Local up axis
pub const LOCAL_UP: Vec3 = Vec3::Y;
/// Local right axis
pub const LOCAL_RIGHT: Vec3 = Vec3::X;

/// Quaternions shorter than this are treated as degenerate
const DEGENERATE_QUAT_LENGTH: f32 = 1e-6;

/// World-space axes derived from an orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAxes {
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl FrameAxes {
    /// Axes of the identity orientation
    pub const IDENTITY: FrameAxes = FrameAxes {
        forward: LOCAL_FORWARD,
        up: LOCAL_UP,
        right: LOCAL_RIGHT,
    };
}

/// Re-normalize an orientation that may have drifted from unit length.
///
/// A near-zero quaternion has no meaningful direction and maps to identity.
pub fn renormalize(orientation: Quat) -> Quat {
    let length = orientation.length();
    if !length.is_finite() || length < DEGENERATE_QUAT_LENGTH {
        Quat::IDENTITY
    } else {
        orientation / length
    }
}

/// Derive the forward/up/right axes of an orientation
pub fn axes_of(orientation: Quat) -> FrameAxes {
    let q = renormalize(orientation);
    FrameAxes {
        forward: (q * LOCAL_FORWARD).normalize(),
        up: (q * LOCAL_UP).normalize(),
        right: (q * LOCAL_RIGHT).normalize(),
    }
}

/// Rotation of `angle` radians around `axis`. A zero axis yields identity.
pub fn compose_around_axis(axis: Vec3, angle: f32) -> Quat {
    match axis.try_normalize() {
        Some(axis) => Quat::from_axis_angle(axis, angle),
        None => Quat::IDENTITY,
    }
}

/// Spherical interpolation with `t` clamped to `[0, 1]`
pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    renormalize(a).slerp(renormalize(b), t)
}

/// Build an orientation directly from its world-space axes.
///
/// The axes must be orthonormal and right-handed (`right × up = forward`).
pub fn from_basis(right: Vec3, up: Vec3, forward: Vec3) -> Quat {
    renormalize(Quat::from_mat3(&Mat3::from_cols(right, up, forward)))
}

/// Camera rotation looking along `direction` (camera space looks down -Z).
///
/// Falls back to an alternate up vector when `direction` is parallel to `up`.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Quat {
    let Some(forward) = direction.try_normalize() else {
        return Quat::IDENTITY;
    };
    let back = -forward;
    let up = up.try_normalize().unwrap_or(LOCAL_UP);
    let right = match up.cross(back).try_normalize() {
        Some(right) => right,
        None => {
            let alternate = if back.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
            alternate.cross(back).normalize()
        }
    };
    let up = back.cross(right);
    renormalize(Quat::from_mat3(&Mat3::from_cols(right, up, back)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_identity_axes() {
        let axes = axes_of(Quat::IDENTITY);
        assert_eq!(axes, FrameAxes::IDENTITY);
    }

    #[test]
    fn test_axes_renormalize_drifted_orientation() {
        let drifted = Quat::from_rotation_y(0.7) * 1.7;
        let axes = axes_of(drifted);
        assert!((axes.forward.length() - 1.0).abs() < EPS);
        assert!((axes.up.length() - 1.0).abs() < EPS);
        assert!((axes.right.length() - 1.0).abs() < EPS);
        assert!(axes.forward.dot(axes.up).abs() < EPS);
        assert!(axes.forward.dot(axes.right).abs() < EPS);
    }

    #[test]
    fn test_degenerate_orientation_is_identity() {
        let axes = axes_of(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(axes, FrameAxes::IDENTITY);
    }

    #[test]
    fn test_compose_around_axis() {
        let q = compose_around_axis(Vec3::new(0.0, 2.0, 0.0), FRAC_PI_2);
        assert!((q * Vec3::Z).abs_diff_eq(Vec3::X, EPS));
        assert_eq!(compose_around_axis(Vec3::ZERO, 1.0), Quat::IDENTITY);
    }

    #[test]
    fn test_slerp_clamps() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_x(FRAC_PI_2);
        assert!(slerp(a, b, -3.0).abs_diff_eq(a, EPS));
        assert!(slerp(a, b, 4.0).abs_diff_eq(b, EPS));
        let half = slerp(a, b, 0.5);
        assert!(half.abs_diff_eq(Quat::from_rotation_x(FRAC_PI_2 / 2.0), EPS));
    }

    #[test]
    fn test_from_basis_round_trips_axes() {
        let q = Quat::from_euler(glam::EulerRot::YXZ, 0.4, -0.3, 1.1);
        let axes = axes_of(q);
        let rebuilt = from_basis(axes.right, axes.up, axes.forward);
        let rebuilt_axes = axes_of(rebuilt);
        assert!(rebuilt_axes.forward.abs_diff_eq(axes.forward, EPS));
        assert!(rebuilt_axes.up.abs_diff_eq(axes.up, EPS));
    }

    #[test]
    fn test_look_rotation_points_camera() {
        let dir = Vec3::new(1.0, -1.0, 0.5).normalize();
        let q = look_rotation(dir, Vec3::Y);
        assert!((q * Vec3::NEG_Z).abs_diff_eq(dir, EPS));
        // straight down is parallel to the up hint
        let q = look_rotation(Vec3::NEG_Y, Vec3::Y);
        assert!((q * Vec3::NEG_Z).abs_diff_eq(Vec3::NEG_Y, EPS));
    }
}
