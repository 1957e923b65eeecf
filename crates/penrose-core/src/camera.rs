//! Dual camera controller.
//!
//! The overview camera is orthographic and pinned to a fixed [`Pose`] so the
//! impossible geometry lines up on screen. The walkthrough camera is a
//! perspective orbit (or first-person follow) that shows the trick from any
//! angle. Only one camera is active at a time.

use glam::{EulerRot, Vec2, Vec3};
use tracing::{debug, info};

use crate::actor::ActorState;
use crate::basis::{look_rotation, LOCAL_UP};
use crate::config::{CameraSettings, WalkthroughStyle};
use crate::pose::{CameraTransform, Pose};

/// Elevation limit for steering the orbit rig, just short of the poles
const MAX_ELEVATION: f32 = 1.55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    /// Orthographic, fixed pose
    #[default]
    Overview,
    /// Perspective, free-look
    Walkthrough,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::Overview => CameraMode::Walkthrough,
            CameraMode::Walkthrough => CameraMode::Overview,
        }
    }

    /// Background shown behind the scene in this mode
    pub fn backdrop(self) -> Backdrop {
        match self {
            CameraMode::Overview => Backdrop::ScreenTiled,
            CameraMode::Walkthrough => Backdrop::Skybox,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    /// Flat screen-space background
    ScreenTiled,
    /// Environment around the perspective camera
    Skybox,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionKind {
    /// Visible world height across the viewport
    Orthographic { height: f32 },
    /// Vertical field of view in radians
    Perspective { fov_y: f32 },
}

/// Which free-look gestures the active camera accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreeLook {
    pub rotate: bool,
    pub pan: bool,
    pub zoom: bool,
}

/// Per-frame pointer input for free-look, already filtered for UI focus
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FreeLookInput {
    /// Orbit drag in pixels
    pub rotate: Vec2,
    /// Pan drag in pixels
    pub pan: Vec2,
    /// Scroll steps, positive zooms in
    pub zoom: f32,
}

impl FreeLookInput {
    pub fn is_empty(&self) -> bool {
        self.rotate == Vec2::ZERO && self.pan == Vec2::ZERO && self.zoom == 0.0
    }
}

/// Everything the renderer needs to drive the active camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveCamera {
    pub mode: CameraMode,
    pub transform: CameraTransform,
    pub projection: ProjectionKind,
    pub free_look: FreeLook,
    pub backdrop: Backdrop,
}

impl ActiveCamera {
    /// World distance covered by one screen pixel at the focus plane
    pub fn units_per_pixel(&self, viewport_height: f32, focus_distance: f32) -> f32 {
        if viewport_height <= 0.0 {
            return 0.0;
        }
        match self.projection {
            ProjectionKind::Orthographic { height } => height / viewport_height,
            ProjectionKind::Perspective { fov_y } => {
                2.0 * focus_distance.max(0.0) * (fov_y * 0.5).tan() / viewport_height
            }
        }
    }
}

/// Read-only camera values for the debug overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraReadout {
    pub mode: CameraMode,
    pub position: Vec3,
    pub target: Vec3,
    /// XYZ Euler angles in degrees
    pub rotation_deg: Vec3,
    pub distance: f32,
    pub zoom: f32,
}

/// Orbit rig with smoothed targets, used by whichever mode is active
#[derive(Debug, Clone, Copy, PartialEq)]
struct Orbit {
    focus: Vec3,
    target_focus: Vec3,
    distance: f32,
    target_distance: f32,
    azimuth: f32,
    target_azimuth: f32,
    elevation: f32,
    target_elevation: f32,
}

impl Orbit {
    /// Rig that reproduces a camera looking along `direction` at `focus`.
    ///
    /// The elevation is taken as is, even straight down; only steering is
    /// held inside `MAX_ELEVATION`.
    fn looking_at(focus: Vec3, direction: Vec3, distance: f32) -> Self {
        let back = (-direction).normalize_or(Vec3::Z);
        let azimuth = back.x.atan2(back.z);
        let elevation = back.y.clamp(-1.0, 1.0).asin();
        Self {
            focus,
            target_focus: focus,
            distance,
            target_distance: distance,
            azimuth,
            target_azimuth: azimuth,
            elevation,
            target_elevation: elevation,
        }
    }

    fn clear_damping(&mut self) {
        self.target_focus = self.focus;
        self.target_distance = self.distance;
        self.target_azimuth = self.azimuth;
        self.target_elevation = self.elevation;
    }

    fn has_residual_motion(&self) -> bool {
        self.target_focus != self.focus
            || self.target_distance != self.distance
            || self.target_azimuth != self.azimuth
            || self.target_elevation != self.elevation
    }

    fn smooth(&mut self, lerp: f32) {
        self.focus = self.focus.lerp(self.target_focus, lerp);
        self.distance += (self.target_distance - self.distance) * lerp;
        self.azimuth += (self.target_azimuth - self.azimuth) * lerp;
        self.elevation += (self.target_elevation - self.elevation) * lerp;
    }

    fn transform(&self) -> CameraTransform {
        let offset = Vec3::new(
            self.elevation.cos() * self.azimuth.sin(),
            self.elevation.sin(),
            self.elevation.cos() * self.azimuth.cos(),
        );
        let translation = self.focus + offset * self.distance;
        CameraTransform {
            translation,
            rotation: look_rotation(self.focus - translation, LOCAL_UP),
        }
    }
}

/// Controller for the overview/walkthrough camera pair
#[derive(Debug, Clone)]
pub struct CameraState {
    settings: CameraSettings,
    mode: CameraMode,
    pose: Pose,
    map_loaded: bool,
    /// Center of the loaded map, the walkthrough orbit focus
    map_focus: Vec3,
    overview: CameraTransform,
    walkthrough: CameraTransform,
    orbit: Orbit,
    zoom: f32,
    target_zoom: f32,
    /// Snap the first-person camera on its next update
    snap_follow: bool,
}

impl CameraState {
    pub fn new(settings: CameraSettings) -> Self {
        let pose = Pose::new(
            Vec3::from_array(settings.overview_camera),
            Vec3::from_array(settings.overview_target),
        );
        let overview = pose.transform();
        let orbit = Orbit::looking_at(pose.target, pose.look_direction(), pose.distance());
        Self {
            settings,
            mode: CameraMode::Overview,
            map_focus: pose.target,
            pose,
            map_loaded: false,
            overview,
            walkthrough: orbit.transform(),
            orbit,
            zoom: 1.0,
            target_zoom: 1.0,
            snap_follow: true,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn is_map_loaded(&self) -> bool {
        self.map_loaded
    }

    pub fn map_focus(&self) -> Vec3 {
        self.map_focus
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Free-look damping still settling
    pub fn has_residual_motion(&self) -> bool {
        self.orbit.has_residual_motion() || self.target_zoom != self.zoom
    }

    /// Switch between overview and walkthrough, returning the new active camera.
    pub fn switch_mode(&mut self) -> ActiveCamera {
        match self.mode {
            CameraMode::Overview => self.enter_walkthrough(),
            CameraMode::Walkthrough => self.enter_overview(),
        }
        info!(mode = ?self.mode, "Camera mode switched");
        self.active_camera()
    }

    /// Force a specific mode; no-op when already there
    pub fn set_mode(&mut self, mode: CameraMode) -> ActiveCamera {
        if mode != self.mode {
            return self.switch_mode();
        }
        self.active_camera()
    }

    fn enter_overview(&mut self) {
        self.mode = CameraMode::Overview;
        self.target_zoom = self.zoom;
        self.reapply_pose();
    }

    fn enter_walkthrough(&mut self) {
        let direction = self.overview.look_direction();
        let distance = (self.pose.distance() * self.settings.walkthrough_factor)
            .clamp(self.settings.min_distance, self.settings.max_distance);
        self.mode = CameraMode::Walkthrough;
        self.orbit = Orbit::looking_at(self.map_focus, direction, distance);
        self.walkthrough = self.orbit.transform();
        self.snap_follow = true;
        debug!(distance, focus = ?self.map_focus, "Walkthrough retargeted");
    }

    /// Put the overview camera back on the fixed pose, dropping any orbit drift
    fn reapply_pose(&mut self) {
        self.overview = self.pose.transform();
        self.orbit = Orbit::looking_at(
            self.pose.target,
            self.pose.look_direction(),
            self.pose.distance(),
        );
    }

    /// One-time recenter of the fixed pose on the loaded map.
    ///
    /// Later loads only reapply the existing pose and return `None`.
    pub fn on_map_loaded(&mut self, map_center: Vec3) -> Option<ActiveCamera> {
        if self.map_loaded {
            if self.mode == CameraMode::Overview {
                self.reapply_pose();
            }
            return None;
        }
        self.map_loaded = true;
        self.pose.recenter_to(map_center);
        self.pose.push_back(self.settings.map_pushback);
        self.map_focus = map_center;
        info!(
            center = ?map_center,
            camera = ?self.pose.camera_position,
            "Overview pose fitted to map"
        );
        match self.mode {
            CameraMode::Overview => self.reapply_pose(),
            CameraMode::Walkthrough => {
                self.overview = self.pose.transform();
                self.enter_walkthrough();
            }
        }
        Some(self.active_camera())
    }

    /// Per-frame update from free-look input and the actor, when there is one
    pub fn update(
        &mut self,
        dt: f32,
        input: &FreeLookInput,
        actor: Option<&ActorState>,
    ) -> ActiveCamera {
        let lerp = 1.0 - (-self.settings.smooth_factor * 60.0 * dt.max(0.0)).exp();
        match self.mode {
            CameraMode::Overview => self.update_overview(lerp, input),
            CameraMode::Walkthrough => self.update_walkthrough(lerp, input, actor),
        }
        self.active_camera()
    }

    fn update_overview(&mut self, lerp: f32, input: &FreeLookInput) {
        if self.settings.frozen_overview {
            self.reapply_pose();
        } else if self.settings.overview_rotate && input.rotate != Vec2::ZERO {
            self.steer(input.rotate);
        }
        if self.settings.overview_zoom && input.zoom != 0.0 {
            self.target_zoom = (self.target_zoom * (1.0 - input.zoom * self.settings.zoom_speed))
                .clamp(self.settings.min_zoom, self.settings.max_zoom);
        }
        self.zoom += (self.target_zoom - self.zoom) * lerp;

        if !self.settings.frozen_overview && self.orbit.has_residual_motion() {
            self.orbit.smooth(lerp);
            self.overview = self.orbit.transform();
        }
    }

    fn update_walkthrough(&mut self, lerp: f32, input: &FreeLookInput, actor: Option<&ActorState>) {
        if self.settings.walkthrough_style == WalkthroughStyle::FirstPerson {
            if let Some(actor) = actor {
                self.follow_actor(actor);
                return;
            }
        }

        self.steer(input.rotate);
        if input.pan != Vec2::ZERO {
            let pan_speed = self.orbit.distance * 0.002;
            let camera = self.orbit.transform();
            self.orbit.target_focus += -camera.right() * input.pan.x * pan_speed
                + camera.up() * input.pan.y * pan_speed;
        }
        if input.zoom != 0.0 {
            self.orbit.target_distance = (self.orbit.target_distance
                * (1.0 - input.zoom * self.settings.zoom_speed))
                .clamp(self.settings.min_distance, self.settings.max_distance);
        }
        self.orbit.smooth(lerp);
        self.walkthrough = self.orbit.transform();
    }

    fn steer(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        self.orbit.target_azimuth -= delta.x * self.settings.sensitivity;
        self.orbit.target_elevation = (self.orbit.target_elevation
            + delta.y * self.settings.sensitivity)
            .clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    fn follow_actor(&mut self, actor: &ActorState) {
        let axes = actor.axes();
        let eye = actor.position
            + axes.up * self.settings.head_height * actor.scale
            + axes.forward * self.settings.head_forward * actor.scale;
        let t = if self.snap_follow {
            1.0
        } else {
            self.settings.follow_smooth.clamp(0.0, 1.0)
        };
        self.snap_follow = false;
        self.walkthrough.translation = self.walkthrough.translation.lerp(eye, t);
        self.walkthrough.rotation = look_rotation(axes.forward, axes.up);
    }

    fn projection(&self) -> ProjectionKind {
        match self.mode {
            CameraMode::Overview => ProjectionKind::Orthographic {
                height: self.settings.ortho_height * self.zoom,
            },
            CameraMode::Walkthrough => ProjectionKind::Perspective {
                fov_y: self.settings.fov_degrees.to_radians(),
            },
        }
    }

    fn free_look(&self) -> FreeLook {
        match self.mode {
            CameraMode::Overview => FreeLook {
                rotate: self.settings.overview_rotate && !self.settings.frozen_overview,
                pan: false,
                zoom: self.settings.overview_zoom,
            },
            CameraMode::Walkthrough => {
                let orbiting = self.settings.walkthrough_style == WalkthroughStyle::Orbit;
                FreeLook {
                    rotate: orbiting,
                    pan: orbiting,
                    zoom: orbiting,
                }
            }
        }
    }

    pub fn active_camera(&self) -> ActiveCamera {
        let transform = match self.mode {
            CameraMode::Overview => self.overview,
            CameraMode::Walkthrough => self.walkthrough,
        };
        ActiveCamera {
            mode: self.mode,
            transform,
            projection: self.projection(),
            free_look: self.free_look(),
            backdrop: self.mode.backdrop(),
        }
    }

    /// Distance from the active camera to what it looks at
    pub fn focus_distance(&self) -> f32 {
        match self.mode {
            CameraMode::Overview => self.pose.distance(),
            CameraMode::Walkthrough => self.orbit.distance,
        }
    }

    pub fn readout(&self) -> CameraReadout {
        let active = self.active_camera();
        let (x, y, z) = active.transform.rotation.to_euler(EulerRot::XYZ);
        let target = match self.mode {
            CameraMode::Overview => self.pose.target,
            CameraMode::Walkthrough => self.orbit.focus,
        };
        CameraReadout {
            mode: self.mode,
            position: active.transform.translation,
            target,
            rotation_deg: Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees()),
            distance: self.focus_distance(),
            zoom: self.zoom,
        }
    }
}
