//! Configuration loading and validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::corner::{CornerParams, CornerVariant};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub locomotion: LocomotionSettings,
    #[serde(default)]
    pub corner: CornerSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub assets: AssetSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionSettings {
    /// Walk speed in world units per second, before actor scale
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    /// Uniform scale of the character model
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Pivot height above the walking surface
    #[serde(default = "default_ground_offset")]
    pub ground_offset: f32,
    /// Crossfade duration between clips
    #[serde(default = "default_blend_secs")]
    pub blend_secs: f32,
    /// Turn-in-place duration used until the turn clip reports progress
    #[serde(default = "default_turn_secs")]
    pub fallback_turn_secs: f32,
    /// Foot contact of the actor at spawn
    #[serde(default = "default_spawn")]
    pub spawn: [f32; 3],
    /// Keep the feet on the map surface and refuse steps off it
    #[serde(default = "default_true")]
    pub snap_to_map: bool,
    /// Turn around when a step is refused at the map edge
    #[serde(default)]
    pub auto_turn_on_edge: bool,
    /// Height above the feet that ground rays start from
    #[serde(default = "default_ray_height")]
    pub ray_height: f32,
}

impl Default for LocomotionSettings {
    fn default() -> Self {
        Self {
            walk_speed: default_walk_speed(),
            scale: default_scale(),
            ground_offset: default_ground_offset(),
            blend_secs: default_blend_secs(),
            fallback_turn_secs: default_turn_secs(),
            spawn: default_spawn(),
            snap_to_map: true,
            auto_turn_on_edge: false,
            ray_height: default_ray_height(),
        }
    }
}

fn default_walk_speed() -> f32 {
    1.5
}

fn default_scale() -> f32 {
    1.0
}

fn default_ground_offset() -> f32 {
    0.02
}

fn default_blend_secs() -> f32 {
    0.3
}

fn default_turn_secs() -> f32 {
    1.0
}

fn default_spawn() -> [f32; 3] {
    [-3.0, 0.0, 0.0]
}

fn default_ray_height() -> f32 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerSettings {
    /// Arm corners from walked distance
    #[serde(default = "default_true")]
    pub auto_trigger: bool,
    /// Walked distance that arms a corner
    #[serde(default = "default_trigger_distance")]
    pub trigger_distance: f32,
    /// Radius of the foot arc around the edge
    #[serde(default = "default_corner_distance")]
    pub distance: f32,
    /// Distance from the feet to the face edge when the corner starts
    #[serde(default = "default_half_face_size")]
    pub half_face_size: f32,
    #[serde(default = "default_turn_speed_deg")]
    pub turn_speed_deg: f32,
    /// Armed corners that have not started by then are released
    #[serde(default = "default_arm_grace_secs")]
    pub arm_grace_secs: f32,
    #[serde(default)]
    pub first_variant: CornerVariant,
}

impl Default for CornerSettings {
    fn default() -> Self {
        Self {
            auto_trigger: true,
            trigger_distance: default_trigger_distance(),
            distance: default_corner_distance(),
            half_face_size: default_half_face_size(),
            turn_speed_deg: default_turn_speed_deg(),
            arm_grace_secs: default_arm_grace_secs(),
            first_variant: CornerVariant::default(),
        }
    }
}

impl CornerSettings {
    pub fn params(&self) -> CornerParams {
        CornerParams {
            distance: self.distance,
            half_face_size: self.half_face_size,
            turn_speed: self.turn_speed_deg.to_radians(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_trigger_distance() -> f32 {
    9.0
}

fn default_corner_distance() -> f32 {
    1.0
}

fn default_half_face_size() -> f32 {
    0.5
}

fn default_turn_speed_deg() -> f32 {
    60.0
}

fn default_arm_grace_secs() -> f32 {
    0.5
}

/// How the walkthrough camera is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkthroughStyle {
    /// Orbit around the map center
    #[default]
    Orbit,
    /// Ride along at the actor's head
    FirstPerson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Provisional overview camera position, used until the map loads
    #[serde(default = "default_overview_camera")]
    pub overview_camera: [f32; 3],
    /// Provisional overview target
    #[serde(default = "default_overview_target")]
    pub overview_target: [f32; 3],
    /// Pushback applied to the overview pose once the map has loaded
    #[serde(default = "default_map_pushback")]
    pub map_pushback: f32,
    /// Walkthrough distance as a fraction of the overview distance
    #[serde(default = "default_walkthrough_factor")]
    pub walkthrough_factor: f32,
    /// Visible height of the orthographic overview at zoom 1
    #[serde(default = "default_ortho_height")]
    pub ortho_height: f32,
    /// Vertical field of view of the walkthrough camera
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
    /// Reapply the fixed pose every frame while in overview
    #[serde(default)]
    pub frozen_overview: bool,
    /// Allow orbiting the overview camera
    #[serde(default)]
    pub overview_rotate: bool,
    /// Allow zooming the overview camera
    #[serde(default = "default_true")]
    pub overview_zoom: bool,
    #[serde(default)]
    pub walkthrough_style: WalkthroughStyle,
    /// First-person eye height above the actor pivot
    #[serde(default = "default_head_height")]
    pub head_height: f32,
    /// First-person eye offset along the actor's forward axis
    #[serde(default = "default_head_forward")]
    pub head_forward: f32,
    /// First-person position smoothing per frame
    #[serde(default = "default_follow_smooth")]
    pub follow_smooth: f32,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
    #[serde(default = "default_smooth_factor")]
    pub smooth_factor: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            overview_camera: default_overview_camera(),
            overview_target: default_overview_target(),
            map_pushback: default_map_pushback(),
            walkthrough_factor: default_walkthrough_factor(),
            ortho_height: default_ortho_height(),
            fov_degrees: default_fov_degrees(),
            frozen_overview: false,
            overview_rotate: false,
            overview_zoom: true,
            walkthrough_style: WalkthroughStyle::default(),
            head_height: default_head_height(),
            head_forward: default_head_forward(),
            follow_smooth: default_follow_smooth(),
            sensitivity: default_sensitivity(),
            zoom_speed: default_zoom_speed(),
            smooth_factor: default_smooth_factor(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

fn default_overview_camera() -> [f32; 3] {
    [-5.367, 14.489, 7.639]
}

fn default_overview_target() -> [f32; 3] {
    [-14.909, 5.006, -1.902]
}

fn default_map_pushback() -> f32 {
    1.25
}

fn default_walkthrough_factor() -> f32 {
    0.6
}

fn default_ortho_height() -> f32 {
    12.0
}

fn default_fov_degrees() -> f32 {
    45.0
}

fn default_head_height() -> f32 {
    1.25
}

fn default_head_forward() -> f32 {
    0.1
}

fn default_follow_smooth() -> f32 {
    0.35
}

fn default_sensitivity() -> f32 {
    0.005
}

fn default_zoom_speed() -> f32 {
    0.1
}

fn default_smooth_factor() -> f32 {
    0.15
}

fn default_min_distance() -> f32 {
    0.5
}

fn default_max_distance() -> f32 {
    200.0
}

fn default_min_zoom() -> f32 {
    0.1
}

fn default_max_zoom() -> f32 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Character glTF with `Idle`, `Walk` and `Turn` animations
    #[serde(default = "default_character_path")]
    pub character: String,
    /// Walkable map glTF
    #[serde(default = "default_map_path")]
    pub map: String,
    /// Second rendition of the map, shown in place of `map` on request
    #[serde(default)]
    pub alternate_map: Option<String>,
    #[serde(default = "default_idle_clip")]
    pub idle_clip: String,
    #[serde(default = "default_walk_clip")]
    pub walk_clip: String,
    #[serde(default = "default_turn_clip")]
    pub turn_clip: String,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            character: default_character_path(),
            map: default_map_path(),
            alternate_map: None,
            idle_clip: default_idle_clip(),
            walk_clip: default_walk_clip(),
            turn_clip: default_turn_clip(),
        }
    }
}

fn default_character_path() -> String {
    "models/astronaut.glb".to_string()
}

fn default_map_path() -> String {
    "models/mapOnly.glb".to_string()
}

fn default_idle_clip() -> String {
    "Idle".to_string()
}

fn default_walk_clip() -> String {
    "Walk".to_string()
}

fn default_turn_clip() -> String {
    "Turn".to_string()
}

impl Settings {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the core cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("locomotion.walk_speed", self.locomotion.walk_speed)?;
        require_positive("locomotion.scale", self.locomotion.scale)?;
        require_positive("locomotion.fallback_turn_secs", self.locomotion.fallback_turn_secs)?;
        require_non_negative("locomotion.blend_secs", self.locomotion.blend_secs)?;
        require_non_negative("locomotion.ground_offset", self.locomotion.ground_offset)?;
        require_positive("locomotion.ray_height", self.locomotion.ray_height)?;
        require_positive("corner.trigger_distance", self.corner.trigger_distance)?;
        require_positive("corner.distance", self.corner.distance)?;
        require_positive("corner.turn_speed_deg", self.corner.turn_speed_deg)?;
        require_non_negative("corner.half_face_size", self.corner.half_face_size)?;
        require_non_negative("corner.arm_grace_secs", self.corner.arm_grace_secs)?;
        require_positive("camera.map_pushback", self.camera.map_pushback)?;
        require_positive("camera.walkthrough_factor", self.camera.walkthrough_factor)?;
        require_positive("camera.ortho_height", self.camera.ortho_height)?;
        require_positive("camera.fov_degrees", self.camera.fov_degrees)?;
        require_positive("camera.min_distance", self.camera.min_distance)?;
        require_positive("camera.min_zoom", self.camera.min_zoom)?;
        if self.camera.max_distance < self.camera.min_distance {
            return Err(ConfigError::Invalid {
                field: "camera.max_distance",
                reason: "must not be below camera.min_distance".to_string(),
            });
        }
        if self.camera.max_zoom < self.camera.min_zoom {
            return Err(ConfigError::Invalid {
                field: "camera.max_zoom",
                reason: "must not be below camera.min_zoom".to_string(),
            });
        }
        let camera = glam::Vec3::from_array(self.camera.overview_camera);
        let target = glam::Vec3::from_array(self.camera.overview_target);
        if camera.distance(target) < crate::pose::MIN_POSE_DISTANCE {
            return Err(ConfigError::Invalid {
                field: "camera.overview_camera",
                reason: "coincides with camera.overview_target".to_string(),
            });
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must not be negative, got {value}"),
        })
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings = Settings::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(settings)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Settings::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(&Settings::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml = r#"
[corner]
trigger_distance = 4.5
first_variant = "right"

[camera]
walkthrough_style = "first_person"
"#;

        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.corner.trigger_distance, 4.5);
        assert_eq!(settings.corner.first_variant, CornerVariant::Right);
        assert_eq!(settings.corner.turn_speed_deg, 60.0);
        assert_eq!(settings.camera.walkthrough_style, WalkthroughStyle::FirstPerson);
        assert_eq!(settings.locomotion, LocomotionSettings::default());
        assert!(settings.locomotion.snap_to_map);
        assert!(!settings.locomotion.auto_turn_on_edge);
        assert!(settings.assets.alternate_map.is_none());
    }

    #[test]
    fn test_alternate_map_path() {
        let toml = r#"
[assets]
map = "models/orthogonal_geometry.glb"
alternate_map = "models/perspective_geometry.glb"
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert_eq!(settings.assets.map, "models/orthogonal_geometry.glb");
        assert_eq!(
            settings.assets.alternate_map.as_deref(),
            Some("models/perspective_geometry.glb")
        );
    }

    #[test]
    fn test_map_walking_options() {
        let toml = r#"
[locomotion]
snap_to_map = false
auto_turn_on_edge = true
ray_height = 0.5
"#;
        let settings = Settings::from_toml(toml).unwrap();
        assert!(!settings.locomotion.snap_to_map);
        assert!(settings.locomotion.auto_turn_on_edge);
        assert_eq!(settings.locomotion.ray_height, 0.5);

        let toml = r#"
[locomotion]
ray_height = 0.0
"#;
        assert!(matches!(
            Settings::from_toml(toml),
            Err(ConfigError::Invalid {
                field: "locomotion.ray_height",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let toml = r#"
[corner]
trigger_distance = 0.0
"#;
        let err = Settings::from_toml(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "corner.trigger_distance",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_coincident_overview_pose() {
        let toml = r#"
[camera]
overview_camera = [1.0, 2.0, 3.0]
overview_target = [1.0, 2.0, 3.0]
"#;
        assert!(Settings::from_toml(toml).is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_saved_default_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("penrose.toml");
        save_default_config(&path).unwrap();
        let settings = load_config(&path).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_corner_params_convert_degrees() {
        let params = CornerSettings::default().params();
        assert!((params.turn_speed - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
    }
}
