//! Penrose Scene - Bevy adapters for the walking illusion
//!
//! Wraps the engine-independent core in resources and wires it to input,
//! glTF assets, the animation player and the two cameras.

pub mod animation;
pub mod assets;
pub mod camera;
pub mod input;
pub mod state;
pub mod teleport;
pub mod ui;
pub mod walk;

use bevy::prelude::*;
use penrose_core::{CameraState, Settings, Walker, WorldOffset};

pub use state::{CameraControl, LocomotionState, PenroseSettings, WalkSet};

/// Plugin that sets up the whole illusion scene
pub struct PenroseScenePlugin {
    pub settings: Settings,
}

impl PenroseScenePlugin {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl Plugin for PenroseScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PenroseSettings(self.settings.clone()))
            .insert_resource(LocomotionState {
                walker: Walker::new(&self.settings),
            })
            .insert_resource(CameraControl {
                cameras: CameraState::new(self.settings.camera.clone()),
                offset: WorldOffset::default(),
            })
            .configure_sets(
                Update,
                (
                    WalkSet::Assets,
                    WalkSet::Input,
                    WalkSet::Feedback,
                    WalkSet::Tick,
                    WalkSet::Animate,
                    WalkSet::Camera,
                )
                    .chain(),
            )
            .add_plugins((
                assets::AssetsPlugin,
                input::InputPlugin,
                walk::WalkPlugin,
                animation::AnimationBridgePlugin,
                camera::CameraPlugin,
                teleport::TeleportPlugin,
                ui::ReadoutPlugin,
            ));
    }
}
