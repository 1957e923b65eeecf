//! Overview click-to-teleport

use bevy::prelude::*;
use bevy_picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings};
use penrose_core::CameraMode;
use tracing::{debug, info};

use crate::assets::MapMesh;
use crate::camera::OverviewCamera;
use crate::state::{CameraControl, LocomotionState, PointerGestures, WalkSet};

pub struct TeleportPlugin;

impl Plugin for TeleportPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, teleport_on_click.in_set(WalkSet::Feedback));
    }
}

/// Drop the actor's feet where a click lands on the map
fn teleport_on_click(
    gestures: Res<PointerGestures>,
    control: Res<CameraControl>,
    cameras: Query<(&Camera, &GlobalTransform), With<OverviewCamera>>,
    map_meshes: Query<(), With<MapMesh>>,
    mut ray_cast: MeshRayCast,
    mut state: ResMut<LocomotionState>,
) {
    let Some(cursor) = gestures.click else {
        return;
    };
    if control.cameras.mode() != CameraMode::Overview {
        return;
    }
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };

    let filter = |entity: Entity| map_meshes.contains(entity);
    let settings = MeshRayCastSettings::default().with_filter(&filter);
    let Some((_, hit)) = ray_cast.cast_ray(ray, &settings).first() else {
        debug!(?cursor, "Click missed the map");
        return;
    };

    // hits are in shifted world space, the walker is not
    let foot = hit.point - control.offset.world_offset(CameraMode::Overview);
    match state.walker.teleport(foot) {
        Ok(()) => info!(?foot, "Actor teleported"),
        Err(err) => debug!(%err, "Teleport refused"),
    }
}
