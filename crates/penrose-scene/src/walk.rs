//! Drives the walker once per frame and mirrors the actor onto its entity

use bevy::prelude::*;
use bevy_picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use penrose_core::{GroundQuery, IllusionError, InputEvent, WalkerEvent};
use tracing::{debug, info, trace, warn};

use crate::assets::{ActorRoot, MapMesh, WorldRoot};
use crate::state::{
    CameraControl, LocomotionState, PendingClip, TurnFeedback, WalkInput, WalkSet,
};

pub struct WalkPlugin;

impl Plugin for WalkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TurnFeedback>()
            .init_resource::<PendingClip>()
            .add_systems(
                Update,
                (apply_walk_input, tick_walker, sync_actor_transform)
                    .chain()
                    .in_set(WalkSet::Tick),
            );
    }
}

fn apply_walk_input(
    mut reader: MessageReader<WalkInput>,
    mut state: ResMut<LocomotionState>,
    mut control: ResMut<CameraControl>,
) {
    for WalkInput(event) in reader.read() {
        if *event == InputEvent::ViewToggleRequested {
            let active = control.cameras.switch_mode();
            debug!(mode = ?active.mode, backdrop = ?active.backdrop, "View toggled");
            continue;
        }
        if let Err(err) = state.walker.handle_input(*event) {
            log_rejection(*event, &err);
        }
    }
}

fn log_rejection(event: InputEvent, err: &IllusionError) {
    match err {
        IllusionError::MissingAsset(_) => trace!(?event, %err, "Input ignored"),
        IllusionError::InvalidPrecondition(_) => debug!(?event, %err, "Input ignored"),
        IllusionError::StuckArmedTransition { .. } => warn!(?event, %err, "Input ignored"),
    }
}

/// Ground rays against the visible map meshes.
///
/// The walker works in unshifted world space, so the drag-pan offset of the
/// world root is added to rays and taken off hits.
struct MapGround<'a, 'w, 's> {
    ray_cast: &'a mut MeshRayCast<'w, 's>,
    map_meshes: &'a Query<'a, 'a, (), With<MapMesh>>,
    offset: Vec3,
}

impl GroundQuery for MapGround<'_, '_, '_> {
    fn cast(&mut self, origin: Vec3, direction: Vec3) -> Option<Vec3> {
        let Self {
            ray_cast,
            map_meshes,
            offset,
        } = self;
        let direction = Dir3::new(direction).ok()?;
        let ray = Ray3d::new(origin + *offset, direction);
        let filter = |entity: Entity| map_meshes.contains(entity);
        let settings = MeshRayCastSettings::default()
            .with_filter(&filter)
            .with_visibility(RayCastVisibility::Visible);
        ray_cast
            .cast_ray(ray, &settings)
            .first()
            .map(|(_, hit)| hit.point - *offset)
    }
}

fn tick_walker(
    time: Res<Time>,
    feedback: Res<TurnFeedback>,
    mut state: ResMut<LocomotionState>,
    mut pending: ResMut<PendingClip>,
    mut ray_cast: MeshRayCast,
    map_meshes: Query<(), With<MapMesh>>,
    world_root: Query<&GlobalTransform, With<WorldRoot>>,
) {
    // walk freely until the map has been measured
    let mut ground = if map_meshes.is_empty() {
        None
    } else {
        Some(MapGround {
            ray_cast: &mut ray_cast,
            map_meshes: &map_meshes,
            offset: world_root
                .single()
                .map(|root| root.translation())
                .unwrap_or(Vec3::ZERO),
        })
    };
    let query = ground.as_mut().map(|g| g as &mut dyn GroundQuery);

    let report = match state
        .walker
        .tick_on_ground(time.delta_secs(), &feedback.0, query)
    {
        Ok(report) => report,
        Err(err) => {
            trace!(%err, "Walker tick skipped");
            return;
        }
    };

    if let Some(request) = report.clip_request {
        pending.0 = Some(request);
    }
    for event in &report.events {
        match event {
            WalkerEvent::CornerFinished(variant) => info!(?variant, "Corner walked"),
            WalkerEvent::ArmReleased { waited } => {
                debug!(waited, "Armed corner dropped by the walker")
            }
            WalkerEvent::EdgeReached { turning } => debug!(turning, "Actor stopped at the map edge"),
            other => debug!(event = ?other, "Walker event"),
        }
    }
}

fn sync_actor_transform(
    state: Res<LocomotionState>,
    mut actors: Query<&mut Transform, With<ActorRoot>>,
) {
    let Some(actor) = state.walker.actor() else {
        return;
    };
    for mut transform in &mut actors {
        transform.translation = actor.position;
        transform.rotation = actor.orientation;
        transform.scale = Vec3::splat(actor.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penrose_core::{CameraMode, CameraState, Gait, Settings, Walker, WorldOffset};

    fn app() -> App {
        let settings = Settings::default();
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Mesh>()
            .add_message::<WalkInput>()
            .insert_resource(LocomotionState {
                walker: Walker::new(&settings),
            })
            .insert_resource(CameraControl {
                cameras: CameraState::new(settings.camera.clone()),
                offset: WorldOffset::default(),
            })
            .add_plugins(WalkPlugin);
        app
    }

    #[test]
    fn test_view_toggle_switches_camera_mode() {
        let mut app = app();
        app.world_mut()
            .write_message(WalkInput(InputEvent::ViewToggleRequested));
        app.update();
        assert_eq!(
            app.world().resource::<CameraControl>().cameras.mode(),
            CameraMode::Walkthrough
        );
    }

    #[test]
    fn test_move_input_reaches_walker_before_character_loads() {
        let mut app = app();
        app.world_mut()
            .write_message(WalkInput(InputEvent::MovePressed));
        app.update();
        let state = app.world().resource::<LocomotionState>();
        assert_eq!(state.walker.gait(), Gait::Walking);
        assert!(state.walker.actor().is_none());
        assert!(app.world().resource::<PendingClip>().0.is_none());
    }
}
