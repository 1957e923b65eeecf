//! Overview and walkthrough camera entities, backdrop and world offset

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use penrose_core::{Backdrop, CameraMode, ProjectionKind};
use tracing::info;

use crate::assets::WorldRoot;
use crate::state::{CameraControl, LocomotionState, PointerGestures, WalkSet};

const OVERVIEW_CLEAR: Color = Color::srgb(0.86, 0.84, 0.78);
const WALKTHROUGH_CLEAR: Color = Color::srgb(0.1, 0.1, 0.15);
const SKY_COLOR: Color = Color::srgb(0.45, 0.6, 0.85);
const SKY_RADIUS: f32 = 400.0;

/// Orthographic camera pinned to the fixed pose
#[derive(Component)]
pub struct OverviewCamera;

/// Perspective free-look camera
#[derive(Component)]
pub struct WalkthroughCamera;

/// Inside-out sphere that travels with the walkthrough camera
#[derive(Component)]
pub struct SkyDome;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(OVERVIEW_CLEAR))
            .add_systems(Startup, spawn_cameras)
            .add_systems(
                Update,
                (drive_cameras, apply_backdrop).chain().in_set(WalkSet::Camera),
            );
    }
}

fn spawn_cameras(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    control: Res<CameraControl>,
) {
    let active = control.cameras.active_camera();
    let overview = active.mode == CameraMode::Overview;

    commands.spawn((
        Camera3d::default(),
        Camera {
            is_active: overview,
            ..default()
        },
        Projection::Orthographic(OrthographicProjection::default_3d()),
        Transform::from_translation(active.transform.translation)
            .with_rotation(active.transform.rotation),
        OverviewCamera,
    ));

    commands
        .spawn((
            Camera3d::default(),
            Camera {
                is_active: !overview,
                ..default()
            },
            Projection::Perspective(PerspectiveProjection {
                fov: control.cameras.settings().fov_degrees.to_radians(),
                near: 0.01,
                far: 1000.0,
                ..default()
            }),
            Transform::default(),
            WalkthroughCamera,
        ))
        .with_child((
            Mesh3d(meshes.add(Sphere::new(SKY_RADIUS).mesh().uv(32, 18))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: SKY_COLOR,
                unlit: true,
                cull_mode: None,
                ..default()
            })),
            Transform::default(),
            Visibility::Hidden,
            SkyDome,
        ));
}

/// Run the camera controller and push the active camera to the renderer
#[allow(clippy::type_complexity)]
fn drive_cameras(
    time: Res<Time>,
    gestures: Res<PointerGestures>,
    state: Res<LocomotionState>,
    mut control: ResMut<CameraControl>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut overview: Query<
        (&mut Camera, &mut Transform, &mut Projection),
        (With<OverviewCamera>, Without<WalkthroughCamera>),
    >,
    mut walkthrough: Query<
        (&mut Camera, &mut Transform, &mut Projection),
        (With<WalkthroughCamera>, Without<OverviewCamera>),
    >,
    mut world_root: Query<
        &mut Transform,
        (With<WorldRoot>, Without<OverviewCamera>, Without<WalkthroughCamera>),
    >,
) {
    let control = &mut *control;
    let active = control
        .cameras
        .update(time.delta_secs(), &gestures.free_look, state.walker.actor());

    let viewport_height = windows.single().map(|w| w.height()).unwrap_or(0.0);
    let units_per_pixel = active.units_per_pixel(viewport_height, control.cameras.focus_distance());
    control.offset.drag(
        active.mode,
        gestures.overview_drag,
        &active.transform,
        units_per_pixel,
    );

    if let Ok((mut camera, mut transform, mut projection)) = overview.single_mut() {
        camera.is_active = active.mode == CameraMode::Overview;
        if camera.is_active {
            transform.translation = active.transform.translation;
            transform.rotation = active.transform.rotation;
            if let (Projection::Orthographic(ortho), ProjectionKind::Orthographic { .. }) =
                (&mut *projection, active.projection)
            {
                // default_3d maps one world unit to one pixel at scale 1
                if units_per_pixel > 0.0 {
                    ortho.scale = units_per_pixel;
                }
            }
        }
    }

    if let Ok((mut camera, mut transform, mut projection)) = walkthrough.single_mut() {
        camera.is_active = active.mode == CameraMode::Walkthrough;
        if camera.is_active {
            transform.translation = active.transform.translation;
            transform.rotation = active.transform.rotation;
            if let (Projection::Perspective(perspective), ProjectionKind::Perspective { fov_y }) =
                (&mut *projection, active.projection)
            {
                perspective.fov = fov_y;
            }
        }
    }

    if let Ok(mut root) = world_root.single_mut() {
        root.translation = control.offset.world_offset(active.mode);
    }
}

/// Swap the background, only when the mode actually changes
fn apply_backdrop(
    control: Res<CameraControl>,
    mut shown: Local<Option<CameraMode>>,
    mut clear: ResMut<ClearColor>,
    mut domes: Query<&mut Visibility, With<SkyDome>>,
) {
    let mode = control.cameras.mode();
    if *shown == Some(mode) {
        return;
    }
    *shown = Some(mode);

    let backdrop = mode.backdrop();
    let (color, dome) = match backdrop {
        Backdrop::ScreenTiled => (OVERVIEW_CLEAR, Visibility::Hidden),
        Backdrop::Skybox => (WALKTHROUGH_CLEAR, Visibility::Visible),
    };
    clear.0 = color;
    for mut visibility in &mut domes {
        *visibility = dome;
    }
    info!(?mode, ?backdrop, "Backdrop applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use penrose_core::{CameraState, Settings, Walker, WorldOffset};

    fn app() -> App {
        let settings = Settings::default();
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(ClearColor(OVERVIEW_CLEAR))
            .init_resource::<PointerGestures>()
            .insert_resource(LocomotionState {
                walker: Walker::new(&settings),
            })
            .insert_resource(CameraControl {
                cameras: CameraState::new(settings.camera.clone()),
                offset: WorldOffset::default(),
            })
            .add_systems(Update, (drive_cameras, apply_backdrop).chain());

        let world = app.world_mut();
        world.spawn((Window::default(), PrimaryWindow));
        world.spawn((
            Camera::default(),
            Projection::Orthographic(OrthographicProjection::default_3d()),
            Transform::default(),
            OverviewCamera,
        ));
        world.spawn((
            Camera {
                is_active: false,
                ..default()
            },
            Projection::Perspective(PerspectiveProjection::default()),
            Transform::default(),
            WalkthroughCamera,
        ));
        world.spawn((Visibility::Hidden, SkyDome));
        world.spawn((Transform::default(), WorldRoot));
        app
    }

    fn transform_of<C: Component>(app: &mut App) -> Transform {
        let mut query = app.world_mut().query_filtered::<&Transform, With<C>>();
        *query.single(app.world()).unwrap()
    }

    fn dome_visibility(app: &mut App) -> Visibility {
        let mut query = app.world_mut().query_filtered::<&Visibility, With<SkyDome>>();
        *query.single(app.world()).unwrap()
    }

    fn toggle(app: &mut App) {
        app.world_mut()
            .resource_mut::<CameraControl>()
            .cameras
            .switch_mode();
    }

    #[test]
    fn test_backdrop_swaps_only_on_mode_change() {
        let mut app = app();
        app.update();
        assert_eq!(app.world().resource::<ClearColor>().0, OVERVIEW_CLEAR);
        assert_eq!(dome_visibility(&mut app), Visibility::Hidden);

        toggle(&mut app);
        app.update();
        assert_eq!(app.world().resource::<ClearColor>().0, WALKTHROUGH_CLEAR);
        assert_eq!(dome_visibility(&mut app), Visibility::Visible);

        // unchanged mode leaves the backdrop alone
        app.world_mut().resource_mut::<ClearColor>().0 = Color::BLACK;
        for _ in 0..3 {
            app.update();
        }
        assert_eq!(app.world().resource::<ClearColor>().0, Color::BLACK);
        assert_eq!(dome_visibility(&mut app), Visibility::Visible);

        toggle(&mut app);
        app.update();
        assert_eq!(app.world().resource::<ClearColor>().0, OVERVIEW_CLEAR);
        assert_eq!(dome_visibility(&mut app), Visibility::Hidden);
    }

    #[test]
    fn test_overview_drag_moves_world_not_camera() {
        let mut app = app();
        app.update();
        let camera = transform_of::<OverviewCamera>(&mut app);
        assert_eq!(transform_of::<WorldRoot>(&mut app).translation, Vec3::ZERO);

        app.world_mut().resource_mut::<PointerGestures>().overview_drag = Vec2::new(30.0, -10.0);
        app.update();
        *app.world_mut().resource_mut::<PointerGestures>() = PointerGestures::default();

        let shifted = transform_of::<WorldRoot>(&mut app).translation;
        let offset = app.world().resource::<CameraControl>().offset.raw();
        assert_eq!(shifted, offset);
        // 12 world units across a 720 pixel window
        let expected = Vec2::new(30.0, -10.0).length() * 12.0 / 720.0;
        assert!((shifted.length() - expected).abs() < 1e-4);
        assert_eq!(transform_of::<OverviewCamera>(&mut app), camera);

        // walkthrough sees the unshifted world, overview gets the offset back
        toggle(&mut app);
        app.update();
        assert_eq!(transform_of::<WorldRoot>(&mut app).translation, Vec3::ZERO);
        toggle(&mut app);
        app.update();
        assert_eq!(transform_of::<WorldRoot>(&mut app).translation, shifted);
        assert_eq!(transform_of::<OverviewCamera>(&mut app), camera);
    }
}
