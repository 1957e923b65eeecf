//! glTF loading for the character and the map, bounds measurement and
//! animation player hookup

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use bevy::camera::primitives::MeshAabb;
use penrose_core::{Bounds, Clip, ClipAvailability};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

use crate::animation::CharacterPlayer;
use crate::state::{CameraControl, LocomotionState, MapToggle, PenroseSettings, WalkSet};

/// Parent of everything that the overview drag-pan shifts
#[derive(Component)]
pub struct WorldRoot;

/// Carries the actor pose from the walker
#[derive(Component)]
pub struct ActorRoot;

/// Character scene, offset so its bottom-center sits on the pivot
#[derive(Component)]
pub struct ActorModel;

/// Map scene
#[derive(Component)]
pub struct MapModel;

/// Which rendition of the map a [`MapModel`] is. Only one is visible at a time.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapVariant {
    Primary,
    Alternate,
}

/// Mesh belonging to the map, the only thing teleport rays hit
#[derive(Component)]
pub struct MapMesh;

/// Bounds have been taken for this model
#[derive(Component)]
struct Measured;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Loading,
    Spawned,
    Failed,
}

#[derive(Resource)]
pub struct SceneAssets {
    character: Handle<Gltf>,
    map: Handle<Gltf>,
    alternate: Option<Handle<Gltf>>,
    character_slot: Slot,
    map_slot: Slot,
    alternate_slot: Slot,
}

/// Animation graph built from the character's named clips
#[derive(Resource)]
pub struct CharacterAnimations {
    pub graph: Handle<AnimationGraph>,
    pub nodes: HashMap<Clip, AnimationNodeIndex>,
    pub clips: HashMap<Clip, Handle<AnimationClip>>,
}

pub struct AssetsPlugin;

impl Plugin for AssetsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<MapToggle>()
            .add_systems(Startup, (load_scene_assets, setup_lighting))
            .add_systems(
                Update,
                (
                    spawn_loaded_assets,
                    measure_models,
                    attach_animation_players,
                    toggle_map_variant,
                )
                    .chain()
                    .in_set(WalkSet::Assets),
            );
    }
}

fn load_scene_assets(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<PenroseSettings>,
) {
    let paths = &settings.0.assets;
    info!(character = %paths.character, map = %paths.map, "Loading scene assets");
    let character: Handle<Gltf> = asset_server.load(&paths.character);
    let map: Handle<Gltf> = asset_server.load(&paths.map);
    let alternate: Option<Handle<Gltf>> = paths.alternate_map.as_ref().map(|path| {
        info!(%path, "Loading alternate map");
        asset_server.load(path)
    });
    let alternate_slot = if alternate.is_some() {
        Slot::Loading
    } else {
        Slot::Failed
    };
    commands.insert_resource(SceneAssets {
        character,
        map,
        alternate,
        character_slot: Slot::Loading,
        map_slot: Slot::Loading,
        alternate_slot,
    });
    commands.spawn((
        WorldRoot,
        Name::new("World"),
        Transform::default(),
        Visibility::default(),
    ));
}

fn setup_lighting(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.95, 0.95, 1.0),
        brightness: 400.0,
        ..default()
    });

    commands.spawn((
        DirectionalLight {
            illuminance: 6000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

enum SceneLoad {
    Pending,
    Ready(Handle<Scene>),
    Failed,
}

/// Default scene of a glTF once it has loaded, falling back to the first one
fn loaded_scene(
    handle: &Handle<Gltf>,
    asset_server: &AssetServer,
    gltfs: &Assets<Gltf>,
) -> SceneLoad {
    match asset_server.get_load_state(handle.id()) {
        Some(LoadState::Loaded) => gltfs
            .get(handle)
            .and_then(|gltf| {
                gltf.default_scene
                    .clone()
                    .or_else(|| gltf.scenes.first().cloned())
            })
            .map_or(SceneLoad::Failed, SceneLoad::Ready),
        Some(LoadState::Failed(_)) => SceneLoad::Failed,
        _ => SceneLoad::Pending,
    }
}

fn spawn_loaded_assets(
    mut commands: Commands,
    mut assets: ResMut<SceneAssets>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    settings: Res<PenroseSettings>,
    mut state: ResMut<LocomotionState>,
    world: Query<Entity, With<WorldRoot>>,
) {
    let Ok(world_root) = world.single() else {
        return;
    };

    if assets.map_slot == Slot::Loading {
        match loaded_scene(&assets.map, &asset_server, &gltfs) {
            SceneLoad::Ready(scene) => {
                info!(path = %settings.0.assets.map, "Map loaded");
                spawn_map(&mut commands, world_root, scene, MapVariant::Primary);
                assets.map_slot = Slot::Spawned;
            }
            SceneLoad::Pending => {}
            SceneLoad::Failed => {
                error!(path = %settings.0.assets.map, "Failed to load map");
                assets.map_slot = Slot::Failed;
            }
        }
    }

    if assets.alternate_slot == Slot::Loading {
        if let Some(handle) = assets.alternate.clone() {
            match loaded_scene(&handle, &asset_server, &gltfs) {
                SceneLoad::Ready(scene) => {
                    info!("Alternate map loaded");
                    spawn_map(&mut commands, world_root, scene, MapVariant::Alternate);
                    assets.alternate_slot = Slot::Spawned;
                }
                SceneLoad::Pending => {}
                SceneLoad::Failed => {
                    warn!("Failed to load alternate map, map swap disabled");
                    assets.alternate_slot = Slot::Failed;
                }
            }
        }
    }

    if assets.character_slot == Slot::Loading {
        match loaded_scene(&assets.character, &asset_server, &gltfs) {
            SceneLoad::Ready(scene) => {
                info!(path = %settings.0.assets.character, "Character loaded");
                if let Some(gltf) = gltfs.get(&assets.character) {
                    let animations = build_animations(gltf, &settings, &mut graphs);
                    state.walker.set_clips(ClipAvailability {
                        idle: animations.clips.contains_key(&Clip::Idle),
                        walk: animations.clips.contains_key(&Clip::Walk),
                        turn: animations.clips.contains_key(&Clip::Turn),
                    });
                    commands.insert_resource(animations);
                }
                let actor = commands
                    .spawn((
                        ActorRoot,
                        Name::new("Actor"),
                        Transform::default(),
                        Visibility::default(),
                    ))
                    .with_child((ActorModel, SceneRoot(scene), Transform::default()))
                    .id();
                commands.entity(world_root).add_child(actor);
                assets.character_slot = Slot::Spawned;
            }
            SceneLoad::Pending => {}
            SceneLoad::Failed => {
                error!(path = %settings.0.assets.character, "Failed to load character");
                assets.character_slot = Slot::Failed;
            }
        }
    }
}

fn spawn_map(
    commands: &mut Commands,
    world_root: Entity,
    scene: Handle<Scene>,
    variant: MapVariant,
) {
    let (name, visibility) = match variant {
        MapVariant::Primary => ("Map", Visibility::Inherited),
        MapVariant::Alternate => ("Alternate map", Visibility::Hidden),
    };
    let map = commands
        .spawn((MapModel, variant, Name::new(name), SceneRoot(scene), visibility))
        .id();
    commands.entity(world_root).add_child(map);
}

fn build_animations(
    gltf: &Gltf,
    settings: &PenroseSettings,
    graphs: &mut Assets<AnimationGraph>,
) -> CharacterAnimations {
    let names = &settings.0.assets;
    let mut clips = HashMap::new();
    for clip in Clip::ALL {
        let name = match clip {
            Clip::Idle => &names.idle_clip,
            Clip::Walk => &names.walk_clip,
            Clip::Turn => &names.turn_clip,
        };
        match gltf.named_animations.get(name.as_str()) {
            Some(handle) => {
                clips.insert(clip, handle.clone());
            }
            None => warn!(%clip, name = %name, "Character has no such animation"),
        }
    }

    let ordered: Vec<(Clip, Handle<AnimationClip>)> = Clip::ALL
        .iter()
        .filter_map(|clip| clips.get(clip).map(|handle| (*clip, handle.clone())))
        .collect();
    let (graph, indices) =
        AnimationGraph::from_clips(ordered.iter().map(|(_, handle)| handle.clone()));
    let nodes = ordered
        .iter()
        .map(|(clip, _)| *clip)
        .zip(indices)
        .collect();

    CharacterAnimations {
        graph: graphs.add(graph),
        nodes,
        clips,
    }
}

/// Mesh bounds of everything below `root`, in `root`'s local space
fn measure_scene(
    root: Entity,
    root_transform: &GlobalTransform,
    children: &Query<&Children>,
    mesh_query: &Query<(&Mesh3d, &GlobalTransform)>,
    meshes: &Assets<Mesh>,
) -> Option<(Bounds, Vec<Entity>)> {
    let to_local = root_transform.affine().inverse();
    let mut bounds: Option<Bounds> = None;
    let mut mesh_entities = Vec::new();

    for entity in children.iter_descendants(root) {
        let Ok((mesh, transform)) = mesh_query.get(entity) else {
            continue;
        };
        let Some(aabb) = meshes.get(&mesh.0).and_then(|mesh| mesh.compute_aabb()) else {
            continue;
        };
        mesh_entities.push(entity);
        let center = Vec3::from(aabb.center);
        let half = Vec3::from(aabb.half_extents);
        for corner in 0..8 {
            let sign = Vec3::new(
                if corner & 1 == 0 { -1.0 } else { 1.0 },
                if corner & 2 == 0 { -1.0 } else { 1.0 },
                if corner & 4 == 0 { -1.0 } else { 1.0 },
            );
            let point = to_local.transform_point3(transform.transform_point(center + half * sign));
            match bounds.as_mut() {
                Some(bounds) => bounds.include(point),
                None => bounds = Some(Bounds::from_min_max(point, point)),
            }
        }
    }

    bounds.map(|bounds| (bounds, mesh_entities))
}

/// Take bounds once the scene has been instanced and hand them to the core
fn measure_models(
    mut commands: Commands,
    models: Query<
        (Entity, &GlobalTransform, Has<ActorModel>, Option<&MapVariant>),
        (Or<(With<ActorModel>, With<MapModel>)>, Without<Measured>),
    >,
    children: Query<&Children>,
    mesh_query: Query<(&Mesh3d, &GlobalTransform)>,
    meshes: Res<Assets<Mesh>>,
    mut model_transforms: Query<&mut Transform, With<ActorModel>>,
    mut state: ResMut<LocomotionState>,
    mut control: ResMut<CameraControl>,
) {
    for (entity, root_transform, is_actor, variant) in &models {
        let Some((bounds, mesh_entities)) =
            measure_scene(entity, root_transform, &children, &mesh_query, &meshes)
        else {
            continue;
        };
        commands.entity(entity).insert(Measured);

        if is_actor {
            let offset = state.walker.attach_actor(&bounds);
            if let Ok(mut transform) = model_transforms.get_mut(entity) {
                transform.translation = offset;
            }
        } else {
            info!(?variant, center = ?bounds.center, size = ?bounds.size(), "Map measured");
            for mesh in mesh_entities {
                commands.entity(mesh).insert(MapMesh);
            }
            // the camera frames the primary map only
            if variant != Some(&MapVariant::Alternate) {
                control.cameras.on_map_loaded(bounds.center);
            }
        }
    }
}

/// Give the character's animation player the clip graph
fn attach_animation_players(
    mut commands: Commands,
    players: Query<Entity, (With<AnimationPlayer>, Without<CharacterPlayer>)>,
    parents: Query<&ChildOf>,
    actor_models: Query<(), With<ActorModel>>,
    animations: Option<Res<CharacterAnimations>>,
) {
    let Some(animations) = animations else {
        return;
    };
    for entity in &players {
        if !parents
            .iter_ancestors(entity)
            .any(|ancestor| actor_models.contains(ancestor))
        {
            continue;
        }
        commands.entity(entity).insert((
            AnimationGraphHandle(animations.graph.clone()),
            AnimationTransitions::new(),
            CharacterPlayer,
        ));
        info!(clips = animations.nodes.len(), "Character animation player ready");
    }
}

/// Swap which map rendition is shown. Needs both renditions spawned.
///
/// Ground rays only hit visible meshes, so the actor settles onto the newly
/// shown map on its next step.
fn toggle_map_variant(
    mut reader: MessageReader<MapToggle>,
    mut maps: Query<(&MapVariant, &mut Visibility), With<MapModel>>,
) {
    let requests = reader.read().count();
    if requests == 0 {
        return;
    }
    let has = |wanted: MapVariant| maps.iter().any(|(variant, _)| *variant == wanted);
    if !has(MapVariant::Primary) || !has(MapVariant::Alternate) {
        debug!("Map swap ignored, alternate map not ready");
        return;
    }
    if requests % 2 == 0 {
        return;
    }
    for (variant, mut visibility) in &mut maps {
        *visibility = match *visibility {
            Visibility::Hidden => Visibility::Inherited,
            _ => Visibility::Hidden,
        };
        if *visibility != Visibility::Hidden {
            info!(?variant, "Map shown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_message::<MapToggle>()
            .add_systems(Update, toggle_map_variant);
        app
    }

    fn spawn(app: &mut App, variant: MapVariant, visibility: Visibility) -> Entity {
        app.world_mut().spawn((MapModel, variant, visibility)).id()
    }

    fn visibility(app: &App, entity: Entity) -> Visibility {
        *app.world().get::<Visibility>(entity).unwrap()
    }

    fn toggle(app: &mut App) {
        app.world_mut().write_message(MapToggle);
        app.update();
    }

    #[test]
    fn test_swap_waits_for_both_maps() {
        let mut app = app();
        let primary = spawn(&mut app, MapVariant::Primary, Visibility::Inherited);

        toggle(&mut app);
        assert_eq!(visibility(&app, primary), Visibility::Inherited);
    }

    #[test]
    fn test_swap_shows_one_map_at_a_time() {
        let mut app = app();
        let primary = spawn(&mut app, MapVariant::Primary, Visibility::Inherited);
        let alternate = spawn(&mut app, MapVariant::Alternate, Visibility::Hidden);

        toggle(&mut app);
        assert_eq!(visibility(&app, primary), Visibility::Hidden);
        assert_eq!(visibility(&app, alternate), Visibility::Inherited);

        // nothing requested, nothing changes
        app.update();
        assert_eq!(visibility(&app, primary), Visibility::Hidden);

        toggle(&mut app);
        assert_eq!(visibility(&app, primary), Visibility::Inherited);
        assert_eq!(visibility(&app, alternate), Visibility::Hidden);
    }

    #[test]
    fn test_two_presses_in_one_frame_cancel() {
        let mut app = app();
        let primary = spawn(&mut app, MapVariant::Primary, Visibility::Inherited);
        spawn(&mut app, MapVariant::Alternate, Visibility::Hidden);

        app.world_mut().write_message(MapToggle);
        app.world_mut().write_message(MapToggle);
        app.update();
        assert_eq!(visibility(&app, primary), Visibility::Inherited);
    }
}
