//! Keyboard and pointer mapping

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;
use penrose_core::{CameraMode, InputEvent};

use crate::state::{CameraControl, MapToggle, PointerGestures, WalkInput, WalkSet};

/// Pointer travel below which a press-release counts as a click
const CLICK_SLOP_PX: f32 = 5.0;

/// Pixel-unit scroll (touchpads) converted to wheel lines
const PIXELS_PER_LINE: f32 = 100.0;

const MOVE_KEYS: [KeyCode; 2] = [KeyCode::KeyW, KeyCode::ArrowUp];

/// Tracks the left button between press and release
#[derive(Resource, Debug, Default)]
struct ClickTracker {
    pressed: bool,
    travelled: f32,
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<WalkInput>()
            .add_message::<MapToggle>()
            .init_resource::<PointerGestures>()
            .init_resource::<ClickTracker>()
            .add_systems(
                Update,
                (map_keyboard, collect_pointer).in_set(WalkSet::Input),
            );
    }
}

/// W/↑ hold to walk, T turn, C corner, S view toggle, A map swap
fn map_keyboard(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
    mut writer: MessageWriter<WalkInput>,
    mut map_toggle: MessageWriter<MapToggle>,
) {
    // Releases pass even while egui holds keyboard focus
    if keyboard.any_just_released(MOVE_KEYS) && !keyboard.any_pressed(MOVE_KEYS) {
        writer.write(WalkInput(InputEvent::MoveReleased));
    }

    let egui_wants_keyboard = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_keyboard_input())
        .unwrap_or(false);
    if egui_wants_keyboard {
        return;
    }

    if keyboard.any_just_pressed(MOVE_KEYS) {
        writer.write(WalkInput(InputEvent::MovePressed));
    }
    if keyboard.just_pressed(KeyCode::KeyT) {
        writer.write(WalkInput(InputEvent::TurnRequested));
    }
    if keyboard.just_pressed(KeyCode::KeyC) {
        writer.write(WalkInput(InputEvent::CornerRequested));
    }
    if keyboard.just_pressed(KeyCode::KeyS) {
        writer.write(WalkInput(InputEvent::ViewToggleRequested));
    }
    if keyboard.just_pressed(KeyCode::KeyA) {
        map_toggle.write(MapToggle);
    }
}

/// Route drags and wheel to the camera for the current mode.
///
/// Overview: left drag pans the world, right drag orbits (when unlocked).
/// Walkthrough: left drag orbits, right drag pans. Wheel zooms in both.
fn collect_pointer(
    mouse_button: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    windows: Query<&Window, With<PrimaryWindow>>,
    control: Res<CameraControl>,
    mut contexts: EguiContexts,
    mut gestures: ResMut<PointerGestures>,
    mut tracker: ResMut<ClickTracker>,
) {
    *gestures = PointerGestures::default();

    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);
    let delta = motion.delta;

    if mouse_button.just_pressed(MouseButton::Left) {
        tracker.pressed = !egui_wants_pointer;
        tracker.travelled = 0.0;
    }
    if tracker.pressed && mouse_button.pressed(MouseButton::Left) {
        tracker.travelled += delta.length();
    }
    let dragging = tracker.travelled > CLICK_SLOP_PX;
    if mouse_button.just_released(MouseButton::Left) {
        if tracker.pressed && !dragging && !egui_wants_pointer {
            gestures.click = windows.single().ok().and_then(|w| w.cursor_position());
        }
        tracker.pressed = false;
    }

    if egui_wants_pointer {
        return;
    }

    let mode = control.cameras.mode();
    if mouse_button.pressed(MouseButton::Left) && dragging {
        match mode {
            CameraMode::Overview => gestures.overview_drag += delta,
            CameraMode::Walkthrough => gestures.free_look.rotate += delta,
        }
    }
    if mouse_button.pressed(MouseButton::Right) {
        match mode {
            CameraMode::Overview => gestures.free_look.rotate += delta,
            CameraMode::Walkthrough => gestures.free_look.pan += delta,
        }
    }

    gestures.free_look.zoom = match scroll.unit {
        MouseScrollUnit::Line => scroll.delta.y,
        MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
    };
}
