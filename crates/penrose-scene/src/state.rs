//! Shared resources, messages and system ordering

use bevy::prelude::*;
use penrose_core::{
    CameraState, ClipFeedback, ClipRequest, FreeLookInput, InputEvent, Settings, Walker,
    WorldOffset,
};

/// Loaded configuration
#[derive(Resource, Debug, Clone)]
pub struct PenroseSettings(pub Settings);

/// Locomotion, corner and trigger state for the single actor
#[derive(Resource, Debug)]
pub struct LocomotionState {
    pub walker: Walker,
}

/// Overview/walkthrough cameras plus the overview drag-pan offset
#[derive(Resource, Debug)]
pub struct CameraControl {
    pub cameras: CameraState,
    pub offset: WorldOffset,
}

/// Discrete input intent for the current frame
#[derive(Message, Debug, Clone, Copy)]
pub struct WalkInput(pub InputEvent);

/// Swap the visible map for its alternate rendition
#[derive(Message, Debug, Clone, Copy)]
pub struct MapToggle;

/// Pointer gestures collected this frame, already filtered for UI focus
#[derive(Resource, Debug, Default)]
pub struct PointerGestures {
    pub free_look: FreeLookInput,
    /// Overview drag in pixels
    pub overview_drag: Vec2,
    /// Cursor position of a click that did not turn into a drag
    pub click: Option<Vec2>,
}

/// Turn clip playback polled before the tick
#[derive(Resource, Debug, Default)]
pub struct TurnFeedback(pub ClipFeedback);

/// Clip change waiting for the animation player to exist
#[derive(Resource, Debug, Default)]
pub struct PendingClip(pub Option<ClipRequest>);

/// Per-frame ordering
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkSet {
    Assets,
    Input,
    Feedback,
    Tick,
    Animate,
    Camera,
}
