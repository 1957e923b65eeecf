//! Bridge between clip requests from the walker and Bevy's animation player

use bevy::prelude::*;
use penrose_core::{Clip, ClipFeedback};
use std::time::Duration;
use tracing::debug;

use crate::assets::CharacterAnimations;
use crate::state::{LocomotionState, PendingClip, TurnFeedback, WalkSet};

/// The character's animation player
#[derive(Component)]
pub struct CharacterPlayer;

pub struct AnimationBridgePlugin;

impl Plugin for AnimationBridgePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, poll_turn_feedback.in_set(WalkSet::Feedback))
            .add_systems(Update, apply_clip_request.in_set(WalkSet::Animate));
    }
}

/// Report turn clip progress while the actor is turning in place
fn poll_turn_feedback(
    players: Query<&AnimationPlayer, With<CharacterPlayer>>,
    animations: Option<Res<CharacterAnimations>>,
    clips: Res<Assets<AnimationClip>>,
    state: Res<LocomotionState>,
    mut feedback: ResMut<TurnFeedback>,
) {
    feedback.0 = ClipFeedback::default();
    if !state.walker.locomotion().is_turning() {
        return;
    }
    let Some(animations) = animations else {
        return;
    };
    let Some(node) = animations.nodes.get(&Clip::Turn) else {
        return;
    };
    let Ok(player) = players.single() else {
        return;
    };
    let Some(active) = player.animation(*node) else {
        return;
    };

    let duration = animations
        .clips
        .get(&Clip::Turn)
        .and_then(|handle| clips.get(handle))
        .map(|clip| clip.duration())
        .filter(|duration| *duration > 0.0);
    feedback.0 = ClipFeedback {
        turn_fraction: duration.map(|duration| active.seek_time() / duration),
        turn_finished: active.is_finished(),
    };
}

/// Play the latest requested clip, crossfading from the current one.
///
/// The request stays pending until the character's player exists.
fn apply_clip_request(
    mut pending: ResMut<PendingClip>,
    mut players: Query<(&mut AnimationPlayer, &mut AnimationTransitions), With<CharacterPlayer>>,
    animations: Option<Res<CharacterAnimations>>,
) {
    let Some(request) = pending.0 else {
        return;
    };
    let Some(animations) = animations else {
        return;
    };
    let Ok((mut player, mut transitions)) = players.single_mut() else {
        return;
    };
    pending.0 = None;

    let Some(node) = animations.nodes.get(&request.clip) else {
        debug!(clip = %request.clip, "Requested clip missing from graph");
        return;
    };
    let active = transitions.play(
        &mut player,
        *node,
        Duration::from_secs_f32(request.blend_secs),
    );
    if request.looping {
        active.repeat();
    } else {
        // a one-shot that is still fading out would otherwise resume mid-way
        active.replay();
    }
    debug!(
        clip = %request.clip,
        blend_secs = request.blend_secs,
        one_shot = request.one_shot,
        "Clip playing"
    );
}
