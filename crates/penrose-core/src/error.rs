//! Error taxonomy of the illusion core.
//!
//! None of these are fatal. Callers log them and carry on with the next frame.

use std::fmt;
use thiserror::Error;

/// Loadable resources the core depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Character,
    Map,
    IdleClip,
    WalkClip,
    TurnClip,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Character => "character mesh",
            AssetKind::Map => "map mesh",
            AssetKind::IdleClip => "idle clip",
            AssetKind::WalkClip => "walk clip",
            AssetKind::TurnClip => "turn clip",
        };
        f.write_str(name)
    }
}

/// Why a request was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    TransitionActive,
    TransitionArmed,
    AlreadyTurning,
    NotWalking,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Precondition::TransitionActive => "a corner transition is running",
            Precondition::TransitionArmed => "a corner transition is armed",
            Precondition::AlreadyTurning => "the actor is already turning",
            Precondition::NotWalking => "the actor is not walking",
        };
        f.write_str(reason)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IllusionError {
    #[error("{0} has not finished loading")]
    MissingAsset(AssetKind),
    #[error("request ignored: {0}")]
    InvalidPrecondition(Precondition),
    #[error("armed corner never started, released after {waited:.2}s")]
    StuckArmedTransition { waited: f32 },
}

pub type Result<T> = std::result::Result<T, IllusionError>;
