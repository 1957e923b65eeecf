//! Penrose Walk core
//!
//! Engine-independent state for the impossible-architecture walking illusion:
//! - Frame basis math and the fixed camera pose
//! - Locomotion on the walkable map, in-place turns and clip selection
//! - The corner transition engine and its distance-based auto-trigger
//! - The overview/walkthrough camera pair and the overview drag-pan offset

pub mod actor;
pub mod animation;
pub mod basis;
pub mod camera;
pub mod config;
pub mod corner;
pub mod error;
pub mod ground;
pub mod locomotion;
pub mod pan;
pub mod pose;
pub mod trigger;
pub mod walker;

pub use actor::{ActorState, Bounds};
pub use animation::{AnimationDirector, Clip, ClipAvailability, ClipFeedback, ClipRequest};
pub use basis::FrameAxes;
pub use camera::{
    ActiveCamera, Backdrop, CameraMode, CameraReadout, CameraState, FreeLook, FreeLookInput,
    ProjectionKind,
};
pub use config::{load_config, save_default_config, ConfigError, Settings, WalkthroughStyle};
pub use corner::{CornerEngine, CornerParams, CornerTransition, CornerVariant};
pub use error::{AssetKind, IllusionError, Precondition};
pub use ground::GroundQuery;
pub use locomotion::{Gait, Locomotion};
pub use pan::WorldOffset;
pub use pose::{CameraTransform, Pose};
pub use trigger::{AutoTrigger, DirectionSign};
pub use walker::{InputEvent, TickReport, Walker, WalkerEvent};
