use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("layer track not found: {0}")]
    TrackNotFound(usize),

    #[error("layer group not found: {0}")]
    GroupNotFound(Uuid),

    #[error("cannot remove the last remaining layer track")]
    LastTrack,

    #[error("need at least 2 distinct layer tracks to merge, got {0}")]
    MergeNeedsTwoLayers(usize),

    #[error("merge target {target} must be one of the source tracks")]
    MergeTargetNotInSources { target: usize },

    #[error("unsupported automation action type: {0}")]
    UnsupportedAction(String),

    #[error("cannot edit pixels while a render pass is in flight")]
    RenderInProgress,

    #[error("edit targets layer {target}, but the active layer is {active}")]
    EditTargetMismatch { target: Uuid, active: Uuid },

    #[error("pixel ({x}, {y}) is outside the {width}x{height} matrix")]
    PixelOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("document version {found} is not supported (current {current})")]
    UnsupportedVersion {
        found: semver::Version,
        current: semver::Version,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
