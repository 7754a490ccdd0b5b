use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grid::{Grid, Rgb};
use crate::transforms;

// =============================================================================
// Effect parameters
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    #[serde(alias = "Left")]
    Left,
    #[default]
    #[serde(alias = "Right")]
    Right,
    #[serde(alias = "Up")]
    Up,
    #[serde(alias = "Down")]
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    #[default]
    #[serde(alias = "90 Clockwise", alias = "Clockwise")]
    Clockwise,
    #[serde(
        alias = "90 Counter-Clockwise",
        alias = "90 Counter Clockwise",
        alias = "counter-clockwise"
    )]
    CounterClockwise,
}

/// `Horizontal` swaps left and right, `Vertical` swaps top and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[serde(alias = "Horizontal")]
    Horizontal,
    #[serde(alias = "Vertical")]
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipeMode {
    #[default]
    #[serde(alias = "Left to Right")]
    LeftToRight,
    #[serde(alias = "Right to Left")]
    RightToLeft,
    #[serde(alias = "Top to Bottom")]
    TopToBottom,
    #[serde(alias = "Bottom to Top")]
    BottomToTop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealEdge {
    #[default]
    #[serde(alias = "Left")]
    Left,
    #[serde(alias = "Right")]
    Right,
    #[serde(alias = "Top")]
    Top,
    #[serde(alias = "Bottom")]
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadialKind {
    #[default]
    #[serde(alias = "Spiral")]
    Spiral,
    #[serde(alias = "Pulse")]
    Pulse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    #[default]
    #[serde(alias = "RGB")]
    Rgb,
    #[serde(alias = "RYB")]
    Ryb,
}

fn one() -> u32 {
    1
}

fn horizontal() -> Axis {
    Axis::Horizontal
}

fn vertical() -> Axis {
    Axis::Vertical
}

// =============================================================================
// Effect
// =============================================================================

/// The kind of an automation effect, without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Scroll,
    Rotate,
    Mirror,
    Flip,
    Bounce,
    Wipe,
    Reveal,
    Radial,
    ColourCycle,
    Invert,
    Unknown,
}

impl ActionKind {
    /// Fixed evaluation order; lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Scroll => 10,
            Self::Rotate => 20,
            Self::Mirror | Self::Flip => 30,
            Self::Bounce => 40,
            Self::Wipe => 50,
            Self::Reveal => 60,
            Self::Radial => 70,
            Self::ColourCycle => 80,
            Self::Invert => 90,
            Self::Unknown => 100,
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Scroll => "Scroll",
            Self::Rotate => "Rotate",
            Self::Mirror => "Mirror",
            Self::Flip => "Flip",
            Self::Bounce => "Bounce",
            Self::Wipe => "Wipe",
            Self::Reveal => "Reveal",
            Self::Radial => "Radial",
            Self::ColourCycle => "Colour Cycle",
            Self::Invert => "Invert",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the effect moves cells, in which case alpha moves with them.
    pub fn moves_pixels(&self) -> bool {
        matches!(
            self,
            Self::Scroll | Self::Rotate | Self::Mirror | Self::Flip | Self::Bounce
        )
    }

    /// All built-in action kinds, in priority order.
    pub fn all_builtin() -> Vec<ActionKind> {
        vec![
            Self::Scroll,
            Self::Rotate,
            Self::Mirror,
            Self::Flip,
            Self::Bounce,
            Self::Wipe,
            Self::Reveal,
            Self::Radial,
            Self::ColourCycle,
            Self::Invert,
        ]
    }
}

/// One automation effect with its typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    Scroll {
        #[serde(default)]
        direction: ScrollDirection,
        #[serde(default = "one")]
        offset: u32,
    },
    Rotate {
        #[serde(default, alias = "mode")]
        direction: RotateDirection,
    },
    Mirror {
        #[serde(default = "horizontal")]
        axis: Axis,
    },
    Flip {
        #[serde(default = "vertical")]
        axis: Axis,
    },
    Bounce {
        #[serde(default = "horizontal")]
        axis: Axis,
    },
    Wipe {
        #[serde(default)]
        mode: WipeMode,
        #[serde(default = "one")]
        offset: u32,
    },
    Reveal {
        #[serde(default, alias = "direction")]
        edge: RevealEdge,
        #[serde(default = "one")]
        offset: u32,
    },
    Radial {
        #[serde(default)]
        kind: RadialKind,
    },
    #[serde(alias = "color_cycle")]
    ColourCycle {
        #[serde(default)]
        mode: CycleMode,
    },
    Invert,
    /// Placeholder for a persisted `type` tag this build does not recognise.
    #[serde(other)]
    Unknown,
}

impl Effect {
    /// The effect of `kind` with default parameters.
    pub fn new(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Scroll => Self::Scroll {
                direction: ScrollDirection::default(),
                offset: 1,
            },
            ActionKind::Rotate => Self::Rotate {
                direction: RotateDirection::default(),
            },
            ActionKind::Mirror => Self::Mirror { axis: horizontal() },
            ActionKind::Flip => Self::Flip { axis: vertical() },
            ActionKind::Bounce => Self::Bounce { axis: horizontal() },
            ActionKind::Wipe => Self::Wipe {
                mode: WipeMode::default(),
                offset: 1,
            },
            ActionKind::Reveal => Self::Reveal {
                edge: RevealEdge::default(),
                offset: 1,
            },
            ActionKind::Radial => Self::Radial {
                kind: RadialKind::default(),
            },
            ActionKind::ColourCycle => Self::ColourCycle {
                mode: CycleMode::default(),
            },
            ActionKind::Invert => Self::Invert,
            ActionKind::Unknown => Self::Unknown,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Scroll { .. } => ActionKind::Scroll,
            Self::Rotate { .. } => ActionKind::Rotate,
            Self::Mirror { .. } => ActionKind::Mirror,
            Self::Flip { .. } => ActionKind::Flip,
            Self::Bounce { .. } => ActionKind::Bounce,
            Self::Wipe { .. } => ActionKind::Wipe,
            Self::Reveal { .. } => ActionKind::Reveal,
            Self::Radial { .. } => ActionKind::Radial,
            Self::ColourCycle { .. } => ActionKind::ColourCycle,
            Self::Invert => ActionKind::Invert,
            Self::Unknown => ActionKind::Unknown,
        }
    }

    pub fn priority(&self) -> u8 {
        self.kind().priority()
    }

    /// True when applying at `step` leaves every cell where it was.
    pub fn is_identity_at(&self, step: usize) -> bool {
        match self {
            Self::Scroll { .. } => step == 0,
            Self::Rotate { .. } => step % 4 == 0,
            Self::Bounce { .. } => step % 2 == 0,
            Self::Unknown => true,
            _ => false,
        }
    }

    /// Apply this effect to a pixel grid at `step`.
    pub fn apply(&self, grid: Grid<Rgb>, step: usize) -> Grid<Rgb> {
        if matches!(self, Self::Unknown) {
            tracing::warn!("unknown automation action type, action not applied");
            return grid;
        }
        if self.is_identity_at(step) {
            return grid;
        }
        match *self {
            Self::Scroll { direction, offset } => {
                let (dx, dy) = scroll_delta(direction, offset, step);
                transforms::scroll(&grid, dx, dy, Rgb::BLACK)
            }
            Self::Rotate { direction } => transforms::rotate(&grid, direction, step, Rgb::BLACK),
            Self::Mirror { axis } | Self::Flip { axis } | Self::Bounce { axis } => {
                transforms::reflect(&grid, axis)
            }
            Self::Wipe { mode, offset } => transforms::wipe(&grid, mode, progress(offset, step)),
            Self::Reveal { edge, offset } => {
                transforms::reveal(&grid, edge, progress(offset, step))
            }
            Self::Radial { kind } => match kind {
                RadialKind::Spiral => transforms::spiral(&grid, step),
                RadialKind::Pulse => transforms::pulse(&grid, step),
            },
            Self::ColourCycle { mode } => {
                let (w, h) = (grid.width(), grid.height());
                let mut flat = grid.into_flat();
                transforms::colour_cycle(&mut flat, mode);
                Grid::from_flat(w, h, &flat, Rgb::BLACK)
            }
            Self::Invert => {
                let (w, h) = (grid.width(), grid.height());
                let mut flat = grid.into_flat();
                transforms::invert(&mut flat);
                Grid::from_flat(w, h, &flat, Rgb::BLACK)
            }
            Self::Unknown => grid,
        }
    }

    /// Apply this effect to an alpha grid at `step`.
    ///
    /// Alpha follows every cell that moves; cells vacated by a scroll become
    /// fully transparent. Colour-only effects leave alpha untouched.
    pub fn apply_alpha(&self, grid: Grid<u8>, step: usize) -> Grid<u8> {
        if !self.kind().moves_pixels() || self.is_identity_at(step) {
            return grid;
        }
        match *self {
            Self::Scroll { direction, offset } => {
                let (dx, dy) = scroll_delta(direction, offset, step);
                transforms::scroll(&grid, dx, dy, 0)
            }
            Self::Rotate { direction } => transforms::rotate(&grid, direction, step, 0),
            Self::Mirror { axis } | Self::Flip { axis } | Self::Bounce { axis } => {
                transforms::reflect(&grid, axis)
            }
            _ => grid,
        }
    }
}

/// Cells covered after `step` frames at `offset` cells per frame. Offsets
/// below 1 are treated as 1.
fn progress(offset: u32, step: usize) -> usize {
    step.saturating_mul(offset.max(1) as usize)
}

fn scroll_delta(direction: ScrollDirection, offset: u32, step: usize) -> (i64, i64) {
    let d = i64::try_from(progress(offset, step)).unwrap_or(i64::MAX);
    match direction {
        ScrollDirection::Right => (d, 0),
        ScrollDirection::Left => (-d, 0),
        ScrollDirection::Down => (0, d),
        ScrollDirection::Up => (0, -d),
    }
}

// =============================================================================
// AutomationAction
// =============================================================================

/// An effect bound to an inclusive frame window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationAction {
    pub id: Uuid,
    pub effect: Effect,
    #[serde(default)]
    pub start_frame: usize,
    #[serde(default)]
    pub end_frame: Option<usize>,
}

impl AutomationAction {
    /// Create an action active from `start_frame` onward.
    pub fn new(effect: Effect, start_frame: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            effect,
            start_frame,
            end_frame: None,
        }
    }

    pub fn with_end(mut self, end_frame: usize) -> Self {
        self.end_frame = Some(end_frame);
        self
    }

    pub fn is_active_at(&self, frame_index: usize) -> bool {
        frame_index >= self.start_frame && self.end_frame.is_none_or(|end| frame_index <= end)
    }

    /// Frames elapsed since the action started, if active.
    pub fn step_at(&self, frame_index: usize) -> Option<usize> {
        self.is_active_at(frame_index)
            .then(|| frame_index - self.start_frame)
    }

    pub fn priority(&self) -> u8 {
        self.effect.priority()
    }
}

/// Actions in evaluation order: ascending priority, insertion order on ties.
fn ordered(actions: &[AutomationAction]) -> Vec<&AutomationAction> {
    let mut sorted: Vec<&AutomationAction> = actions.iter().collect();
    sorted.sort_by_key(|a| a.priority());
    sorted
}

/// Run every action active at `frame_index` over `pixels`.
///
/// Each action sees the output of the previous one within the frame; nothing
/// is carried between frames.
pub fn apply_pipeline(
    actions: &[AutomationAction],
    pixels: &[Rgb],
    frame_index: usize,
    width: usize,
    height: usize,
) -> Vec<Rgb> {
    let mut grid = Grid::from_flat(width, height, pixels, Rgb::BLACK);
    for action in ordered(actions) {
        if let Some(step) = action.step_at(frame_index) {
            grid = action.effect.apply(grid, step);
        }
    }
    grid.into_flat()
}

/// Alpha companion of [`apply_pipeline`]. Missing entries read as opaque.
pub fn apply_alpha_pipeline(
    actions: &[AutomationAction],
    alpha: &[u8],
    frame_index: usize,
    width: usize,
    height: usize,
) -> Vec<u8> {
    let mut grid = Grid::from_flat(width, height, alpha, 255);
    for action in ordered(actions) {
        if let Some(step) = action.step_at(frame_index) {
            grid = action.effect.apply_alpha(grid, step);
        }
    }
    grid.into_flat()
}
