//! User actions.
//!
//! Every key press, click and scroll is translated into an [`Action`] and
//! handed to [`App::dispatch`](crate::App::dispatch). Actions that target one
//! server carry its key, so a single handler serves every card no matter how
//! many are on screen.

use crate::data::TimeWindow;

/// Direction for moving the card selection through the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Refresh,
    ToggleHelp,
    CloseOverlay,
    Export,

    // Card selection
    SelectCard(usize),
    Move(Direction),
    SelectFirst,
    SelectLast,

    // Per-server actions
    SetWindow { key: String, window: TimeWindow },
    CycleWindow { key: String, forward: bool },
    OpenLogs { key: String },

    // Logs overlay scrolling
    ScrollLogs(i32),

    // Filter
    StartFilter,
    ClearFilter,
}
