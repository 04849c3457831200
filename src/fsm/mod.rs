//! Operating-mode state machine.
//!
//! Function-pointer table, one row per mode:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────────┬───────────┬──────────┬────────────────┐ │
//! │  │ Mode        │ on_enter  │ on_exit  │ on_update      │ │
//! │  ├─────────────┼───────────┼──────────┼────────────────┤ │
//! │  │ Off         │ fn(ctx)   │ -        │ fn(ctx)->Opt<> │ │
//! │  │ Manual      │ fn(ctx)   │ -        │ fn(ctx)->Opt<> │ │
//! │  │ Session     │ fn(ctx)   │ -        │ fn(ctx)->Opt<> │ │
//! │  │ Autosession │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Opt<> │ │
//! │  └─────────────┴───────────┴──────────┴────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The control engine calls [`ModeMachine::tick`] once per control cycle
//! after it has written the fresh measurement and time into the
//! [`ModeContext`].  `on_update` may return `Some(next)` to leave the
//! mode (session timeout, profile finished).  External commands go
//! through [`ModeMachine::request`].

pub mod context;
pub mod states;

use context::ModeContext;
use log::{info, warn};

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Operating modes.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    Off = 0,
    Manual = 1,
    Session = 2,
    Autosession = 3,
}

impl Mode {
    /// Total number of modes, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a table index back to `Mode`.  Out-of-range indices map to
    /// `Off` (the safe fallback) after a debug assertion.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Off,
            1 => Self::Manual,
            2 => Self::Session,
            3 => Self::Autosession,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Off
            }
        }
    }

    pub fn is_active(self) -> bool {
        self != Self::Off
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut ModeContext);

/// Per-cycle update.  `Some(next)` leaves the mode.
pub type StateUpdateFn = fn(&mut ModeContext) -> Option<Mode>;

/// One row of the mode table.
pub struct StateDescriptor {
    pub id: Mode,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

/// Why a mode request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequestError {
    /// Autosession needs a valid profile loaded first.
    NoProfile,
}

impl core::fmt::Display for ModeRequestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoProfile => write!(f, "no valid autosession profile loaded"),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ModeMachine {
    table: [StateDescriptor; Mode::COUNT],
    current: usize,
}

impl ModeMachine {
    pub fn new(table: [StateDescriptor; Mode::COUNT], initial: Mode) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Machine with the standard table, starting in `Off`.
    pub fn standard() -> Self {
        Self::new(states::build_state_table(), Mode::Off)
    }

    /// Run the initial `on_enter`.  Call once before the first `tick()`.
    pub fn start(&mut self, ctx: &mut ModeContext) {
        info!("Mode machine starting in {}", self.table[self.current].name);
        ctx.entered_at_ms = ctx.now_ms;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run the current mode's update and follow any transition it returns.
    pub fn tick(&mut self, ctx: &mut ModeContext) {
        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    /// Explicit mode change from a command.
    ///
    /// Requesting the current mode restarts it: `on_enter` runs again
    /// without `on_exit`, so a session restarts its timer and an
    /// autosession its profile clock.  Autosession is refused without a
    /// valid profile.
    pub fn request(&mut self, next: Mode, ctx: &mut ModeContext) -> Result<(), ModeRequestError> {
        if next == Mode::Autosession && !ctx.has_valid_profile() {
            warn!("Mode request Autosession refused: no profile");
            return Err(ModeRequestError::NoProfile);
        }
        self.transition(next, ctx);
        Ok(())
    }

    /// Leave the current mode for `Off` (safety shutdown).  No-op if already Off.
    pub fn force_off(&mut self, ctx: &mut ModeContext) {
        if self.current != Mode::Off as usize {
            self.transition(Mode::Off, ctx);
        }
    }

    pub fn current(&self) -> Mode {
        Mode::from_index(self.current)
    }

    pub fn current_name(&self) -> &'static str {
        self.table[self.current].name
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: Mode, ctx: &mut ModeContext) {
        let next_idx = next as usize;
        info!(
            "Mode transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if next_idx != self.current {
            if let Some(exit) = self.table[self.current].on_exit {
                exit(ctx);
            }
        }

        self.current = next_idx;
        ctx.entered_at_ms = ctx.now_ms;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
