//! Inbound commands to the control engine.
//!
//! The input collaborator (encoder, buttons, a future serial console)
//! decodes raw input into these discrete commands and posts them to
//! [`COMMAND_CHANNEL`].  The main loop drains the channel between
//! control ticks, so commands and control cycles never interleave.
//!
//! ```text
//! ┌──────────────┐  ControlCommand  ┌──────────────┐
//! │ Input task   │─────────────────▶│  Main loop   │──▶ engine.handle_command()
//! └──────────────┘                  └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::fsm::Mode;

/// Longest profile name accepted by [`ControlCommand::SelectProfile`].
pub const PROFILE_NAME_LEN: usize = 32;

/// Discrete requests from the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    RequestMode(Mode),

    /// New user setpoint (°C).  Clamped to `[1, max_allowed_setpoint]`.
    SetSetpoint(i32),

    /// Manual duty cycle for duty-cycle control (0-100%).
    SetDutyCycle(f32),

    /// Target wattage for watts control.
    SetWatts(f32),

    /// Runtime wattage budget used for duty derating.
    SetMaxWatts(f32),

    /// Load a named autosession profile.
    SelectProfile(heapless::String<PROFILE_NAME_LEN>),

    /// Add the configured extension to a session in its last minute.
    ExtendSession,

    /// Start a session with only the warning window left.
    StartShortSession,

    /// Move the autosession clock by this many adjustment steps.
    /// Positive skips ahead in the profile, negative goes back.
    ShiftAutosession(i32),
}

/// Channel depth for inbound commands.
const CMD_DEPTH: usize = 16;

/// Inbound command channel: input collaborator → main loop.
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, ControlCommand, CMD_DEPTH> =
    Channel::new();

/// Post a command without blocking.  Returns `false` (and logs) if the
/// channel is full.
pub fn submit(cmd: ControlCommand) -> bool {
    match COMMAND_CHANNEL.try_send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("command channel full, dropping command");
            false
        }
    }
}

/// Hand every queued command to `f`, oldest first.
pub fn drain(mut f: impl FnMut(ControlCommand)) -> usize {
    let mut count = 0;
    while let Ok(cmd) = COMMAND_CHANNEL.try_receive() {
        f(cmd);
        count += 1;
    }
    count
}
