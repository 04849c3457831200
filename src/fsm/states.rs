//! Mode handler functions and the table builder.
//!
//! ```text
//!          request(Manual)            request(Session)
//!   OFF ◀────────────────▶ MANUAL    OFF ──────────────▶ SESSION
//!    ▲                                ▲                     │
//!    │                                └──[timeout]──────────┘
//!    │
//!    │   request(Autosession) [profile valid]
//!    └──────────────────────────────▶ AUTOSESSION
//!    ▲                                    │
//!    └─────────[profile finished]─────────┘
//!
//!  Any mode ──[supply trip / fatal sensor fault]──▶ OFF
//! ```

use log::{debug, info};

use super::context::{
    AUTOSESSION_INTEGRAL_LIMIT, AUTOSESSION_NEAR_BAND, ModeContext, ModeNotice, PidResetReason,
};
use super::{Mode, StateDescriptor};
use crate::config::ControlKind;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor; Mode::COUNT] {
    [
        // Index 0: Off
        StateDescriptor {
            id: Mode::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_update: off_update,
        },
        // Index 1: Manual
        StateDescriptor {
            id: Mode::Manual,
            name: "Manual",
            on_enter: Some(manual_enter),
            on_exit: None,
            on_update: manual_update,
        },
        // Index 2: Session
        StateDescriptor {
            id: Mode::Session,
            name: "Session",
            on_enter: Some(session_enter),
            on_exit: None,
            on_update: session_update,
        },
        // Index 3: Autosession
        StateDescriptor {
            id: Mode::Autosession,
            name: "Autosession",
            on_enter: Some(autosession_enter),
            on_exit: Some(autosession_exit),
            on_update: autosession_update,
        },
    ]
}

/// Shared entry for the heating modes.
fn enter_heating(ctx: &mut ModeContext) {
    ctx.setpoint_reached = false;
    ctx.request_pid_reset(PidResetReason::ModeChange);
}

/// `measured > setpoint + margin`: the loop overshot badly.
fn running_away(ctx: &ModeContext) -> bool {
    ctx.measured > ctx.setpoint + ctx.settings.reset_high_margin
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut ModeContext) {
    ctx.setpoint_reached = false;
    info!("OFF: heater disabled");
}

fn off_update(_ctx: &mut ModeContext) -> Option<Mode> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MANUAL: heats while the mode is held, no timeout
// ═══════════════════════════════════════════════════════════════════════════

fn manual_enter(ctx: &mut ModeContext) {
    enter_heating(ctx);
    info!("MANUAL: holding {:.0}\u{00b0}C", ctx.setpoint);
}

fn manual_update(_ctx: &mut ModeContext) -> Option<Mode> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  SESSION: timed heating
// ═══════════════════════════════════════════════════════════════════════════

fn session_enter(ctx: &mut ModeContext) {
    enter_heating(ctx);
    let timeout = ctx.settings.session_timeout_ms;
    ctx.session.start(ctx.now_ms, timeout);
    info!(
        "SESSION: {:.0}\u{00b0}C for {}s",
        ctx.setpoint,
        timeout / 1000
    );
}

fn session_update(ctx: &mut ModeContext) -> Option<Mode> {
    if ctx.session.expired(ctx.now_ms) {
        info!("SESSION: timed out after {}s", ctx.ms_in_mode() / 1000);
        ctx.notify(ModeNotice::SessionExpired);
        return Some(Mode::Off);
    }

    if ctx.settings.control != ControlKind::TemperaturePid {
        return None;
    }

    if !ctx.setpoint_reached {
        if ctx.measured >= ctx.setpoint - ctx.settings.reached_margin {
            info!(
                "SESSION: setpoint reached ({:.0}\u{00b0}C / {:.0}\u{00b0}C)",
                ctx.measured, ctx.setpoint
            );
            ctx.setpoint_reached = true;
            ctx.notify(ModeNotice::SetpointReached);
            if ctx.settings.reset_pid_when_reached {
                ctx.request_pid_reset(PidResetReason::SetpointReached);
            }
        }
    } else if running_away(ctx) {
        debug!("SESSION: {:.0}\u{00b0}C over setpoint, PID reset", ctx.measured);
        ctx.request_pid_reset(PidResetReason::Runaway);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  AUTOSESSION: setpoint follows the loaded profile
// ═══════════════════════════════════════════════════════════════════════════

fn autosession_enter(ctx: &mut ModeContext) {
    enter_heating(ctx);
    ctx.autosession_start_ms = ctx.now_ms;
    if let Some(first) = ctx.profile.as_ref().and_then(|p| p.at(0)) {
        ctx.setpoint = ctx.clamp_setpoint(first);
    }
    info!(
        "AUTOSESSION: following profile for {}s",
        ctx.profile.as_ref().map_or(0, |p| p.duration_ms() / 1000)
    );
}

fn autosession_exit(ctx: &mut ModeContext) {
    ctx.profile = None;
    ctx.setpoint = ctx.user_setpoint;
    info!("AUTOSESSION: profile released");
}

fn autosession_update(ctx: &mut ModeContext) -> Option<Mode> {
    let elapsed = ctx.autosession_elapsed_ms();

    let Some(target) = ctx.profile.as_ref().and_then(|p| p.at(elapsed)) else {
        info!("AUTOSESSION: profile finished after {}s", elapsed / 1000);
        ctx.notify(ModeNotice::ProfileFinished);
        return Some(Mode::Off);
    };
    ctx.setpoint = ctx.clamp_setpoint(target);

    if ctx.settings.control != ControlKind::TemperaturePid {
        return None;
    }

    if running_away(ctx) {
        debug!("AUTOSESSION: {:.0}\u{00b0}C over setpoint, PID reset", ctx.measured);
        ctx.request_pid_reset(PidResetReason::Runaway);
    } else if ctx.measured >= ctx.setpoint - AUTOSESSION_NEAR_BAND
        && ctx.pid_integral > AUTOSESSION_INTEGRAL_LIMIT
    {
        debug!("AUTOSESSION: integral {:.1} near setpoint, PID reset", ctx.pid_integral);
        ctx.request_pid_reset(PidResetReason::IntegralWindup);
    }

    None
}
