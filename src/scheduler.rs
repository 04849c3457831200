//! Single-instance periodic timer.
//!
//! Wraps a hardware periodic timer (see [`TimerBackend`]) and enforces
//! that it is started and stopped strictly alternately.  A second
//! `start()` usually means a callback re-entered or a code path recursed,
//! which in a heater controller is a safety bug, so misuse is reported as
//! a [`SchedulerError`] instead of being absorbed.
//!
//! ```text
//!            start()                 arm ok
//!   Idle ──────────────▶ Starting ──────────▶ Running
//!    ▲                      │ arm failed        │
//!    │◀─────────────────────┘                   │ stop()
//!    │                                          ▼
//!    └────────────────────────────────────── Stopping
//!                       disarmed
//! ```
//!
//! The state lives in an `AtomicU8` and every transition is a
//! compare-and-swap, so a check-then-act race between the main loop and
//! a preempting timer task cannot double-arm the hardware.

use core::sync::atomic::{AtomicU8, Ordering};

use log::{debug, error};

use crate::error::SchedulerError;

/// Hardware primitive behind a [`PeriodicTimer`].
pub trait TimerBackend {
    /// Begin firing every `period_ms`.  Returns the platform error code on failure.
    fn arm(&self, period_ms: u32) -> Result<(), i32>;

    /// Stop firing.  No callback starts after this returns.
    fn disarm(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerState {
    Idle = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
}

impl TimerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Idle,
        }
    }
}

/// Periodic timer that refuses double start and double stop.
pub struct PeriodicTimer<B: TimerBackend> {
    name: &'static str,
    period_ms: u32,
    state: AtomicU8,
    backend: B,
}

impl<B: TimerBackend> PeriodicTimer<B> {
    pub fn new(name: &'static str, period_ms: u32, backend: B) -> Self {
        Self {
            name,
            period_ms,
            state: AtomicU8::new(TimerState::Idle as u8),
            backend,
        }
    }

    /// Arm the timer.  Fails if it is not idle.
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.state
            .compare_exchange(
                TimerState::Idle as u8,
                TimerState::Starting as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| {
                error!("{} timer: start() while not idle", self.name);
                SchedulerError::AlreadyRunning(self.name)
            })?;

        if let Err(rc) = self.backend.arm(self.period_ms) {
            self.state.store(TimerState::Idle as u8, Ordering::Release);
            error!("{} timer: arm failed (rc={})", self.name, rc);
            return Err(SchedulerError::ArmFailed(self.name, rc));
        }

        self.state.store(TimerState::Running as u8, Ordering::Release);
        debug!("{} timer started ({} ms)", self.name, self.period_ms);
        Ok(())
    }

    /// Disarm the timer.  Fails if it is not running.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        self.state
            .compare_exchange(
                TimerState::Running as u8,
                TimerState::Stopping as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| {
                error!("{} timer: stop() while not running", self.name);
                SchedulerError::NotRunning(self.name)
            })?;

        self.backend.disarm();
        self.state.store(TimerState::Idle as u8, Ordering::Release);
        debug!("{} timer stopped", self.name);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }

    pub fn state(&self) -> TimerState {
        TimerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Start/stop control over the main control timer, as seen by code that
/// must pause it (the die-overheat wait) without owning its backend type.
pub trait ControlTimer {
    fn start(&self) -> Result<(), SchedulerError>;
    fn stop(&self) -> Result<(), SchedulerError>;
    fn is_running(&self) -> bool;
}

impl<B: TimerBackend> ControlTimer for PeriodicTimer<B> {
    fn start(&self) -> Result<(), SchedulerError> {
        PeriodicTimer::start(self)
    }

    fn stop(&self) -> Result<(), SchedulerError> {
        PeriodicTimer::stop(self)
    }

    fn is_running(&self) -> bool {
        PeriodicTimer::is_running(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct CountingBackend {
        armed: Cell<bool>,
        arms: Cell<u32>,
        fail_next: Cell<bool>,
    }

    impl TimerBackend for CountingBackend {
        fn arm(&self, _period_ms: u32) -> Result<(), i32> {
            if self.fail_next.replace(false) {
                return Err(-1);
            }
            self.armed.set(true);
            self.arms.set(self.arms.get() + 1);
            Ok(())
        }

        fn disarm(&self) {
            self.armed.set(false);
        }
    }

    fn timer() -> PeriodicTimer<CountingBackend> {
        PeriodicTimer::new("control", 371, CountingBackend::default())
    }

    #[test]
    fn start_then_stop() {
        let t = timer();
        assert!(!t.is_running());
        t.start().unwrap();
        assert!(t.is_running());
        assert!(t.backend().armed.get());
        t.stop().unwrap();
        assert!(!t.is_running());
        assert!(!t.backend().armed.get());
    }

    #[test]
    fn double_start_is_an_error() {
        let t = timer();
        t.start().unwrap();
        assert_eq!(t.start(), Err(SchedulerError::AlreadyRunning("control")));
        assert_eq!(t.backend().arms.get(), 1);
        assert!(t.is_running());
    }

    #[test]
    fn double_stop_is_an_error() {
        let t = timer();
        assert_eq!(t.stop(), Err(SchedulerError::NotRunning("control")));
        t.start().unwrap();
        t.stop().unwrap();
        assert_eq!(t.stop(), Err(SchedulerError::NotRunning("control")));
    }

    #[test]
    fn failed_arm_returns_to_idle() {
        let t = timer();
        t.backend().fail_next.set(true);
        assert_eq!(t.start(), Err(SchedulerError::ArmFailed("control", -1)));
        assert_eq!(t.state(), TimerState::Idle);
        t.start().unwrap();
        assert!(t.is_running());
    }

    #[test]
    fn restart_after_stop() {
        let t = timer();
        for _ in 0..3 {
            t.start().unwrap();
            t.stop().unwrap();
        }
        assert_eq!(t.backend().arms.get(), 3);
    }
}
