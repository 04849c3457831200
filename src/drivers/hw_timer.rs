//! Periodic timer backends.
//!
//! On the board each [`PeriodicTimer`](crate::scheduler::PeriodicTimer)
//! sits on an `esp_timer` whose callback pushes one [`TimerEvent`] into
//! the lock-free queue.  Callbacks run in the ESP timer task (not an ISR)
//! and do nothing else.
//!
//! [`SimTimerBackend`] records arm/disarm calls so host builds and tests
//! can drive the scheduler without hardware.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::events::TimerEvent;
use crate::scheduler::TimerBackend;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::events::push_event;

// ── ESP-IDF backend ───────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn timer_cb(arg: *mut core::ffi::c_void) {
    // The event discriminant travels in the pointer value itself.
    if let Some(event) = TimerEvent::from_u8(arg as usize as u8) {
        push_event(event);
    }
}

/// `esp_timer` handle that posts `event` on every expiry.
#[cfg(target_os = "espidf")]
pub struct EspTimerBackend {
    handle: esp_timer_handle_t,
    event: TimerEvent,
}

#[cfg(target_os = "espidf")]
impl EspTimerBackend {
    /// Create (but do not start) the timer.  `name` must be NUL-terminated.
    pub fn new(name: &'static core::ffi::CStr, event: TimerEvent) -> Result<Self, i32> {
        let args = esp_timer_create_args_t {
            callback: Some(timer_cb),
            arg: event as u8 as usize as *mut core::ffi::c_void,
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: name.as_ptr(),
            skip_unhandled_events: true,
        };
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: `args` and `name` outlive the call; the handle is owned
        // by this struct and deleted in Drop.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK {
            log::error!("hw_timer: create {:?} failed (rc={})", name, ret);
            return Err(ret);
        }
        Ok(Self { handle, event })
    }

    pub fn event(&self) -> TimerEvent {
        self.event
    }
}

#[cfg(target_os = "espidf")]
impl TimerBackend for EspTimerBackend {
    fn arm(&self, period_ms: u32) -> Result<(), i32> {
        // SAFETY: handle is valid for the lifetime of self.
        let ret = unsafe { esp_timer_start_periodic(self.handle, u64::from(period_ms) * 1000) };
        if ret == ESP_OK { Ok(()) } else { Err(ret) }
    }

    fn disarm(&self) {
        // SAFETY: handle is valid; stopping an idle timer only returns
        // ESP_ERR_INVALID_STATE, which is harmless here.
        unsafe {
            esp_timer_stop(self.handle);
        }
    }
}

#[cfg(target_os = "espidf")]
impl Drop for EspTimerBackend {
    fn drop(&mut self) {
        // SAFETY: handle came from esp_timer_create and is deleted once.
        unsafe {
            esp_timer_stop(self.handle);
            esp_timer_delete(self.handle);
        }
    }
}

// ── Simulation backend ────────────────────────────────────────

/// Host-side backend: remembers whether it is armed and with what period.
pub struct SimTimerBackend {
    event: TimerEvent,
    armed: AtomicBool,
    period_ms: AtomicU32,
    arms: AtomicU32,
}

impl SimTimerBackend {
    pub fn new(event: TimerEvent) -> Self {
        Self {
            event,
            armed: AtomicBool::new(false),
            period_ms: AtomicU32::new(0),
            arms: AtomicU32::new(0),
        }
    }

    pub fn event(&self) -> TimerEvent {
        self.event
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms.load(Ordering::Relaxed)
    }

    /// How many times the timer has been armed.
    pub fn arm_count(&self) -> u32 {
        self.arms.load(Ordering::Relaxed)
    }
}

impl TimerBackend for SimTimerBackend {
    fn arm(&self, period_ms: u32) -> Result<(), i32> {
        if period_ms == 0 {
            return Err(-1);
        }
        self.period_ms.store(period_ms, Ordering::Relaxed);
        self.arms.fetch_add(1, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
        Ok(())
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }
}
