//! Wrap-safe millisecond tick arithmetic.
//!
//! The hardware tick counter is a free-running `u32` that wraps roughly
//! every 49.7 days.  Deadlines are never stored as absolute "end" ticks;
//! elapsed time is always computed with [`ticks_diff`] against a start
//! tick, which stays correct across a wrap as long as the real interval
//! is shorter than half the counter range.

/// Signed milliseconds from `start` to `end`.
///
/// Positive when `end` is after `start`, negative when before, and
/// correct across a counter wrap.
pub const fn ticks_diff(end: u32, start: u32) -> i32 {
    end.wrapping_sub(start) as i32
}

/// Tick `delta` milliseconds after (or before, if negative) `tick`.
pub const fn ticks_add(tick: u32, delta: i32) -> u32 {
    tick.wrapping_add(delta as u32)
}
