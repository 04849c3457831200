//! Timer event queue.
//!
//! Hardware timer callbacks run in the ESP timer task, which preempts
//! the main loop.  They do no work themselves: each one pushes a
//! [`TimerEvent`] here and returns, and the main loop drains the queue
//! and runs the matching engine entry point to completion.
//!
//! ```text
//! ┌───────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ control timer     │────▶│              │     │              │
//! │ housekeeping timer│────▶│  SPSC queue  │────▶│  Main loop   │
//! │ coil timer        │────▶│  (lock-free) │     │  (consumer)  │
//! └───────────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};

/// Queue slots.  One slot is always left empty.
const EVENT_QUEUE_CAP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerEvent {
    /// Run one control cycle.
    ControlTick = 1,
    /// Check the controller die temperature.
    HousekeepingTick = 2,
    /// Rotate to the next induction coil.
    CoilSwitch = 3,
}

impl TimerEvent {
    pub(crate) fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::ControlTick),
            2 => Some(Self::HousekeepingTick),
            3 => Some(Self::CoilSwitch),
            _ => None,
        }
    }
}

// ── SPSC queue ────────────────────────────────────────────────
//
// Timer task produces, main loop consumes.  The queue is split once by
// `init_event_queue`; until then pushes are dropped and pops see nothing.

static mut EVENT_QUEUE: Queue<TimerEvent, EVENT_QUEUE_CAP> = Queue::new();
static mut PRODUCER: Option<Producer<'static, TimerEvent, EVENT_QUEUE_CAP>> = None;
static mut CONSUMER: Option<Consumer<'static, TimerEvent, EVENT_QUEUE_CAP>> = None;

static QUEUE_CLAIMED: AtomicBool = AtomicBool::new(false);
static QUEUE_READY: AtomicBool = AtomicBool::new(false);

/// Split the queue into its producer and consumer halves.  Call once at
/// boot before any timer is started; later calls do nothing.
pub fn init_event_queue() {
    if QUEUE_CLAIMED.swap(true, Ordering::AcqRel) {
        return;
    }
    // SAFETY: the swap above admits exactly one caller, and neither half
    // is reachable until QUEUE_READY is published below.
    unsafe {
        let (producer, consumer) = (*(&raw mut EVENT_QUEUE)).split();
        *(&raw mut PRODUCER) = Some(producer);
        *(&raw mut CONSUMER) = Some(consumer);
    }
    QUEUE_READY.store(true, Ordering::Release);
}

/// Push an event.  Timer task only.
/// Returns `false` if the queue is full or not initialised (event dropped).
pub fn push_event(event: TimerEvent) -> bool {
    if !QUEUE_READY.load(Ordering::Acquire) {
        return false;
    }
    // SAFETY: esp_timer dispatches every callback from its one task, so
    // there is a single producer.
    let producer = unsafe { (*(&raw mut PRODUCER)).as_mut() };
    producer.is_some_and(|p| p.enqueue(event).is_ok())
}

/// Pop the oldest event.  Main loop only.
pub fn pop_event() -> Option<TimerEvent> {
    consumer()?.dequeue()
}

/// Drain all pending events into `handler`, FIFO.
pub fn drain_events(mut handler: impl FnMut(TimerEvent)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

pub fn queue_is_empty() -> bool {
    queue_len() == 0
}

pub fn queue_len() -> usize {
    consumer().map_or(0, |c| c.len())
}

fn consumer() -> Option<&'static mut Consumer<'static, TimerEvent, EVENT_QUEUE_CAP>> {
    if !QUEUE_READY.load(Ordering::Acquire) {
        return None;
    }
    // SAFETY: only the main loop consumes, and it never holds two of
    // these borrows at once.
    unsafe { (*(&raw mut CONSUMER)).as_mut() }
}
