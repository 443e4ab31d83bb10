//! Timer and frame scheduling abstraction
//!
//! The game loop needs three host services: a cancellable repeating timer
//! (the 1-second countdown), one-shot timeouts (deferred explosion cleanup),
//! and a display-refresh callback (the frame chain). `Scheduler` captures
//! exactly that, so the core runs against `ManualScheduler` in tests and the
//! native demo, and against the browser's real timers on wasm32.
//!
//! Run-to-completion semantics: every implementation runs one callback fully
//! before starting the next, on one logical thread. No ordering is guaranteed
//! between the three callback sources beyond that.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Cancellation token for a repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(pub i32);

/// Host timer capability. Single-threaded; callbacks may re-enter the
/// scheduler to schedule more work.
pub trait Scheduler {
    /// Fire `cb` every `interval_ms` until cancelled.
    fn schedule_repeating(&self, interval_ms: u32, cb: Rc<dyn Fn()>) -> TimerHandle;

    /// Stop a repeating timer. Unknown handles are ignored.
    fn cancel_repeating(&self, handle: TimerHandle);

    /// Fire `cb` once after `delay_ms`.
    fn schedule_timeout(&self, delay_ms: u32, cb: Box<dyn FnOnce()>);

    /// Fire `cb` at the next display refresh. Not cancellable - callbacks
    /// that should stop a chain simply decline to reschedule.
    fn schedule_next_frame(&self, cb: Box<dyn FnOnce()>);
}

struct RepeatingTimer {
    handle: TimerHandle,
    interval: u64,
    due: u64,
    cb: Rc<dyn Fn()>,
}

struct Timeout {
    due: u64,
    seq: u64,
    cb: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct Queues {
    now: u64,
    next_handle: i32,
    next_seq: u64,
    repeating: Vec<RepeatingTimer>,
    timeouts: Vec<Timeout>,
    frames: VecDeque<Box<dyn FnOnce()>>,
}

enum Fired {
    Repeating(Rc<dyn Fn()>),
    Timeout(Box<dyn FnOnce()>),
}

impl Queues {
    /// Pop the earliest timer due at or before `limit`, advancing `now` to
    /// its due time. Ties go to the earliest-registered timeout.
    fn take_next_due(&mut self, limit: u64) -> Option<Fired> {
        let timeout_due = self
            .timeouts
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, t)| (t.due, i));
        let repeating_due = self
            .repeating
            .iter()
            .enumerate()
            .min_by_key(|(_, r)| r.due)
            .map(|(i, r)| (r.due, i));

        match (timeout_due, repeating_due) {
            (Some((td, ti)), rd) if td <= limit && rd.is_none_or(|(d, _)| td <= d) => {
                self.now = td;
                Some(Fired::Timeout(self.timeouts.remove(ti).cb))
            }
            (_, Some((rd, ri))) if rd <= limit => {
                self.now = rd;
                let timer = &mut self.repeating[ri];
                timer.due += timer.interval;
                Some(Fired::Repeating(Rc::clone(&timer.cb)))
            }
            _ => None,
        }
    }
}

/// Deterministic scheduler driven by virtual time.
///
/// `advance` fires timers in due order; `run_frame` drains the callbacks
/// queued for the current frame. Nothing runs until the test asks for it.
#[derive(Default)]
pub struct ManualScheduler {
    queues: RefCell<Queues>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.queues.borrow().now
    }

    /// Advance virtual time, firing every due timer in order. Callbacks run
    /// with the queues unborrowed, so they may schedule or cancel freely.
    pub fn advance(&self, ms: u32) {
        let limit = self.queues.borrow().now + u64::from(ms);
        loop {
            let fired = self.queues.borrow_mut().take_next_due(limit);
            match fired {
                Some(Fired::Repeating(cb)) => cb(),
                Some(Fired::Timeout(cb)) => cb(),
                None => break,
            }
        }
        self.queues.borrow_mut().now = limit;
    }

    /// Run one display refresh: drains the callbacks queued so far.
    /// Callbacks scheduled while running land in the next frame.
    pub fn run_frame(&self) {
        let batch: Vec<_> = {
            let mut q = self.queues.borrow_mut();
            q.frames.drain(..).collect()
        };
        for cb in batch {
            cb();
        }
    }

    /// Frame callbacks currently waiting for the next refresh
    pub fn pending_frames(&self) -> usize {
        self.queues.borrow().frames.len()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&self, interval_ms: u32, cb: Rc<dyn Fn()>) -> TimerHandle {
        let mut q = self.queues.borrow_mut();
        q.next_handle += 1;
        let handle = TimerHandle(q.next_handle);
        let interval = u64::from(interval_ms.max(1));
        let due = q.now + interval;
        q.repeating.push(RepeatingTimer {
            handle,
            interval,
            due,
            cb,
        });
        handle
    }

    fn cancel_repeating(&self, handle: TimerHandle) {
        self.queues
            .borrow_mut()
            .repeating
            .retain(|t| t.handle != handle);
    }

    fn schedule_timeout(&self, delay_ms: u32, cb: Box<dyn FnOnce()>) {
        let mut q = self.queues.borrow_mut();
        let due = q.now + u64::from(delay_ms);
        let seq = q.next_seq;
        q.next_seq += 1;
        q.timeouts.push(Timeout { due, seq, cb });
    }

    fn schedule_next_frame(&self, cb: Box<dyn FnOnce()>) {
        self.queues.borrow_mut().frames.push_back(cb);
    }
}
