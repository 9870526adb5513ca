use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::foundation::error::{VignetteError, VignetteResult};

/// Token identifying a periodic task registered with a [`TickLoop`].
///
/// Tokens are generation-checked: once a task is cancelled or stops, its token no longer
/// matches anything, even if the registry slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle {
    slot: u32,
    generation: u32,
}

/// Arguments passed to a tick body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickInfo {
    /// Task being invoked.
    pub handle: TickHandle,
    /// Loop time of this invocation.
    pub now: Duration,
    /// Time since the previous invocation (or since scheduling, for the first one).
    pub dt: Duration,
    /// 1-based invocation count.
    pub count: u64,
}

/// Value returned by a tick body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    /// Keep the task scheduled.
    Continue,
    /// Unschedule the task after this invocation.
    Stop,
}

/// Outcome of [`TickLoop::cancel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelAck {
    /// The task was idle and has been removed; its body is dropped.
    Cancelled,
    /// The task is running right now (cancel issued from inside a tick). The running invocation
    /// finishes, then the task is removed without being invoked again.
    CancelledInFlight,
    /// The handle does not name a scheduled task.
    NotScheduled,
}

impl CancelAck {
    /// Return `true` when the call actually cancelled a task.
    pub fn was_scheduled(self) -> bool {
        !matches!(self, Self::NotScheduled)
    }
}

/// Body of a periodic task.
pub type TickBody = Box<dyn FnMut(TickInfo) -> TickControl>;

struct Task {
    interval: Duration,
    // `None` once the clock can no longer reach the next invocation.
    next_due: Option<Duration>,
    last_run: Duration,
    count: u64,
    // `None` while the body is running.
    body: Option<TickBody>,
    cancel_requested: bool,
}

#[derive(Default)]
struct Slot {
    generation: u32,
    task: Option<Task>,
}

#[derive(Default)]
struct Inner {
    now: Duration,
    slots: Vec<Slot>,
    free: Vec<u32>,
    invocations: u64,
}

impl Inner {
    fn task_mut(&mut self, handle: TickHandle) -> Option<&mut Task> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.task.as_mut()
    }

    fn remove(&mut self, slot: u32) -> Option<Task> {
        let s = self.slots.get_mut(slot as usize)?;
        let task = s.task.take()?;
        s.generation = s.generation.wrapping_add(1);
        self.free.push(slot);
        Some(task)
    }

    fn next_due(&self, until: Duration) -> Option<(u32, Duration)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let t = s.task.as_ref()?;
                let due = t.next_due?;
                (t.body.is_some() && !t.cancel_requested && due <= until)
                    .then_some((i as u32, due))
            })
            .min_by_key(|&(i, due)| (due, i))
    }
}

/// Host-driven cooperative scheduler for periodic tasks.
///
/// The host owns time: [`TickLoop::advance`] moves the clock forward and runs every task that
/// comes due, one at a time and in due-time order. Invocations are therefore serialized with
/// each other and with everything else the host does on the same thread. Clones share the same
/// registry.
#[derive(Clone, Default)]
pub struct TickLoop {
    inner: Rc<RefCell<Inner>>,
}

impl TickLoop {
    /// Create an empty loop at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current loop time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of scheduled tasks (including one that is currently running).
    pub fn live_tasks(&self) -> usize {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|s| s.task.as_ref().is_some_and(|t| !t.cancel_requested))
            .count()
    }

    /// Total tick invocations run by this loop.
    pub fn invocations(&self) -> u64 {
        self.inner.borrow().invocations
    }

    /// Return `true` when `handle` names a scheduled task that has not been cancelled.
    pub fn is_scheduled(&self, handle: TickHandle) -> bool {
        self.inner
            .borrow_mut()
            .task_mut(handle)
            .is_some_and(|t| !t.cancel_requested)
    }

    /// Schedule `body` to run every `interval`, first at `now + interval`.
    pub fn schedule(
        &self,
        interval: Duration,
        body: impl FnMut(TickInfo) -> TickControl + 'static,
    ) -> VignetteResult<TickHandle> {
        if interval.is_zero() {
            return Err(VignetteError::validation("tick interval must be > 0"));
        }

        let mut inner = self.inner.borrow_mut();
        let now = inner.now;
        let task = Task {
            interval,
            next_due: now.checked_add(interval),
            last_run: now,
            count: 0,
            body: Some(Box::new(body)),
            cancel_requested: false,
        };
        let slot = match inner.free.pop() {
            Some(slot) => slot,
            None => {
                inner.slots.push(Slot::default());
                (inner.slots.len() - 1) as u32
            }
        };
        let s = &mut inner.slots[slot as usize];
        s.task = Some(task);
        Ok(TickHandle {
            slot,
            generation: s.generation,
        })
    }

    /// Cancel a task synchronously.
    ///
    /// When this returns, the task will not be invoked again. Calling it from inside the task's
    /// own body is allowed; the current invocation completes and is the last one.
    pub fn cancel(&self, handle: TickHandle) -> CancelAck {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let Some(task) = inner.task_mut(handle) else {
                return CancelAck::NotScheduled;
            };
            if task.cancel_requested {
                return CancelAck::NotScheduled;
            }
            if task.body.is_none() {
                task.cancel_requested = true;
                return CancelAck::CancelledInFlight;
            }
            inner.remove(handle.slot)
        };
        // Body dropped outside the borrow; its captures may touch this loop.
        drop(removed);
        tracing::debug!(slot = handle.slot, "tick cancelled");
        CancelAck::Cancelled
    }

    /// Advance the clock by `dt`, running every task that comes due.
    ///
    /// A task whose interval is shorter than `dt` runs once per elapsed interval. The clock
    /// saturates at [`Duration::MAX`].
    pub fn advance(&self, dt: Duration) {
        let until = self.inner.borrow().now.saturating_add(dt);

        loop {
            let next = self.inner.borrow().next_due(until);
            let Some((slot, due)) = next else { break };

            let (mut body, info) = {
                let mut inner = self.inner.borrow_mut();
                inner.now = due;
                inner.invocations += 1;
                let generation = inner.slots[slot as usize].generation;
                let Some(task) = inner.slots[slot as usize].task.as_mut() else {
                    continue;
                };
                let Some(body) = task.body.take() else {
                    continue;
                };
                task.count += 1;
                let info = TickInfo {
                    handle: TickHandle { slot, generation },
                    now: due,
                    dt: due - task.last_run,
                    count: task.count,
                };
                (body, info)
            };

            let control = body(info);

            let finished = {
                let mut inner = self.inner.borrow_mut();
                let Some(task) = inner.task_mut(info.handle) else {
                    continue;
                };
                if task.cancel_requested || control == TickControl::Stop {
                    inner.remove(slot);
                    Some(body)
                } else {
                    task.body = Some(body);
                    task.last_run = due;
                    task.next_due = due.checked_add(task.interval);
                    None
                }
            };
            drop(finished);
        }

        self.inner.borrow_mut().now = until;
    }
}

impl fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickLoop")
            .field("now", &self.now())
            .field("live_tasks", &self.live_tasks())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/ticker.rs"]
mod tests;
