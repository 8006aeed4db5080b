//! Deferred-callback scheduler.
//!
//! Cooperative and single-threaded. Two kinds of deferred work exist:
//! - after-render tasks, run when the host completes a render pass
//! - timers, run when the virtual clock passes their deadline
//!
//! Every scheduled task is owned through a [`TaskHandle`]. Cancelling or
//! dropping the handle removes the task from the queue, so a cancelled task
//! never runs.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = Scheduler::new();
//! let handle = scheduler.schedule_timer(Duration::from_millis(100), || check());
//!
//! scheduler.advance(Duration::from_millis(50));  // nothing yet
//! scheduler.advance(Duration::from_millis(50));  // check() runs
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};
use std::time::Duration;

type Task = Box<dyn FnOnce()>;

/// Identity of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

// =============================================================================
// Scheduler State
// =============================================================================

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    next_id: u64,
    after_render: Vec<(TaskId, Task)>,
    timers: BTreeMap<(Duration, TaskId), Task>,
    deadlines: HashMap<TaskId, Duration>,
}

impl SchedulerState {
    fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(deadline) = self.deadlines.remove(&id) {
            return self.timers.remove(&(deadline, id)).is_some();
        }
        let before = self.after_render.len();
        self.after_render.retain(|(task_id, _)| *task_id != id);
        self.after_render.len() != before
    }

    fn is_pending(&self, id: TaskId) -> bool {
        self.deadlines.contains_key(&id) || self.after_render.iter().any(|(task_id, _)| *task_id == id)
    }
}

// =============================================================================
// Task Handle
// =============================================================================

/// Owner of a scheduled task. Dropping it cancels the task.
pub struct TaskHandle {
    id: TaskId,
    scheduler: Weak<RefCell<SchedulerState>>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Check if the task is still queued.
    pub fn is_pending(&self) -> bool {
        self.scheduler
            .upgrade()
            .is_some_and(|state| state.borrow().is_pending(self.id))
    }

    /// Remove the task from the queue.
    pub fn cancel(self) {
        // Drop does the work
    }

    /// Let the task run without an owner.
    pub fn detach(mut self) {
        self.scheduler = Weak::new();
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(state) = self.scheduler.upgrade() {
            // A task dropping its own handle while running is already dequeued
            if let Ok(mut state) = state.try_borrow_mut() {
                state.cancel(self.id);
            }
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Shared handle to the scheduler.
#[derive(Clone, Default)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerState>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Run `task` after the current render pass completes.
    pub fn schedule_after_render(&self, task: impl FnOnce() + 'static) -> TaskHandle {
        let mut state = self.inner.borrow_mut();
        let id = state.next_id();
        state.after_render.push((id, Box::new(task)));
        TaskHandle { id, scheduler: Rc::downgrade(&self.inner) }
    }

    /// Run `task` once `delay` has elapsed on the virtual clock.
    pub fn schedule_timer(&self, delay: Duration, task: impl FnOnce() + 'static) -> TaskHandle {
        let mut state = self.inner.borrow_mut();
        let id = state.next_id();
        let deadline = state.now + delay;
        state.timers.insert((deadline, id), Box::new(task));
        state.deadlines.insert(id, deadline);
        TaskHandle { id, scheduler: Rc::downgrade(&self.inner) }
    }

    /// Complete a render pass: run every queued after-render task.
    ///
    /// Tasks queued while flushing wait for the next pass. Returns the number
    /// of tasks run.
    pub fn render(&self) -> usize {
        let tasks = std::mem::take(&mut self.inner.borrow_mut().after_render);
        let count = tasks.len();
        for (_, task) in tasks {
            task();
        }
        count
    }

    /// Advance the virtual clock, running due timers in deadline order.
    ///
    /// Returns the number of timers run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.inner.borrow().now + by;
        let mut count = 0;

        loop {
            let task = {
                let mut state = self.inner.borrow_mut();
                let Some(&(deadline, id)) = state.timers.keys().next() else { break };
                if deadline > target {
                    break;
                }
                state.deadlines.remove(&id);
                state.now = deadline;
                state.timers.remove(&(deadline, id))
            };
            if let Some(task) = task {
                task();
                count += 1;
            }
        }

        self.inner.borrow_mut().now = target;
        count
    }

    /// Number of queued timers.
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Number of tasks waiting for the next render pass.
    pub fn pending_after_render(&self) -> usize {
        self.inner.borrow().after_render.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() -> Box<dyn FnOnce()>) {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        let make = move || -> Box<dyn FnOnce()> {
            let c = count_clone.clone();
            Box::new(move || c.set(c.get() + 1))
        };
        (count, make)
    }

    #[test]
    fn test_after_render_runs_once() {
        let scheduler = Scheduler::new();
        let (count, make) = counter();

        let handle = scheduler.schedule_after_render(make());
        assert!(handle.is_pending());

        assert_eq!(scheduler.render(), 1);
        assert_eq!(count.get(), 1);
        assert!(!handle.is_pending());

        assert_eq!(scheduler.render(), 0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_task_queued_during_render_waits() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(false));

        let inner_scheduler = scheduler.clone();
        let ran_clone = ran.clone();
        scheduler
            .schedule_after_render(move || {
                inner_scheduler
                    .schedule_after_render(move || ran_clone.set(true))
                    .detach();
            })
            .detach();

        scheduler.render();
        assert!(!ran.get());
        scheduler.render();
        assert!(ran.get());
    }

    #[test]
    fn test_dropping_handle_cancels() {
        let scheduler = Scheduler::new();
        let (count, make) = counter();

        let handle = scheduler.schedule_timer(Duration::from_millis(10), make());
        drop(handle);
        let handle = scheduler.schedule_after_render(make());
        handle.cancel();

        scheduler.advance(Duration::from_millis(20));
        scheduler.render();
        assert_eq!(count.get(), 0);
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_timers_run_in_deadline_order() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        let _late = scheduler.schedule_timer(Duration::from_millis(30), move || o.borrow_mut().push(30));
        let o = order.clone();
        let _early = scheduler.schedule_timer(Duration::from_millis(10), move || o.borrow_mut().push(10));

        assert_eq!(scheduler.advance(Duration::from_millis(5)), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(25)), 2);
        assert_eq!(*order.borrow(), vec![10, 30]);
        assert_eq!(scheduler.now(), Duration::from_millis(30));
    }

    #[test]
    fn test_timer_sees_its_deadline_as_now() {
        let scheduler = Scheduler::new();
        let seen = Rc::new(Cell::new(Duration::ZERO));

        let s = scheduler.clone();
        let seen_clone = seen.clone();
        let _handle = scheduler.schedule_timer(Duration::from_millis(40), move || seen_clone.set(s.now()));

        scheduler.advance(Duration::from_millis(100));
        assert_eq!(seen.get(), Duration::from_millis(40));
    }
}
