//! Deadline-ordered task queue
//!
//! The coalescer never sleeps or spawns. Work that must happen later (the
//! deferred resolution, deferred ups, auto-repeat ticks) is queued here with
//! an [`Instant`] deadline, and whoever owns the event loop polls
//! [`Scheduler::pop_due`] once [`Scheduler::next_deadline`] has passed.
//!
//! Tasks with equal deadlines run in insertion order. Periodic tasks keep
//! their id and are re-queued one interval after their previous deadline, so
//! a late poll does not drift the cadence.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Smallest interval a periodic task may use.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Handle for cancelling a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Position of an entry in the queue: deadline first, then insertion order.
type QueueKey = (Instant, u64);

#[derive(Debug)]
struct Entry<T> {
    id: TaskId,
    task: T,
    interval: Option<Duration>,
}

/// A task whose deadline has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask<T> {
    pub id: TaskId,
    /// When the task was due. Handlers should treat this as "now".
    pub deadline: Instant,
    pub task: T,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    queue: BTreeMap<QueueKey, Entry<T>>,
    index: HashMap<TaskId, QueueKey>,
    next_seq: u64,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: 0,
            next_id: 0,
        }
    }
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot task.
    pub fn schedule_at(&mut self, deadline: Instant, task: T) -> TaskId {
        let id = self.allocate_id();
        self.insert(deadline, Entry { id, task, interval: None });
        id
    }

    /// Queue a periodic task, first due at `first`, then every `interval`.
    ///
    /// Intervals below [`MIN_INTERVAL`] are raised to it.
    pub fn schedule_every(&mut self, first: Instant, interval: Duration, task: T) -> TaskId {
        let id = self.allocate_id();
        let interval = interval.max(MIN_INTERVAL);
        self.insert(
            first,
            Entry {
                id,
                task,
                interval: Some(interval),
            },
        );
        id
    }

    /// Cancel a task. Returns whether it was still queued.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        match self.index.remove(&id) {
            Some(key) => {
                self.queue.remove(&key);
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Earliest deadline in the queue, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest task due at or before `now`.
    ///
    /// Periodic tasks are re-queued before being returned, so a handler may
    /// cancel them through the returned id.
    pub fn pop_due(&mut self, now: Instant) -> Option<DueTask<T>> {
        let (&key, _) = self.queue.iter().next()?;
        let (deadline, _) = key;
        if deadline > now {
            return None;
        }

        let entry = self.queue.remove(&key)?;
        self.index.remove(&entry.id);

        let due = DueTask {
            id: entry.id,
            deadline,
            task: entry.task.clone(),
        };

        if let Some(interval) = entry.interval {
            self.insert(deadline + interval, entry);
        }

        Some(due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert(&mut self, deadline: Instant, entry: Entry<T>) {
        let key = (deadline, self.next_seq);
        self.next_seq += 1;
        self.index.insert(entry.id, key);
        self.queue.insert(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_empty_scheduler() {
        let mut scheduler: Scheduler<&str> = Scheduler::new();
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(scheduler.pop_due(Instant::now()), None);
    }

    #[test]
    fn test_tasks_run_in_deadline_order() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(t0 + ms(20), "late");
        scheduler.schedule_at(t0 + ms(10), "early");

        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(10)));
        assert_eq!(scheduler.pop_due(t0 + ms(30)).map(|d| d.task), Some("early"));
        assert_eq!(scheduler.pop_due(t0 + ms(30)).map(|d| d.task), Some("late"));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_equal_deadlines_are_fifo() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(t0, "first");
        scheduler.schedule_at(t0, "second");
        scheduler.schedule_at(t0, "third");

        let order: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(t0).map(|d| d.task)).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_task_not_due_yet() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(t0 + ms(5), ());

        assert_eq!(scheduler.pop_due(t0 + ms(4)), None);
        assert_eq!(scheduler.len(), 1);

        let due = scheduler.pop_due(t0 + ms(5)).unwrap();
        assert_eq!(due.deadline, t0 + ms(5));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let keep = scheduler.schedule_at(t0, "keep");
        let drop = scheduler.schedule_at(t0, "drop");

        assert!(scheduler.cancel(drop));
        assert!(!scheduler.cancel(drop), "Second cancel should be a no-op");
        assert!(scheduler.is_scheduled(keep));
        assert!(!scheduler.is_scheduled(drop));

        assert_eq!(scheduler.pop_due(t0).map(|d| d.task), Some("keep"));
        assert_eq!(scheduler.pop_due(t0), None);
    }

    #[test]
    fn test_periodic_task_keeps_cadence() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule_every(t0 + ms(100), ms(10), "tick");

        // Poll late: every missed tick is still delivered at its own deadline
        let deadlines: Vec<_> =
            std::iter::from_fn(|| scheduler.pop_due(t0 + ms(125)).map(|d| d.deadline)).collect();
        assert_eq!(deadlines, vec![t0 + ms(100), t0 + ms(110), t0 + ms(120)]);

        assert!(scheduler.is_scheduled(id));
        assert_eq!(scheduler.next_deadline(), Some(t0 + ms(130)));
    }

    #[test]
    fn test_periodic_task_cancel_after_pop() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(t0, ms(10), "tick");

        let due = scheduler.pop_due(t0).unwrap();
        assert!(scheduler.cancel(due.id));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(t0, Duration::ZERO, ());

        scheduler.pop_due(t0).unwrap();
        assert_eq!(scheduler.next_deadline(), Some(t0 + MIN_INTERVAL));
        assert_eq!(scheduler.pop_due(t0), None);
    }
}
