use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc,
    },
    thread,
    time::Duration,
};

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Runs a callback once after a delay. The callback is whatever the
/// owner does when it is handed back the `TaskId`.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TaskId;
    fn cancel(&mut self, task: TaskId);
}

struct Pending {
    id: TaskId,
    cancelled: Arc<AtomicBool>,
}

/// Sleeps on a dedicated thread, then posts `wrap(id)` on the channel
/// unless the task was cancelled in the meantime.
pub struct ThreadScheduler<T> {
    sender: mpsc::Sender<T>,
    wrap: fn(TaskId) -> T,
    next_id: u64,
    pending: Option<Pending>,
}

impl<T> ThreadScheduler<T>
where
    T: Send + 'static,
{
    pub fn new(sender: mpsc::Sender<T>, wrap: fn(TaskId) -> T) -> Self {
        Self {
            sender,
            wrap,
            next_id: 0,
            pending: None,
        }
    }
}

impl<T> Scheduler for ThreadScheduler<T>
where
    T: Send + 'static,
{
    fn schedule(&mut self, delay: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let sender = self.sender.clone();
        let message = (self.wrap)(id);
        thread::spawn(move || {
            thread::sleep(delay);
            if !flag.load(Ordering::SeqCst) {
                // the receiver may be gone on shutdown
                let _ = sender.send(message);
            }
        });

        trace!("scheduled {id:?} in {delay:?}");
        self.pending = Some(Pending { id, cancelled });
        id
    }

    fn cancel(&mut self, task: TaskId) {
        match self.pending.take() {
            Some(pending) if pending.id == task => {
                pending.cancelled.store(true, Ordering::SeqCst);
                trace!("cancelled {task:?}");
            }
            other => self.pending = other,
        }
    }
}

/// Records requests without running anything; tests fire tasks by hand.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pub scheduled: Vec<(TaskId, Duration)>,
    pub cancelled: Vec<TaskId>,
}

#[cfg(test)]
impl ManualScheduler {
    pub fn last(&self) -> Option<TaskId> {
        self.scheduled.last().map(|(id, _)| *id)
    }
}

#[cfg(test)]
impl Scheduler for ManualScheduler {
    fn schedule(&mut self, delay: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.scheduled.push((id, delay));
        id
    }

    fn cancel(&mut self, task: TaskId) {
        self.cancelled.push(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_delay() {
        let (sender, receiver) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(sender, |id| id);
        let id = scheduler.schedule(Duration::from_millis(5));
        assert_eq!(receiver.recv_timeout(Duration::from_secs(2)), Ok(id));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let (sender, receiver) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(sender, |id| id);
        let id = scheduler.schedule(Duration::from_millis(100));
        scheduler.cancel(id);
        assert!(receiver.recv_timeout(Duration::from_millis(400)).is_err());
    }

    #[test]
    fn ids_are_distinct() {
        let (sender, _receiver) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(sender, |id| id);
        let a = scheduler.schedule(Duration::from_secs(60));
        let b = scheduler.schedule(Duration::from_secs(60));
        assert_ne!(a, b);
        scheduler.cancel(b);
    }
}
