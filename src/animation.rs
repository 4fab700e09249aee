// Per-frame task scheduling, driven by RedrawRequested.
use flume::{Receiver, Sender};

type FrameTask<T> = Box<dyn FnMut(&mut T)>;

/// Keeps a scheduled task alive. Cancelling or dropping the handle removes
/// the task before the next frame runs.
#[derive(Debug)]
pub struct FrameHandle {
    id: u64,
    cancel_tx: Sender<u64>,
}

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(self) {
        // Drop does the work.
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        // The scheduler may already be gone, in which case there is nothing left to cancel.
        let _ = self.cancel_tx.send(self.id);
    }
}

pub struct FrameScheduler<T> {
    tasks: Vec<(u64, FrameTask<T>)>,
    next_id: u64,
    cancel_tx: Sender<u64>,
    cancel_rx: Receiver<u64>,
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        let (cancel_tx, cancel_rx) = flume::unbounded();
        Self { tasks: Vec::new(), next_id: 0, cancel_tx, cancel_rx }
    }

    /// Registers `task` to run once per frame until its handle is released.
    pub fn schedule(&mut self, task: impl FnMut(&mut T) + 'static) -> FrameHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push((id, Box::new(task)));
        log::debug!("Scheduled frame task {}.", id);
        FrameHandle { id, cancel_tx: self.cancel_tx.clone() }
    }

    fn apply_cancellations(&mut self) {
        for id in self.cancel_rx.try_iter() {
            self.tasks.retain(|(task_id, _)| *task_id != id);
            log::debug!("Released frame task {}.", id);
        }
    }

    /// Runs every live task once. Returns whether any task is still scheduled,
    /// i.e. whether another frame should be requested.
    pub fn tick(&mut self, ctx: &mut T) -> bool {
        self.apply_cancellations();
        for (_, task) in self.tasks.iter_mut() {
            task(ctx);
        }
        self.has_pending()
    }

    pub fn has_pending(&self) -> bool {
        // Every queued id belongs to a task that is still in `tasks`.
        self.tasks.len() > self.cancel_rx.len()
    }

    pub fn active_count(&mut self) -> usize {
        self.apply_cancellations();
        self.tasks.len()
    }
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_task_runs_every_tick() {
        let mut scheduler = FrameScheduler::<u32>::new();
        let _handle = scheduler.schedule(|n| *n += 1);

        let mut counter = 0;
        assert!(scheduler.tick(&mut counter));
        assert!(scheduler.tick(&mut counter));
        assert_eq!(counter, 2);
    }

    #[test]
    fn dropped_handle_stops_task() {
        let mut scheduler = FrameScheduler::<u32>::new();
        let handle = scheduler.schedule(|n| *n += 1);
        let mut counter = 0;
        scheduler.tick(&mut counter);

        drop(handle);
        assert!(!scheduler.has_pending());
        assert!(!scheduler.tick(&mut counter));
        assert_eq!(counter, 1);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn cancel_only_affects_its_own_task() {
        let mut scheduler = FrameScheduler::<Vec<&'static str>>::new();
        let a = scheduler.schedule(|log| log.push("a"));
        let _b = scheduler.schedule(|log| log.push("b"));
        assert_ne!(a.id(), _b.id());

        a.cancel();
        let mut log = Vec::new();
        assert!(scheduler.tick(&mut log));
        assert_eq!(log, vec!["b"]);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn handle_outliving_scheduler_is_harmless() {
        let mut scheduler = FrameScheduler::<()>::new();
        let handle = scheduler.schedule(|_| {});
        drop(scheduler);
        drop(handle);
    }
}
