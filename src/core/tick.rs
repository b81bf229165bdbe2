//! Next-tick task queue.
//!
//! Nothing the host reports is acted on immediately. Scrolls are coalesced
//! (a burst collapses into one task carrying the latest offset) and
//! deliveries wait for the next tick, so a delivery is never applied while
//! the batch that produced it is still being dispatched.

use std::collections::VecDeque;

use super::fetch::BatchId;
use super::store::Delivery;

#[derive(Debug)]
pub enum Task {
    /// Process the latest scroll offset.
    Scroll,
    Deliver { batch: BatchId, delivery: Delivery },
    /// Drop in-flight state and refetch the window.
    Resync,
}

#[derive(Debug, Default)]
pub struct TickQueue {
    tasks: VecDeque<Task>,
    scroll: Option<(u64, u64)>,
    scroll_scheduled: bool,
    resync_scheduled: bool,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scroll offset; only the first of a burst queues a task.
    pub fn schedule_scroll(&mut self, x: u64, y: u64) {
        self.scroll = Some((x, y));
        if !self.scroll_scheduled {
            self.scroll_scheduled = true;
            self.tasks.push_back(Task::Scroll);
        }
    }

    pub fn schedule_delivery(&mut self, batch: BatchId, delivery: Delivery) {
        self.tasks.push_back(Task::Deliver { batch, delivery });
    }

    pub fn schedule_resync(&mut self) {
        if !self.resync_scheduled {
            self.resync_scheduled = true;
            self.tasks.push_back(Task::Resync);
        }
    }

    pub fn pop(&mut self) -> Option<Task> {
        let task = self.tasks.pop_front()?;
        if matches!(task, Task::Resync) {
            self.resync_scheduled = false;
        }
        Some(task)
    }

    /// Latest scroll offset; clears the pending scroll.
    pub fn take_scroll(&mut self) -> Option<(u64, u64)> {
        self.scroll_scheduled = false;
        self.scroll.take()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
