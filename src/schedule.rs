use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use futures::executor::LocalSpawner;
use futures::task::LocalSpawnExt as _;
use tracing::warn;

pub type Turn = Box<dyn FnOnce()>;

/// Yield-and-reschedule port. The engine never blocks; when a quantum runs out
/// of budget it hands a continuation to the host's scheduler and returns.
pub trait Scheduler {
    fn defer(&self, turn: Turn);
}

/// FIFO scheduler for hosts (and tests) that pump turns themselves.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<VecDeque<Turn>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn run_next(&self) -> bool {
        let turn = self.queue.borrow_mut().pop_front();
        match turn {
            Some(turn) => {
                turn();
                true
            }
            None => false,
        }
    }

    /// Runs queued turns, including turns enqueued while draining, until the
    /// queue is empty. Returns how many turns ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, turn: Turn) {
        self.queue.borrow_mut().push_back(turn);
    }
}

/// Adapter for hosts whose event loop is a `futures` local pool.
pub struct SpawnScheduler {
    spawner: LocalSpawner,
}

impl SpawnScheduler {
    pub fn new(spawner: LocalSpawner) -> Self {
        Self { spawner }
    }
}

impl Scheduler for SpawnScheduler {
    fn defer(&self, turn: Turn) {
        if let Err(err) = self.spawner.spawn_local(async move { turn() }) {
            warn!("host scheduler rejected deferred turn: {err}");
        }
    }
}
