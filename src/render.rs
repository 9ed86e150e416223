use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, warn};

use crate::rows::Row;
use crate::schedule::Scheduler;

pub const DEFAULT_RENDER_BUDGET: Duration = Duration::from_millis(200);
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;

/// One resumable unit of list work. `step` performs a bounded amount of work
/// and reports whether more remains; the counters only feed progress
/// reporting.
pub trait RenderStep {
    fn step(&mut self) -> bool;
    fn completed(&self) -> usize;
    fn total(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSchedule {
    pub budget: Duration,
    pub progress_interval: usize,
}

impl Default for RenderSchedule {
    fn default() -> Self {
        Self {
            budget: DEFAULT_RENDER_BUDGET,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Cooperative stepper. Runs a `RenderStep` in wall-clock-bounded quanta on
/// the host scheduler, yielding between quanta so the control thread never
/// blocks. Detachment of the display surface silently discards the job.
pub struct IncrementalRenderer {
    scheduler: Rc<dyn Scheduler>,
    schedule: RenderSchedule,
}

struct TurnState<S> {
    job: S,
    alive: Box<dyn Fn() -> bool>,
    on_progress: Box<dyn FnMut(usize, usize)>,
    finalize: Option<Box<dyn FnOnce(S)>>,
    schedule: RenderSchedule,
    scheduler: Rc<dyn Scheduler>,
    steps_done: usize,
}

impl IncrementalRenderer {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_schedule(scheduler, RenderSchedule::default())
    }

    pub fn with_schedule(scheduler: Rc<dyn Scheduler>, schedule: RenderSchedule) -> Self {
        Self { scheduler, schedule }
    }

    /// Starts `job` on the next scheduler turn. `alive` is polled at every
    /// quantum boundary; once it reports false the job is dropped without
    /// finalizing. `finalize` receives the finished job exactly once.
    pub fn run<S>(
        &self,
        job: S,
        alive: impl Fn() -> bool + 'static,
        on_progress: impl FnMut(usize, usize) + 'static,
        finalize: impl FnOnce(S) + 'static,
    ) where
        S: RenderStep + 'static,
    {
        let state = TurnState {
            job,
            alive: Box::new(alive),
            on_progress: Box::new(on_progress),
            finalize: Some(Box::new(finalize)),
            schedule: self.schedule,
            scheduler: self.scheduler.clone(),
            steps_done: 0,
        };
        self.scheduler.defer(Box::new(move || run_turn(state)));
    }
}

fn run_turn<S: RenderStep + 'static>(mut state: TurnState<S>) {
    // A stale continuation can still be queued after the surface detaches;
    // the check has to happen on every turn, not just the first.
    if !(state.alive)() {
        debug!(
            completed = state.job.completed(),
            total = state.job.total(),
            "render surface detached; discarding job"
        );
        return;
    }

    let interval = state.schedule.progress_interval.max(1);
    let quantum_started = Instant::now();
    loop {
        let more = state.job.step();
        state.steps_done = state.steps_done.saturating_add(1);
        if state.steps_done % interval == 0 {
            (state.on_progress)(state.job.completed(), state.job.total());
        }

        if !more {
            (state.on_progress)(state.job.completed(), state.job.total());
            if let Some(finalize) = state.finalize.take() {
                finalize(state.job);
            }
            return;
        }

        if quantum_started.elapsed() >= state.schedule.budget {
            if !(state.alive)() {
                debug!("render surface detached at quantum end; discarding job");
                return;
            }
            let scheduler = state.scheduler.clone();
            scheduler.defer(Box::new(move || run_turn(state)));
            return;
        }
    }
}

/// Builds one `Row` per step from a list of source items, preserving source
/// order. An item whose builder fails turns into an inert error placeholder
/// instead of aborting the rest of the list.
pub struct RowBuildJob<T> {
    items: Vec<T>,
    build: Box<dyn FnMut(&T) -> Result<Row>>,
    rows: Vec<Row>,
    cursor: usize,
}

impl<T> RowBuildJob<T> {
    pub fn new(items: Vec<T>, build: impl FnMut(&T) -> Result<Row> + 'static) -> Self {
        let rows = Vec::with_capacity(items.len());
        Self {
            items,
            build: Box::new(build),
            rows,
            cursor: 0,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl<T> RenderStep for RowBuildJob<T> {
    fn step(&mut self) -> bool {
        if self.cursor >= self.items.len() {
            return false;
        }
        let row = match (self.build)(&self.items[self.cursor]) {
            Ok(row) => row,
            Err(err) => {
                warn!(index = self.cursor, "row failed to build: {err:#}");
                Row::error_placeholder(format!("row-error-{}", self.cursor), "failed to render")
            }
        };
        self.rows.push(row);
        self.cursor += 1;
        self.cursor < self.items.len()
    }

    fn completed(&self) -> usize {
        self.cursor
    }

    fn total(&self) -> usize {
        self.items.len()
    }
}
