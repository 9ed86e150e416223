use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use anyhow::Result;
use tracing::info;

use crate::ancestry::{AncestryMarker, CommitRow};
use crate::config::EngineConfig;
use crate::join::JoinGroup;
use crate::render::{IncrementalRenderer, RowBuildJob};
use crate::requests::{RequestIssuer, RequestOutcome};
use crate::rows::Row;
use crate::schedule::Scheduler;
use crate::surface::{RenderTarget, RowEventRegistry};
use crate::virtual_list::RowVirtualizer;

type MergeFn<T> = Box<dyn FnOnce(Vec<(String, RequestOutcome)>) -> Vec<T>>;
type BuildFn<T> = Box<dyn FnMut(&T) -> Result<Row>>;
type ProgressFn = Box<dyn FnMut(usize, usize)>;

/// One screen load: which requests to fan out, how to merge their outcomes
/// into an ordered item list, and how to turn one item into a row. Outcomes
/// reach `merge` in request order regardless of resolution order, failures
/// included; whether a failed request empties the screen or just drops its
/// items is the merge closure's policy.
pub struct LoadPlan<T> {
    pub requests: Vec<String>,
    pub merge: MergeFn<T>,
    pub build: BuildFn<T>,
    pub on_progress: Option<ProgressFn>,
}

/// Orchestrates a virtualized list screen: fans requests through a
/// `JoinGroup`, builds rows incrementally on the host scheduler, and hands
/// the finished list to the `RowVirtualizer`, which owns the live display
/// from then on.
pub struct ListScreen {
    scheduler: Rc<dyn Scheduler>,
    surface: Rc<dyn RenderTarget>,
    events: Rc<RowEventRegistry>,
    config: EngineConfig,
    virtualizer: Rc<RefCell<RowVirtualizer>>,
}

impl ListScreen {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        surface: Rc<dyn RenderTarget>,
        config: EngineConfig,
    ) -> Self {
        let virtualizer = Rc::new(RefCell::new(
            RowVirtualizer::new(surface.clone()).with_overscan(config.overscan),
        ));
        Self {
            scheduler,
            surface,
            events: Rc::new(RowEventRegistry::new()),
            config,
            virtualizer,
        }
    }

    pub fn virtualizer(&self) -> Rc<RefCell<RowVirtualizer>> {
        self.virtualizer.clone()
    }

    pub fn events(&self) -> Rc<RowEventRegistry> {
        self.events.clone()
    }

    pub fn load<T: 'static>(
        &self,
        issuer: &dyn RequestIssuer,
        plan: LoadPlan<T>,
        viewport_height_px: f32,
    ) -> Result<()> {
        let LoadPlan {
            requests,
            merge,
            build,
            mut on_progress,
        } = plan;

        info!(requests = requests.len(), "starting list screen load");

        let group = JoinGroup::new();
        let slots: Rc<RefCell<Vec<Option<RequestOutcome>>>> =
            Rc::new(RefCell::new(vec![None; requests.len()]));

        let mut callbacks = Vec::with_capacity(requests.len());
        for ix in 0..requests.len() {
            let slots = slots.clone();
            callbacks.push(group.wrap(move |outcome: RequestOutcome| {
                slots.borrow_mut()[ix] = Some(outcome);
            })?);
        }
        for (request, callback) in requests.iter().zip(callbacks) {
            issuer.issue(request, callback);
        }

        let renderer =
            IncrementalRenderer::with_schedule(self.scheduler.clone(), self.config.render_schedule());
        let surface = self.surface.clone();
        let events = self.events.clone();
        let virtualizer = self.virtualizer.clone();
        group.seal(move || {
            let collected = requests
                .into_iter()
                .zip(slots.borrow_mut().drain(..))
                .map(|(request, slot)| {
                    let outcome =
                        slot.unwrap_or_else(|| RequestOutcome::Failure("never completed".into()));
                    (request, outcome)
                })
                .collect();
            let items = merge(collected);

            let alive_surface = surface.clone();
            renderer.run(
                RowBuildJob::new(items, build),
                move || alive_surface.is_attached(),
                move |completed, total| {
                    if let Some(on_progress) = on_progress.as_mut() {
                        on_progress(completed, total);
                    }
                },
                move |job| {
                    let rows = job.into_rows();
                    info!(rows = rows.len(), "list build complete; going live");
                    virtualizer
                        .borrow_mut()
                        .set_rows(rows, viewport_height_px);

                    events.clear();
                    let keys: Vec<String> = virtualizer
                        .borrow()
                        .rows()
                        .iter()
                        .map(|row| row.key.clone())
                        .collect();
                    for key in keys {
                        let virtualizer = virtualizer.clone();
                        let selected_key = key.clone();
                        events.set_handler(key, move || {
                            virtualizer.borrow_mut().select_key(&selected_key);
                        });
                    }
                },
            );
        })?;
        Ok(())
    }

    /// Drives an `AncestryMarker` through the same time-sliced stepper the
    /// row build uses, so large related-commit lists never block the host.
    pub fn mark_ancestry(
        &self,
        rows: Vec<CommitRow>,
        target: impl Into<String>,
        on_done: impl FnOnce(BTreeSet<String>) + 'static,
    ) {
        let renderer =
            IncrementalRenderer::with_schedule(self.scheduler.clone(), self.config.render_schedule());
        let alive_surface = self.surface.clone();
        renderer.run(
            AncestryMarker::new(rows, target),
            move || alive_surface.is_attached(),
            |_, _| {},
            move |marker| on_done(marker.into_connected()),
        );
    }

    pub fn handle_scroll(&self, scroll_top: f32, viewport_height_px: f32) {
        self.virtualizer
            .borrow_mut()
            .handle_scroll(scroll_top, viewport_height_px);
    }

    pub fn handle_resize(&self, viewport_height_px: f32) {
        self.virtualizer.borrow_mut().handle_resize(viewport_height_px);
    }

    pub fn move_selection(&self, delta: isize) {
        self.virtualizer.borrow_mut().move_selection(delta);
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.virtualizer.borrow().selected_index()
    }

    pub fn activate_row(&self, key: &str) -> bool {
        self.events.dispatch(key)
    }
}
