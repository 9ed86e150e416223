use std::collections::BTreeMap;
use std::ops::Range;
use std::rc::Rc;

use tracing::debug;

use crate::rows::Row;
use crate::surface::RenderTarget;

pub const DEFAULT_OVERSCAN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualizerPhase {
    Empty,
    Measuring,
    Live,
}

/// Windowed renderer over a finished row list. Measures one probe row to get
/// a uniform row height, sizes the scroll container once, and thereafter only
/// materializes rows near the visible window, patching the smallest possible
/// range on scroll and resize. Rows are only ever added to the materialized
/// range, never proactively removed.
pub struct RowVirtualizer {
    surface: Rc<dyn RenderTarget>,
    overscan: usize,
    rows: Vec<Row>,
    index_by_key: BTreeMap<String, usize>,
    row_height_px: f32,
    row_width_px: f32,
    viewport_height_px: f32,
    materialized: Option<Range<usize>>,
    selected: Option<usize>,
    phase: VirtualizerPhase,
}

impl RowVirtualizer {
    pub fn new(surface: Rc<dyn RenderTarget>) -> Self {
        Self {
            surface,
            overscan: DEFAULT_OVERSCAN,
            rows: Vec::new(),
            index_by_key: BTreeMap::new(),
            row_height_px: 0.0,
            row_width_px: 0.0,
            viewport_height_px: 0.0,
            materialized: None,
            selected: None,
            phase: VirtualizerPhase::Empty,
        }
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn phase(&self) -> VirtualizerPhase {
        self.phase
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn index_of_key(&self, key: &str) -> Option<usize> {
        self.index_by_key.get(key).copied()
    }

    pub fn row_height_px(&self) -> f32 {
        self.row_height_px
    }

    pub fn row_width_px(&self) -> f32 {
        self.row_width_px
    }

    pub fn materialized_range(&self) -> Option<Range<usize>> {
        self.materialized.clone()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Takes ownership of the finished row list and renders the initial
    /// window. The first non-empty list triggers the one-shot probe
    /// measurement; the height it yields is assumed uniform for every row
    /// afterwards, even if later content differs.
    pub fn set_rows(&mut self, rows: Vec<Row>, viewport_height_px: f32) {
        self.rows = rows;
        self.index_by_key = self
            .rows
            .iter()
            .enumerate()
            .map(|(ix, row)| (row.key.clone(), ix))
            .collect();
        self.viewport_height_px = viewport_height_px;
        self.materialized = None;
        self.selected = None;

        if self.rows.is_empty() {
            self.phase = VirtualizerPhase::Empty;
            self.surface.set_content_height(0.0);
            return;
        }

        if self.row_height_px <= 0.0 {
            self.phase = VirtualizerPhase::Measuring;
            let metrics = self.surface.measure_row(&self.rows[0].markup);
            self.row_height_px = metrics.height_px.max(1.0);
            self.row_width_px = metrics.width_px;
            debug!(
                row_height_px = self.row_height_px,
                row_width_px = self.row_width_px,
                "probe row measured"
            );
        }

        self.phase = VirtualizerPhase::Live;
        self.surface
            .set_content_height(self.row_height_px * self.rows.len() as f32);
        self.apply_window(self.surface.scroll_top());
    }

    pub fn handle_scroll(&mut self, scroll_top: f32, viewport_height_px: f32) {
        self.viewport_height_px = viewport_height_px;
        if self.phase == VirtualizerPhase::Live {
            self.apply_window(scroll_top);
        }
    }

    pub fn handle_resize(&mut self, viewport_height_px: f32) {
        self.viewport_height_px = viewport_height_px;
        if self.phase == VirtualizerPhase::Live {
            self.apply_window(self.surface.scroll_top());
        }
    }

    /// Moves the selection pointer. A target outside the materialized range
    /// scrolls into view and re-applies the window before the host highlights
    /// the row.
    pub fn select(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        let covered = self
            .materialized
            .as_ref()
            .is_some_and(|range| range.contains(&index));
        if !covered {
            self.scroll_into_view(index);
        }
        self.selected = Some(index);
    }

    pub fn select_key(&mut self, key: &str) {
        if let Some(index) = self.index_of_key(key) {
            self.select(index);
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let current = self.selected.unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, self.rows.len() as isize - 1) as usize;
        self.select(next);
    }

    fn scroll_into_view(&mut self, index: usize) {
        if self.row_height_px <= 0.0 {
            return;
        }
        let row_top = index as f32 * self.row_height_px;
        let row_bottom = row_top + self.row_height_px;
        let scroll_top = self.surface.scroll_top();

        let target = if row_top < scroll_top {
            row_top
        } else if row_bottom > scroll_top + self.viewport_height_px {
            (row_bottom - self.viewport_height_px).max(0.0)
        } else {
            scroll_top
        };

        if target != scroll_top {
            self.surface.scroll_to(target);
        }
        self.apply_window(target);
    }

    fn apply_window(&mut self, scroll_top: f32) {
        let Some(needed) = self.window_for(scroll_top) else {
            return;
        };

        match self.materialized.clone() {
            None => self.replace_with(needed),
            Some(current) => {
                if current.start <= needed.start && needed.end <= current.end {
                    return;
                }
                if needed.end <= current.start || needed.start >= current.end {
                    self.replace_with(needed);
                    return;
                }
                if needed.start < current.start {
                    self.surface
                        .prepend_range(&self.markup_for(needed.start..current.start));
                }
                if needed.end > current.end {
                    self.surface
                        .append_range(&self.markup_for(current.end..needed.end));
                }
                self.materialized =
                    Some(needed.start.min(current.start)..needed.end.max(current.end));
            }
        }
    }

    fn replace_with(&mut self, range: Range<usize>) {
        let markup = self.markup_for(range.clone());
        self.surface.replace_range(range.clone(), &markup);
        self.materialized = Some(range);
    }

    fn window_for(&self, scroll_top: f32) -> Option<Range<usize>> {
        if self.rows.is_empty() || self.row_height_px <= 0.0 {
            return None;
        }
        let len = self.rows.len();
        let max_scroll =
            (len as f32 * self.row_height_px - self.viewport_height_px).max(0.0);
        let scroll_top = scroll_top.clamp(0.0, max_scroll);
        let first_visible = (scroll_top / self.row_height_px).floor() as usize;
        let last_visible =
            ((scroll_top + self.viewport_height_px) / self.row_height_px).ceil() as usize;

        let start = first_visible.saturating_sub(self.overscan).min(len);
        let end = last_visible.saturating_add(self.overscan).min(len);
        Some(start..end.max(start))
    }

    fn markup_for(&self, range: Range<usize>) -> Vec<String> {
        self.rows[range].iter().map(|row| row.markup.clone()).collect()
    }
}
