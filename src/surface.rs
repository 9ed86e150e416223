use std::cell::RefCell;
use std::collections::BTreeMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub height_px: f32,
    pub width_px: f32,
}

/// Display surface the engine renders into. The engine owns no toolkit code;
/// it only patches ranges of opaque markup strings and reads scroll state.
pub trait RenderTarget {
    fn measure_row(&self, markup: &str) -> RowMetrics;
    fn replace_range(&self, range: Range<usize>, markup: &[String]);
    fn prepend_range(&self, markup: &[String]);
    fn append_range(&self, markup: &[String]);
    fn set_content_height(&self, px: f32);
    fn scroll_to(&self, px: f32);
    fn scroll_top(&self) -> f32;
    fn is_attached(&self) -> bool;
}

type RowHandler = Box<dyn FnMut()>;

/// Routes row activation events (clicks, key presses) back to per-row
/// handlers by row key. Hosts forward events here instead of keeping any
/// global lookup of their own.
#[derive(Default)]
pub struct RowEventRegistry {
    handlers: RefCell<BTreeMap<String, RowHandler>>,
}

impl RowEventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handler(&self, key: impl Into<String>, handler: impl FnMut() + 'static) {
        self.handlers
            .borrow_mut()
            .insert(key.into(), Box::new(handler));
    }

    pub fn remove_handler(&self, key: &str) -> bool {
        self.handlers.borrow_mut().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Invokes the handler for `key`, if any. The handler is taken out of the
    /// registry while it runs so it may itself register or remove handlers.
    pub fn dispatch(&self, key: &str) -> bool {
        let handler = self.handlers.borrow_mut().remove(key);
        let Some(mut handler) = handler else {
            return false;
        };
        handler();
        let mut handlers = self.handlers.borrow_mut();
        handlers.entry(key.to_string()).or_insert(handler);
        true
    }
}
