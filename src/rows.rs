#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: String,
    pub markup: String,
    pub height_hint_px: Option<f32>,
}

impl Row {
    pub fn new(key: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            markup: markup.into(),
            height_hint_px: None,
        }
    }

    pub fn with_height_hint(mut self, px: f32) -> Self {
        self.height_hint_px = Some(px);
        self
    }

    pub fn error_placeholder(key: impl Into<String>, message: &str) -> Self {
        let key = key.into();
        Self {
            markup: format!("<div data-row-error=\"{key}\">{message}</div>"),
            key,
            height_hint_px: None,
        }
    }

    pub fn is_error_placeholder(&self) -> bool {
        self.markup.starts_with("<div data-row-error=")
    }
}
