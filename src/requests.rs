/// Outcome of one issued request. Payload and error text are opaque to the
/// engine; interpretation belongs to the caller's merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Success(String),
    Failure(String),
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }
}

pub type RequestCallback = Box<dyn FnOnce(RequestOutcome)>;

/// Network side of the host. Each issued request invokes its callback exactly
/// once, with either outcome; retry policy, transport, and serialization all
/// live behind this trait.
pub trait RequestIssuer {
    fn issue(&self, request: &str, callback: RequestCallback);
}
