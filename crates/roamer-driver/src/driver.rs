use crate::coverage::Coverage;
use crate::target::{PageSignature, Target};

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum DriverError {
    /// Transport to the automation server failed.
    #[error("driver unavailable: {0}")]
    Unavailable(String),

    /// Stale session, app sent to the background, element gone. The
    /// session survives; re-foregrounding the app recovers.
    #[error("transient automation error: {0}")]
    Transient(String),

    /// The automation server or device is gone.
    #[error("fatal automation error: {0}")]
    Fatal(String),
}

impl DriverError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DriverError::Fatal(_))
    }
}

/// Remote automation driver bound to one application session.
///
/// Targets are addressed by their index in the most recent
/// [`enumerate_candidates`](Driver::enumerate_candidates) call. The driver is
/// single-client: one caller at a time.
pub trait Driver: Send {
    /// Interactive elements on the current screen, in document order.
    fn enumerate_candidates(&mut self) -> Result<Vec<Target>, DriverError>;

    /// Content hash of the current screen.
    fn page_signature(&mut self) -> Result<PageSignature, DriverError>;

    fn click(&mut self, index: usize) -> Result<(), DriverError>;

    fn type_text(&mut self, index: usize, text: &str) -> Result<(), DriverError>;

    /// Send a single backspace key to an input.
    fn backspace(&mut self, index: usize) -> Result<(), DriverError>;

    /// Current length of an input's text, read live.
    fn input_len(&mut self, index: usize) -> Result<usize, DriverError>;

    /// `history.go(-1)` inside the webview.
    fn webview_back(&mut self) -> Result<(), DriverError>;

    fn hardware_back(&mut self) -> Result<(), DriverError>;

    /// Bring the application under test back to the foreground.
    fn foreground(&mut self) -> Result<(), DriverError>;

    fn background(&mut self) -> Result<(), DriverError>;

    /// Count a link as clicked for coverage.
    fn record_link_clicked(&mut self, href: &str);

    fn coverage(&self) -> Coverage;

    /// Abandon the automation session. Further calls may fail.
    fn end_session(&mut self) {}
}
