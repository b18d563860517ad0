//! Collaborator seams for the recovery check.
//! Hardware and platform services stay behind traits so the check logic
//! runs unchanged against the board or against host-side mocks.

use alloc::string::String;

/// GPIO failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioErrorKind {
    /// The name resolved to no known line.
    NotFound,
    /// The line exists but is already claimed.
    Busy,
    /// Input/polarity configuration was rejected by the hardware.
    ConfigFailed,
    /// A previously working line failed to read.
    ReadFailed,
}

/// GPIO service error, carrying the platform's native code for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError {
    pub kind: GpioErrorKind,
    pub code: i32,
}

impl GpioError {
    pub fn new(kind: GpioErrorKind, code: i32) -> Self {
        Self { kind, code }
    }
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            GpioErrorKind::NotFound => write!(f, "not found (err={})", self.code),
            GpioErrorKind::Busy => write!(f, "busy (err={})", self.code),
            GpioErrorKind::ConfigFailed => {
                write!(f, "input configuration failed (err={})", self.code)
            }
            GpioErrorKind::ReadFailed => write!(f, "read failed (err={})", self.code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for GpioError {}

/// Fatal check failure: a mandatory input source could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckError {
    /// The descriptor or label the operator configured.
    pub label: String,
    pub error: GpioError,
}

impl CheckError {
    pub fn new(label: impl Into<String>, error: GpioError) -> Self {
        Self {
            label: label.into(),
            error,
        }
    }
}

impl core::fmt::Display for CheckError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "recovery source '{}': {}", self.label, self.error)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CheckError {}

/// A read failure observed mid-poll. Aborts the hold session without
/// failing the whole invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    pub label: String,
    pub code: i32,
}

/// Pattern for the activity indicator LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorPattern {
    Off,
    Solid,
    Blink { period_ms: u32 },
}

/// The closed set of feedback capabilities the check may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackAction {
    Indicator(IndicatorPattern),
    SystemLedOn,
    RunRecovery,
}

/// Key/value configuration lookup (NVS on the device).
pub trait ConfigStore {
    fn get(&mut self, key: &str) -> Option<String>;
}

/// Labelled logical button devices. State queries are total: a button that
/// cannot be read counts as released.
pub trait ButtonBank {
    type Button;

    /// Look up a button device by its label.
    fn by_label(&mut self, label: &str) -> Option<Self::Button>;

    /// Instantaneous pressed state of a previously looked-up button.
    fn is_pressed(&mut self, button: &Self::Button) -> bool;

    /// Enumerate all button devices and return the label of the first one
    /// currently pressed, in enumeration order.
    fn find_pressed(&mut self) -> Option<String>;
}

/// Named GPIO lines with exclusive claim semantics.
///
/// A line returned by [`GpioBank::acquire`] is owned by the caller and must
/// be handed back through [`GpioBank::release`] exactly once.
pub trait GpioBank {
    type Line;

    /// Resolve a line name and claim the line exclusively.
    ///
    /// # Errors
    /// `NotFound` if the name matches no line, `Busy` if it is already
    /// claimed.
    fn acquire(&mut self, name: &str) -> Result<Self::Line, GpioError>;

    /// Configure the claimed line as an input with the given polarity.
    /// On error the caller still owns the line and must release it.
    fn configure_input(&mut self, line: &mut Self::Line, active_low: bool)
        -> Result<(), GpioError>;

    /// Polarity-corrected instantaneous read: `true` means pressed.
    fn read(&mut self, line: &Self::Line) -> Result<bool, GpioError>;

    /// Return the line. Consumes the handle, so each claim releases once.
    fn release(&mut self, line: Self::Line);
}

/// Feedback sink for indicator LEDs and the recovery action.
pub trait Feedback {
    /// Perform an action now.
    fn perform(&mut self, action: FeedbackAction);

    /// Schedule an action to run unattended after `delay_ms`. Fire-and-forget:
    /// no cancellation, no observable result.
    fn perform_after(&mut self, delay_ms: u32, action: FeedbackAction);
}

/// Monotonic time for the one-second tick gating.
pub trait MonotonicClock {
    fn now_ms(&self) -> u64;

    /// Short non-blocking pause between boundary checks.
    fn idle_wait(&self);
}
