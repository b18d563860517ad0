//! Recovery-button hold detection for the Gatebox G2.
//! Works against real GPIO/buttons on the device and mock collaborators on the host.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::unreachable,
        clippy::unwrap_used
    )
)]

extern crate alloc;

pub mod descriptor;
pub mod hold;
pub mod registry;
pub mod sample;
pub mod services;

#[cfg(feature = "std")]
pub mod mock_services;

pub use descriptor::{parse_descriptor, resolve_gpio, ParsedDescriptor};
pub use hold::{HoldSession, HoldStep, RecoveryCheck, Verdict, HOLD_THRESHOLD_SECS};
pub use registry::{Source, SourceHandle, SourcePlan, SourceSet, RESET_LABEL};
pub use sample::PressOutcome;
pub use services::{
    ButtonBank, CheckError, ConfigStore, Feedback, FeedbackAction, GpioBank, GpioError,
    GpioErrorKind, IndicatorPattern, MonotonicClock, ReadFailure,
};

#[cfg(feature = "std")]
pub use mock_services::{
    FeedbackEvent, MockButtons, MockClock, MockConfig, MockFeedback, MockGpio,
};
