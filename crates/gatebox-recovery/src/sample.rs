//! Per-tick press sampling across every candidate source.

use alloc::string::String;

use crate::registry::{SourceHandle, SourcePlan, SourceSet};
use crate::services::{ButtonBank, GpioBank};

/// Tri-state outcome of one sampling tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    NotPressed,
    /// At least one source is pressed; the label is the highest-priority one.
    PressedBy { label: String },
    /// A claimed line failed to read. A faulty line must not be silently
    /// ignored, so this aborts the sample outright.
    ReadError { label: String, code: i32 },
}

/// Sample the plan once.
pub fn sample<B: ButtonBank, G: GpioBank>(
    buttons: &mut B,
    gpio: &mut G,
    plan: &SourcePlan<B::Button, G::Line>,
) -> PressOutcome {
    match plan {
        // Enumeration failures show up as absence, never as a read error.
        SourcePlan::All => match buttons.find_pressed() {
            Some(label) => PressOutcome::PressedBy { label },
            None => PressOutcome::NotPressed,
        },
        SourcePlan::Explicit(set) => sample_set(buttons, gpio, set),
    }
}

/// Query every source in priority order. The first pressed source names the
/// outcome; the rest are still read so a failing line is never missed.
fn sample_set<B: ButtonBank, G: GpioBank>(
    buttons: &mut B,
    gpio: &mut G,
    set: &SourceSet<B::Button, G::Line>,
) -> PressOutcome {
    let mut pressed: Option<&str> = None;

    for source in set.iter() {
        let hit = match &source.handle {
            SourceHandle::Button(button) => buttons.is_pressed(button),
            SourceHandle::Gpio(line) => match gpio.read(line) {
                Ok(level) => level,
                Err(err) => {
                    return PressOutcome::ReadError {
                        label: source.label.clone(),
                        code: err.code,
                    }
                }
            },
        };

        if hit && pressed.is_none() {
            pressed = Some(source.label.as_str());
        }
    }

    match pressed {
        Some(label) => PressOutcome::PressedBy {
            label: String::from(label),
        },
        None => PressOutcome::NotPressed,
    }
}
