//! Builds the candidate source set for one check invocation.
//!
//! Up to five slots, in fixed priority order: override GPIO, primary button,
//! primary-as-GPIO, reset button, reset-as-GPIO. The order decides which
//! label is attributed when several sources are pressed at once.

use alloc::string::String;
use alloc::vec::Vec;

use crate::descriptor::resolve_gpio;
use crate::services::{ButtonBank, CheckError, GpioBank};

/// Label of the hardwired fallback source.
pub const RESET_LABEL: &str = "reset";

/// Keyword selecting dynamic enumeration of every button device.
const ALL_KEYWORD: &str = "all";

/// Boards wire recovery inputs active-low unless the descriptor says `!`.
const DEFAULT_ACTIVE_LOW: bool = true;

/// One live candidate source.
#[derive(Debug)]
pub enum SourceHandle<B, L> {
    Button(B),
    Gpio(L),
}

/// A resolved source plus the label reported if it triggers.
#[derive(Debug)]
pub struct Source<B, L> {
    pub label: String,
    pub handle: SourceHandle<B, L>,
}

/// Priority-ordered list of resolved sources.
#[derive(Debug)]
pub struct SourceSet<B, L> {
    sources: Vec<Source<B, L>>,
}

impl<B, L> SourceSet<B, L> {
    fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    fn push_button(&mut self, label: &str, button: B) {
        self.sources.push(Source {
            label: String::from(label),
            handle: SourceHandle::Button(button),
        });
    }

    fn push_gpio(&mut self, label: &str, line: L) {
        self.sources.push(Source {
            label: String::from(label),
            handle: SourceHandle::Gpio(line),
        });
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Source<B, L>> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Hand every claimed line back to the bank. Button handles need no
    /// release.
    pub fn release_all<G: GpioBank<Line = L>>(self, gpio: &mut G) {
        for source in self.sources {
            if let SourceHandle::Gpio(line) = source.handle {
                gpio.release(line);
            }
        }
    }
}

/// What to poll this invocation.
#[derive(Debug)]
pub enum SourcePlan<B, L> {
    /// Enumerate every button device on each tick.
    All,
    /// Poll exactly these resolved sources.
    Explicit(SourceSet<B, L>),
}

impl<B, L> SourcePlan<B, L> {
    pub fn release_all<G: GpioBank<Line = L>>(self, gpio: &mut G) {
        if let SourcePlan::Explicit(set) = self {
            set.release_all(gpio);
        }
    }
}

/// Resolve the configured key name and optional GPIO override into a plan.
///
/// The override and the bare key are mandatory (the operator asked for
/// them); the reset fallback is best-effort and silently omitted when it
/// resolves to nothing. On a fatal failure every line claimed so far is
/// released before the error returns.
///
/// # Errors
/// The override descriptor failing to resolve, or the key name resolving to
/// neither a button nor a line while no override exists.
pub fn build<B: ButtonBank, G: GpioBank>(
    buttons: &mut B,
    gpio: &mut G,
    key_name: &str,
    gpio_override: Option<&str>,
) -> Result<SourcePlan<B::Button, G::Line>, CheckError> {
    if key_name.eq_ignore_ascii_case(ALL_KEYWORD)
        || gpio_override.is_some_and(|d| d.eq_ignore_ascii_case(ALL_KEYWORD))
    {
        return Ok(SourcePlan::All);
    }

    let mut set = SourceSet::new();

    if let Some(descriptor) = gpio_override {
        match resolve_gpio(gpio, descriptor, DEFAULT_ACTIVE_LOW) {
            Ok(line) => set.push_gpio(descriptor, line),
            Err(err) => {
                set.release_all(gpio);
                return Err(CheckError::new(descriptor, err));
            }
        }
    }

    match buttons.by_label(key_name) {
        Some(button) => set.push_button(key_name, button),
        None => match resolve_gpio(gpio, key_name, DEFAULT_ACTIVE_LOW) {
            Ok(line) => set.push_gpio(key_name, line),
            Err(err) if gpio_override.is_none() => {
                set.release_all(gpio);
                return Err(CheckError::new(key_name, err));
            }
            Err(err) => {
                log::warn!("key '{}' has no button or GPIO source: {}", key_name, err);
            }
        },
    }

    if !key_name.eq_ignore_ascii_case(RESET_LABEL) {
        match buttons.by_label(RESET_LABEL) {
            Some(button) => set.push_button(RESET_LABEL, button),
            None => match resolve_gpio(gpio, RESET_LABEL, DEFAULT_ACTIVE_LOW) {
                Ok(line) => set.push_gpio(RESET_LABEL, line),
                Err(err) => {
                    log::debug!("reset fallback unavailable: {}", err);
                }
            },
        }
    }

    Ok(SourcePlan::Explicit(set))
}
