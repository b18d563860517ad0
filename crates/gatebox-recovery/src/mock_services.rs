//! Mock collaborators for host-side tests.
//!
//! Scripted stand-ins for the device services: buttons and lines replay
//! per-query scripts, the clock advances when the check idles, and the
//! feedback sink records every action so tests can assert choreography.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::collections::VecDeque;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::services::{
    ButtonBank, ConfigStore, Feedback, FeedbackAction, GpioBank, GpioError, GpioErrorKind,
    MonotonicClock,
};

use core::cell::Cell;

const NOT_FOUND_CODE: i32 = -2;
const BUSY_CODE: i32 = -16;

/// In-memory key/value configuration.
#[derive(Debug, Default)]
pub struct MockConfig {
    values: BTreeMap<String, String>,
}

impl MockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

impl ConfigStore for MockConfig {
    fn get(&mut self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Debug)]
struct MockButton {
    label: String,
    steady: bool,
    script: VecDeque<bool>,
}

impl MockButton {
    fn next_state(&mut self) -> bool {
        self.script.pop_front().unwrap_or(self.steady)
    }
}

/// Index handle into the mock button table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockButtonId(usize);

/// Scripted button devices, enumerated in insertion order.
#[derive(Debug, Default)]
pub struct MockButtons {
    buttons: Vec<MockButton>,
}

impl MockButtons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_button(&mut self, label: &str) {
        self.buttons.push(MockButton {
            label: label.to_string(),
            steady: false,
            script: VecDeque::new(),
        });
    }

    /// Hold the button down for the rest of the run.
    pub fn press(&mut self, label: &str) {
        if let Some(button) = self.find_mut(label) {
            button.steady = true;
        }
    }

    /// Queue per-query states; once drained the steady state applies again.
    pub fn script(&mut self, label: &str, states: &[bool]) {
        if let Some(button) = self.find_mut(label) {
            button.script.extend(states.iter().copied());
        }
    }

    /// Scripted states not yet consumed by queries.
    pub fn remaining_script(&self, label: &str) -> usize {
        self.buttons
            .iter()
            .find(|b| b.label == label)
            .map_or(0, |b| b.script.len())
    }

    fn find_mut(&mut self, label: &str) -> Option<&mut MockButton> {
        self.buttons.iter_mut().find(|b| b.label == label)
    }
}

impl ButtonBank for MockButtons {
    type Button = MockButtonId;

    fn by_label(&mut self, label: &str) -> Option<MockButtonId> {
        self.buttons
            .iter()
            .position(|b| b.label == label)
            .map(MockButtonId)
    }

    fn is_pressed(&mut self, button: &MockButtonId) -> bool {
        self.buttons
            .get_mut(button.0)
            .map_or(false, MockButton::next_state)
    }

    fn find_pressed(&mut self) -> Option<String> {
        // Every device advances its script each enumeration pass so scripted
        // states stay aligned with ticks.
        let mut pressed = None;
        for button in &mut self.buttons {
            let state = button.next_state();
            if state && pressed.is_none() {
                pressed = Some(button.label.clone());
            }
        }
        pressed
    }
}

#[derive(Debug, Default)]
struct MockLineState {
    claimed: bool,
    active_low: Option<bool>,
    steady: bool,
    script: VecDeque<bool>,
    read_fail_code: Option<i32>,
    configure_fail_code: Option<i32>,
    releases: u32,
}

/// Claimed-line handle; releasing it hands the name back to the bank.
#[derive(Debug)]
pub struct MockLine {
    name: String,
}

/// Scripted GPIO bank with exclusive-claim bookkeeping.
#[derive(Debug, Default)]
pub struct MockGpio {
    lines: BTreeMap<String, MockLineState>,
    stray_releases: u32,
}

impl MockGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_line(&mut self, name: &str) {
        self.lines.insert(name.to_string(), MockLineState::default());
    }

    /// Steady logical level once any scripted reads are drained.
    pub fn set_level(&mut self, name: &str, pressed: bool) {
        if let Some(line) = self.lines.get_mut(name) {
            line.steady = pressed;
        }
    }

    /// Queue per-read logical levels.
    pub fn script_levels(&mut self, name: &str, levels: &[bool]) {
        if let Some(line) = self.lines.get_mut(name) {
            line.script.extend(levels.iter().copied());
        }
    }

    /// Fail every read after the scripted levels are drained.
    pub fn fail_read(&mut self, name: &str, code: i32) {
        if let Some(line) = self.lines.get_mut(name) {
            line.read_fail_code = Some(code);
        }
    }

    /// Reject input configuration for this line.
    pub fn fail_configure(&mut self, name: &str, code: i32) {
        if let Some(line) = self.lines.get_mut(name) {
            line.configure_fail_code = Some(code);
        }
    }

    /// Number of lines currently claimed.
    pub fn outstanding(&self) -> usize {
        self.lines.values().filter(|l| l.claimed).count()
    }

    /// How often this line has been released.
    pub fn release_count(&self, name: &str) -> u32 {
        self.lines.get(name).map_or(0, |l| l.releases)
    }

    /// Releases of handles that were not claimed; always zero in a correct
    /// run.
    pub fn stray_releases(&self) -> u32 {
        self.stray_releases
    }

    /// Polarity recorded by `configure_input`, if it ran.
    pub fn configured_polarity(&self, name: &str) -> Option<bool> {
        self.lines.get(name).and_then(|l| l.active_low)
    }
}

impl GpioBank for MockGpio {
    type Line = MockLine;

    fn acquire(&mut self, name: &str) -> Result<MockLine, GpioError> {
        let line = self
            .lines
            .get_mut(name)
            .ok_or(GpioError::new(GpioErrorKind::NotFound, NOT_FOUND_CODE))?;
        if line.claimed {
            return Err(GpioError::new(GpioErrorKind::Busy, BUSY_CODE));
        }
        line.claimed = true;
        Ok(MockLine {
            name: name.to_string(),
        })
    }

    fn configure_input(
        &mut self,
        line: &mut MockLine,
        active_low: bool,
    ) -> Result<(), GpioError> {
        let state = self
            .lines
            .get_mut(&line.name)
            .ok_or(GpioError::new(GpioErrorKind::NotFound, NOT_FOUND_CODE))?;
        if let Some(code) = state.configure_fail_code {
            return Err(GpioError::new(GpioErrorKind::ConfigFailed, code));
        }
        state.active_low = Some(active_low);
        Ok(())
    }

    fn read(&mut self, line: &MockLine) -> Result<bool, GpioError> {
        let state = self
            .lines
            .get_mut(&line.name)
            .ok_or(GpioError::new(GpioErrorKind::NotFound, NOT_FOUND_CODE))?;
        if let Some(level) = state.script.pop_front() {
            return Ok(level);
        }
        if let Some(code) = state.read_fail_code {
            return Err(GpioError::new(GpioErrorKind::ReadFailed, code));
        }
        Ok(state.steady)
    }

    fn release(&mut self, line: MockLine) {
        match self.lines.get_mut(&line.name) {
            Some(state) if state.claimed => {
                state.claimed = false;
                state.releases += 1;
            }
            _ => self.stray_releases += 1,
        }
    }
}

/// Recorded feedback activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    Performed(FeedbackAction),
    Scheduled { delay_ms: u32, action: FeedbackAction },
}

/// Feedback sink that records instead of driving LEDs.
#[derive(Debug, Default)]
pub struct MockFeedback {
    events: Vec<FeedbackEvent>,
}

impl MockFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[FeedbackEvent] {
        &self.events
    }
}

impl Feedback for MockFeedback {
    fn perform(&mut self, action: FeedbackAction) {
        self.events.push(FeedbackEvent::Performed(action));
    }

    fn perform_after(&mut self, delay_ms: u32, action: FeedbackAction) {
        self.events.push(FeedbackEvent::Scheduled { delay_ms, action });
    }
}

/// Virtual monotonic clock; time moves only when the check idles or a test
/// advances it by hand.
#[derive(Debug)]
pub struct MockClock {
    now_ms: Cell<u64>,
    idle_step_ms: u64,
}

impl MockClock {
    pub fn new() -> Self {
        Self::with_idle_step(100)
    }

    /// How far each `idle_wait` moves virtual time.
    pub fn with_idle_step(idle_step_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(0),
            idle_step_ms,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn idle_wait(&self) {
        self.advance(self.idle_step_ms);
    }
}
