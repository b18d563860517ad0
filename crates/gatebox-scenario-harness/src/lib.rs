//! Host-side scenario harness for scripted recovery-check runs.

use gatebox_recovery::{
    CheckError, FeedbackAction, FeedbackEvent, MockButtons, MockClock, MockConfig, MockFeedback,
    MockGpio, RecoveryCheck, Verdict,
};

/// Couples the mock collaborators with the check driver for scenario tests.
pub struct RecoveryScenario {
    pub config: MockConfig,
    pub buttons: MockButtons,
    pub gpio: MockGpio,
    pub feedback: MockFeedback,
    pub clock: MockClock,
}

impl RecoveryScenario {
    pub fn new() -> Self {
        Self {
            config: MockConfig::new(),
            buttons: MockButtons::new(),
            gpio: MockGpio::new(),
            feedback: MockFeedback::new(),
            clock: MockClock::new(),
        }
    }

    /// Run one check invocation against the scripted state.
    pub fn run(&mut self) -> Result<Verdict, CheckError> {
        RecoveryCheck::new(
            &mut self.config,
            &mut self.buttons,
            &mut self.gpio,
            &mut self.feedback,
            &self.clock,
        )
        .run()
    }

    /// Actions performed immediately, in order.
    pub fn performed(&self) -> Vec<FeedbackAction> {
        self.feedback
            .events()
            .iter()
            .filter_map(|event| match event {
                FeedbackEvent::Performed(action) => Some(*action),
                FeedbackEvent::Scheduled { .. } => None,
            })
            .collect()
    }

    /// Deferred actions, in order, with their delays.
    pub fn scheduled(&self) -> Vec<(u32, FeedbackAction)> {
        self.feedback
            .events()
            .iter()
            .filter_map(|event| match event {
                FeedbackEvent::Scheduled { delay_ms, action } => Some((*delay_ms, *action)),
                FeedbackEvent::Performed(_) => None,
            })
            .collect()
    }
}

impl Default for RecoveryScenario {
    fn default() -> Self {
        Self::new()
    }
}
