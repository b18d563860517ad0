//! Hold-duration tracking and the top-level check driver.
//!
//! One invocation per boot attempt: build the source plan, sample it on
//! whole-second boundaries, and decide whether the press was held long
//! enough to start recovery. Every claimed line is released on every exit
//! path before the verdict is returned.

use alloc::string::String;

use crate::registry;
use crate::sample::{sample, PressOutcome};
use crate::services::{
    ButtonBank, CheckError, ConfigStore, Feedback, FeedbackAction, GpioBank, GpioError,
    GpioErrorKind, IndicatorPattern, MonotonicClock, ReadFailure,
};

/// Consecutive held seconds required to trigger recovery.
pub const HOLD_THRESHOLD_SECS: u32 = 4;

/// Sampling boundary.
const TICK_MS: u64 = 1000;

/// Delay before the no-press idle indicator action fires.
const IDLE_FEEDBACK_DELAY_MS: u32 = 1000;

/// Indicator blink period while the check is starting up.
const CHECK_BLINK_MS: u32 = 250;

/// Indicator blink period while a press is being held.
const HOLD_BLINK_MS: u32 = 500;

/// Shown when a press arrives without a usable label.
const FALLBACK_LABEL: &str = "button";

/// Config key naming the primary source; defaults to `reset`.
const KEY_NAME_CONFIG: &str = "recovery_key";

/// Config key holding an optional GPIO descriptor override.
const GPIO_OVERRIDE_CONFIG: &str = "recovery_gpio";

/// Final outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Press held to the threshold; recovery was requested.
    Triggered { label: String },
    /// No trigger. `aborted` records a mid-poll read failure when the hold
    /// session ended on one; purely diagnostic.
    NotTriggered { aborted: Option<ReadFailure> },
}

/// Result of feeding one boundary sample to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldStep {
    /// Still held; progress count in whole seconds.
    Held(u32),
    Triggered,
    Released,
    Aborted(ReadFailure),
}

/// Live hold state. Created on the first positive sample, discarded the
/// moment the press ends, a read fails, or the threshold is reached.
#[derive(Debug)]
pub struct HoldSession {
    label: String,
    held_secs: u32,
}

impl HoldSession {
    pub fn start(label: String) -> Self {
        let label = if label.is_empty() {
            String::from(FALLBACK_LABEL)
        } else {
            label
        };
        Self {
            label,
            held_secs: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn held_secs(&self) -> u32 {
        self.held_secs
    }

    fn into_label(self) -> String {
        self.label
    }

    /// Feed the sample taken at a whole-second boundary.
    pub fn advance(&mut self, outcome: PressOutcome) -> HoldStep {
        match outcome {
            PressOutcome::ReadError { label, code } => {
                HoldStep::Aborted(ReadFailure { label, code })
            }
            PressOutcome::NotPressed => HoldStep::Released,
            PressOutcome::PressedBy { .. } => {
                self.held_secs += 1;
                if self.held_secs >= HOLD_THRESHOLD_SECS {
                    HoldStep::Triggered
                } else {
                    HoldStep::Held(self.held_secs)
                }
            }
        }
    }
}

enum SessionEnd {
    Triggered,
    Released,
    Aborted(ReadFailure),
}

/// One-shot recovery-button check over explicit collaborator handles.
pub struct RecoveryCheck<'a, C, B, G, F, K> {
    config: &'a mut C,
    buttons: &'a mut B,
    gpio: &'a mut G,
    feedback: &'a mut F,
    clock: &'a K,
}

impl<'a, C, B, G, F, K> RecoveryCheck<'a, C, B, G, F, K>
where
    C: ConfigStore,
    B: ButtonBank,
    G: GpioBank,
    F: Feedback,
    K: MonotonicClock,
{
    pub fn new(
        config: &'a mut C,
        buttons: &'a mut B,
        gpio: &'a mut G,
        feedback: &'a mut F,
        clock: &'a K,
    ) -> Self {
        Self {
            config,
            buttons,
            gpio,
            feedback,
            clock,
        }
    }

    /// Run the check to completion.
    ///
    /// # Errors
    /// Only fatal source resolution (or a read failure on the very first
    /// sample): a mandatory source the operator configured is unusable.
    /// Mid-poll read failures are folded into the verdict instead.
    pub fn run(self) -> Result<Verdict, CheckError> {
        let Self {
            config,
            buttons,
            gpio,
            feedback,
            clock,
        } = self;

        feedback.perform(FeedbackAction::Indicator(IndicatorPattern::Blink {
            period_ms: CHECK_BLINK_MS,
        }));

        let key = config
            .get(KEY_NAME_CONFIG)
            .unwrap_or_else(|| String::from(registry::RESET_LABEL));
        let gpio_override = config.get(GPIO_OVERRIDE_CONFIG);

        let plan = registry::build(buttons, gpio, &key, gpio_override.as_deref())?;

        let label = match sample(buttons, gpio, &plan) {
            PressOutcome::NotPressed => {
                feedback.perform_after(
                    IDLE_FEEDBACK_DELAY_MS,
                    FeedbackAction::Indicator(IndicatorPattern::Solid),
                );
                plan.release_all(gpio);
                return Ok(Verdict::NotTriggered { aborted: None });
            }
            PressOutcome::ReadError { label, code } => {
                plan.release_all(gpio);
                return Err(CheckError::new(
                    label,
                    GpioError::new(GpioErrorKind::ReadFailed, code),
                ));
            }
            PressOutcome::PressedBy { label } => label,
        };

        let mut session = HoldSession::start(label);
        feedback.perform(FeedbackAction::Indicator(IndicatorPattern::Blink {
            period_ms: HOLD_BLINK_MS,
        }));
        log::info!(
            "{} is pressed for: {} second(s)",
            session.label(),
            session.held_secs()
        );

        let mut anchor = clock.now_ms();
        let ending = loop {
            if clock.now_ms().saturating_sub(anchor) < TICK_MS {
                clock.idle_wait();
                continue;
            }
            anchor = clock.now_ms();

            match session.advance(sample(buttons, gpio, &plan)) {
                HoldStep::Held(secs) => {
                    log::info!("{} is pressed for: {} second(s)", session.label(), secs);
                }
                HoldStep::Triggered => break SessionEnd::Triggered,
                HoldStep::Released => break SessionEnd::Released,
                HoldStep::Aborted(failure) => break SessionEnd::Aborted(failure),
            }
        };

        feedback.perform(FeedbackAction::Indicator(IndicatorPattern::Off));
        plan.release_all(gpio);

        Ok(match ending {
            SessionEnd::Triggered => {
                log::info!(
                    "{} held for {} second(s), starting recovery",
                    session.label(),
                    HOLD_THRESHOLD_SECS
                );
                feedback.perform(FeedbackAction::SystemLedOn);
                feedback.perform(FeedbackAction::RunRecovery);
                Verdict::Triggered {
                    label: session.into_label(),
                }
            }
            SessionEnd::Released => Verdict::NotTriggered { aborted: None },
            SessionEnd::Aborted(failure) => {
                log::warn!(
                    "GPIO '{}' read failed (err={}), hold check abandoned",
                    failure.label,
                    failure.code
                );
                Verdict::NotTriggered {
                    aborted: Some(failure),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_services::{
        FeedbackEvent, MockButtons, MockClock, MockConfig, MockFeedback, MockGpio,
    };

    #[test]
    fn session_counts_up_and_triggers_at_threshold() {
        let mut session = HoldSession::start(String::from("reset"));
        let pressed = || PressOutcome::PressedBy {
            label: String::from("reset"),
        };

        assert_eq!(session.advance(pressed()), HoldStep::Held(1));
        assert_eq!(session.advance(pressed()), HoldStep::Held(2));
        assert_eq!(session.advance(pressed()), HoldStep::Held(3));
        assert_eq!(session.advance(pressed()), HoldStep::Triggered);
        assert_eq!(session.held_secs(), 4);
    }

    #[test]
    fn release_before_threshold_ends_the_session() {
        let mut session = HoldSession::start(String::from("reset"));
        let pressed = || PressOutcome::PressedBy {
            label: String::from("reset"),
        };

        session.advance(pressed());
        session.advance(pressed());
        assert_eq!(session.advance(PressOutcome::NotPressed), HoldStep::Released);
        assert_eq!(session.held_secs(), 2);
    }

    #[test]
    fn read_error_aborts_without_advancing() {
        let mut session = HoldSession::start(String::from("reset"));
        session.advance(PressOutcome::PressedBy {
            label: String::from("reset"),
        });

        let step = session.advance(PressOutcome::ReadError {
            label: String::from("reset"),
            code: -5,
        });
        assert_eq!(
            step,
            HoldStep::Aborted(ReadFailure {
                label: String::from("reset"),
                code: -5
            })
        );
        assert_eq!(session.held_secs(), 1);
    }

    #[test]
    fn empty_label_falls_back_to_generic_name() {
        let session = HoldSession::start(String::new());
        assert_eq!(session.label(), "button");
    }

    #[test]
    fn idle_run_schedules_the_deferred_indicator_once() {
        let mut config = MockConfig::new();
        let mut buttons = MockButtons::new();
        buttons.add_button("reset");
        let mut gpio = MockGpio::new();
        let mut feedback = MockFeedback::new();
        let clock = MockClock::new();

        let verdict =
            RecoveryCheck::new(&mut config, &mut buttons, &mut gpio, &mut feedback, &clock)
                .run()
                .unwrap();

        assert_eq!(verdict, Verdict::NotTriggered { aborted: None });
        let scheduled: Vec<_> = feedback
            .events()
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::Scheduled { .. }))
            .collect();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(
            scheduled[0],
            &FeedbackEvent::Scheduled {
                delay_ms: 1000,
                action: FeedbackAction::Indicator(IndicatorPattern::Solid),
            }
        );
    }

    #[test]
    fn held_press_triggers_recovery_action() {
        let mut config = MockConfig::new();
        let mut buttons = MockButtons::new();
        buttons.add_button("reset");
        buttons.press("reset");
        let mut gpio = MockGpio::new();
        let mut feedback = MockFeedback::new();
        let clock = MockClock::new();

        let verdict =
            RecoveryCheck::new(&mut config, &mut buttons, &mut gpio, &mut feedback, &clock)
                .run()
                .unwrap();

        assert_eq!(
            verdict,
            Verdict::Triggered {
                label: String::from("reset")
            }
        );
        assert!(feedback
            .events()
            .contains(&FeedbackEvent::Performed(FeedbackAction::RunRecovery)));
        assert!(feedback
            .events()
            .contains(&FeedbackEvent::Performed(FeedbackAction::SystemLedOn)));
    }
}
