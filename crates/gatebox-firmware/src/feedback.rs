//! LED indicator and recovery-action sink.
//!
//! Blink patterns run on the shared timer service so the check loop never
//! has to service the LED itself. The deferred variant arms a one-shot
//! timer and forgets about it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_svc::sys::EspError;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use gatebox_recovery::{Feedback, FeedbackAction, IndicatorPattern};

type SharedLed = Arc<Mutex<PinDriver<'static, AnyOutputPin, Output>>>;
type SharedTimer = Arc<Mutex<Option<EspTimer<'static>>>>;
type RecoveryHook = Arc<Mutex<Box<dyn FnMut() + Send>>>;

fn set_level(led: &SharedLed, high: bool) -> Result<(), EspError> {
    match led.lock() {
        Ok(mut driver) => {
            if high {
                driver.set_high()
            } else {
                driver.set_low()
            }
        }
        Err(_) => Ok(()),
    }
}

/// Drives the activity and system LEDs and launches the recovery action.
pub struct BoardFeedback {
    timer_service: EspTaskTimerService,
    activity_led: SharedLed,
    system_led: SharedLed,
    blink: SharedTimer,
    deferred: Vec<EspTimer<'static>>,
    recovery: RecoveryHook,
}

impl BoardFeedback {
    pub fn new(
        activity: AnyOutputPin,
        system: AnyOutputPin,
        recovery: Box<dyn FnMut() + Send>,
    ) -> Result<Self, EspError> {
        Ok(Self {
            timer_service: EspTaskTimerService::new()?,
            activity_led: Arc::new(Mutex::new(PinDriver::output(activity)?)),
            system_led: Arc::new(Mutex::new(PinDriver::output(system)?)),
            blink: Arc::new(Mutex::new(None)),
            deferred: Vec::new(),
            recovery: Arc::new(Mutex::new(recovery)),
        })
    }

    fn apply_indicator(
        service: &EspTaskTimerService,
        led: &SharedLed,
        blink: &SharedTimer,
        pattern: IndicatorPattern,
    ) -> Result<(), EspError> {
        // Dropping the previous timer stops any running blink.
        if let Ok(mut slot) = blink.lock() {
            *slot = None;
        }

        match pattern {
            IndicatorPattern::Off => set_level(led, false),
            IndicatorPattern::Solid => set_level(led, true),
            IndicatorPattern::Blink { period_ms } => {
                let led = led.clone();
                let timer = service.timer(move || {
                    if let Ok(mut driver) = led.lock() {
                        let _ = driver.toggle();
                    }
                })?;
                timer.every(Duration::from_millis(u64::from(period_ms)))?;
                if let Ok(mut slot) = blink.lock() {
                    *slot = Some(timer);
                }
                Ok(())
            }
        }
    }

    fn dispatch(
        service: &EspTaskTimerService,
        activity: &SharedLed,
        system: &SharedLed,
        blink: &SharedTimer,
        recovery: &RecoveryHook,
        action: FeedbackAction,
    ) {
        let result = match action {
            FeedbackAction::Indicator(pattern) => {
                Self::apply_indicator(service, activity, blink, pattern)
            }
            FeedbackAction::SystemLedOn => set_level(system, true),
            FeedbackAction::RunRecovery => {
                if let Ok(mut hook) = recovery.lock() {
                    (*hook)();
                }
                Ok(())
            }
        };

        if let Err(err) = result {
            log::warn!("feedback action {:?} failed: {}", action, err);
        }
    }
}

impl Feedback for BoardFeedback {
    fn perform(&mut self, action: FeedbackAction) {
        Self::dispatch(
            &self.timer_service,
            &self.activity_led,
            &self.system_led,
            &self.blink,
            &self.recovery,
            action,
        );
    }

    fn perform_after(&mut self, delay_ms: u32, action: FeedbackAction) {
        let service = self.timer_service.clone();
        let activity = self.activity_led.clone();
        let system = self.system_led.clone();
        let blink = self.blink.clone();
        let recovery = self.recovery.clone();

        match self.timer_service.timer(move || {
            Self::dispatch(&service, &activity, &system, &blink, &recovery, action);
        }) {
            Ok(timer) => {
                if let Err(err) = timer.after(Duration::from_millis(u64::from(delay_ms))) {
                    log::warn!("deferred feedback not armed: {}", err);
                    return;
                }
                self.deferred.push(timer);
            }
            Err(err) => log::warn!("deferred feedback timer unavailable: {}", err),
        }
    }
}
