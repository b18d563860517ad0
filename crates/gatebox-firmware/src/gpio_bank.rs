//! GPIO line service over the SoC pins.
//!
//! Line names are bare pin numbers ("4", "12"); descriptor prefixes are
//! already stripped by the resolver before they reach this bank.

use std::collections::BTreeSet;

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_svc::sys;

use gatebox_recovery::{GpioBank, GpioError, GpioErrorKind};

// ESP32-C3 exposes GPIO0..GPIO21.
const MAX_PIN: i32 = 21;

fn not_found() -> GpioError {
    GpioError::new(GpioErrorKind::NotFound, sys::ESP_ERR_NOT_FOUND as i32)
}

/// A claimed pin, configured as input on demand.
pub struct ClaimedLine {
    pin: i32,
    driver: PinDriver<'static, AnyIOPin, Input>,
    active_low: bool,
}

/// Exclusive claim bookkeeping over the free pins of the board.
pub struct BoardGpioBank {
    reserved: BTreeSet<i32>,
    claimed: BTreeSet<i32>,
}

impl BoardGpioBank {
    /// `reserved` pins are wired to board functions and never resolvable
    /// as free lines.
    pub fn new(reserved: &[i32]) -> Self {
        Self {
            reserved: reserved.iter().copied().collect(),
            claimed: BTreeSet::new(),
        }
    }
}

impl GpioBank for BoardGpioBank {
    type Line = ClaimedLine;

    fn acquire(&mut self, name: &str) -> Result<ClaimedLine, GpioError> {
        let pin: i32 = name.parse().map_err(|_| not_found())?;
        if !(0..=MAX_PIN).contains(&pin) || self.reserved.contains(&pin) {
            return Err(not_found());
        }
        if self.claimed.contains(&pin) {
            return Err(GpioError::new(
                GpioErrorKind::Busy,
                sys::ESP_ERR_INVALID_STATE as i32,
            ));
        }

        // Runtime pin numbers have no typed peripheral handle; the claimed
        // set above guarantees a single driver per pin.
        let io_pin = unsafe { AnyIOPin::new(pin) };
        let driver = PinDriver::input(io_pin)
            .map_err(|e| GpioError::new(GpioErrorKind::Busy, e.code()))?;

        self.claimed.insert(pin);
        Ok(ClaimedLine {
            pin,
            driver,
            active_low: true,
        })
    }

    fn configure_input(
        &mut self,
        line: &mut ClaimedLine,
        active_low: bool,
    ) -> Result<(), GpioError> {
        let pull = if active_low { Pull::Up } else { Pull::Down };
        line.driver
            .set_pull(pull)
            .map_err(|e| GpioError::new(GpioErrorKind::ConfigFailed, e.code()))?;
        line.active_low = active_low;
        Ok(())
    }

    fn read(&mut self, line: &ClaimedLine) -> Result<bool, GpioError> {
        let pressed = if line.active_low {
            line.driver.is_low()
        } else {
            line.driver.is_high()
        };
        Ok(pressed)
    }

    fn release(&mut self, line: ClaimedLine) {
        self.claimed.remove(&line.pin);
    }
}
