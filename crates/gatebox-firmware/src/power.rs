//! Best-effort power-rail clearing before the check samples anything.
//!
//! Some carrier boards back-power attached modules through stray GPIO
//! levels; the `power_clr_gpios` config key lists lines to drive low first.

use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};

use gatebox_recovery::ConfigStore;

const POWER_CLR_CONFIG: &str = "power_clr_gpios";

/// Drive every configured line low. The returned drivers must stay alive
/// for the levels to hold.
pub fn clear_power_rails<C: ConfigStore>(
    config: &mut C,
) -> Vec<PinDriver<'static, AnyOutputPin, Output>> {
    let Some(list) = config.get(POWER_CLR_CONFIG) else {
        return Vec::new();
    };

    let mut held = Vec::new();
    for token in list.split_whitespace() {
        let Ok(pin_num) = token.parse::<i32>() else {
            log::warn!("ignoring malformed power GPIO '{}'", token);
            continue;
        };

        let pin = unsafe { AnyOutputPin::new(pin_num) };
        match PinDriver::output(pin) {
            Ok(mut driver) => match driver.set_low() {
                Ok(()) => {
                    log::info!("cleared power GPIO {}", pin_num);
                    held.push(driver);
                }
                Err(err) => log::warn!("power GPIO {} not cleared: {}", pin_num, err),
            },
            Err(err) => log::warn!("power GPIO {} unavailable: {}", pin_num, err),
        }
    }

    held
}
