//! Gatebox G2 boot firmware: run the recovery-button check, then either
//! hand the device to the recovery portal or continue the normal boot.

mod buttons;
mod config;
mod feedback;
mod gpio_bank;
mod portal;
mod power;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{IOPin, OutputPin};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys;

use gatebox_recovery::{MonotonicClock, RecoveryCheck, Verdict};

use crate::buttons::BoardButtons;
use crate::config::NvsConfig;
use crate::feedback::BoardFeedback;
use crate::gpio_bank::BoardGpioBank;
use crate::portal::RecoveryPortal;

// Gatebox G2 wiring.
const MESH_BUTTON_PIN: i32 = 4;
const ACTIVITY_LED_PIN: i32 = 8;
const RESET_BUTTON_PIN: i32 = 9;
const SYSTEM_LED_PIN: i32 = 10;

const IDLE_POLL_MS: u32 = 10;

struct BootClock;

impl MonotonicClock for BootClock {
    fn now_ms(&self) -> u64 {
        (unsafe { sys::esp_timer_get_time() } / 1_000) as u64
    }

    fn idle_wait(&self) {
        FreeRtos::delay_ms(IDLE_POLL_MS);
    }
}

fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("Gatebox G2 boot: checking recovery button");

    let peripherals = Peripherals::take().unwrap();
    let sys_loop = EspSystemEventLoop::take().unwrap();
    let nvs_partition = EspDefaultNvsPartition::take().unwrap();
    let pins = peripherals.pins;

    let mut config = NvsConfig::new(nvs_partition.clone()).unwrap();

    let mut buttons = BoardButtons::new();
    buttons.add("reset", pins.gpio9.downgrade()).unwrap();
    buttons.add("mesh", pins.gpio4.downgrade()).unwrap();

    // Pins wired to buttons and LEDs are not claimable as free lines.
    let mut gpio = BoardGpioBank::new(&[
        MESH_BUTTON_PIN,
        ACTIVITY_LED_PIN,
        RESET_BUTTON_PIN,
        SYSTEM_LED_PIN,
    ]);

    let mut portal_parts = Some((peripherals.modem, sys_loop, nvs_partition));
    let mut portal: Option<RecoveryPortal> = None;
    let recovery = Box::new(move || {
        if portal.is_some() {
            return;
        }
        if let Some((modem, sys_loop, nvs)) = portal_parts.take() {
            match RecoveryPortal::start(modem, sys_loop, nvs) {
                Ok(started) => portal = Some(started),
                Err(err) => log::error!("recovery portal failed to start: {}", err.0),
            }
        }
    });

    let mut feedback = BoardFeedback::new(
        pins.gpio8.downgrade_output(),
        pins.gpio10.downgrade_output(),
        recovery,
    )
    .unwrap();

    let _power_rails = power::clear_power_rails(&mut config);

    let clock = BootClock;
    let check = RecoveryCheck::new(&mut config, &mut buttons, &mut gpio, &mut feedback, &clock);

    match check.run() {
        Ok(Verdict::Triggered { label }) => {
            log::info!("recovery requested by '{}'", label);
        }
        Ok(Verdict::NotTriggered {
            aborted: Some(failure),
        }) => {
            log::warn!(
                "hold check ended on read failure from '{}' (err={}); continuing boot",
                failure.label,
                failure.code
            );
        }
        Ok(Verdict::NotTriggered { aborted: None }) => {
            log::info!("no recovery request, continuing boot");
        }
        Err(err) => {
            log::error!("recovery check unavailable: {}", err);
        }
    }

    // Park here: the portal (if started) and the deferred indicator timers
    // live in `feedback` and must outlast the check.
    loop {
        FreeRtos::delay_ms(1000);
    }
}
