//! Board button table.
//!
//! The Gatebox G2 wires its buttons active-low with internal pull-ups; the
//! labels here are what the check reports when a press triggers recovery.

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_svc::sys::EspError;

use gatebox_recovery::ButtonBank;

struct BoardButton {
    label: &'static str,
    driver: PinDriver<'static, AnyIOPin, Input>,
}

/// Index handle into the button table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonIndex(usize);

/// Labelled button devices in enumeration order.
pub struct BoardButtons {
    buttons: Vec<BoardButton>,
}

impl BoardButtons {
    pub fn new() -> Self {
        Self {
            buttons: Vec::new(),
        }
    }

    pub fn add(&mut self, label: &'static str, pin: AnyIOPin) -> Result<(), EspError> {
        let mut driver = PinDriver::input(pin)?;
        driver.set_pull(Pull::Up)?;
        self.buttons.push(BoardButton { label, driver });
        Ok(())
    }
}

impl ButtonBank for BoardButtons {
    type Button = ButtonIndex;

    fn by_label(&mut self, label: &str) -> Option<ButtonIndex> {
        self.buttons
            .iter()
            .position(|b| b.label == label)
            .map(ButtonIndex)
    }

    fn is_pressed(&mut self, button: &ButtonIndex) -> bool {
        self.buttons
            .get(button.0)
            .map_or(false, |b| b.driver.is_low())
    }

    fn find_pressed(&mut self) -> Option<String> {
        self.buttons
            .iter()
            .find(|b| b.driver.is_low())
            .map(|b| b.label.to_string())
    }
}
