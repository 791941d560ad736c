//! GPIO configuration for the button input.

use crate::event::{PinId, Polarity};

/// Button pin configuration.
///
/// Pin mode, pull and edge trigger are applied by the device glue
/// before the pipeline starts.
#[derive(Clone, Copy, Debug)]
pub struct ButtonPinConfig {
    pub pin: PinId,
    pub polarity: Polarity,
    pub pull_up: bool,
}

impl ButtonPinConfig {
    /// Edge that signals a press for this wiring.
    pub fn press_edge_is_falling(&self) -> bool {
        self.polarity == Polarity::ActiveLow
    }
}

impl Default for ButtonPinConfig {
    fn default() -> Self {
        Self {
            pin: PinId(0), // GPIO0 - BOOT button on ESP32-S3 devkits
            polarity: Polarity::ActiveLow,
            pull_up: true,
        }
    }
}
