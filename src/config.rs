use embassy_time::Duration;

use crate::platform::{Edge, PinId};

/// Wiring and timing for the LED pair and the button.
///
/// Uses struct update syntax for customisation.
///
/// # Example
///
/// ```ignore
/// let config = BlinkConfig {
///     red_pin: 14,
///     green_pin: 15,
///     button_pin: 16,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkConfig {
    /// GPIO driving the red LED
    pub red_pin: PinId,
    /// GPIO driving the green LED
    pub green_pin: PinId,
    /// GPIO the button is wired to
    pub button_pin: PinId,
    /// Red level applied when the pin is configured, before the first tick
    pub red_initial: bool,
    /// Green level applied when the pin is configured, before the first tick
    pub green_initial: bool,
    /// Debounce window handed to the input capability
    pub debounce: Duration,
    /// Edge that counts as a press
    pub edge: Edge,
    /// Nominal blink period. One tick lasts a third of it.
    pub blink_period: Duration,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            red_pin: 66,
            green_pin: 67,
            button_pin: 69,
            red_initial: true,
            green_initial: false,
            debounce: Duration::from_millis(200),
            edge: Edge::Rising,
            blink_period: Duration::from_millis(1000),
        }
    }
}

impl BlinkConfig {
    /// Sleep between two ticks: the blink period divided by three, in whole
    /// milliseconds.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.blink_period.as_millis() / 3)
    }

    /// Longest time a stop request may take to be observed.
    pub fn shutdown_bound(&self) -> Duration {
        self.tick_interval()
    }

    pub(crate) fn has_valid_period(&self) -> bool {
        self.tick_interval() > Duration::from_ticks(0)
    }
}
