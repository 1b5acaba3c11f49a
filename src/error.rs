use crate::platform::PinId;

/// Which of the two LEDs a write went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    Red,
    Green,
}

impl Led {
    pub const fn as_str(self) -> &'static str {
        match self {
            Led::Red => "RED",
            Led::Green => "GREEN",
        }
    }
}

/// Failures that abort [`start`](crate::start). Nothing is left acquired when
/// one of these is returned.
///
/// `E` is the platform's own error, kept as the `cause` of the GPIO failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartError<E> {
    #[error("Blink period of {period_ms} ms is too short for a tick")]
    InvalidBlinkPeriod { period_ms: u64 },
    #[error("Failed to configure GPIO {pin}: {cause:?}")]
    Configuration { pin: PinId, cause: E },
    #[error("Failed to register the edge interrupt on GPIO {pin}: {cause:?}")]
    InterruptRegistration { pin: PinId, cause: E },
}

/// A single LED write that failed during a tick. Recovered by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("Failed to drive the {} LED", .led.as_str())]
pub struct OutputWriteError {
    pub led: Led,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutdownError {
    #[error("Blink service did not stop within {waited_ms} ms")]
    Timeout { waited_ms: u64 },
}
