//! Start/stop lifecycle for the LED pair and the button.
//!
//! [`start`] acquires every pin and binds the button interrupt, rolling back
//! on failure. [`Running::run`] drives the scheduler and the edge watcher
//! until [`BlinkState::stop`] (or [`BlinkState::request_stop`]) is called,
//! then leaves both LEDs off and releases the hardware.

use embassy_futures::select::select;
use embedded_hal::digital::InputPin;

use crate::blink::BlinkScheduler;
use crate::config::BlinkConfig;
use crate::error::StartError;
use crate::mode::ModeController;
use crate::platform::Platform;
use crate::state::BlinkState;

/// Outcome of a finished run, for the reporting layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShutdownReport {
    /// Presses counted during the run
    pub presses: u32,
    /// Button level at shutdown, if it could be read
    pub button_level: Option<bool>,
}

/// A started service. Nothing happens until [`run`](Self::run) is polled.
pub struct Running<'a, P: Platform> {
    platform: P,
    config: BlinkConfig,
    state: &'a BlinkState,
    scheduler: BlinkScheduler<'a, P::Output>,
    button: P::Input,
    interrupt: P::Interrupt,
}

/// Acquire the pins named in `config`, bind the button interrupt and reset
/// `state` to power-on values (FLASH, zero presses, LEDs off).
///
/// On error everything acquired so far has been handed back to `platform`.
pub fn start<'a, P: Platform>(
    mut platform: P,
    config: BlinkConfig,
    state: &'a BlinkState,
) -> Result<Running<'a, P>, StartError<P::Error>> {
    if !config.has_valid_period() {
        log_error!(
            "blink period {} ms gives a zero tick",
            config.blink_period.as_millis()
        );
        return Err(StartError::InvalidBlinkPeriod {
            period_ms: config.blink_period.as_millis(),
        });
    }

    let red = match platform.configure_output(config.red_pin, config.red_initial) {
        Ok(pin) => pin,
        Err(cause) => {
            log_error!("invalid RED LED GPIO {}", config.red_pin);
            return Err(StartError::Configuration {
                pin: config.red_pin,
                cause,
            });
        }
    };

    let green = match platform.configure_output(config.green_pin, config.green_initial) {
        Ok(pin) => pin,
        Err(cause) => {
            log_error!("invalid GREEN LED GPIO {}", config.green_pin);
            platform.release_output(red);
            return Err(StartError::Configuration {
                pin: config.green_pin,
                cause,
            });
        }
    };

    let mut button = match platform.configure_input(config.button_pin, config.debounce) {
        Ok(pin) => pin,
        Err(cause) => {
            log_error!("invalid button GPIO {}", config.button_pin);
            platform.release_output(green);
            platform.release_output(red);
            return Err(StartError::Configuration {
                pin: config.button_pin,
                cause,
            });
        }
    };

    if let Ok(level) = button.is_high() {
        log_info!("button GPIO {} currently reads {}", config.button_pin, level);
    }

    let interrupt = match platform.register_edge_interrupt(&mut button, config.edge) {
        Ok(interrupt) => interrupt,
        Err(cause) => {
            log_error!("failed to bind the edge interrupt on GPIO {}", config.button_pin);
            platform.release_input(button);
            platform.release_output(green);
            platform.release_output(red);
            return Err(StartError::InterruptRegistration {
                pin: config.button_pin,
                cause,
            });
        }
    };

    state.reset();
    let scheduler = BlinkScheduler::new(red, green, state, config.tick_interval());

    log_info!(
        "blink service ready: RED {} GREEN {} button {}",
        config.red_pin,
        config.green_pin,
        config.button_pin
    );

    Ok(Running {
        platform,
        config,
        state,
        scheduler,
        button,
        interrupt,
    })
}

impl<'a, P: Platform> Running<'a, P> {
    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }

    /// Flash the LEDs and follow the button until a stop is requested.
    ///
    /// On the way out both LEDs are forced low, the interrupt is unregistered,
    /// all pins are released and waiters in [`BlinkState::stop`] are woken
    /// with the final press count.
    pub async fn run(self) -> ShutdownReport {
        let Running {
            mut platform,
            config,
            state,
            mut scheduler,
            mut button,
            interrupt,
        } = self;

        state.set_running(true);
        let controller = ModeController::new(state);

        // The watcher never finishes on its own; it is dropped at one of its
        // await points once the scheduler returns.
        select(scheduler.run(), controller.watch(&mut button, config.edge)).await;

        if scheduler.force_off().is_err() {
            log_error!("failed to force the LEDs off");
        }

        platform.unregister_edge_interrupt(&mut button, interrupt);
        let button_level = button.is_high().ok();
        platform.release_input(button);
        let (red, green) = scheduler.into_outputs();
        platform.release_output(green);
        platform.release_output(red);

        let presses = state.presses();
        if let Some(level) = button_level {
            log_info!("button GPIO {} reads {} at shutdown", config.button_pin, level);
        }
        log_info!("button was pressed {} times", presses);

        state.set_running(false);
        state.finish(presses);

        ShutdownReport {
            presses,
            button_level,
        }
    }
}
