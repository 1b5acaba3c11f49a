//! Periodic LED driver.
//!
//! Every tick reads the shared mode, projects it onto a single level and
//! writes that level to both LEDs. The scheduler owns no state machine of its
//! own apart from the last level it wrote.

use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};
use embedded_hal::digital::{OutputPin, PinState};

use crate::error::{Led, OutputWriteError};
use crate::state::BlinkState;

pub struct BlinkScheduler<'a, O> {
    red: O,
    green: O,
    state: &'a BlinkState,
    tick_interval: Duration,
    reported_presses: u32,
}

impl<'a, O> BlinkScheduler<'a, O>
where
    O: OutputPin,
{
    pub fn new(red: O, green: O, state: &'a BlinkState, tick_interval: Duration) -> Self {
        Self {
            red,
            green,
            state,
            tick_interval,
            reported_presses: state.presses(),
        }
    }

    /// Run one tick without sleeping. Returns the level written to both LEDs.
    ///
    /// A failed write is logged and counted; the level is still recorded so
    /// flashing keeps its rhythm.
    pub fn tick(&mut self) -> bool {
        self.report_presses();

        let mode = self.state.mode();
        let level = mode.next_level(self.state.led_on());

        if let Err(err) = self.write_both(level) {
            self.state.record_write_failure();
            log_warn!(
                "tick write failed on {} LED (mode {}, level {})",
                err.led.as_str(),
                mode.as_str(),
                level
            );
        }
        self.state.set_led_on(level);
        level
    }

    /// Tick until a stop is requested.
    ///
    /// The stop request is checked before every tick and raced against the
    /// sleep after it, so the loop ends at most one tick interval after the
    /// request and never in the middle of a write.
    pub async fn run(&mut self) {
        log_debug!("blink scheduler started, tick {} ms", self.tick_interval.as_millis());
        loop {
            if self.state.stop_requested() {
                break;
            }
            self.tick();
            match select(Timer::after(self.tick_interval), self.state.wait_stop()).await {
                Either::First(()) => {}
                Either::Second(()) => break,
            }
        }
        log_debug!("blink scheduler stopped");
    }

    /// Drive both LEDs low regardless of mode.
    pub fn force_off(&mut self) -> Result<(), OutputWriteError> {
        let result = self.write_both(false);
        self.state.set_led_on(false);
        result
    }

    pub fn into_outputs(self) -> (O, O) {
        (self.red, self.green)
    }

    /// Write `level` to RED then GREEN. GREEN is attempted even when RED
    /// fails; the first failure is returned.
    fn write_both(&mut self, level: bool) -> Result<(), OutputWriteError> {
        let state = PinState::from(level);
        let red = self
            .red
            .set_state(state)
            .map_err(|_| OutputWriteError { led: Led::Red });
        let green = self
            .green
            .set_state(state)
            .map_err(|_| OutputWriteError { led: Led::Green });
        red.and(green)
    }

    fn report_presses(&mut self) {
        let presses = self.state.presses();
        if presses != self.reported_presses {
            self.reported_presses = presses;
            log_info!(
                "button pressed {} times, mode {}",
                presses,
                self.state.mode().as_str()
            );
        }
    }
}
