//! Shared state between the edge handler and the blink scheduler.
//!
//! Every field is either an atomic or an ISR-safe signal, so the edge handler
//! never waits on the scheduler and the scheduler never holds anything across
//! its sleep.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_futures::select::select;
use embassy_time::{Duration, Timer, with_timeout};
use portable_atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::error::ShutdownError;

/// Upper bound on how long a `stop` caller can miss a completion it did not
/// receive the wake-up for.
const FINISH_POLL: Duration = Duration::from_millis(5);

/// Operating mode driving both LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Mode {
    /// Both LEDs held low
    Off = 0,
    /// Both LEDs held high
    On = 1,
    /// Both LEDs inverted on every tick
    #[default]
    Flash = 2,
}

impl Mode {
    /// Decode a raw mode value. Anything unknown is treated as `Off`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Mode::On,
            2 => Mode::Flash,
            _ => Mode::Off,
        }
    }

    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// Mode selected by one button press.
    ///
    /// `Flash` goes to `On`, everything else goes back to `Flash`. `Off` is
    /// never produced here.
    pub const fn toggled(self) -> Self {
        match self {
            Mode::Flash => Mode::On,
            _ => Mode::Flash,
        }
    }

    /// LED level for the next tick given the level written by the last one.
    pub const fn next_level(self, previous: bool) -> bool {
        match self {
            Mode::Flash => !previous,
            Mode::On => true,
            Mode::Off => false,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Mode::Off => "OFF",
            Mode::On => "ON",
            Mode::Flash => "FLASH",
        }
    }
}

/// Read-only snapshot for the reporting layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    pub mode: Mode,
    pub presses: u32,
    pub led_on: bool,
    pub write_failures: u32,
    pub running: bool,
}

/// State shared by [`ModeController`](crate::ModeController),
/// [`BlinkScheduler`](crate::BlinkScheduler) and the lifecycle owner.
///
/// `const`-constructible so firmware can keep it in a plain `static`.
pub struct BlinkState {
    mode: AtomicU8,
    presses: AtomicU32,
    led_on: AtomicBool,
    write_failures: AtomicU32,
    running: AtomicBool,
    stop: Signal<CriticalSectionRawMutex, ()>,
    // Sticky completion: set once by `finish`, cleared only by `reset`.
    finished: AtomicBool,
    final_presses: AtomicU32,
    finished_wake: Signal<CriticalSectionRawMutex, ()>,
}

impl BlinkState {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(Mode::Flash.as_raw()),
            presses: AtomicU32::new(0),
            led_on: AtomicBool::new(false),
            write_failures: AtomicU32::new(0),
            running: AtomicBool::new(false),
            stop: Signal::new(),
            finished: AtomicBool::new(false),
            final_presses: AtomicU32::new(0),
            finished_wake: Signal::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_raw(self.mode.load(Ordering::Acquire))
    }

    pub fn presses(&self) -> u32 {
        self.presses.load(Ordering::Acquire)
    }

    /// Level last written to both LEDs.
    pub fn led_on(&self) -> bool {
        self.led_on.load(Ordering::Acquire)
    }

    pub fn write_failures(&self) -> u32 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn status(&self) -> Status {
        Status {
            mode: self.mode(),
            presses: self.presses(),
            led_on: self.led_on(),
            write_failures: self.write_failures(),
            running: self.is_running(),
        }
    }

    /// Ask the running service to shut down. Never blocks. Does nothing once
    /// the service has already finished.
    pub fn request_stop(&self) {
        if !self.is_finished() {
            self.stop.signal(());
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.signaled()
    }

    /// Request a stop and wait for the service to finish its shutdown.
    ///
    /// Returns the final press count. Any number of callers may wait at the
    /// same time, and once the service has finished every later call returns
    /// the same count at once. If the service does not report back within
    /// `timeout` the stop request stays pending and [`ShutdownError::Timeout`]
    /// is returned; calling `stop` again keeps waiting.
    pub async fn stop(&self, timeout: Duration) -> Result<u32, ShutdownError> {
        if let Some(presses) = self.final_presses() {
            return Ok(presses);
        }
        self.request_stop();
        match with_timeout(timeout, self.wait_finished()).await {
            Ok(presses) => Ok(presses),
            Err(_) => {
                log_warn!(
                    "blink service did not stop within {} ms",
                    timeout.as_millis()
                );
                Err(ShutdownError::Timeout {
                    waited_ms: timeout.as_millis(),
                })
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn final_presses(&self) -> Option<u32> {
        self.is_finished()
            .then(|| self.final_presses.load(Ordering::Acquire))
    }

    // The wake signal has a single slot, so a caller that loses it to another
    // waiter falls back to re-reading the flag.
    async fn wait_finished(&self) -> u32 {
        loop {
            if let Some(presses) = self.final_presses() {
                self.finished_wake.signal(());
                return presses;
            }
            select(self.finished_wake.wait(), Timer::after(FINISH_POLL)).await;
        }
    }

    /// Put everything back to power-on values before a new run.
    pub(crate) fn reset(&self) {
        self.mode.store(Mode::Flash.as_raw(), Ordering::Release);
        self.presses.store(0, Ordering::Release);
        self.led_on.store(false, Ordering::Release);
        self.write_failures.store(0, Ordering::Relaxed);
        self.stop.reset();
        self.finished.store(false, Ordering::Release);
        self.final_presses.store(0, Ordering::Release);
        self.finished_wake.reset();
    }

    /// Toggle the mode and count the press. Lock-free, one CAS per call
    /// unless `force_mode` races it.
    pub(crate) fn record_press(&self) -> Mode {
        let previous = self
            .mode
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(Mode::from_raw(raw).toggled().as_raw())
            })
            .unwrap_or_else(|raw| raw);
        self.presses.fetch_add(1, Ordering::Release);
        Mode::from_raw(previous).toggled()
    }

    pub(crate) fn set_mode(&self, mode: Mode) {
        self.mode.store(mode.as_raw(), Ordering::Release);
    }

    pub(crate) fn set_led_on(&self, on: bool) {
        self.led_on.store(on, Ordering::Release);
    }

    pub(crate) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub(crate) async fn wait_stop(&self) {
        self.stop.wait().await
    }

    /// Publish the final count and drop any stop request still pending.
    pub(crate) fn finish(&self, presses: u32) {
        self.final_presses.store(presses, Ordering::Release);
        self.finished.store(true, Ordering::Release);
        self.stop.reset();
        self.finished_wake.signal(());
    }
}

impl Default for BlinkState {
    fn default() -> Self {
        Self::new()
    }
}
