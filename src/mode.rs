//! Button-driven mode switching.

use embedded_hal_async::digital::Wait;
use embassy_time::{Duration, Timer};

use crate::platform::{Edge, wait_for_edge};
use crate::state::{BlinkState, Mode};

/// Pause after a failed edge wait before waiting again.
const EDGE_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Turns qualifying edge events into mode changes.
///
/// [`on_edge_event`](Self::on_edge_event) touches nothing but atomics, so it
/// is safe to call straight from an interrupt handler.
#[derive(Clone, Copy)]
pub struct ModeController<'a> {
    state: &'a BlinkState,
}

impl<'a> ModeController<'a> {
    pub fn new(state: &'a BlinkState) -> Self {
        Self { state }
    }

    /// Handle one press: `Flash` becomes `On`, anything else becomes `Flash`,
    /// then the press counter is bumped. Never blocks and never fails.
    ///
    /// Logging of the new count is left to the scheduler.
    pub fn on_edge_event(&self) -> Mode {
        self.state.record_press()
    }

    /// Set the mode directly, bypassing the toggle. This is the only path
    /// that reaches [`Mode::Off`]. The press counter is untouched.
    pub fn force_mode(&self, mode: Mode) {
        self.state.set_mode(mode);
    }

    pub fn mode(&self) -> Mode {
        self.state.mode()
    }

    pub fn presses(&self) -> u32 {
        self.state.presses()
    }

    /// Deliver every `edge` on `button` to [`on_edge_event`](Self::on_edge_event).
    ///
    /// Runs until dropped. A failed wait is retried after a short pause.
    pub async fn watch<I: Wait>(&self, button: &mut I, edge: Edge) {
        loop {
            match wait_for_edge(button, edge).await {
                Ok(()) => {
                    self.on_edge_event();
                }
                Err(_) => {
                    log_warn!("button edge wait failed, retrying");
                    Timer::after(EDGE_RETRY_DELAY).await;
                }
            }
        }
    }
}
