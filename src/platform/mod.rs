//! Hardware capabilities consumed by the blink service.
//!
//! Output levels go through `embedded_hal::digital::OutputPin`, the button is
//! read through `embedded_hal::digital::InputPin` and its interrupt line is
//! awaited through `embedded_hal_async::digital::Wait`. Pin acquisition and
//! interrupt registration are gathered in [`Platform`] so a board (or a test
//! double) can hand them out by number.

#[cfg(test)]
pub(crate) mod mock;

use embassy_time::Duration;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::digital::Wait;

/// Board-specific GPIO number.
pub type PinId = u8;

/// Input transition that fires the edge interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

/// Pin acquisition and interrupt binding for one board.
///
/// # Example
///
/// ```ignore
/// impl Platform for MyBoard {
///     type Error = MyBoardError;
///     type Output = MyOutput;
///     type Input = MyInput;
///     type Interrupt = ();
///
///     fn configure_output(&mut self, pin: PinId, initial: bool) -> Result<MyOutput, MyBoardError> {
///         // take the pin, set it as push-pull output at `initial`
///     }
///
///     // ...
/// }
/// ```
pub trait Platform {
    /// Acquisition or binding failure.
    type Error: core::fmt::Debug;

    /// LED output line
    type Output: OutputPin;

    /// Button input line with interrupt-driven edge waits
    type Input: InputPin + Wait;

    /// Token for a registered edge interrupt
    type Interrupt;

    /// Take `pin` as a push-pull output driven at `initial`.
    fn configure_output(&mut self, pin: PinId, initial: bool) -> Result<Self::Output, Self::Error>;

    /// Take `pin` as an input, debounced over `debounce`.
    fn configure_input(&mut self, pin: PinId, debounce: Duration)
    -> Result<Self::Input, Self::Error>;

    /// Bind the edge interrupt of `input`. Edges are only delivered through
    /// [`Wait`] while the returned token is registered.
    fn register_edge_interrupt(
        &mut self,
        input: &mut Self::Input,
        edge: Edge,
    ) -> Result<Self::Interrupt, Self::Error>;

    /// Unbind the interrupt taken from `input`. Edge waits on `input` stay
    /// pending afterwards.
    fn unregister_edge_interrupt(
        &mut self,
        input: &mut Self::Input,
        interrupt: Self::Interrupt,
    );

    fn release_output(&mut self, output: Self::Output);

    fn release_input(&mut self, input: Self::Input);
}

/// Wait for the next `edge` on `input`.
pub async fn wait_for_edge<I: Wait>(input: &mut I, edge: Edge) -> Result<(), I::Error> {
    match edge {
        Edge::Rising => input.wait_for_rising_edge().await,
        Edge::Falling => input.wait_for_falling_edge().await,
        Edge::Both => input.wait_for_any_edge().await,
    }
}
