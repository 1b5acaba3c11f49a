//! RP2040 GPIO capabilities on embassy-rp

use core::convert::Infallible;

use embassy_rp::Peri;
use embassy_rp::gpio::{AnyPin, Input, Level, Output, Pull};
use embassy_time::{Duration, Instant};
use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::digital::Wait;

use crate::platform::{Edge, PinId, Platform};

/// RP2040 bank 0 has GPIO0..=GPIO29.
const GPIO_COUNT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format, thiserror::Error)]
pub enum RpPlatformError {
    #[error("GPIO {0} was not handed to the platform or is already taken")]
    PinUnavailable(PinId),
}

/// GPIO table for the blink service.
///
/// Pins are handed over once with [`with_pin`](Self::with_pin) and taken out
/// by number. embassy-rp resets a pin when its driver is dropped, so a
/// released pin goes back to its reset state and cannot be configured again.
/// The button input uses a pull-down (pressed = high).
pub struct RpPlatform {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl RpPlatform {
    pub fn new() -> Self {
        Self {
            pins: [const { None }; GPIO_COUNT],
        }
    }

    /// Register `pin` under GPIO number `id`.
    pub fn with_pin(mut self, id: PinId, pin: Peri<'static, AnyPin>) -> Self {
        if let Some(slot) = self.pins.get_mut(id as usize) {
            *slot = Some(pin);
        }
        self
    }

    fn take(&mut self, id: PinId) -> Result<Peri<'static, AnyPin>, RpPlatformError> {
        self.pins
            .get_mut(id as usize)
            .and_then(Option::take)
            .ok_or(RpPlatformError::PinUnavailable(id))
    }
}

impl Default for RpPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for RpPlatform {
    type Error = RpPlatformError;
    type Output = Output<'static>;
    type Input = DebouncedInput;
    type Interrupt = PinId;

    fn configure_output(&mut self, pin: PinId, initial: bool) -> Result<Self::Output, Self::Error> {
        let peri = self.take(pin)?;
        Ok(Output::new(peri, Level::from(initial)))
    }

    fn configure_input(
        &mut self,
        pin: PinId,
        debounce: Duration,
    ) -> Result<Self::Input, Self::Error> {
        let peri = self.take(pin)?;
        Ok(DebouncedInput::new(
            pin,
            Input::new(peri, Pull::Down),
            debounce,
        ))
    }

    // The bank 0 IRQ is bound by embassy-rp itself. Registering only arms
    // the input; its edge waits stay pending until then.
    fn register_edge_interrupt(
        &mut self,
        input: &mut Self::Input,
        edge: Edge,
    ) -> Result<Self::Interrupt, Self::Error> {
        input.edge = Some(edge);
        Ok(input.pin)
    }

    fn unregister_edge_interrupt(
        &mut self,
        input: &mut Self::Input,
        _interrupt: Self::Interrupt,
    ) {
        input.edge = None;
    }

    fn release_output(&mut self, output: Self::Output) {
        drop(output);
    }

    fn release_input(&mut self, input: Self::Input) {
        drop(input);
    }
}

/// Button input that drops edges arriving within `debounce` of the last
/// accepted one. Edge waits only complete while an interrupt is registered.
pub struct DebouncedInput {
    pin: PinId,
    input: Input<'static>,
    debounce: Duration,
    edge: Option<Edge>,
    last_edge: Option<Instant>,
}

impl DebouncedInput {
    pub fn new(pin: PinId, input: Input<'static>, debounce: Duration) -> Self {
        Self {
            pin,
            input,
            debounce,
            edge: None,
            last_edge: None,
        }
    }

    async fn armed(&self) {
        if self.edge.is_none() {
            core::future::pending::<()>().await;
        }
    }

    fn accept(&mut self) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_edge {
            if now.duration_since(last) < self.debounce {
                return false;
            }
        }
        self.last_edge = Some(now);
        true
    }
}

impl ErrorType for DebouncedInput {
    type Error = Infallible;
}

impl InputPin for DebouncedInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.input.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.input.is_low())
    }
}

impl Wait for DebouncedInput {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.input.wait_for_high().await;
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        self.input.wait_for_low().await;
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.armed().await;
        loop {
            self.input.wait_for_rising_edge().await;
            if self.accept() {
                return Ok(());
            }
        }
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.armed().await;
        loop {
            self.input.wait_for_falling_edge().await;
            if self.accept() {
                return Ok(());
            }
        }
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        self.armed().await;
        loop {
            self.input.wait_for_any_edge().await;
            if self.accept() {
                return Ok(());
            }
        }
    }
}
