//! Mock platform for host tests
//!
//! Lines are created up front by the test and shared with the pins handed
//! out by the platform, so the test can keep inspecting them after the pins
//! have moved into the service.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Duration;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};
use embedded_hal_async::digital::Wait;

use super::{Edge, PinId, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MockPlatformError {
    PinUnavailable(PinId),
    InterruptUnavailable(PinId),
}

/// Observable side of a mock output pin.
#[derive(Default)]
pub(crate) struct OutputLine {
    level: Cell<bool>,
    writes: RefCell<Vec<bool>>,
    failing_writes: Cell<u32>,
    acquired: Cell<bool>,
    released: Cell<bool>,
}

impl OutputLine {
    pub(crate) fn level(&self) -> bool {
        self.level.get()
    }

    /// Every successful write, oldest first. The configure-time level is not
    /// included.
    pub(crate) fn writes(&self) -> Vec<bool> {
        self.writes.borrow().clone()
    }

    pub(crate) fn fail_next_writes(&self, count: u32) {
        self.failing_writes.set(count);
    }

    pub(crate) fn is_acquired(&self) -> bool {
        self.acquired.get()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.get()
    }
}

pub(crate) struct MockOutput {
    line: Rc<OutputLine>,
}

impl MockOutput {
    fn write(&mut self, level: bool) -> Result<(), MockPinError> {
        let failing = self.line.failing_writes.get();
        if failing > 0 {
            self.line.failing_writes.set(failing - 1);
            return Err(MockPinError);
        }
        self.line.level.set(level);
        self.line.writes.borrow_mut().push(level);
        Ok(())
    }
}

impl ErrorType for MockOutput {
    type Error = MockPinError;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// Observable side of the mock button.
pub(crate) struct InputLine {
    level: Cell<bool>,
    edges: Channel<NoopRawMutex, (), 8>,
    armed: Cell<Option<Edge>>,
    debounce: Cell<Option<Duration>>,
    acquired: Cell<bool>,
    released: Cell<bool>,
}

impl Default for InputLine {
    fn default() -> Self {
        Self {
            level: Cell::new(false),
            edges: Channel::new(),
            armed: Cell::new(None),
            debounce: Cell::new(None),
            acquired: Cell::new(false),
            released: Cell::new(false),
        }
    }
}

impl InputLine {
    /// Drive the line high. Delivers one edge if the interrupt is registered.
    pub(crate) fn press(&self) {
        self.level.set(true);
        if self.armed.get().is_some() {
            let _ = self.edges.try_send(());
        }
    }

    pub(crate) fn release(&self) {
        self.level.set(false);
    }

    pub(crate) fn armed_edge(&self) -> Option<Edge> {
        self.armed.get()
    }

    pub(crate) fn debounce(&self) -> Option<Duration> {
        self.debounce.get()
    }

    pub(crate) fn is_acquired(&self) -> bool {
        self.acquired.get()
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.get()
    }
}

pub(crate) struct MockInput {
    pin: PinId,
    line: Rc<InputLine>,
}

impl ErrorType for MockInput {
    type Error = MockPinError;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.line.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.line.level.get())
    }
}

impl Wait for MockInput {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        if !self.line.level.get() {
            self.line.edges.receive().await;
        }
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        if self.line.level.get() {
            core::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.line.edges.receive().await;
        Ok(())
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.line.edges.receive().await;
        Ok(())
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        self.line.edges.receive().await;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockPlatform {
    outputs: Vec<(PinId, Rc<OutputLine>)>,
    inputs: Vec<(PinId, Rc<InputLine>)>,
    unavailable: Vec<PinId>,
    interrupts_unavailable: bool,
}

impl MockPlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Line behind output `pin`, created on first use.
    pub(crate) fn output_line(&mut self, pin: PinId) -> Rc<OutputLine> {
        if let Some((_, line)) = self.outputs.iter().find(|(id, _)| *id == pin) {
            return line.clone();
        }
        let line = Rc::new(OutputLine::default());
        self.outputs.push((pin, line.clone()));
        line
    }

    /// Line behind input `pin`, created on first use.
    pub(crate) fn input_line(&mut self, pin: PinId) -> Rc<InputLine> {
        if let Some((_, line)) = self.inputs.iter().find(|(id, _)| *id == pin) {
            return line.clone();
        }
        let line = Rc::new(InputLine::default());
        self.inputs.push((pin, line.clone()));
        line
    }

    pub(crate) fn make_unavailable(&mut self, pin: PinId) {
        self.unavailable.push(pin);
    }

    pub(crate) fn disable_interrupts(&mut self) {
        self.interrupts_unavailable = true;
    }
}

impl Platform for MockPlatform {
    type Error = MockPlatformError;
    type Output = MockOutput;
    type Input = MockInput;
    type Interrupt = PinId;

    fn configure_output(&mut self, pin: PinId, initial: bool) -> Result<MockOutput, Self::Error> {
        if self.unavailable.contains(&pin) {
            return Err(MockPlatformError::PinUnavailable(pin));
        }
        let line = self.output_line(pin);
        line.level.set(initial);
        line.acquired.set(true);
        line.released.set(false);
        Ok(MockOutput { line })
    }

    fn configure_input(&mut self, pin: PinId, debounce: Duration) -> Result<MockInput, Self::Error> {
        if self.unavailable.contains(&pin) {
            return Err(MockPlatformError::PinUnavailable(pin));
        }
        let line = self.input_line(pin);
        line.debounce.set(Some(debounce));
        line.acquired.set(true);
        line.released.set(false);
        Ok(MockInput { pin, line })
    }

    fn register_edge_interrupt(
        &mut self,
        input: &mut MockInput,
        edge: Edge,
    ) -> Result<PinId, Self::Error> {
        if self.interrupts_unavailable {
            return Err(MockPlatformError::InterruptUnavailable(input.pin));
        }
        input.line.armed.set(Some(edge));
        Ok(input.pin)
    }

    fn unregister_edge_interrupt(&mut self, input: &mut MockInput, interrupt: PinId) {
        debug_assert_eq!(input.pin, interrupt);
        input.line.armed.set(None);
    }

    fn release_output(&mut self, output: MockOutput) {
        output.line.acquired.set(false);
        output.line.released.set(true);
    }

    fn release_input(&mut self, input: MockInput) {
        input.line.acquired.set(false);
        input.line.released.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_output_records_writes() {
        let mut platform = MockPlatform::new();
        let line = platform.output_line(3);
        let mut pin = platform.configure_output(3, true).unwrap();
        assert!(line.level());
        assert!(line.writes().is_empty());

        pin.set_low().unwrap();
        pin.set_high().unwrap();
        assert_eq!(line.writes(), vec![false, true]);
    }

    #[test]
    fn test_mock_output_injected_failure() {
        let mut platform = MockPlatform::new();
        let line = platform.output_line(3);
        let mut pin = platform.configure_output(3, false).unwrap();

        line.fail_next_writes(1);
        assert!(pin.set_high().is_err());
        assert!(!line.level());
        assert!(pin.set_high().is_ok());
        assert!(line.level());
    }

    #[test]
    fn test_unavailable_pin_is_refused() {
        let mut platform = MockPlatform::new();
        platform.make_unavailable(5);
        assert_eq!(
            platform.configure_output(5, false).err(),
            Some(MockPlatformError::PinUnavailable(5))
        );

        platform.disable_interrupts();
        let mut input = platform.configure_input(9, Duration::from_millis(1)).unwrap();
        assert_eq!(
            platform.register_edge_interrupt(&mut input, Edge::Rising).err(),
            Some(MockPlatformError::InterruptUnavailable(9))
        );
    }

    #[test]
    fn test_mock_input_delivers_edges_only_when_armed() {
        let mut platform = MockPlatform::new();
        let line = platform.input_line(9);
        let mut input = platform.configure_input(9, Duration::from_millis(200)).unwrap();

        line.press();
        assert!(input.is_high().unwrap());
        assert!(line.edges.try_receive().is_err());
        line.release();

        let interrupt = platform.register_edge_interrupt(&mut input, Edge::Rising).unwrap();
        line.press();
        embassy_futures::block_on(input.wait_for_rising_edge()).unwrap();
        line.release();

        platform.unregister_edge_interrupt(&mut input, interrupt);
        assert_eq!(line.armed_edge(), None);
        line.press();
        assert!(line.edges.try_receive().is_err());
    }
}
