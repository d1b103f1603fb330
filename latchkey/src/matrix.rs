use core::sync::atomic::Ordering;

use embassy_time::Timer;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::CONNECTION_STATE;
use crate::channel::KEY_EVENT_CHANNEL;
use crate::event::KeyEvent;
use crate::input_device::Runnable;

/// KeyState represents the state of a key.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyState {
    // True if the key is pressed
    pub pressed: bool,
}

impl Default for KeyState {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyState {
    pub fn new() -> Self {
        KeyState { pressed: false }
    }

    pub fn toggle_pressed(&mut self) {
        self.pressed = !self.pressed;
    }
}

/// Matrix is the physical pcb layout of the keyboard matrix.
///
/// The matrix scans all keys continuously, every key change is sent to
/// the key event channel right away. There is no debouncing, switches
/// with noisy contacts should be handled before the input pin level.
pub struct Matrix<In: InputPin, Out: OutputPin, const INPUT_PIN_NUM: usize, const OUTPUT_PIN_NUM: usize> {
    /// Input pins of the pcb matrix
    input_pins: [In; INPUT_PIN_NUM],
    /// Output pins of the pcb matrix
    output_pins: [Out; OUTPUT_PIN_NUM],
    /// Key state matrix
    key_states: [[KeyState; INPUT_PIN_NUM]; OUTPUT_PIN_NUM],
}

impl<In: InputPin, Out: OutputPin, const INPUT_PIN_NUM: usize, const OUTPUT_PIN_NUM: usize>
    Matrix<In, Out, INPUT_PIN_NUM, OUTPUT_PIN_NUM>
{
    /// Create a matrix from input and output pins.
    pub fn new(input_pins: [In; INPUT_PIN_NUM], output_pins: [Out; OUTPUT_PIN_NUM]) -> Self {
        Matrix {
            input_pins,
            output_pins,
            key_states: [[KeyState::new(); INPUT_PIN_NUM]; OUTPUT_PIN_NUM],
        }
    }

    // Wait for the host connection, scanning is pointless before it
    async fn wait_for_connected(&self) {
        while !CONNECTION_STATE.load(Ordering::Acquire) {
            Timer::after_millis(100).await;
        }
        info!("Connected, start scanning matrix");
    }
}

impl<In: InputPin, Out: OutputPin, const INPUT_PIN_NUM: usize, const OUTPUT_PIN_NUM: usize> Runnable
    for Matrix<In, Out, INPUT_PIN_NUM, OUTPUT_PIN_NUM>
{
    async fn run(&mut self) {
        self.wait_for_connected().await;
        loop {
            for out_idx in 0..OUTPUT_PIN_NUM {
                // Pull up output pin, wait 1us ensuring the change comes into effect
                if let Some(out_pin) = self.output_pins.get_mut(out_idx) {
                    out_pin.set_high().ok();
                }
                Timer::after_micros(1).await;
                for (in_idx, in_pin) in self.input_pins.iter_mut().enumerate() {
                    let pressed = in_pin.is_high().ok().unwrap_or_default();
                    if pressed != self.key_states[out_idx][in_idx].pressed {
                        self.key_states[out_idx][in_idx].toggle_pressed();

                        #[cfg(feature = "col2row")]
                        let (row, col) = (in_idx, out_idx);
                        #[cfg(not(feature = "col2row"))]
                        let (row, col) = (out_idx, in_idx);

                        KEY_EVENT_CHANNEL
                            .send(KeyEvent {
                                row: row as u8,
                                col: col as u8,
                                pressed,
                            })
                            .await;
                    }
                }

                // Pull it back to low
                if let Some(out_pin) = self.output_pins.get_mut(out_idx) {
                    out_pin.set_low().ok();
                }
            }
        }
    }
}
