#![no_main]
#![no_std]

mod keymap;
#[macro_use]
mod macros;

use core::cell::RefCell;
use core::sync::atomic::Ordering;

use defmt::info;
use embassy_executor::Spawner;
use embassy_futures::join::join4;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::gpio::{Input, Output};
use latchkey::CONNECTION_STATE;
use latchkey::channel::KEYBOARD_REPORT_CHANNEL;
use latchkey::config::StorageConfig;
use latchkey::hid::{HidError, HidReporter, Report};
use latchkey::input_device::Runnable;
use latchkey::keyboard::Keyboard;
use latchkey::keymap::KeyMap;
use latchkey::matrix::Matrix;
use latchkey::storage::Storage;
use {defmt_rtt as _, panic_probe as _};

const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Logs every report which would go to the host. Stands in until a USB or
/// BLE transport is wired up as the reporter.
struct RttReporter;

impl HidReporter for RttReporter {
    type ReportType = Report;

    async fn get_report(&mut self) -> Report {
        KEYBOARD_REPORT_CHANNEL.receive().await
    }

    async fn write_report(&mut self, report: Report) -> Result<usize, HidError> {
        match report {
            Report::KeyboardReport(r) => info!("Keyboard report: {:?}", r),
            Report::MouseReport(r) => info!("Mouse report: {:?}", r),
            Report::MediaKeyboardReport(r) => info!("Media report: {:?}", r),
            Report::SystemControlReport(r) => info!("System control report: {:?}", r),
        }
        Ok(0)
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Latchkey start!");
    // Initialize peripherals
    let p = embassy_rp::init(Default::default());

    // Pin config, both halves are wired into one 4x12 matrix
    let (input_pins, output_pins) = config_matrix_pins_rp!(
        peripherals: p,
        input: [PIN_2, PIN_3, PIN_4, PIN_5],
        output: [PIN_6, PIN_7, PIN_8, PIN_9, PIN_10, PIN_11, PIN_12, PIN_13, PIN_14, PIN_15, PIN_16, PIN_17]
    );

    // Use internal flash to emulate eeprom
    let flash = Flash::<_, Async, FLASH_SIZE>::new(p.FLASH, p.DMA_CH0);

    // Initialize the storage and keymap
    let mut storage = Storage::new(flash, &StorageConfig::default()).await;
    let mut default_keymap = keymap::get_default_keymap();
    let keymap = RefCell::new(
        KeyMap::new_from_storage(&mut default_keymap, Some(&mut storage), keymap::get_behavior_config()).await,
    );

    // Initialize the matrix scanner and the keyboard
    let mut matrix = Matrix::<_, _, 4, 12>::new(input_pins, output_pins);
    let mut keyboard = Keyboard::new(&keymap);
    let mut reporter = RttReporter;

    // The logging reporter needs no host handshake
    CONNECTION_STATE.store(true, Ordering::Release);

    // Start
    join4(matrix.run(), keyboard.run(), reporter.run_reporter(), storage.run()).await;
}
