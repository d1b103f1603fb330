//! Traits and types for HID message reporting.

use serde::Serialize;
use usbd_hid::descriptor::{AsInputReport, MediaKeyboardReport, MouseReport, SystemControlReport};

use crate::CONNECTION_STATE;
use crate::descriptor::KeyboardReport;

#[derive(Serialize)]
pub enum Report {
    /// Normal keyboard hid report
    KeyboardReport(KeyboardReport),
    /// Mouse hid report
    MouseReport(MouseReport),
    /// Media keyboard report
    MediaKeyboardReport(MediaKeyboardReport),
    /// System control report
    SystemControlReport(SystemControlReport),
}

impl AsInputReport for Report {}

/// Errors that occur when reporting HID messages to the host
#[derive(PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidError {
    UsbDisabled,
    UsbPartialRead,
    BufferOverflow,
    ReportSerializeError,
}

/// HidReporter trait is used for reporting HID messages to the host, via USB, BLE, etc.
pub trait HidReporter {
    /// The report type that the reporter receives from input processors.
    type ReportType: AsInputReport;

    /// Get the report to be sent to the host
    async fn get_report(&mut self) -> Self::ReportType;

    /// Run the reporter task.
    async fn run_reporter(&mut self) {
        loop {
            let report = self.get_report().await;
            // Only send the report after the connection is established.
            if CONNECTION_STATE.load(core::sync::atomic::Ordering::Acquire) {
                if let Err(e) = self.write_report(report).await {
                    error!("Failed to send report: {:?}", e);
                }
            }
        }
    }

    /// Write report to the host, return the number of bytes written if success.
    async fn write_report(&mut self, report: Self::ReportType) -> Result<usize, HidError>;
}
