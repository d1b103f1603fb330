use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// A single key transition reported by the matrix scanner, identified by
/// its physical position.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
}
