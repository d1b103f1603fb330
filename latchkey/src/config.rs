use embassy_time::Duration;

/// Config for configurable action behavior
#[derive(Clone, Copy, Debug, Default)]
pub struct BehaviorConfig {
    pub tri_layer: Option<[u8; 3]>,
    pub tap_hold: TapHoldConfig,
    pub mouse_key: MouseKeyConfig,
}

/// Configurations for tap hold behavior
#[derive(Clone, Copy, Debug)]
pub struct TapHoldConfig {
    /// Wait time after a release before the hold decision is settled
    pub post_wait_time: Duration,
    /// A held key is resolved as hold after this timeout
    pub hold_timeout: Duration,
}

impl Default for TapHoldConfig {
    fn default() -> Self {
        Self {
            post_wait_time: Duration::from_millis(50),
            hold_timeout: Duration::from_millis(250),
        }
    }
}

/// Configurations for mouse key behavior
#[derive(Clone, Copy, Debug)]
pub struct MouseKeyConfig {
    /// Time interval of reporting mouse cursor and wheel states while a mouse key is held
    pub interval: Duration,
    /// Cursor distance per report
    pub move_delta: i8,
    /// Wheel ticks per report
    pub wheel_delta: i8,
}

impl Default for MouseKeyConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(20),
            move_delta: 8,
            wheel_delta: 1,
        }
    }
}

/// Config for storage
#[cfg(feature = "storage")]
#[derive(Clone, Copy, Debug)]
pub struct StorageConfig {
    /// Start address of local storage, MUST BE start of a sector.
    /// If start_addr is set to 0(this is the default value), the last `num_sectors` sectors will be used.
    pub start_addr: usize,
    // Number of sectors used for storage, >= 2.
    pub num_sectors: u8,
    pub clear_storage: bool,
}

#[cfg(feature = "storage")]
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            start_addr: 0,
            num_sectors: 2,
            clear_storage: false,
        }
    }
}
