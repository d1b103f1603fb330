use core::ops::Range;

use byteorder::{BigEndian, ByteOrder};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_sync::signal::Signal;
use embedded_storage::nor_flash::NorFlash;
use embedded_storage_async::nor_flash::NorFlash as AsyncNorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item, SerializationError, Value};
use sequential_storage::Error as SSError;

use crate::channel::FLASH_CHANNEL;
use crate::config::StorageConfig;
use crate::BUILD_HASH;

/// Signal to synchronize the flash operation status, usually used outside of the flash task.
/// True if the flash operation is finished correctly, false if the flash operation is finished with error.
pub static FLASH_OPERATION_FINISHED: Signal<crate::RawMutex, bool> = Signal::new();

// Message sent to the flash task, which will do saving or clearing operation
#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashOperationMessage {
    // Clear the storage
    Reset,
    // Layout option
    LayoutOptions(u32),
    // Default layer number
    DefaultLayer(u8),
}

/// StorageKeys is the prefix digit stored in the flash, it's used to identify the type of the stored data.
///
/// This is because the whole storage item is an Rust enum due to the limitation of `sequential_storage`.
/// When deserializing, we need to know the type of the stored data to know how to parse it, the first byte of the stored data is always the type, aka StorageKeys.
#[repr(u32)]
pub(crate) enum StorageKeys {
    StorageConfig,
    LayoutConfig,
}

impl StorageKeys {
    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKeys::StorageConfig),
            1 => Some(StorageKeys::LayoutConfig),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum StorageData {
    StorageConfig(LocalStorageConfig),
    LayoutConfig(LayoutConfig),
}

impl Value<'_> for StorageData {
    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, SerializationError> {
        if buffer.len() < 6 {
            return Err(SerializationError::BufferTooSmall);
        }
        match self {
            StorageData::StorageConfig(c) => {
                buffer[0] = StorageKeys::StorageConfig as u8;
                // If enabled, write 0 to flash.
                if c.enable {
                    buffer[1] = 0;
                } else {
                    buffer[1] = 1;
                }
                BigEndian::write_u32(&mut buffer[2..6], c.build_hash);
                Ok(6)
            }
            StorageData::LayoutConfig(c) => {
                buffer[0] = StorageKeys::LayoutConfig as u8;
                buffer[1] = c.default_layer;
                BigEndian::write_u32(&mut buffer[2..6], c.layout_option);
                Ok(6)
            }
        }
    }

    fn deserialize_from(buffer: &[u8]) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        if buffer.is_empty() {
            return Err(SerializationError::InvalidFormat);
        }
        if let Some(key_type) = StorageKeys::from_u8(buffer[0]) {
            match key_type {
                StorageKeys::StorageConfig => {
                    if buffer.len() < 6 {
                        return Err(SerializationError::BufferTooSmall);
                    }

                    // 1 is the initial state of flash, so it means storage is NOT initialized
                    if buffer[1] == 1 {
                        Ok(StorageData::StorageConfig(LocalStorageConfig {
                            enable: false,
                            build_hash: BUILD_HASH,
                        }))
                    } else {
                        let build_hash = BigEndian::read_u32(&buffer[2..6]);
                        Ok(StorageData::StorageConfig(LocalStorageConfig {
                            enable: true,
                            build_hash,
                        }))
                    }
                }
                StorageKeys::LayoutConfig => {
                    let default_layer = buffer[1];
                    let layout_option = BigEndian::read_u32(&buffer[2..6]);
                    Ok(StorageData::LayoutConfig(LayoutConfig {
                        default_layer,
                        layout_option,
                    }))
                }
            }
        } else {
            Err(SerializationError::Custom(1))
        }
    }
}

impl StorageData {
    fn key(&self) -> u32 {
        match self {
            StorageData::StorageConfig(_) => StorageKeys::StorageConfig as u32,
            StorageData::LayoutConfig(_) => StorageKeys::LayoutConfig as u32,
        }
    }
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct LocalStorageConfig {
    enable: bool,
    build_hash: u32,
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct LayoutConfig {
    pub(crate) default_layer: u8,
    pub(crate) layout_option: u32,
}

pub fn async_flash_wrapper<F: NorFlash>(flash: F) -> BlockingAsync<F> {
    embassy_embedded_hal::adapter::BlockingAsync::new(flash)
}

pub struct Storage<F: AsyncNorFlash, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    pub(crate) flash: F,
    pub(crate) storage_range: Range<u32>,
    pub(crate) buffer: [u8; get_buffer_size()],
}

/// Read out storage config, update and then save back.
/// This macro applies to only some of the configs.
macro_rules! update_storage_field {
    ($f: expr, $buf: expr, $cache:expr, $key:ident, $field:ident, $range:expr) => {
        if let Ok(Some(StorageData::$key(mut saved))) =
            fetch_item::<u32, StorageData, _>($f, $range, $cache, $buf, &(StorageKeys::$key as u32)).await
        {
            saved.$field = $field;
            store_item::<u32, StorageData, _>(
                $f,
                $range,
                $cache,
                $buf,
                &(StorageKeys::$key as u32),
                &StorageData::$key(saved),
            )
            .await
        } else {
            Ok(())
        }
    };
}

impl<F: AsyncNorFlash, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Storage<F, ROW, COL, NUM_LAYER> {
    pub async fn new(flash: F, config: &StorageConfig) -> Self {
        // Check storage setting
        assert!(
            config.num_sectors >= 2,
            "Number of used sector for storage must larger than 1"
        );

        let start_addr = config.start_addr;

        info!(
            "Flash capacity {} KB, using {} KB({} sectors) starting from 0x{:X} as storage",
            flash.capacity() / 1024,
            (F::ERASE_SIZE * config.num_sectors as usize) / 1024,
            config.num_sectors,
            config.start_addr,
        );

        // If config.start_addr == 0, use last `num_sectors` sectors, otherwise use storage config setting
        let storage_range = if start_addr == 0 {
            (flash.capacity() - config.num_sectors as usize * F::ERASE_SIZE) as u32..flash.capacity() as u32
        } else {
            assert!(
                start_addr % F::ERASE_SIZE == 0,
                "Storage's start addr MUST BE a multiplier of sector size"
            );
            start_addr as u32..(start_addr + config.num_sectors as usize * F::ERASE_SIZE) as u32
        };

        let mut storage = Self {
            flash,
            storage_range,
            buffer: [0; get_buffer_size()],
        };

        // Check whether the storage has been initialized by this firmware
        if !storage.check_enable().await || config.clear_storage {
            // Clear storage first
            debug!("Clearing storage!");
            let _ = sequential_storage::erase_all(&mut storage.flash, storage.storage_range.clone()).await;

            // Initialize storage from config
            if storage.initialize_storage_with_config().await.is_err() {
                // When there's an error, `enable: false` should be saved back to storage, preventing partial initialization of storage
                store_item(
                    &mut storage.flash,
                    storage.storage_range.clone(),
                    &mut NoCache::new(),
                    &mut storage.buffer,
                    &(StorageKeys::StorageConfig as u32),
                    &StorageData::StorageConfig(LocalStorageConfig {
                        enable: false,
                        build_hash: BUILD_HASH,
                    }),
                )
                .await
                .ok();
            }
        }

        storage
    }

    pub async fn run(&mut self) {
        let mut storage_cache = NoCache::new();
        loop {
            let info: FlashOperationMessage = FLASH_CHANNEL.receive().await;
            debug!("Flash operation: {:?}", info);
            if let Err(e) = match info {
                FlashOperationMessage::LayoutOptions(layout_option) => {
                    // Read out layout options, update layout option and save back
                    update_storage_field!(
                        &mut self.flash,
                        &mut self.buffer,
                        &mut storage_cache,
                        LayoutConfig,
                        layout_option,
                        self.storage_range.clone()
                    )
                }
                FlashOperationMessage::Reset => {
                    sequential_storage::erase_all(&mut self.flash, self.storage_range.clone()).await
                }
                FlashOperationMessage::DefaultLayer(default_layer) => {
                    // Read out layout options, update default layer and save back
                    update_storage_field!(
                        &mut self.flash,
                        &mut self.buffer,
                        &mut storage_cache,
                        LayoutConfig,
                        default_layer,
                        self.storage_range.clone()
                    )
                }
            } {
                print_storage_error::<F>(e);
                FLASH_OPERATION_FINISHED.signal(false);
            } else {
                FLASH_OPERATION_FINISHED.signal(true);
            }
        }
    }

    async fn initialize_storage_with_config(&mut self) -> Result<(), ()> {
        let mut cache = NoCache::new();

        // Save storage config
        let storage_config = StorageData::StorageConfig(LocalStorageConfig {
            enable: true,
            build_hash: BUILD_HASH,
        });
        store_item(
            &mut self.flash,
            self.storage_range.clone(),
            &mut cache,
            &mut self.buffer,
            &storage_config.key(),
            &storage_config,
        )
        .await
        .map_err(|e| print_storage_error::<F>(e))?;

        // Save layout config
        let layout_config = StorageData::LayoutConfig(LayoutConfig {
            default_layer: 0,
            layout_option: 0,
        });
        store_item(
            &mut self.flash,
            self.storage_range.clone(),
            &mut cache,
            &mut self.buffer,
            &layout_config.key(),
            &layout_config,
        )
        .await
        .map_err(|e| print_storage_error::<F>(e))?;

        Ok(())
    }

    /// Read out the saved layout config.
    ///
    /// If the storage is initialized but the layout config is missing, the default layout config is returned.
    pub(crate) async fn read_layout_config(&mut self) -> Result<LayoutConfig, ()> {
        let read_data = fetch_item::<u32, StorageData, _>(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &(StorageKeys::LayoutConfig as u32),
        )
        .await
        .map_err(|e| print_storage_error::<F>(e))?;

        if let Some(StorageData::LayoutConfig(layout_config)) = read_data {
            Ok(layout_config)
        } else {
            Ok(LayoutConfig {
                default_layer: 0,
                layout_option: 0,
            })
        }
    }

    async fn check_enable(&mut self) -> bool {
        if let Ok(Some(StorageData::StorageConfig(config))) = fetch_item::<u32, StorageData, _>(
            &mut self.flash,
            self.storage_range.clone(),
            &mut NoCache::new(),
            &mut self.buffer,
            &(StorageKeys::StorageConfig as u32),
        )
        .await
        {
            // The storage is enabled only when the saved build hash matches the current firmware
            if config.enable && config.build_hash == BUILD_HASH {
                return true;
            }
        }
        false
    }
}

fn print_storage_error<F: AsyncNorFlash>(e: SSError<F::Error>) {
    match e {
        SSError::Storage { value: _ } => error!("Flash error"),
        SSError::FullStorage => error!("Storage is full"),
        SSError::Corrupted {} => error!("Storage is corrupted"),
        SSError::BufferTooBig => error!("Buffer too big"),
        SSError::BufferTooSmall(_) => error!("Buffer too small"),
        SSError::SerializationError(e) => error!("Map value error: {}", e),
        _ => error!("Unknown storage error"),
    }
}

const fn get_buffer_size() -> usize {
    // Stored items are at most 6 bytes, but according to the doc of `sequential_storage`,
    // for some flashes the read buffer should be aligned in 32 bytes.
    // 256 covers both with headroom for longer items in future storage versions.
    256
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_storage_config_round_trip() {
        let mut buffer = [0xFF_u8; 8];
        let data = StorageData::StorageConfig(LocalStorageConfig {
            enable: true,
            build_hash: BUILD_HASH,
        });
        let n = data.serialize_into(&mut buffer).unwrap();
        assert_eq!(n, 6);
        assert_eq!(buffer[0], StorageKeys::StorageConfig as u8);
        // Enabled storage is stored as 0
        assert_eq!(buffer[1], 0);

        match StorageData::deserialize_from(&buffer[..6]).unwrap() {
            StorageData::StorageConfig(config) => {
                assert!(config.enable);
                assert_eq!(config.build_hash, BUILD_HASH);
            }
            _ => panic!("wrong storage data type"),
        }
    }

    #[test]
    fn test_disabled_storage_config() {
        let mut buffer = [0xFF_u8; 8];
        let data = StorageData::StorageConfig(LocalStorageConfig {
            enable: false,
            build_hash: BUILD_HASH,
        });
        data.serialize_into(&mut buffer).unwrap();
        assert_eq!(buffer[1], 1);

        match StorageData::deserialize_from(&buffer[..6]).unwrap() {
            StorageData::StorageConfig(config) => assert!(!config.enable),
            _ => panic!("wrong storage data type"),
        }
    }

    #[test]
    fn test_layout_config_round_trip() {
        let mut buffer = [0xFF_u8; 8];
        let data = StorageData::LayoutConfig(LayoutConfig {
            default_layer: 3,
            layout_option: 0xDEAD_BEEF,
        });
        data.serialize_into(&mut buffer).unwrap();
        assert_eq!(buffer[0], StorageKeys::LayoutConfig as u8);
        assert_eq!(buffer[1], 3);

        match StorageData::deserialize_from(&buffer[..6]).unwrap() {
            StorageData::LayoutConfig(config) => {
                assert_eq!(config.default_layer, 3);
                assert_eq!(config.layout_option, 0xDEAD_BEEF);
            }
            _ => panic!("wrong storage data type"),
        }
    }

    #[test]
    fn test_serialize_buffer_too_small() {
        let mut buffer = [0u8; 4];
        let data = StorageData::LayoutConfig(LayoutConfig {
            default_layer: 0,
            layout_option: 0,
        });
        assert!(matches!(
            data.serialize_into(&mut buffer),
            Err(SerializationError::BufferTooSmall)
        ));
    }

    #[test]
    fn test_deserialize_unknown_key() {
        let buffer = [0x42_u8, 0, 0, 0, 0, 0];
        assert!(matches!(
            StorageData::deserialize_from(&buffer),
            Err(SerializationError::Custom(1))
        ));
    }

    #[test]
    fn test_deserialize_empty_buffer() {
        assert!(matches!(
            StorageData::deserialize_from(&[]),
            Err(SerializationError::InvalidFormat)
        ));
    }
}
