#[cfg(feature = "storage")]
use embedded_storage_async::nor_flash::NorFlash;

use crate::action::KeyAction;
use crate::config::BehaviorConfig;
use crate::event::KeyEvent;
#[cfg(feature = "storage")]
use crate::{boot::reboot_keyboard, storage::Storage};

/// Keymap represents the stack of layers.
///
/// Keymap should be binded to the actual pcb matrix definition.
/// The keyboard engine detects hardware key strokes, uses tuple `(row, col, layer)` to retrieve the action from Keymap.
pub struct KeyMap<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    /// Layers
    pub(crate) layers: &'a mut [[[KeyAction; COL]; ROW]; NUM_LAYER],
    /// Current state of each layer
    layer_state: [bool; NUM_LAYER],
    /// Default layer number
    default_layer: u8,
    /// Layer cache
    layer_cache: [[u8; COL]; ROW],
    /// Options for configurable action behavior
    pub(crate) behavior: BehaviorConfig,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyMap<'a, ROW, COL, NUM_LAYER> {
    pub async fn new(action_map: &'a mut [[[KeyAction; COL]; ROW]; NUM_LAYER], behavior: BehaviorConfig) -> Self {
        KeyMap {
            layers: action_map,
            layer_state: [false; NUM_LAYER],
            default_layer: 0,
            layer_cache: [[0; COL]; ROW],
            behavior,
        }
    }

    /// Initialize the keymap with the layout configuration restored from storage.
    #[cfg(feature = "storage")]
    pub async fn new_from_storage<F: NorFlash>(
        action_map: &'a mut [[[KeyAction; COL]; ROW]; NUM_LAYER],
        storage: Option<&mut Storage<F, ROW, COL, NUM_LAYER>>,
        behavior: BehaviorConfig,
    ) -> Self {
        let mut default_layer = 0;
        if let Some(storage) = storage {
            match storage.read_layout_config().await {
                Ok(layout_config) => default_layer = layout_config.default_layer,
                Err(_) => {
                    error!("Failed to read from storage, clearing...");
                    sequential_storage::erase_all(&mut storage.flash, storage.storage_range.clone())
                        .await
                        .ok();

                    reboot_keyboard();
                }
            }
        }

        KeyMap {
            layers: action_map,
            layer_state: [false; NUM_LAYER],
            default_layer,
            layer_cache: [[default_layer; COL]; ROW],
            behavior,
        }
    }

    /// Get the default layer number
    pub(crate) fn get_default_layer(&self) -> u8 {
        self.default_layer
    }

    /// Set the default layer number
    pub(crate) fn set_default_layer(&mut self, layer_num: u8) {
        self.default_layer = layer_num;
    }

    /// Fetch the action in keymap, with layer cache
    pub(crate) fn get_action_with_layer_cache(&mut self, key_event: KeyEvent) -> KeyAction {
        let row = key_event.row as usize;
        let col = key_event.col as usize;
        if !key_event.pressed {
            // Releasing a pressed key, use cached layer and restore the cache
            let layer = self.pop_layer_from_cache(row, col);
            return self.layers[layer as usize][row][col];
        }

        // Iterate from higher layer to lower layer, the lowest checked layer is the default layer
        for (layer_idx, layer) in self.layers.iter().enumerate().rev() {
            if self.layer_state[layer_idx] || layer_idx as u8 == self.default_layer {
                // This layer is activated
                let action = layer[row][col];
                if action == KeyAction::Transparent {
                    continue;
                }

                // Found a valid action in the layer, cache it
                self.save_layer_cache(row, col, layer_idx as u8);

                return action;
            }

            if layer_idx as u8 == self.default_layer {
                // No action
                break;
            }
        }

        KeyAction::No
    }

    pub(crate) fn get_activated_layer(&self) -> u8 {
        for (layer_idx, _) in self.layers.iter().enumerate().rev() {
            if self.layer_state[layer_idx] || layer_idx as u8 == self.default_layer {
                return layer_idx as u8;
            }
        }

        self.default_layer
    }

    fn pop_layer_from_cache(&mut self, row: usize, col: usize) -> u8 {
        let layer = self.layer_cache[row][col];
        self.layer_cache[row][col] = self.default_layer;

        layer
    }

    fn save_layer_cache(&mut self, row: usize, col: usize, layer_num: u8) {
        self.layer_cache[row][col] = layer_num;
    }

    /// Update Tri Layer state
    fn update_tri_layer(&mut self) {
        if let Some(ref tri_layer) = self.behavior.tri_layer {
            self.layer_state[tri_layer[2] as usize] =
                self.layer_state[tri_layer[0] as usize] && self.layer_state[tri_layer[1] as usize];
        }
    }

    /// Activate given layer
    pub(crate) fn activate_layer(&mut self, layer_num: u8) {
        if layer_num as usize >= NUM_LAYER {
            warn!("Not a valid layer {}, keyboard supports only {} layers", layer_num, NUM_LAYER);
            return;
        }
        self.layer_state[layer_num as usize] = true;
        self.update_tri_layer();
    }

    /// Deactivate given layer
    pub(crate) fn deactivate_layer(&mut self, layer_num: u8) {
        if layer_num as usize >= NUM_LAYER {
            warn!("Not a valid layer {}, keyboard supports only {} layers", layer_num, NUM_LAYER);
            return;
        }
        self.layer_state[layer_num as usize] = false;
        self.update_tri_layer();
    }

    /// Toggle given layer
    pub(crate) fn toggle_layer(&mut self, layer_num: u8) {
        if layer_num as usize >= NUM_LAYER {
            warn!("Not a valid layer {}, keyboard supports only {} layers", layer_num, NUM_LAYER);
            return;
        }

        self.layer_state[layer_num as usize] = !self.layer_state[layer_num as usize];
    }
}

#[cfg(test)]
mod test {
    use embassy_futures::block_on;

    use super::*;
    use crate::action::Action;
    use crate::keycode::KeyCode;
    use crate::{a, k, layer, mo};

    #[rustfmt::skip]
    fn get_keymap() -> [[[KeyAction; 2]; 2]; 4] {
        [
            layer!([[k!(A), k!(B)], [k!(Kc1), mo!(1)]]),
            layer!([[k!(X), a!(Transparent)], [a!(No), mo!(2)]]),
            layer!([[k!(Z), k!(Y)], [a!(Transparent), a!(No)]]),
            layer!([[k!(F1), a!(Transparent)], [a!(Transparent), a!(No)]]),
        ]
    }

    fn press(row: u8, col: u8) -> KeyEvent {
        KeyEvent { row, col, pressed: true }
    }

    fn release(row: u8, col: u8) -> KeyEvent {
        KeyEvent { row, col, pressed: false }
    }

    #[test]
    fn test_layer_activation() {
        let mut action_map = get_keymap();
        let mut keymap = block_on(KeyMap::new(&mut action_map, BehaviorConfig::default()));
        assert_eq!(keymap.get_activated_layer(), 0);
        keymap.activate_layer(2);
        assert_eq!(keymap.get_activated_layer(), 2);
        keymap.deactivate_layer(2);
        assert_eq!(keymap.get_activated_layer(), 0);

        // Out of range layers are ignored
        keymap.activate_layer(8);
        assert_eq!(keymap.get_activated_layer(), 0);
    }

    #[test]
    fn test_toggle_layer() {
        let mut action_map = get_keymap();
        let mut keymap = block_on(KeyMap::new(&mut action_map, BehaviorConfig::default()));
        keymap.toggle_layer(1);
        assert_eq!(keymap.get_activated_layer(), 1);
        keymap.toggle_layer(1);
        assert_eq!(keymap.get_activated_layer(), 0);
        keymap.toggle_layer(8);
        assert_eq!(keymap.get_activated_layer(), 0);
    }

    #[test]
    fn test_transparent_falls_through_to_lower_layer() {
        let mut action_map = get_keymap();
        let mut keymap = block_on(KeyMap::new(&mut action_map, BehaviorConfig::default()));
        keymap.activate_layer(1);

        // (0, 1) is transparent on layer 1, the action comes from layer 0
        let action = keymap.get_action_with_layer_cache(press(0, 1));
        assert_eq!(action, KeyAction::Single(Action::Key(KeyCode::B)));
        assert_eq!(keymap.get_action_with_layer_cache(release(0, 1)), KeyAction::Single(Action::Key(KeyCode::B)));
    }

    #[test]
    fn test_release_uses_cached_layer() {
        let mut action_map = get_keymap();
        let mut keymap = block_on(KeyMap::new(&mut action_map, BehaviorConfig::default()));
        keymap.activate_layer(1);
        assert_eq!(
            keymap.get_action_with_layer_cache(press(0, 0)),
            KeyAction::Single(Action::Key(KeyCode::X))
        );

        // The layer is deactivated while the key is held, the release still
        // resolves on the layer the press was resolved on
        keymap.deactivate_layer(1);
        assert_eq!(
            keymap.get_action_with_layer_cache(release(0, 0)),
            KeyAction::Single(Action::Key(KeyCode::X))
        );
        assert_eq!(
            keymap.get_action_with_layer_cache(press(0, 0)),
            KeyAction::Single(Action::Key(KeyCode::A))
        );
    }

    #[test]
    fn test_transparent_on_default_layer() {
        let mut action_map = get_keymap();
        let mut keymap = block_on(KeyMap::new(&mut action_map, BehaviorConfig::default()));
        keymap.set_default_layer(1);
        assert_eq!(keymap.get_default_layer(), 1);

        // (0, 1) is transparent on the default layer and lower layers are not
        // searched, so there is no action
        assert_eq!(keymap.get_action_with_layer_cache(press(0, 1)), KeyAction::No);
        // (0, 0) resolves on the new default layer
        assert_eq!(
            keymap.get_action_with_layer_cache(press(0, 0)),
            KeyAction::Single(Action::Key(KeyCode::X))
        );
    }

    #[test]
    fn test_tri_layer() {
        let mut action_map = get_keymap();
        let behavior = BehaviorConfig {
            tri_layer: Some([1, 2, 3]),
            ..BehaviorConfig::default()
        };
        let mut keymap = block_on(KeyMap::new(&mut action_map, behavior));

        keymap.activate_layer(1);
        assert_eq!(keymap.get_activated_layer(), 1);
        keymap.activate_layer(2);
        // Both lower layers are active, the adjust layer kicks in
        assert_eq!(keymap.get_activated_layer(), 3);
        keymap.deactivate_layer(1);
        assert_eq!(keymap.get_activated_layer(), 2);
        keymap.deactivate_layer(2);
        assert_eq!(keymap.get_activated_layer(), 0);
    }
}
