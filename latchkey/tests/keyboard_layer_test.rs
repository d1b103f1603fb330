pub mod common;

use latchkey::config::BehaviorConfig;
use latchkey::keyboard::Keyboard;
use latchkey::{a, df, k, layer, mo, tg, to, tt};

use crate::common::wrap_keymap;

/// 1x2 keymap with a layer toggle key
fn create_toggle_keyboard() -> Keyboard<'static, 1, 2, 2> {
    let keymap = [
        layer!([[k!(A), tg!(1)]]),
        layer!([[k!(B), a!(Transparent)]]),
    ];
    Keyboard::new(wrap_keymap(keymap, BehaviorConfig::default()))
}

/// 1x2 keymap with a "toggle only" key which deactivates all other layers
fn create_toggle_only_keyboard() -> Keyboard<'static, 1, 2, 3> {
    let keymap = [
        layer!([[k!(A), to!(2)]]),
        layer!([[k!(B), a!(No)]]),
        layer!([[k!(C), a!(Transparent)]]),
    ];
    Keyboard::new(wrap_keymap(keymap, BehaviorConfig::default()))
}

/// 1x2 keymap with a default layer switch key
fn create_default_layer_keyboard() -> Keyboard<'static, 1, 2, 2> {
    let keymap = [
        layer!([[k!(A), df!(1)]]),
        layer!([[k!(B), a!(Transparent)]]),
    ];
    Keyboard::new(wrap_keymap(keymap, BehaviorConfig::default()))
}

/// 1x2 keymap with a tap-toggle key: tap toggles layer 1, hold activates it momentarily
fn create_tap_toggle_keyboard() -> Keyboard<'static, 1, 2, 2> {
    let keymap = [
        layer!([[k!(A), tt!(1)]]),
        layer!([[k!(B), a!(Transparent)]]),
    ];
    Keyboard::new(wrap_keymap(keymap, BehaviorConfig::default()))
}

/// 1x3 keymap with two momentary keys driving a tri-layer setup
fn create_tri_layer_keyboard() -> Keyboard<'static, 1, 3, 4> {
    let keymap = [
        layer!([[mo!(1), mo!(2), k!(A)]]),
        layer!([[a!(Transparent), a!(Transparent), k!(B)]]),
        layer!([[a!(Transparent), a!(Transparent), k!(C)]]),
        layer!([[a!(Transparent), a!(Transparent), k!(D)]]),
    ];
    Keyboard::new(wrap_keymap(
        keymap,
        BehaviorConfig {
            tri_layer: Some([1, 2, 3]),
            ..BehaviorConfig::default()
        },
    ))
}

mod layer_test {
    use embassy_futures::block_on;
    use rusty_fork::rusty_fork_test;

    use super::*;
    use crate::common::{create_test_keyboard, run_key_sequence_test};

    rusty_fork_test! {
        #[test]
        fn test_momentary_layer() {
            key_sequence_test! {
                keyboard: create_test_keyboard(),
                sequence: [
                    [4, 9, true, 10],  // Press mo!(1)
                    [0, 1, true, 20],  // Press (0,1), resolves on layer 1
                    [0, 1, false, 20],
                    [4, 9, false, 10], // Release mo!(1), resolved via the layer cache
                    [0, 1, true, 20],  // Press (0,1) again, layer 1 is off now
                    [0, 1, false, 20],
                ],
                expected_reports: [
                    [0, [kc8!(F1), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                    [0, [kc8!(Kc1), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_transparent_key_falls_through() {
            key_sequence_test! {
                keyboard: create_test_keyboard(),
                sequence: [
                    [4, 9, true, 10],  // Press mo!(1)
                    [1, 1, true, 20],  // (1,1) is transparent on layer 1, Q on layer 0
                    [1, 1, false, 20],
                    [4, 9, false, 10],
                ],
                expected_reports: [
                    [0, [kc8!(Q), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_toggle_layer() {
            key_sequence_test! {
                keyboard: create_toggle_keyboard(),
                sequence: [
                    [0, 1, true, 10],  // Tap tg!(1), the layer toggles on release
                    [0, 1, false, 10],
                    [0, 0, true, 20],  // B from layer 1
                    [0, 0, false, 20],
                    [0, 1, true, 20],  // (0,1) is transparent on layer 1, tap tg!(1) again
                    [0, 1, false, 10],
                    [0, 0, true, 20],  // A from layer 0
                    [0, 0, false, 20],
                ],
                expected_reports: [
                    [0, [kc8!(B), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                    [0, [kc8!(A), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_layer_toggle_only() {
            key_sequence_test! {
                keyboard: create_toggle_only_keyboard(),
                sequence: [
                    [0, 1, true, 10],  // to!(2) activates layer 2 and deactivates the others
                    [0, 1, false, 10],
                    [0, 0, true, 20],  // C from layer 2
                    [0, 0, false, 20],
                ],
                expected_reports: [
                    [0, [kc8!(C), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_default_layer_switch() {
            key_sequence_test! {
                keyboard: create_default_layer_keyboard(),
                sequence: [
                    [0, 1, true, 10],  // df!(1) makes layer 1 the default layer
                    [0, 1, false, 10],
                    [0, 0, true, 20],  // B from the new default layer
                    [0, 0, false, 20],
                ],
                expected_reports: [
                    [0, [kc8!(B), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_tap_toggle_tap() {
            key_sequence_test! {
                keyboard: create_tap_toggle_keyboard(),
                sequence: [
                    [0, 1, true, 10],   // Tap tt!(1) within the hold timeout
                    [0, 1, false, 50],
                    [0, 0, true, 50],   // B, layer 1 is toggled on
                    [0, 0, false, 20],
                    [0, 1, true, 20],   // Tap tt!(1) again, toggles layer 1 off
                    [0, 1, false, 50],
                    [0, 0, true, 50],   // A, back on layer 0
                    [0, 0, false, 20],
                ],
                expected_reports: [
                    [0, [kc8!(B), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                    [0, [kc8!(A), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_tap_toggle_hold() {
            key_sequence_test! {
                keyboard: create_tap_toggle_keyboard(),
                sequence: [
                    [0, 1, true, 10],   // Hold tt!(1) past the hold timeout
                    [0, 0, true, 300],  // B while the layer is held
                    [0, 0, false, 20],
                    [0, 1, false, 50],  // Release tt!(1), the layer deactivates
                    [0, 0, true, 100],  // A, back on layer 0
                    [0, 0, false, 20],
                ],
                expected_reports: [
                    [0, [kc8!(B), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                    [0, [kc8!(A), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_tri_layer() {
            let main = async {
                let mut keyboard = create_tri_layer_keyboard();

                let sequence = key_sequence![
                    [0, 0, true, 10],   // mo!(1)
                    [0, 2, true, 20],   // B from layer 1
                    [0, 2, false, 20],
                    [0, 1, true, 20],   // mo!(2), both lower layers held, adjust layer activates
                    [0, 2, true, 20],   // D from layer 3
                    [0, 2, false, 20],
                    [0, 1, false, 20],  // Release mo!(2), adjust layer deactivates
                    [0, 2, true, 20],   // B from layer 1 again
                    [0, 2, false, 20],
                    [0, 0, false, 20],  // Release mo!(1)
                    [0, 2, true, 20],   // A from the default layer
                    [0, 2, false, 20],
                ];
                let expected_reports = key_report![
                    [0, [kc8!(B), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                    [0, [kc8!(D), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                    [0, [kc8!(B), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                    [0, [kc8!(A), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ];

                run_key_sequence_test(&mut keyboard, &sequence, &expected_reports).await;
            };
            block_on(main);
        }
    }
}
