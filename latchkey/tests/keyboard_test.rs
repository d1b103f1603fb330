pub mod common;

mod keyboard_test {
    use embassy_futures::block_on;
    use rusty_fork::rusty_fork_test;

    use crate::common::{KC_LSHIFT, create_test_keyboard, run_key_sequence_test};

    rusty_fork_test! {
        #[test]
        fn test_single_key() {
            key_sequence_test! {
                keyboard: create_test_keyboard(),
                sequence: [
                    [1, 1, true, 10],
                    [1, 1, false, 50],
                ],
                expected_reports: [
                    [0, [kc8!(Q), 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_key_rollover() {
            key_sequence_test! {
                keyboard: create_test_keyboard(),
                sequence: [
                    [1, 1, true, 10],
                    [1, 2, true, 30],
                    [1, 1, false, 30],  // Release the first key, the second keeps its slot
                    [1, 2, false, 30],
                ],
                expected_reports: [
                    [0, [kc8!(Q), 0, 0, 0, 0, 0]],
                    [0, [kc8!(Q), kc8!(W), 0, 0, 0, 0]],
                    [0, [0, kc8!(W), 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }

        #[test]
        fn test_modifier_key() {
            key_sequence_test! {
                keyboard: create_test_keyboard(),
                sequence: [
                    [3, 0, true, 10],  // LShift
                    [1, 1, true, 30],
                    [1, 1, false, 30],
                    [3, 0, false, 30],
                ],
                expected_reports: [
                    [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                    [KC_LSHIFT, [kc8!(Q), 0, 0, 0, 0, 0]],
                    [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                    [0, [0, 0, 0, 0, 0, 0]],
                ]
            };
        }
    }
}
