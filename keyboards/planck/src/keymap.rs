use embassy_time::Duration;
use latchkey::action::KeyAction;
use latchkey::config::{BehaviorConfig, TapHoldConfig};
use latchkey::keycode::ModifierCombination;
use latchkey::{a, df, k, layer, lt, mo, mt, sc, shifted, wm};

pub(crate) const COL: usize = 12;
pub(crate) const ROW: usize = 4;
pub(crate) const NUM_LAYER: usize = 7;

const LC: ModifierCombination = ModifierCombination::CTRL;
const LG: ModifierCombination = ModifierCombination::GUI;
const LS: ModifierCombination = ModifierCombination::SHIFT;
const RS: ModifierCombination = ModifierCombination::new_from(true, false, false, true, false);

/// Layers: 0 Colemak, 1 Qwerty, 2 Raise, 3 Lower, 4 Adjust, 5 Gui, 6 Func.
///
/// Raise and Lower are reached with the momentary keys on the bottom row,
/// holding both activates Adjust (see `get_behavior_config`). The Gui layer
/// sits on the space bar as a layer-tap, Func on the top right corner.
#[rustfmt::skip]
pub const fn get_default_keymap() -> [[[KeyAction; COL]; ROW]; NUM_LAYER] {
    [
        // Layer 0: Colemak
        layer!([
            [k!(Tab),         k!(Q),    k!(W),        k!(F),    k!(P),  k!(G),         k!(J),         k!(L),  k!(U),     k!(Y),   k!(Semicolon), mo!(6)],
            [mt!(Escape, LC), k!(A),    k!(R),        k!(S),    k!(T),  k!(D),         k!(H),         k!(N),  k!(E),     k!(I),   k!(O),         k!(Quote)],
            [sc!(Kc9, LS),    k!(Z),    k!(X),        k!(C),    k!(V),  k!(B),         k!(K),         k!(M),  k!(Comma), k!(Dot), k!(Slash),     sc!(Kc0, RS)],
            [k!(LGui),        a!(No),   k!(CapsLock), k!(LAlt), mo!(3), k!(Backspace), lt!(5, Space), mo!(2), k!(LGui),  a!(No),  a!(No),        k!(Enter)]
        ]),
        // Layer 1: Qwerty
        layer!([
            [k!(Tab),         k!(Q),           k!(W),        k!(E),    k!(R),  k!(T),  k!(Y),         k!(U),  k!(I),     k!(O),   k!(P),         k!(Backspace)],
            [mt!(Escape, LC), k!(A),           k!(S),        k!(D),    k!(F),  k!(G),  k!(H),         k!(J),  k!(K),     k!(L),   k!(Semicolon), k!(Quote)],
            [sc!(Kc9, LS),    k!(Z),           k!(X),        k!(C),    k!(V),  k!(B),  k!(N),         k!(M),  k!(Comma), k!(Dot), k!(Slash),     sc!(Kc0, RS)],
            [k!(LGui),        k!(SystemSleep), k!(CapsLock), k!(LAlt), mo!(3), a!(No), lt!(5, Space), mo!(2), k!(LGui),  a!(No),  a!(No),        k!(Enter)]
        ]),
        // Layer 2: Raise, numbers on the top row and the unshifted symbols
        layer!([
            [wm!(Grave, LG),  k!(Kc1),         k!(Kc2),         k!(Kc3),         k!(Kc4),         k!(Kc5),    k!(Kc6),   k!(Kc7),         k!(Kc8),         k!(Kc9),              k!(Kc0),               a!(Transparent)],
            [a!(Transparent), a!(No),          a!(No),          a!(No),          a!(No),          a!(No),     k!(Grave), k!(Minus),       k!(Equal),       k!(LeftBracket),      k!(RightBracket),      k!(Backslash)],
            [a!(Transparent), a!(No),          a!(No),          a!(No),          a!(No),          a!(No),     a!(No),    shifted!(Minus), shifted!(Equal), shifted!(LeftBracket), shifted!(RightBracket), a!(Transparent)],
            [a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), k!(Delete), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)]
        ]),
        // Layer 3: Lower, shifted symbols, media and page navigation
        layer!([
            [shifted!(Grave), shifted!(Kc1),      shifted!(Kc2),    shifted!(Kc3),   shifted!(Kc4),      shifted!(Kc5),      shifted!(Kc6),   shifted!(Kc7),   shifted!(Kc8),   a!(Transparent), a!(Transparent), a!(Transparent)],
            [a!(Transparent), k!(MediaPrevTrack), k!(AudioVolDown), k!(AudioVolUp),  k!(MediaNextTrack), k!(MediaPlayPause), a!(Transparent), a!(Transparent), a!(Transparent), k!(PageUp),      k!(PageDown),    shifted!(Backslash)],
            [a!(Transparent), a!(Transparent),    a!(Transparent),  a!(Transparent), k!(Oper),           k!(AudioMute),      a!(Transparent), a!(Transparent), a!(Transparent), k!(Home),        k!(End),         a!(Transparent)],
            [a!(Transparent), a!(Transparent),    a!(Transparent),  a!(Transparent), a!(Transparent),    k!(Delete),         a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)]
        ]),
        // Layer 4: Adjust, firmware functions and default layer selection
        layer!([
            [a!(Transparent), k!(Bootloader),  a!(No),          a!(Transparent), a!(Transparent), a!(Transparent), k!(Down), k!(Right),       a!(Transparent), a!(Transparent), a!(Transparent), k!(Delete)],
            [mt!(Escape, LC), a!(Transparent), a!(No),          a!(No),          a!(No),          a!(Transparent), k!(Left), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)],
            [a!(Transparent), a!(No),          a!(No),          a!(No),          a!(No),          a!(No),          k!(Up),   df!(1),          df!(0),          a!(Transparent), a!(Transparent), a!(Transparent)],
            [a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent), a!(Transparent)]
        ]),
        // Layer 5: Gui, mouse keys on the left hand, arrows on the right
        layer!([
            [a!(No), a!(No), k!(MouseBtn2),  k!(MouseUp),   k!(MouseBtn1),  k!(MouseWheelUp),   k!(Down),        k!(Right),       a!(No), a!(No), a!(No), a!(No)],
            [a!(No), a!(No), k!(MouseLeft),  k!(MouseDown), k!(MouseRight), k!(MouseWheelDown), k!(Left),        a!(No),          a!(No), a!(No), a!(No), a!(No)],
            [a!(No), a!(No), a!(No),         k!(MouseBtn3), a!(No),         a!(No),             k!(Up),          a!(No),          a!(No), a!(No), a!(No), a!(No)],
            [a!(No), a!(No), a!(No),         a!(No),        a!(No),         a!(Transparent),    a!(Transparent), a!(No),          a!(No), a!(No), a!(No), a!(No)]
        ]),
        // Layer 6: Func, the full function key range
        layer!([
            [a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(Transparent)],
            [k!(F1),  k!(F2),  k!(F3),  k!(F4),  k!(F5),  k!(F6),  k!(F7),  k!(F8),  k!(F9),  k!(F10), k!(F11), k!(F12)],
            [k!(F13), k!(F14), k!(F15), k!(F16), k!(F17), k!(F18), k!(F19), k!(F20), k!(F21), k!(F22), k!(F23), k!(F24)],
            [a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No),  a!(No)]
        ]),
    ]
}

/// Holding Lower (layer 3) and Raise (layer 2) together activates Adjust (layer 4).
pub fn get_behavior_config() -> BehaviorConfig {
    BehaviorConfig {
        tri_layer: Some([3, 2, 4]),
        tap_hold: TapHoldConfig {
            hold_timeout: Duration::from_millis(200),
            ..Default::default()
        },
        ..Default::default()
    }
}
