use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use bitfield_struct::bitfield;

/// Modifier byte of the HID keyboard report
#[bitfield(u8, order = Lsb)]
#[derive(Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidModifiers {
    #[bits(1)]
    pub(crate) left_ctrl: bool,
    #[bits(1)]
    pub(crate) left_shift: bool,
    #[bits(1)]
    pub(crate) left_alt: bool,
    #[bits(1)]
    pub(crate) left_gui: bool,
    #[bits(1)]
    pub(crate) right_ctrl: bool,
    #[bits(1)]
    pub(crate) right_shift: bool,
    #[bits(1)]
    pub(crate) right_alt: bool,
    #[bits(1)]
    pub(crate) right_gui: bool,
}

impl BitOr for HidModifiers {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() | rhs.into_bits())
    }
}
impl BitAnd for HidModifiers {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() & rhs.into_bits())
    }
}
impl Not for HidModifiers {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::from_bits(!self.into_bits())
    }
}
impl BitAndAssign for HidModifiers {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}
impl BitOrAssign for HidModifiers {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}
