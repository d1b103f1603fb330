#![doc = include_str!("../../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod action;
pub mod boot;
pub mod channel;
pub mod config;
pub mod descriptor;
pub mod event;
pub mod hid;
pub mod hid_state;
pub mod input_device;
pub mod keyboard;
pub mod keycode;
pub mod keymap;
pub mod layout_macro;
pub mod matrix;
#[cfg(feature = "storage")]
pub mod storage;

use core::sync::atomic::AtomicBool;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

/// The size of the channel for key events
pub const EVENT_CHANNEL_SIZE: usize = 16;
/// The size of the channel for hid reports
pub const REPORT_CHANNEL_SIZE: usize = 16;
/// The size of the channel for flash operations
#[cfg(feature = "storage")]
pub(crate) const FLASH_CHANNEL_SIZE: usize = 4;

/// RawMutex used in the whole keyboard engine
pub type RawMutex = CriticalSectionRawMutex;

/// Whether the connection with the host is established.
///
/// The hid reporter holds reports back until the transport sets this to true.
pub static CONNECTION_STATE: AtomicBool = AtomicBool::new(false);
