use core::cell::RefCell;

use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use embassy_time::{Instant, Timer};
use heapless::{FnvIndexMap, Vec};
use usbd_hid::descriptor::{MediaKeyboardReport, MouseReport, SystemControlReport};

use crate::action::{Action, KeyAction};
use crate::boot;
#[cfg(feature = "storage")]
use crate::channel::FLASH_CHANNEL;
use crate::channel::{KEY_EVENT_CHANNEL, KEYBOARD_REPORT_CHANNEL};
use crate::descriptor::KeyboardReport;
use crate::event::KeyEvent;
use crate::hid::Report;
use crate::hid_state::HidModifiers;
use crate::input_device::Runnable;
use crate::keycode::{KeyCode, ModifierCombination};
use crate::keymap::KeyMap;
#[cfg(feature = "storage")]
use crate::storage::FlashOperationMessage;

impl<const ROW: usize, const COL: usize, const NUM_LAYER: usize> Runnable for Keyboard<'_, ROW, COL, NUM_LAYER> {
    /// Main keyboard processing task, it receives input devices result, processes keys.
    /// The report is sent using `send_report`.
    async fn run(&mut self) {
        loop {
            let key_event = KEY_EVENT_CHANNEL.receive().await;

            // Process the key change
            self.process_inner(key_event).await;

            // After processing the key change, check if there are unprocessed events
            // This will happen if there's recursion in key processing
            loop {
                if self.unprocessed_events.is_empty() {
                    break;
                }
                // Process unprocessed events
                let e = self.unprocessed_events.remove(0);
                self.process_inner(e).await;
            }
        }
    }
}

pub struct Keyboard<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    /// Keymap
    pub(crate) keymap: &'a RefCell<KeyMap<'a, ROW, COL, NUM_LAYER>>,

    /// Unprocessed events
    unprocessed_events: Vec<KeyEvent, 16>,

    /// Timer which records the timestamp of key changes
    pub(crate) timer: [[Option<Instant>; ROW]; COL],

    /// The modifiers coming from (last) `Action::KeyWithModifier`
    with_modifiers: HidModifiers,

    /// The held modifiers for the keyboard hid report
    held_modifiers: HidModifiers,

    /// The held keys for the keyboard hid report, except the modifiers
    held_keycodes: [KeyCode; 6],

    /// Registered key position
    registered_keys: [Option<(u8, u8)>; 6],

    /// Internal mouse report buf
    mouse_report: MouseReport,

    /// Internal media report buf
    media_report: MediaKeyboardReport,

    /// Internal system control report buf
    system_control_report: SystemControlReport,

    /// Mouse key is different from other keyboard keys, it should be sent continuously while the key is pressed.
    /// `last_mouse_tick` tracks at most 4 mouse keys, with its recent state.
    /// It can be used to control the mouse report rate and release mouse key properly.
    /// The key is mouse keycode, the value is the last action and its timestamp.
    last_mouse_tick: FnvIndexMap<KeyCode, (bool, Instant), 4>,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, ROW, COL, NUM_LAYER> {
    pub fn new(keymap: &'a RefCell<KeyMap<'a, ROW, COL, NUM_LAYER>>) -> Self {
        Keyboard {
            keymap,
            unprocessed_events: Vec::new(),
            timer: [[None; ROW]; COL],
            with_modifiers: HidModifiers::default(),
            held_modifiers: HidModifiers::default(),
            held_keycodes: [KeyCode::No; 6],
            registered_keys: [None; 6],
            mouse_report: MouseReport {
                buttons: 0,
                x: 0,
                y: 0,
                wheel: 0,
                pan: 0,
            },
            media_report: MediaKeyboardReport { usage_id: 0 },
            system_control_report: SystemControlReport { usage_id: 0 },
            last_mouse_tick: FnvIndexMap::new(),
        }
    }

    async fn send_report(&self, report: Report) {
        KEYBOARD_REPORT_CHANNEL.sender().send(report).await
    }

    /// Process key changes at (row, col)
    async fn process_inner(&mut self, key_event: KeyEvent) {
        // Matrix should process key pressed event first, record the timestamp of key changes
        if key_event.pressed {
            self.timer[key_event.col as usize][key_event.row as usize] = Some(Instant::now());
        }

        // Process key
        let key_action = self.keymap.borrow_mut().get_action_with_layer_cache(key_event);
        debug!("Process key action: {:?}, {:?}", key_action, key_event);
        self.process_key_action(key_action, key_event).await;
    }

    pub(crate) async fn send_keyboard_report_with_resolved_modifiers(&mut self, pressed: bool) {
        // All modifier related effects are combined here to be sent with the hid report
        let modifiers = self.resolve_modifiers(pressed).into_bits();

        self.send_report(Report::KeyboardReport(KeyboardReport {
            modifier: modifiers,
            reserved: 0,
            leds: 0,
            keycodes: self.held_keycodes.map(|k| k as u8),
        }))
        .await;

        // Yield once after sending the report to channel
        yield_now().await;
    }

    /// Send system control report if needed
    pub(crate) async fn send_system_control_report(&mut self) {
        self.send_report(Report::SystemControlReport(self.system_control_report))
            .await;
        self.system_control_report.usage_id = 0;
        yield_now().await;
    }

    /// Send media report if needed
    pub(crate) async fn send_media_report(&mut self) {
        self.send_report(Report::MediaKeyboardReport(self.media_report)).await;
        yield_now().await;
    }

    /// Send mouse report if needed
    pub(crate) async fn send_mouse_report(&mut self) {
        self.send_report(Report::MouseReport(self.mouse_report)).await;
        yield_now().await;
    }

    async fn process_key_action(&mut self, key_action: KeyAction, key_event: KeyEvent) {
        match key_action {
            KeyAction::No | KeyAction::Transparent => (),
            KeyAction::Single(a) => self.process_key_action_normal(a, key_event).await,
            KeyAction::Tap(a) => self.process_key_action_tap(a, key_event).await,
            KeyAction::TapHold(tap_action, hold_action) => {
                self.process_key_action_tap_hold(tap_action, hold_action, key_event).await;
            }
        }
    }

    async fn process_key_action_normal(&mut self, action: Action, key_event: KeyEvent) {
        match action {
            Action::Key(key) => self.process_action_keycode(key, key_event).await,
            Action::KeyWithModifier(key, modifiers) => {
                self.process_key_action_with_modifier(key, modifiers, key_event).await
            }
            Action::Modifier(modifiers) => {
                if key_event.pressed {
                    self.register_modifiers(modifiers);
                } else {
                    self.unregister_modifiers(modifiers);
                }
                // Report the modifier press/release in its own hid report
                self.send_keyboard_report_with_resolved_modifiers(key_event.pressed).await;
            }
            Action::LayerOn(layer_num) => self.process_action_layer_switch(layer_num, key_event),
            Action::LayerOff(layer_num) => {
                // Turn off a layer temporarily when the key is pressed
                // Reactivate the layer after the key is released
                if key_event.pressed {
                    self.keymap.borrow_mut().deactivate_layer(layer_num);
                }
            }
            Action::LayerToggle(layer_num) => {
                // Toggle a layer when the key is release
                if !key_event.pressed {
                    self.keymap.borrow_mut().toggle_layer(layer_num);
                }
            }
            Action::LayerToggleOnly(layer_num) => {
                // Activate a layer and deactivate all other layers(except default layer)
                if key_event.pressed {
                    // Disable all layers except the default layer
                    let default_layer = self.keymap.borrow().get_default_layer();
                    for i in 0..NUM_LAYER as u8 {
                        if i != default_layer {
                            self.keymap.borrow_mut().deactivate_layer(i);
                        }
                    }
                    // Activate the target layer
                    self.keymap.borrow_mut().activate_layer(layer_num);
                }
            }
            Action::DefaultLayer(layer_num) => {
                // Set the default layer and persist it, so it survives power cycles
                if key_event.pressed {
                    info!("Set default layer: {}", layer_num);
                    self.keymap.borrow_mut().set_default_layer(layer_num);
                    #[cfg(feature = "storage")]
                    FLASH_CHANNEL.send(FlashOperationMessage::DefaultLayer(layer_num)).await;
                }
            }
        }
    }

    async fn process_key_action_with_modifier(
        &mut self,
        key: KeyCode,
        modifiers: ModifierCombination,
        key_event: KeyEvent,
    ) {
        if key_event.pressed {
            // These modifiers will be combined into the hid report, so
            // they will be "pressed" the same time as the key (in same hid report)
            self.with_modifiers |= modifiers.to_hid_modifiers();
        } else {
            // The modifiers will not be part of the hid report, so
            // they will be "released" the same time as the key (in same hid report)
            self.with_modifiers &= !(modifiers.to_hid_modifiers());
        }
        self.process_action_keycode(key, key_event).await;
    }

    /// Tap action, send a key when the key is pressed, then release the key.
    async fn process_key_action_tap(&mut self, action: Action, mut key_event: KeyEvent) {
        if key_event.pressed {
            self.process_key_action_normal(action, key_event).await;

            // Wait 10ms, then send release
            Timer::after_millis(10).await;

            key_event.pressed = false;
            self.process_key_action_normal(action, key_event).await;
        }
    }

    /// Process tap/hold action.
    ///
    /// The "hold" action is triggered in the following cases:
    ///
    /// - When the holding threshold expires
    /// - When another key is pressed while the tap/hold key is held
    ///
    /// The "tap" action is triggered when the tap/hold key is released within
    /// the holding threshold.
    async fn process_key_action_tap_hold(&mut self, tap_action: Action, hold_action: Action, key_event: KeyEvent) {
        let row = key_event.row as usize;
        let col = key_event.col as usize;
        if key_event.pressed {
            // Press
            self.timer[col][row] = Some(Instant::now());

            let hold_timeout =
                embassy_time::Timer::after_millis(self.keymap.borrow().behavior.tap_hold.hold_timeout.as_millis());
            match select(hold_timeout, KEY_EVENT_CHANNEL.receive()).await {
                Either::First(_) => {
                    // Timeout, trigger hold
                    debug!("Hold timeout, got HOLD: {:?}, {:?}", hold_action, key_event);
                    self.process_key_action_normal(hold_action, key_event).await;
                }
                Either::Second(e) => {
                    if e.row == key_event.row && e.col == key_event.col {
                        // If it's same key event and releasing within `hold_timeout`, trigger tap
                        if !e.pressed {
                            let elapsed = self.timer[col][row].unwrap().elapsed().as_millis();
                            debug!("TAP action: {:?}, time elapsed: {}ms", tap_action, elapsed);
                            self.process_key_action_tap(tap_action, key_event).await;

                            // Clear timer
                            self.timer[col][row] = None;
                        }
                    } else {
                        // A different key comes
                        // If it's a release event, the key is pressed BEFORE tap/hold key, so it should be regarded as a normal key
                        self.unprocessed_events.push(e).ok();
                        if !e.pressed {
                            // We push the current tap/hold event again, the loop will process the release first, then re-process current tap/hold
                            self.unprocessed_events.push(key_event).ok();
                            return;
                        }

                        // Wait for key release, record all pressed keys during this
                        loop {
                            let next_key_event = KEY_EVENT_CHANNEL.receive().await;
                            self.unprocessed_events.push(next_key_event).ok();
                            if !next_key_event.pressed {
                                break;
                            }
                        }

                        // Process hold action
                        self.process_key_action_normal(hold_action, key_event).await;

                        // All other unprocessed events will be processed later
                    }
                }
            }
        } else {
            // Release
            if self.timer[col][row].is_some() {
                // Release hold action, wait for `post_wait_time`, then clear timer
                debug!(
                    "HOLD releasing: {:?}, {}, wait for `post_wait_time` for new releases",
                    hold_action, key_event.pressed
                );
                let wait_release = async {
                    loop {
                        let next_key_event = KEY_EVENT_CHANNEL.receive().await;
                        if !next_key_event.pressed {
                            self.unprocessed_events.push(next_key_event).ok();
                        } else {
                            break next_key_event;
                        }
                    }
                };

                let wait_timeout =
                    embassy_time::Timer::after_millis(self.keymap.borrow().behavior.tap_hold.post_wait_time.as_millis());
                match select(wait_timeout, wait_release).await {
                    Either::First(_) => {
                        // Wait timeout, release the hold key finally
                        self.process_key_action_normal(hold_action, key_event).await;
                    }
                    Either::Second(next_press) => {
                        // Next press event comes, add hold release to unprocessed list first, then add next press
                        self.unprocessed_events.push(key_event).ok();
                        self.unprocessed_events.push(next_press).ok();
                    }
                };
                // Clear timer
                self.timer[col][row] = None;
            } else {
                // The timer has been reset, fire hold release event
                debug!("HOLD releasing: {:?}, {}", hold_action, key_event.pressed);
                self.process_key_action_normal(hold_action, key_event).await;
            }
        }
    }

    // Process a single keycode, typically a basic key or a modifier key.
    async fn process_action_keycode(&mut self, key: KeyCode, key_event: KeyEvent) {
        if key.is_consumer() {
            self.process_action_consumer_control(key, key_event).await;
        } else if key.is_system() {
            self.process_action_system_control(key, key_event).await;
        } else if key.is_mouse_key() {
            self.process_action_mouse(key, key_event).await;
        } else if key.is_basic() {
            self.process_basic(key, key_event).await;
        } else if key.is_boot() {
            self.process_boot(key, key_event);
        } else {
            warn!("Unsupported key: {:?}", key);
        }
    }

    /// Calculates the combined effect of all modifiers:
    /// - registered (held) modifier keys
    /// - effect of `Action::KeyWithModifier` (while they are pressed)
    pub fn resolve_modifiers(&self, pressed: bool) -> HidModifiers {
        let mut result = self.held_modifiers;

        // Apply the modifiers from `Action::KeyWithModifier`
        if pressed {
            result |= self.with_modifiers;
        }

        result
    }

    // Process a basic keypress/release
    async fn process_basic(&mut self, key: KeyCode, key_event: KeyEvent) {
        if key_event.pressed {
            self.register_key(key, key_event);
        } else {
            self.unregister_key(key, key_event);
        }

        self.send_keyboard_report_with_resolved_modifiers(key_event.pressed).await;
    }

    /// Process layer switch action.
    fn process_action_layer_switch(&mut self, layer_num: u8, key_event: KeyEvent) {
        // Change layer state only when the key's state is changed
        if key_event.pressed {
            self.keymap.borrow_mut().activate_layer(layer_num);
        } else {
            self.keymap.borrow_mut().deactivate_layer(layer_num);
        }
    }

    /// Process consumer control action. Consumer control keys are keys in hid consumer page, such as media keys.
    async fn process_action_consumer_control(&mut self, key: KeyCode, key_event: KeyEvent) {
        if key.is_consumer() {
            self.media_report.usage_id = if key_event.pressed {
                key.as_consumer_control_usage_id() as u16
            } else {
                0
            };

            self.send_media_report().await;
        }
    }

    /// Process system control action. System control keys are keys in system page, such as power key.
    async fn process_action_system_control(&mut self, key: KeyCode, key_event: KeyEvent) {
        if key.is_system() {
            if key_event.pressed {
                if let Some(system_key) = key.as_system_control_usage_id() {
                    self.system_control_report.usage_id = system_key as u8;
                    self.send_system_control_report().await;
                }
            } else {
                self.system_control_report.usage_id = 0;
                self.send_system_control_report().await;
            }
        }
    }

    /// Process mouse key action.
    async fn process_action_mouse(&mut self, key: KeyCode, key_event: KeyEvent) {
        if key.is_mouse_key() {
            let mouse_key = self.keymap.borrow().behavior.mouse_key;
            // Check whether the key is held, or it's released within the time interval
            if let Some((pressed, last_tick)) = self.last_mouse_tick.get(&key) {
                if !pressed && last_tick.elapsed().as_millis() <= mouse_key.interval.as_millis() + 10 {
                    // The key is just released, ignore the key event, use a slightly longer time interval
                    self.last_mouse_tick.remove(&key);
                    return;
                }
            }
            if key_event.pressed {
                match key {
                    // TODO: Add accelerated mode when pressing the mouse key
                    KeyCode::MouseUp => {
                        self.mouse_report.y = -mouse_key.move_delta;
                    }
                    KeyCode::MouseDown => {
                        self.mouse_report.y = mouse_key.move_delta;
                    }
                    KeyCode::MouseLeft => {
                        self.mouse_report.x = -mouse_key.move_delta;
                    }
                    KeyCode::MouseRight => {
                        self.mouse_report.x = mouse_key.move_delta;
                    }
                    KeyCode::MouseWheelUp => {
                        self.mouse_report.wheel = mouse_key.wheel_delta;
                    }
                    KeyCode::MouseWheelDown => {
                        self.mouse_report.wheel = -mouse_key.wheel_delta;
                    }
                    KeyCode::MouseBtn1 => self.mouse_report.buttons |= 1 << 0,
                    KeyCode::MouseBtn2 => self.mouse_report.buttons |= 1 << 1,
                    KeyCode::MouseBtn3 => self.mouse_report.buttons |= 1 << 2,
                    KeyCode::MouseBtn4 => self.mouse_report.buttons |= 1 << 3,
                    KeyCode::MouseBtn5 => self.mouse_report.buttons |= 1 << 4,
                    KeyCode::MouseBtn6 => self.mouse_report.buttons |= 1 << 5,
                    KeyCode::MouseBtn7 => self.mouse_report.buttons |= 1 << 6,
                    KeyCode::MouseBtn8 => self.mouse_report.buttons |= 1 << 7,
                    KeyCode::MouseWheelLeft => {
                        self.mouse_report.pan = -mouse_key.wheel_delta;
                    }
                    KeyCode::MouseWheelRight => {
                        self.mouse_report.pan = mouse_key.wheel_delta;
                    }
                    KeyCode::MouseAccel0 => {}
                    KeyCode::MouseAccel1 => {}
                    KeyCode::MouseAccel2 => {}
                    _ => {}
                }
            } else {
                match key {
                    KeyCode::MouseUp | KeyCode::MouseDown => {
                        self.mouse_report.y = 0;
                    }
                    KeyCode::MouseLeft | KeyCode::MouseRight => {
                        self.mouse_report.x = 0;
                    }
                    KeyCode::MouseWheelUp | KeyCode::MouseWheelDown => {
                        self.mouse_report.wheel = 0;
                    }
                    KeyCode::MouseWheelLeft | KeyCode::MouseWheelRight => {
                        self.mouse_report.pan = 0;
                    }
                    KeyCode::MouseBtn1 => self.mouse_report.buttons &= !(1 << 0),
                    KeyCode::MouseBtn2 => self.mouse_report.buttons &= !(1 << 1),
                    KeyCode::MouseBtn3 => self.mouse_report.buttons &= !(1 << 2),
                    KeyCode::MouseBtn4 => self.mouse_report.buttons &= !(1 << 3),
                    KeyCode::MouseBtn5 => self.mouse_report.buttons &= !(1 << 4),
                    KeyCode::MouseBtn6 => self.mouse_report.buttons &= !(1 << 5),
                    KeyCode::MouseBtn7 => self.mouse_report.buttons &= !(1 << 6),
                    KeyCode::MouseBtn8 => self.mouse_report.buttons &= !(1 << 7),
                    _ => {}
                }
            }
            self.send_mouse_report().await;

            if self
                .last_mouse_tick
                .insert(key, (key_event.pressed, Instant::now()))
                .is_err()
            {
                error!("The buffer for last mouse tick is full");
            }

            // Send the key event back to channel again, to keep processing the mouse key until release
            if key_event.pressed {
                embassy_time::Timer::after(mouse_key.interval).await;
                KEY_EVENT_CHANNEL.try_send(key_event).ok();
            }
        }
    }

    fn process_boot(&mut self, key: KeyCode, key_event: KeyEvent) {
        // When releasing the key, process the boot action
        if !key_event.pressed {
            match key {
                KeyCode::Bootloader => {
                    boot::jump_to_bootloader();
                }
                KeyCode::Reboot => {
                    boot::reboot_keyboard();
                }
                _ => (), // unreachable, do nothing
            };
        }
    }

    /// Register a key, the key can be a basic keycode or a modifier.
    fn register_key(&mut self, key: KeyCode, key_event: KeyEvent) {
        if key.is_modifier() {
            self.register_modifier_key(key);
        } else if key.is_basic() {
            self.register_keycode(key, key_event);
        }
    }

    /// Unregister a key, the key can be a basic keycode or a modifier.
    fn unregister_key(&mut self, key: KeyCode, key_event: KeyEvent) {
        if key.is_modifier() {
            self.unregister_modifier_key(key);
        } else if key.is_basic() {
            self.unregister_keycode(key, key_event);
        }
    }

    /// Register a key to be sent in hid report.
    fn register_keycode(&mut self, key: KeyCode, key_event: KeyEvent) {
        // First, find the key event slot according to the position
        let slot = self.registered_keys.iter().enumerate().find_map(|(i, k)| {
            if let Some((row, col)) = k {
                if key_event.row == *row && key_event.col == *col {
                    return Some(i);
                }
            }
            None
        });

        // If the slot is found, update the key in the slot
        if let Some(index) = slot {
            self.held_keycodes[index] = key;
            self.registered_keys[index] = Some((key_event.row, key_event.col));
        } else {
            // Otherwise, find the first free slot
            if let Some(index) = self.held_keycodes.iter().position(|&k| k == KeyCode::No) {
                self.held_keycodes[index] = key;
                self.registered_keys[index] = Some((key_event.row, key_event.col));
            }
        }
    }

    /// Unregister a key from hid report.
    fn unregister_keycode(&mut self, key: KeyCode, key_event: KeyEvent) {
        // First, find the key event slot according to the position
        let slot = self.registered_keys.iter().enumerate().find_map(|(i, k)| {
            if let Some((row, col)) = k {
                if key_event.row == *row && key_event.col == *col {
                    return Some(i);
                }
            }
            None
        });

        // If the slot is found, update the key in the slot
        if let Some(index) = slot {
            self.held_keycodes[index] = KeyCode::No;
            self.registered_keys[index] = None;
        } else {
            // Otherwise, release the first same key
            if let Some(index) = self.held_keycodes.iter().position(|&k| k == key) {
                self.held_keycodes[index] = KeyCode::No;
                self.registered_keys[index] = None;
            }
        }
    }

    /// Register a modifier to be sent in hid report.
    fn register_modifier_key(&mut self, key: KeyCode) {
        self.held_modifiers |= key.to_hid_modifiers();
    }

    /// Unregister a modifier from hid report.
    fn unregister_modifier_key(&mut self, key: KeyCode) {
        self.held_modifiers &= !key.to_hid_modifiers();
    }

    /// Register a modifier combination to be sent in hid report.
    fn register_modifiers(&mut self, modifiers: ModifierCombination) {
        self.held_modifiers |= modifiers.to_hid_modifiers();
    }

    /// Unregister a modifier combination from hid report.
    fn unregister_modifiers(&mut self, modifiers: ModifierCombination) {
        self.held_modifiers &= !modifiers.to_hid_modifiers();
    }
}
