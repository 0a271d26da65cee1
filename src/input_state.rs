//! Input latching: gamepads, mouse, keyboard, and button-press detection
//!
//! `tick_start` copies a host-supplied [`Input`] into RAM once per tick;
//! everything the running cartridge reads through `btn`/`btnp`/`key`/
//! `keyp`/`mouse` comes from that single latch, never from a live event
//! stream, so the whole tick sees one consistent snapshot (see spec
//! §5, "Ordering guarantees").

use bitflags::bitflags;

use crate::mem::{Ram, GAMEPAD_COUNT, KEYBOARD_KEYS};

bitflags! {
    /// One gamepad's button state, matching the single-byte bitmask the
    /// hardware RAM layout stores per pad.
    #[derive(Default)]
    pub struct Buttons: u8 {
        const UP    = 0b0000_0001;
        const DOWN  = 0b0000_0010;
        const LEFT  = 0b0000_0100;
        const RIGHT = 0b0000_1000;
        const A     = 0b0001_0000;
        const B     = 0b0010_0000;
        const X     = 0b0100_0000;
        const Y     = 0b1000_0000;
    }
}

/// Mouse state supplied by the host for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mouse {
    pub x: i16,
    pub y: i16,
    pub buttons: u8,
    pub scroll: i8,
}

/// One tick's worth of host-supplied input. The host builds this once
/// per frame and hands it to [`crate::vm::Vm::tick_start`].
#[derive(Clone, Debug, Default)]
pub struct Input {
    pub gamepads: [Buttons; GAMEPAD_COUNT],
    pub mouse: Mouse,
    pub keyboard: [u8; KEYBOARD_KEYS],
}

/// Total distinct (pad, button-bit) combinations tracked for hold/press
/// detection.
const TRACKED_BUTTONS: usize = GAMEPAD_COUNT * 8;

/// Per-button hold counters and previous-tick shadow state, maintained
/// across ticks by the scheduler. Not part of RAM: this bookkeeping is
/// host/scheduler state, not something a cartridge can `peek`/`poke`.
pub struct InputLatch {
    previous_gamepads: [u8; GAMEPAD_COUNT],
    hold_counters: [u16; TRACKED_BUTTONS],
    previous_keys: [u8; KEYBOARD_KEYS],
    key_hold: [u16; 256],
}

impl InputLatch {
    pub fn new() -> Self {
        InputLatch {
            previous_gamepads: [0; GAMEPAD_COUNT],
            hold_counters: [0; TRACKED_BUTTONS],
            previous_keys: [0; KEYBOARD_KEYS],
            key_hold: [0; 256],
        }
    }

    pub fn reset(&mut self) {
        *self = InputLatch::new();
    }

    /// Copy `input` into RAM, then advance hold counters and shadow
    /// state for the *next* tick's press detection. Called once at the
    /// start of every tick, before user code runs.
    pub fn latch(&mut self, ram: &mut Ram, input: &Input) {
        for (pad, buttons) in input.gamepads.iter().enumerate() {
            ram.set_gamepad(pad, buttons.bits());
        }
        ram.set_mouse(input.mouse.x, input.mouse.y, input.mouse.buttons, input.mouse.scroll);
        for (slot, key) in input.keyboard.iter().enumerate() {
            ram.set_keyboard_key(slot, *key);
        }

        for pad in 0..GAMEPAD_COUNT {
            let current = input.gamepads[pad].bits();
            for bit in 0..8u8 {
                let idx = pad * 8 + bit as usize;
                let pressed = (current >> bit) & 1 != 0;
                if pressed {
                    self.hold_counters[idx] = self.hold_counters[idx].saturating_add(1);
                } else {
                    self.hold_counters[idx] = 0;
                }
            }
            self.previous_gamepads[pad] = current;
        }

        for key in input.keyboard.iter() {
            if *key != 0 {
                let idx = *key as usize;
                self.key_hold[idx] = self.key_hold[idx].saturating_add(1);
            }
        }
        // Keys not present this tick reset their hold counter.
        let mut active = [false; 256];
        for key in input.keyboard.iter() {
            if *key != 0 {
                active[*key as usize] = true;
            }
        }
        for (code, hold) in self.key_hold.iter_mut().enumerate() {
            if !active[code] {
                *hold = 0;
            }
        }
        self.previous_keys = input.keyboard;
    }

    /// `btn(id)`: is the button currently held?
    pub fn btn(&self, ram: &Ram, pad: usize, button: Buttons) -> bool {
        if pad >= GAMEPAD_COUNT {
            return false;
        }
        Buttons::from_bits_truncate(ram.gamepad(pad)).contains(button)
    }

    /// `btnp(id, hold, period)`: pressed this tick, and either newly
    /// pressed or on a hold-repeat boundary. `hold == -1 && period == -1`
    /// is the pure "rising edge" case.
    pub fn btnp(&self, ram: &Ram, pad: usize, button: Buttons, hold: i32, period: i32) -> bool {
        if pad >= GAMEPAD_COUNT {
            return false;
        }
        let current = ram.gamepad(pad);
        let bit = button_bit(button);
        let pressed = (current >> bit) & 1 != 0;
        if !pressed {
            return false;
        }
        let was_pressed = (self.previous_gamepads[pad] >> bit) & 1 != 0;
        if !was_pressed {
            return true;
        }
        if hold < 0 || period < 0 {
            return false;
        }
        let count = self.hold_counters[pad * 8 + bit as usize] as i32;
        count >= hold && period > 0 && (count - hold) % period == 0
    }

    /// `key(code)`: is the keyboard key currently held?
    pub fn key(&self, ram: &Ram, code: u8) -> bool {
        if code == 0 {
            return false;
        }
        ram.keyboard_key(0) == code
            || ram.keyboard_key(1) == code
            || ram.keyboard_key(2) == code
            || ram.keyboard_key(3) == code
    }

    /// `keyp(code, hold, period)`: press/hold semantics for keyboard
    /// keys, mirroring `btnp`.
    pub fn keyp(&self, ram: &Ram, code: u8, hold: i32, period: i32) -> bool {
        if !self.key(ram, code) {
            return false;
        }
        let was_pressed = self.previous_keys.contains(&code);
        if !was_pressed {
            return true;
        }
        if hold < 0 || period < 0 {
            return false;
        }
        let count = self.key_hold[code as usize] as i32;
        count >= hold && period > 0 && (count - hold) % period == 0
    }
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new()
    }
}

fn button_bit(button: Buttons) -> u8 {
    button.bits().trailing_zeros() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_with(pad0: Buttons) -> Input {
        let mut input = Input::default();
        input.gamepads[0] = pad0;
        input
    }

    #[test]
    fn btnp_fires_once_on_rising_edge() {
        let mut ram = Ram::new();
        let mut latch = InputLatch::new();

        latch.latch(&mut ram, &Input::default());
        assert!(!latch.btnp(&ram, 0, Buttons::A, -1, -1));

        latch.latch(&mut ram, &input_with(Buttons::A));
        assert!(latch.btnp(&ram, 0, Buttons::A, -1, -1));

        latch.latch(&mut ram, &input_with(Buttons::A));
        assert!(!latch.btnp(&ram, 0, Buttons::A, -1, -1));
    }

    #[test]
    fn btnp_hold_and_period_repeat() {
        let mut ram = Ram::new();
        let mut latch = InputLatch::new();

        latch.latch(&mut ram, &Input::default());
        for tick in 1..=10 {
            latch.latch(&mut ram, &input_with(Buttons::A));
            let fired = latch.btnp(&ram, 0, Buttons::A, 3, 2);
            let expected = tick == 1 || (tick >= 3 && (tick - 3) % 2 == 0);
            assert_eq!(fired, expected, "tick {tick}");
        }
    }

    #[test]
    fn btn_reads_the_current_latch() {
        let mut ram = Ram::new();
        let mut latch = InputLatch::new();
        latch.latch(&mut ram, &input_with(Buttons::UP | Buttons::A));
        assert!(latch.btn(&ram, 0, Buttons::UP));
        assert!(latch.btn(&ram, 0, Buttons::A));
        assert!(!latch.btn(&ram, 0, Buttons::B));
    }
}
